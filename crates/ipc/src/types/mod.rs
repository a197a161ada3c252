//! Type definitions for IPC messages.

mod transform;
mod wearable;

pub use transform::*;
pub use wearable::*;
