//! Command types sent from the UI.

mod gizmo;
mod hat;

pub use gizmo::*;
pub use hat::*;

use serde::{Deserialize, Serialize};

use crate::types::Transform3D;

/// Selection and object edit commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObjectCommand {
    /// Select by list identifier (`hat`, `hat_0`, ...). An empty id deselects.
    Select { id: String },
    /// Select by viewport ray, in world space
    Pick {
        origin: [f32; 3],
        direction: [f32; 3],
    },
    /// Clear the selection
    Deselect,
    /// The gizmo moved an object; transform is local to its parent
    Transform { id: String, transform: Transform3D },
    /// Delete the selected object
    Delete,
}

/// Undo/redo commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryCommand {
    Undo,
    Redo,
}
