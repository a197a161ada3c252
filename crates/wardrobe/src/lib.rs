//! Wardrobe core for the avatar builder
//!
//! Dresses a base character with hats and shirts taken from accessory
//! assets. Accessory assets ship with stand-in body geometry and authoring
//! helpers; [`classify`] keeps only the wearable parts, [`attach`] moves them
//! onto the character, and [`Wardrobe`] runs the edit session around it:
//! selection, gizmo edits, undo/redo and saved positions.
//!
//! The crate has no rendering or windowing code. The Bevy adapter drives a
//! [`Wardrobe`] resource and forwards its [`avatar_ipc::CoreToUi`] messages.

pub mod attach;
pub mod bones;
pub mod classify;
pub mod constants;
mod error;
pub mod graph;
pub mod history;
pub mod keys;
pub mod loader;
pub mod manipulate;
pub mod persist;
pub mod pick;
mod session;
pub mod store;

pub use attach::{Attachment, attach};
pub use bones::{BoneRole, find_bone};
pub use classify::{BaseBodyIndex, Classification, ExclusionRule, classify};
pub use error::{AssetError, StoreError, WardrobeError};
pub use graph::{NodeId, NodeKind, NodeTransform, SceneGraph, SceneNode};
pub use history::{History, HistoryEntry};
pub use keys::{EditorCommand, Key, KeyInput};
pub use loader::{AssetRequest, AssetSource, GltfAssetSource, LoadedAsset};
pub use manipulate::{Manipulator, ManipulatorTarget, NullManipulator};
pub use persist::{PersistedPositions, PersistedTransform, PositionStore};
pub use session::{
    Character, LoadCompletion, LoadOutcome, LoadRequestOutcome, LoadTicket, Outfit, SCENE_ROOT_NAME,
    Wardrobe, frame_character,
};
pub use store::{FileStore, KeyValueStore, MemoryStore};
