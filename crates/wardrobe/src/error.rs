//! Error types for the wardrobe core.

use std::path::PathBuf;

use avatar_ipc::{AssetKind, WearableCategory};

/// Errors surfaced by wardrobe operations.
///
/// A missing bone and history bounds are not errors: the first degrades to a
/// root attachment and the second is a logged no-op.
#[derive(Debug, thiserror::Error)]
pub enum WardrobeError {
    #[error("Could not load {file}: make sure it exists in the {folder}/ folder ({reason})")]
    LoadFailure {
        file: String,
        folder: String,
        reason: String,
    },

    #[error("Load a base character before adding a {category}")]
    MissingPrerequisite { category: WearableCategory },

    #[error("A {kind} load is already in progress")]
    LoadBusy { kind: AssetKind },

    #[error("Load ticket {0} is not in flight")]
    StaleLoad(u64),

    #[error("Unknown selectable object '{0}'")]
    UnknownSelection(String),

    #[error("{0} is not a glTF model (.glb or .gltf)")]
    UnsupportedFile(String),

    #[error("The catalog has no {kind} options")]
    EmptyCatalog { kind: AssetKind },
}

/// Errors from the durable key-value store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store contents are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Store lock poisoned")]
    Poisoned,
}

/// Errors from an asset source
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("glTF import failed: {0}")]
    Import(#[from] gltf::Error),

    #[error("{0} contains no scene")]
    NoScene(PathBuf),

    #[error("Asset not found: {0}")]
    NotFound(String),
}
