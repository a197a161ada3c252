//! Main IPC message enums for communication between the core and the UI.

use serde::{Deserialize, Serialize};

use crate::commands::{GizmoCommand, GizmoMode, HatCommand, HistoryCommand, ObjectCommand};
use crate::types::{AssetKind, AttachmentAlignment, SelectableObject, WearableCategory};

/// Messages from the core to the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CoreToUi {
    /// The set of selectable objects changed (load, removal, deletion, mode toggle)
    SelectableObjectsChanged { objects: Vec<SelectableObject> },

    /// The edit target changed
    SelectionChanged { selected_id: Option<String> },

    /// Enable or disable the remove affordance of a wearable category
    RemoveAvailabilityChanged {
        category: WearableCategory,
        enabled: bool,
    },

    /// Loading indicator state
    LoadingChanged { loading: bool },

    /// User-visible alert
    Alert { message: String },

    /// Camera orbit must be disabled while a gizmo drag is in progress
    OrbitControlsChanged { enabled: bool },

    /// Gizmo attached to an object
    GizmoAttached { id: String, mode: GizmoMode },

    /// Gizmo detached from its object
    GizmoDetached,

    /// Gizmo mode changed (for UI sync)
    GizmoModeChanged { mode: GizmoMode },

    /// A base character finished loading
    CharacterLoaded { name: String },

    /// A wearable was attached to the character
    WearableAttached {
        category: WearableCategory,
        name: String,
        alignment: AttachmentAlignment,
    },

    /// Adjusted transforms were written to the durable store
    PositionsSaved { names: Vec<String> },

    /// Options the gallery can offer, per category
    CatalogPublished {
        furs: Vec<String>,
        hats: Vec<String>,
        shirts: Vec<String>,
    },

    /// Error notification
    Error { code: String, message: String },
}

/// Messages from the UI to the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum UiToCore {
    /// Load a base character or a wearable by logical name
    LoadAsset { kind: AssetKind, name: String },

    /// Load a model file from outside the library as the base character.
    /// Current wearables are dropped.
    LoadCustom { path: String },

    /// Random character, then a hat and a shirt by chance
    Randomize,

    /// Ask for the option catalog
    RequestCatalog,

    /// Remove the current wearable of a category
    RemoveWearable { category: WearableCategory },

    /// Toggle edit mode
    SetEditMode { enabled: bool },

    /// Selection and object edits
    ObjectCommand(ObjectCommand),

    /// Gizmo mode and drag reporting
    GizmoCommand(GizmoCommand),

    /// Undo/redo
    HistoryCommand(HistoryCommand),

    /// Fine hat adjustments
    HatCommand(HatCommand),

    /// Persist the current hat and shirt transforms
    SavePositions,

    /// A text input gained or lost keyboard focus
    TextInputFocus { focused: bool },
}

impl UiToCore {
    /// Shorthand for a load request
    pub fn load(kind: AssetKind, name: impl Into<String>) -> Self {
        Self::LoadAsset {
            kind,
            name: name.into(),
        }
    }
}
