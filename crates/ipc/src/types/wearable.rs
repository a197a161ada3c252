//! Wearable vocabulary shared by the core and the UI.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Accessory category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WearableCategory {
    Hat,
    Shirt,
}

impl WearableCategory {
    pub const ALL: [WearableCategory; 2] = [WearableCategory::Hat, WearableCategory::Shirt];

    /// Lower-case identifier, also the selectable id prefix
    pub fn as_str(self) -> &'static str {
        match self {
            WearableCategory::Hat => "hat",
            WearableCategory::Shirt => "shirt",
        }
    }

    /// Capitalized name for labels
    pub fn title(self) -> &'static str {
        match self {
            WearableCategory::Hat => "Hat",
            WearableCategory::Shirt => "Shirt",
        }
    }
}

impl fmt::Display for WearableCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of asset a load request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    /// Base character
    Fur,
    Hat,
    Shirt,
}

impl AssetKind {
    /// Wearable category, `None` for base characters
    pub fn category(self) -> Option<WearableCategory> {
        match self {
            AssetKind::Fur => None,
            AssetKind::Hat => Some(WearableCategory::Hat),
            AssetKind::Shirt => Some(WearableCategory::Shirt),
        }
    }
}

impl From<WearableCategory> for AssetKind {
    fn from(category: WearableCategory) -> Self {
        match category {
            WearableCategory::Hat => AssetKind::Hat,
            WearableCategory::Shirt => AssetKind::Shirt,
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Fur => f.write_str("fur"),
            AssetKind::Hat => f.write_str("hat"),
            AssetKind::Shirt => f.write_str("shirt"),
        }
    }
}

/// Entry of the selectable-object list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectableObject {
    pub id: String,
    pub label: String,
}

/// How a wearable wrapper ended up placed on the character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttachmentAlignment {
    /// Parented under the head bone with the calibrated transform
    Calibrated,
    /// Parented at the character root by design (shirts)
    Root,
    /// No suitable bone; parented at the character root
    Degraded,
}
