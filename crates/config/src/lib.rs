//! Shared configuration for the avatar builder
//!
//! This crate is the single source of truth for where wearable assets live,
//! which durable key their adjusted transforms are stored under, and the
//! editing limits shared by the core and the Bevy adapter.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[cfg(feature = "bevy")]
use bevy::prelude::Resource;

/// Top-level folder holding every wearable category folder
pub const DEFAULT_WEARABLE_ROOT: &str = "WEARABLES";

/// Folder holding base characters
pub const DEFAULT_FUR_FOLDER: &str = "Furs";

/// Folder holding hat assets
pub const DEFAULT_HAT_FOLDER: &str = "Hats";

/// Folder holding shirt assets
pub const DEFAULT_SHIRT_FOLDER: &str = "Shirts";

/// Model file extension (without the dot)
pub const DEFAULT_EXTENSION: &str = "glb";

/// Key the persisted transform map is written under
pub const DEFAULT_STORAGE_KEY: &str = "avatarBuilder_positions";

/// File backing the durable key-value store
pub const DEFAULT_STORAGE_FILE: &str = "avatar_builder_store.json";

/// Maximum number of undo entries kept
pub const DEFAULT_MAX_HISTORY: usize = 50;

/// Base character loaded at startup
pub const DEFAULT_FUR: &str = "OG";

/// Environment variable pointing at a JSON config file
pub const CONFIG_ENV_VAR: &str = "AVATAR_BUILDER_CONFIG";

/// Base characters shipped in the fur folder
const CATALOG_FURS: &[&str] = &[
    "OG", "Red", "Orange", "Green", "Blue", "Pink", "Purple", "Blue-Tiger", "Red-Tiger",
    "Neon-Tiger", "Tiger", "Green-Dots", "Purple-Dots", "Robo-1", "Robo-2", "Zombie", "Galaxy",
    "Gold", "SpecialPink",
];

/// Hats shipped in the hat folder
const CATALOG_HATS: &[&str] = &[
    "Afro-Rainbow", "Antlers", "Backwards-Hat", "Backwards-Hat-Red-v2",
    "Backwards-Hat-Yellow-Purple", "Banana", "Bandana", "Bandana-Red", "Beanie", "Beanie-Orange",
    "Beanie-Orange-v2", "Beanie-Stealth", "Beret-Green", "Bow", "Bucket", "Bucket-Orange",
    "Bucket-Snow-Tan", "Bunny", "Captain", "Captain-Gold", "Chef", "Clouds", "Cone", "Cowboy",
    "Cowboy-Stealth", "Crown", "Ducky", "Fisherman", "Flipped-Brim-Blue", "Flipped-Brim-Red-v2",
    "Frog", "Fuzzy-Bucket", "Fuzzy-Bucket-Blue-Yellow", "Fuzzy-Bucket-Green-Stealth v2",
    "Fuzzy-Bucket-Orange-Blue", "Fuzzy-Bucket-Pink-Green", "Fuzzy-Bucket-Snow",
    "Fuzzy-Bucket-Snow-Red", "Fuzzy-Bucket-Stealth", "Fuzzy-Bucket-Stealth-Red",
    "Fuzzy-Bucket-Stealth-Teal", "Green-Dino", "Halo", "Hat-Red-v2", "Hat-Stealth-v2",
    "Helmet Green", "Horns", "Island", "Mowhawk-Green", "Mowhawk-Stealth", "Mushroom-Green",
    "Mushroom-Red", "Pineapple", "Pink-Dino", "Pirate", "Plumber", "Plumber-v2", "Plumber-v3",
    "Plumber-v4", "Plumber-v5", "Pot-of-Gold", "Propeller", "Sailor", "Sensei", "Shark",
    "Space-Helmet-Gold", "Space-Helmet-v2", "Spikey-Hair", "Spikey-Hair-Rose", "Spikey-Hair-Teal",
    "Spikey-Hair-v2", "Spikey-Hair-Yellow", "Sportband-OG", "Taco", "Top-Hat-v3", "Uni-Horn",
    "Viking-Helmet", "Viking-Helmet-Gold", "Viking-Helmet-Red", "Viking-Helmet-Silver", "Visor",
    "Watermelon", "Whale", "Wizard Teal", "Wizard-Blue",
];

/// Shirts shipped in the shirt folder
const CATALOG_SHIRTS: &[&str] = &[
    "Apron-Fishy", "Apron", "Baseball-Blue-Orange-v2", "Baseball-Green-Yellow",
    "Baseball-Mint-Stealth", "Baseball-Snow-Blue-v2", "Baseball-Snow-Purple",
    "Baseball-Snow-Stealth", "Basketball-Blue", "Basketball-Gold", "Basketball-Green",
    "Basketball-Purple-v2", "Basketball-Purple", "Basketball-Red", "Bathrobe", "Bowtie",
    "Business-v2", "Business", "Camo-Green-v2", "Cowboy-Vest", "Fishdolier", "Football-Blue-Red",
    "Football-Purple-Yellow", "Football-Stealth", "Golf-Red", "Hockey-Blue-Orange",
    "Hockey-Red-Blue", "Kimono-Blue-Flowers", "Kimono-Pink-Flowers", "Kimono-Purple-Red",
    "Kimono-Snow-Brown-v2", "Mech-Suit", "Ninja", "Overalls-Orange", "Overalls-v2", "Overalls-v3",
    "Puffy-Jacket-Stripes-v8", "Puffy-Jacket-Stripes-v9", "Puffy-Sleeves", "Robe-Purple", "Scuba",
    "Soccer-Mint-Fishy", "Soccer-Stealth", "Spacesuit-Gold", "Spacesuit-v3", "Supersuit-v10",
    "Supersuit-v2", "Supersuit-v3", "Supersuit-v4", "Supersuit-v5", "Supersuit-v6", "Supersuit-v7",
    "Supersuit-v8", "Supersuit-v9", "Supersuit", "Sweater-Yellow", "Sweater", "T-Shirt-Blue-Fishy",
    "T-Shirt-Meme", "T-Shirt", "Tracksuit-Red", "Tracksuit-Yellow-Stealth", "Tux-Gold",
    "Tux-Purple", "Tux-Snow", "Tux-Stealth", "Vest", "Warmup-Blue-Orange", "Warmup-Blue-Snow",
    "Warmup-Blue-Stealth", "Warmup-Mint-Snow", "Warmup-Pink-Orange", "Warmup-Purple-Red",
    "Warmup-Purple-Yellow", "Warmup-Stealth", "Wings", "Wizard-Cloak-Green", "Wizard-Cloak-Pink",
    "Wizard-Cloak-Teal",
];

/// Errors raised while reading a config file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Fixed wrapper transform applied to hats parented under a head bone.
///
/// The values reproduce correct placement for the supported hat family,
/// whose assets are authored with inconsistent internal pivots. A hat with a
/// different pivot will land in the wrong place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HatCalibration {
    /// Local position relative to the head bone
    pub position: [f32; 3],
    /// Local rotation as XYZ Euler angles in radians
    pub euler: [f32; 3],
    /// Local orientation quaternion (x, y, z, w), same orientation as `euler`
    pub quaternion: [f32; 4],
    /// Local scale
    pub scale: [f32; 3],
}

impl Default for HatCalibration {
    fn default() -> Self {
        Self {
            position: [-0.607745, 0.0, 0.005627],
            euler: [0.0, 0.0, -1.570796],
            quaternion: [0.0, 0.0, -0.707107, 0.707107],
            scale: [1.0, 1.0, 1.0],
        }
    }
}

/// Logical names offered per category, used by the gallery and the randomizer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    pub furs: Vec<String>,
    pub hats: Vec<String>,
    pub shirts: Vec<String>,
}

impl Default for Catalog {
    fn default() -> Self {
        let owned = |names: &[&str]| names.iter().map(|n| n.to_string()).collect();
        Self {
            furs: owned(CATALOG_FURS),
            hats: owned(CATALOG_HATS),
            shirts: owned(CATALOG_SHIRTS),
        }
    }
}

/// Avatar builder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "bevy", derive(Resource))]
#[serde(default)]
pub struct BuilderConfig {
    /// Directory every asset path is resolved against
    pub asset_root: PathBuf,
    /// Folder under `asset_root` holding the category folders
    pub wearable_root: String,
    /// Category folder for base characters
    pub fur_folder: String,
    /// Category folder for hats
    pub hat_folder: String,
    /// Category folder for shirts
    pub shirt_folder: String,
    /// Model file extension
    pub extension: String,
    /// Durable store key for persisted transforms
    pub storage_key: String,
    /// Durable store file
    pub storage_path: PathBuf,
    /// Undo history bound
    pub max_history: usize,
    /// Apply a wearable's saved transform right after it is attached
    pub apply_saved_transforms: bool,
    /// Base character requested at startup, if any
    pub default_fur: Option<String>,
    /// Calibrated hat wrapper transform
    pub hat_calibration: HatCalibration,
    /// Options per category
    pub catalog: Catalog,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("."),
            wearable_root: DEFAULT_WEARABLE_ROOT.to_string(),
            fur_folder: DEFAULT_FUR_FOLDER.to_string(),
            hat_folder: DEFAULT_HAT_FOLDER.to_string(),
            shirt_folder: DEFAULT_SHIRT_FOLDER.to_string(),
            extension: DEFAULT_EXTENSION.to_string(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            storage_path: PathBuf::from(DEFAULT_STORAGE_FILE),
            max_history: DEFAULT_MAX_HISTORY,
            apply_saved_transforms: false,
            default_fur: Some(DEFAULT_FUR.to_string()),
            hat_calibration: HatCalibration::default(),
            catalog: Catalog::default(),
        }
    }
}

impl BuilderConfig {
    /// Read a config from a JSON file. Missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read the file named by `AVATAR_BUILDER_CONFIG`, or fall back to defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::from_file(PathBuf::from(path)),
            None => Ok(Self::default()),
        }
    }

    /// Folder path of a category, relative to `asset_root`
    pub fn category_dir(&self, folder: &str) -> String {
        format!("{}/{}", self.wearable_root, folder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BuilderConfig::default();
        assert_eq!(config.storage_key, "avatarBuilder_positions");
        assert_eq!(config.max_history, 50);
        assert_eq!(config.extension, "glb");
        assert!(!config.apply_saved_transforms);
        assert_eq!(config.category_dir(&config.hat_folder), "WEARABLES/Hats");
    }

    #[test]
    fn test_calibration_quaternion_is_unit() {
        let q = HatCalibration::default().quaternion;
        let len = (q[0] * q[0] + q[1] * q[1] + q[2] * q[2] + q[3] * q[3]).sqrt();
        assert!((len - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let path = std::env::temp_dir().join(format!("avatar_config_{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "max_history": 10, "hat_folder": "Caps" }"#).unwrap();

        let config = BuilderConfig::from_file(&path).unwrap();
        assert_eq!(config.max_history, 10);
        assert_eq!(config.hat_folder, "Caps");
        assert_eq!(config.shirt_folder, DEFAULT_SHIRT_FOLDER);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_default_catalog() {
        let catalog = Catalog::default();
        assert_eq!(catalog.furs.len(), 19);
        assert_eq!(catalog.furs[0], DEFAULT_FUR);
        assert!(catalog.hats.iter().any(|h| h == "Crown"));
        assert!(catalog.shirts.iter().any(|s| s == "Tux-Gold"));

        let path = std::env::temp_dir().join(format!("avatar_catalog_{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "catalog": { "hats": ["Crown"] } }"#).unwrap();
        let config = BuilderConfig::from_file(&path).unwrap();
        assert_eq!(config.catalog.hats, vec!["Crown".to_string()]);
        assert_eq!(config.catalog.furs, catalog.furs);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = BuilderConfig::from_file("/nonexistent/avatar_builder.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
