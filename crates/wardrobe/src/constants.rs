//! Wardrobe constants
//!
//! Name tokens and size thresholds used to tell wearable geometry apart from
//! body and placeholder geometry bundled inside accessory assets.

/// Nodes whose lower-cased name contains this are dropped with their subtree
pub const PLACEHOLDER_NODE_NAME: &str = "placeholder";

/// Authoring helper shapes shipped inside hat assets
pub const HAT_PLACEHOLDER_TOKENS: &[&str] = &["cone", "sphere", "geo", "placeholder"];

/// Authoring helper shapes shipped inside shirt assets
pub const SHIRT_PLACEHOLDER_TOKENS: &[&str] = &["cone", "sphere", "geo", "placeholder", "temp"];

/// Anatomical name tokens
pub const BODY_PART_TOKENS: &[&str] = &[
    "head", "body", "torso", "teeth", "tooth", "tongue", "mouth", "jaw", "nose", "whisker",
];

/// Extra anatomical tokens only shirts ship with
pub const SHIRT_BODY_PART_TOKENS: &[&str] = &["snout", "muzzle"];

pub const EYE_TOKEN: &str = "eye";

/// Names containing these are accessories even though they contain "eye"-like text
pub const EYE_EXCEPTIONS: &[&str] = &["ear", "bunny"];

/// Name prefix of a generic body export
pub const GENERIC_BODY_PREFIX: &str = "mesh_0001";

/// Vertex count difference still treated as the same base mesh
pub const IDENTITY_VERTEX_TOLERANCE: usize = 10;

/// Per-axis bounding size difference still treated as the same base mesh
pub const IDENTITY_SIZE_TOLERANCE: f32 = 0.01;

/// Box height above which a shirt node is always a bundled body
pub const BULK_VERY_TALL: f32 = 1.0;

/// X and Z extents above which a shirt node is always a bundled body
pub const BULK_VERY_WIDE: f32 = 0.8;

pub const BULK_TALL: f32 = 0.6;
pub const BULK_WIDE: f32 = 0.5;
pub const BULK_WIDE_MIN_HEIGHT: f32 = 0.4;

/// Centre offsets (y, and x/z) under which a large node counts as body-centred
pub const BULK_CENTER_Y: f32 = 0.5;
pub const BULK_CENTER_XZ: f32 = 0.3;

/// Largest extent of a tiny primitive placeholder
pub const TINY_PRIMITIVE_MAX: f32 = 0.1;

/// Maximum |x - z| extent difference of a roughly round primitive
pub const TINY_PRIMITIVE_ROUNDNESS: f32 = 0.05;

/// Head joint names, in priority order
pub const HEAD_BONE_NAMES: &[&str] = &["head", "head_bone"];

/// Body joint names, in priority order
pub const BODY_BONE_NAMES: &[&str] = &["body", "torso", "spine", "chest", "root"];

/// Joints containing this are never body joints
pub const BODY_BONE_EXCLUSION: &str = "head";

/// Target largest extent of a framed base character
pub const FRAMING_TARGET_SIZE: f32 = 2.0;

/// Vertical drop applied when centring a base character
pub const FRAMING_DROP: f32 = 0.9;

/// Centre offset under which a character is considered already centred
pub const FRAMING_CENTERED_EPSILON: f32 = 0.01;

/// Extents outside this range trigger a rescale of an already centred character
pub const FRAMING_MAX_EXTENT: f32 = 10.0;
pub const FRAMING_MIN_EXTENT: f32 = 0.1;

/// Tolerance used when comparing snapshots for coalescing
pub const SNAPSHOT_EPSILON: f32 = 1e-6;

/// Chance that a randomized outfit includes a hat
pub const HAT_CHANCE: f64 = 0.7;

/// Chance that a randomized outfit includes a shirt
pub const SHIRT_CHANCE: f64 = 0.8;
