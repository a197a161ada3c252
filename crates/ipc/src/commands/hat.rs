//! Fine adjustment commands for the current hat.

use serde::{Deserialize, Serialize};

/// World-space nudge direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NudgeDirection {
    Up,
    Down,
    Left,
    Right,
    Forward,
    Backward,
}

/// Hat rotation presets and axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HatRotation {
    X,
    Y,
    Z,
    /// Half turn about Y
    Flip,
    /// Quarter turn about Y
    Turn,
}

/// Default nudge step in world units
pub const DEFAULT_NUDGE: f32 = 0.05;

fn default_nudge() -> f32 {
    DEFAULT_NUDGE
}

/// Hat adjustment commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HatCommand {
    Nudge {
        direction: NudgeDirection,
        #[serde(default = "default_nudge")]
        amount: f32,
    },
    /// `angle` is in radians. Axis rotations default to a quarter turn;
    /// `flip` always turns by half.
    Rotate {
        rotation: HatRotation,
        #[serde(default)]
        angle: Option<f32>,
    },
}
