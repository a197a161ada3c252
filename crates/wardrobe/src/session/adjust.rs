//! Fine hat adjustments.

use std::f32::consts::{FRAC_PI_2, PI};

use avatar_ipc::{HatRotation, NudgeDirection};
use glam::Vec3;
use tracing::{debug, info};

use super::Wardrobe;

/// World-space offset of one nudge
pub fn nudge_offset(direction: NudgeDirection, amount: f32) -> Vec3 {
    match direction {
        NudgeDirection::Up => Vec3::Y * amount,
        NudgeDirection::Down => Vec3::NEG_Y * amount,
        NudgeDirection::Left => Vec3::NEG_X * amount,
        NudgeDirection::Right => Vec3::X * amount,
        // Forward faces the camera
        NudgeDirection::Forward => Vec3::NEG_Z * amount,
        NudgeDirection::Backward => Vec3::Z * amount,
    }
}

impl Wardrobe {
    /// Move the hat by a world-space step, whatever its parent
    pub fn move_hat(&mut self, direction: NudgeDirection, amount: f32) -> bool {
        let Some(hat) = self.hat else {
            debug!("No hat to move");
            return false;
        };
        let world = self.graph.world_transform(hat).translation + nudge_offset(direction, amount);
        let target = match self.graph.parent(hat) {
            Some(parent) => self.graph.world_to_local_point(parent, world),
            None => world,
        };
        if let Some(node) = self.graph.get_mut(hat) {
            node.transform.translation = target;
            info!("Hat moved {:?}: {:?}", direction, target);
        }
        self.refresh_manipulator();
        self.commit("Move hat");
        true
    }

    /// Rotate the hat about one of its Euler axes.
    ///
    /// `angle` defaults to a quarter turn. `Flip` is a half turn about Y and
    /// `Turn` a quarter turn (or `angle`) about Y.
    pub fn rotate_hat(&mut self, rotation: HatRotation, angle: Option<f32>) -> bool {
        let Some(hat) = self.hat else {
            debug!("No hat to rotate");
            return false;
        };
        let (axis, amount) = match rotation {
            HatRotation::X => (Vec3::X, angle.unwrap_or(FRAC_PI_2)),
            HatRotation::Y => (Vec3::Y, angle.unwrap_or(FRAC_PI_2)),
            HatRotation::Z => (Vec3::Z, angle.unwrap_or(FRAC_PI_2)),
            HatRotation::Flip => (Vec3::Y, PI),
            HatRotation::Turn => (Vec3::Y, angle.unwrap_or(FRAC_PI_2)),
        };
        if let Some(node) = self.graph.get_mut(hat) {
            let euler = node.transform.euler() + axis * amount;
            node.transform.set_euler(euler);
            info!("Hat rotated {:?} by {:.1} degrees", rotation, amount.to_degrees());
        }
        self.refresh_manipulator();
        self.commit("Rotate hat");
        true
    }
}
