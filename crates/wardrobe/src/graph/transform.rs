//! Local transform of a scene node.

use avatar_ipc::Transform3D;
use glam::{EulerRot, Mat4, Quat, Vec3};

/// Position, orientation and non-uniform scale of a node relative to its parent.
///
/// Orientation is stored once, as a quaternion. The Euler view is derived on
/// demand (intrinsic XYZ order), so the two can never disagree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl NodeTransform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    pub fn from_trs(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// Decompose an affine matrix. Shear is discarded.
    pub fn from_matrix(matrix: Mat4) -> Self {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        Self {
            translation,
            rotation: rotation.normalize(),
            scale,
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Orientation as XYZ Euler angles in radians
    pub fn euler(&self) -> Vec3 {
        let (x, y, z) = self.rotation.to_euler(EulerRot::XYZ);
        Vec3::new(x, y, z)
    }

    /// Set orientation from XYZ Euler angles; the quaternion follows
    pub fn set_euler(&mut self, euler: Vec3) {
        self.rotation = Quat::from_euler(EulerRot::XYZ, euler.x, euler.y, euler.z);
    }

    /// Set orientation from a quaternion; the Euler view follows
    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation.normalize();
    }

    /// Component-wise comparison; quaternions q and -q compare equal
    pub fn abs_diff_eq(&self, other: &Self, epsilon: f32) -> bool {
        let same_rotation = self.rotation.abs_diff_eq(other.rotation, epsilon)
            || self.rotation.abs_diff_eq(-other.rotation, epsilon);
        self.translation.abs_diff_eq(other.translation, epsilon)
            && self.scale.abs_diff_eq(other.scale, epsilon)
            && same_rotation
    }
}

impl From<Transform3D> for NodeTransform {
    fn from(t: Transform3D) -> Self {
        let rotation = Quat::from_array(t.rotation);
        Self {
            translation: Vec3::from_array(t.position),
            rotation: if rotation.length_squared() > 0.0 {
                rotation.normalize()
            } else {
                Quat::IDENTITY
            },
            scale: Vec3::from_array(t.scale),
        }
    }
}

impl From<NodeTransform> for Transform3D {
    fn from(t: NodeTransform) -> Self {
        Self {
            position: t.translation.to_array(),
            rotation: t.rotation.to_array(),
            scale: t.scale.to_array(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_euler_and_quaternion_agree() {
        let mut t = NodeTransform::IDENTITY;
        t.set_euler(Vec3::new(0.0, 0.0, -FRAC_PI_2));
        let q = t.rotation;
        assert!((q.z - (-0.707107)).abs() < 1e-5);
        assert!((q.w - 0.707107).abs() < 1e-5);

        t.set_rotation(Quat::from_rotation_x(0.5));
        assert!((t.euler().x - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_matrix_round_trip() {
        let t = NodeTransform::from_trs(
            Vec3::new(1.0, -2.0, 3.0),
            Quat::from_euler(EulerRot::XYZ, 0.3, -0.2, 1.1),
            Vec3::new(2.0, 0.5, 1.5),
        );
        assert!(NodeTransform::from_matrix(t.matrix()).abs_diff_eq(&t, 1e-5));
    }
}
