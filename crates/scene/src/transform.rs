//! Object transforms.

use glam::{Mat4, Quat, Vec3};

/// Translation, rotation, and scale of a scene object.
#[derive(Clone, Copy, Debug)]
pub struct Transform {
    /// Position in world space.
    pub translation: Vec3,
    /// Orientation.
    pub rotation: Quat,
    /// Per-axis scale.
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Identity transform.
    pub fn new() -> Self {
        Self::default()
    }

    /// Transform at the given position.
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::default()
        }
    }

    /// Composes the model matrix (scale, then rotate, then translate).
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Applies an additional rotation about the Z axis.
    pub fn rotate_z(&mut self, radians: f32) {
        self.rotation = Quat::from_rotation_z(radians) * self.rotation;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn test_identity_matrix() {
        assert_eq!(Transform::new().matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn test_translation_applies_last() {
        let transform = Transform {
            translation: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quat::IDENTITY,
            scale: Vec3::splat(2.0),
        };

        let origin = transform.matrix() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert_eq!(origin, Vec4::new(1.0, 2.0, 3.0, 1.0));

        let unit_x = transform.matrix() * Vec4::new(1.0, 0.0, 0.0, 1.0);
        assert_eq!(unit_x, Vec4::new(3.0, 2.0, 3.0, 1.0));
    }

    #[test]
    fn test_rotate_z_accumulates() {
        let mut transform = Transform::new();
        transform.rotate_z(std::f32::consts::FRAC_PI_2);
        transform.rotate_z(std::f32::consts::FRAC_PI_2);

        let rotated = transform.matrix() * Vec4::new(1.0, 0.0, 0.0, 1.0);
        // Two quarter turns about Z send +X to -X
        assert!((rotated.x + 1.0).abs() < 1e-5);
        assert!(rotated.y.abs() < 1e-5);
    }
}
