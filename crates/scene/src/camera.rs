//! Camera for rendering the scene.

use glam::{Mat4, Vec3};

/// A look-at camera with a perspective projection.
///
/// The view matrix is recomputed from position and target each frame; the
/// projection matrix takes the current aspect ratio so a window resize
/// flows through naturally.
#[derive(Clone, Debug)]
pub struct Camera {
    /// Camera position in world space.
    pub position: Vec3,
    /// Point the camera looks at.
    pub target: Vec3,
    /// Up direction.
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Near clip plane distance.
    pub near: f32,
    /// Far clip plane distance.
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(2.0, 2.0, 2.0),
            target: Vec3::ZERO,
            up: Vec3::Z,
            fov_y: 45.0_f32.to_radians(),
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Camera {
    /// Create a camera with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the view matrix.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Get the projection matrix for the given aspect ratio.
    ///
    /// Includes the Vulkan Y-flip: clip-space Y points down, so the
    /// projection's Y axis is negated to keep the scene upright.
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        let mut proj = Mat4::perspective_rh(self.fov_y, aspect, self.near, self.far);
        proj.y_axis.y *= -1.0;
        proj
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn test_view_matrix_moves_world_to_camera() {
        let camera = Camera {
            position: Vec3::new(0.0, 0.0, 5.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            ..Camera::default()
        };

        // The look-at target ends up in front of the camera (negative Z)
        let view = camera.view_matrix();
        let target_in_view = view * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!(target_in_view.z < 0.0);
        assert!((target_in_view.z + 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_projection_flips_y() {
        let camera = Camera::default();
        let proj = camera.projection_matrix(16.0 / 9.0);

        let unflipped = Mat4::perspective_rh(camera.fov_y, 16.0 / 9.0, camera.near, camera.far);
        assert_eq!(proj.y_axis.y, -unflipped.y_axis.y);
    }

    #[test]
    fn test_projection_respects_aspect() {
        let camera = Camera::default();
        let wide = camera.projection_matrix(2.0);
        let square = camera.projection_matrix(1.0);
        // Wider aspect compresses X
        assert!(wide.x_axis.x < square.x_axis.x);
    }
}
