use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Perspective camera that always looks at a target point.
///
/// Shots animate `position`, `target` and `fov`; the view matrix is derived
/// from them on demand so it never goes stale while the camera is moving.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    /// Point the camera looks at.
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 20.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov: 75f32.to_radians(),
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, x: f32, y: f32, z: f32) -> Self {
        self.position = Vec3::new(x, y, z);
        self
    }

    pub fn looking_at(mut self, target_x: f32, target_y: f32, target_z: f32) -> Self {
        self.target = Vec3::new(target_x, target_y, target_z);
        self
    }

    pub fn with_fov(mut self, fov_degrees: f32) -> Self {
        self.fov = fov_degrees.to_radians();
        self
    }

    /// Unit vector from the camera towards its target.
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or(Vec3::NEG_Z)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov, aspect, self.near, self.far)
    }

    /// Current position and target as a pose.
    pub fn pose(&self) -> CameraPose {
        CameraPose {
            position: self.position,
            target: self.target,
        }
    }

    /// Jump to a pose, leaving projection parameters untouched.
    pub fn set_pose(&mut self, pose: CameraPose) {
        self.position = pose.position;
        self.target = pose.target;
    }
}

/// Position plus look-at target, e.g. the pose a stage starts from.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub position: Vec3,
    pub target: Vec3,
}

impl CameraPose {
    pub fn new(position: Vec3, target: Vec3) -> Self {
        Self { position, target }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_points_at_target() {
        let camera = Camera::new().at(0.0, 0.0, 20.0).looking_at(0.0, 0.0, 0.0);
        assert_eq!(camera.forward(), Vec3::NEG_Z);
    }

    #[test]
    fn degenerate_forward_falls_back() {
        let camera = Camera::new().at(1.0, 1.0, 1.0).looking_at(1.0, 1.0, 1.0);
        assert_eq!(camera.forward(), Vec3::NEG_Z);
    }

    #[test]
    fn set_pose_keeps_projection() {
        let mut camera = Camera::new().with_fov(60.0);
        camera.set_pose(CameraPose::new(Vec3::new(0.0, 0.0, 4.25), Vec3::Y));

        assert_eq!(camera.position, Vec3::new(0.0, 0.0, 4.25));
        assert_eq!(camera.target, Vec3::Y);
        assert_eq!(camera.fov, 60f32.to_radians());
    }
}
