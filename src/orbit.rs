use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::camera::CameraPose;

/// Camera path bound to the scroll offset while a stage is current.
///
/// The camera circles `center` at `radius`, one `radians_per_offset` per unit
/// of scroll, and bobs up and down by `bob` as it goes. It always looks at
/// `center`.
///
/// # Example
/// ```
/// use flythrough::{ScrollOrbit, Vec3};
///
/// let orbit = ScrollOrbit::new(Vec3::new(0.0, 10.0, 0.0), 20.0);
/// let pose = orbit.pose_at(0.0);
/// assert_eq!(pose.position, Vec3::new(0.0, 10.0, 20.0));
/// assert_eq!(pose.target, Vec3::new(0.0, 10.0, 0.0));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollOrbit {
    /// Point orbited and looked at.
    pub center: Vec3,
    pub radius: f32,
    /// Orbit angle per unit of scroll offset.
    pub radians_per_offset: f32,
    /// Vertical amplitude of the bob.
    pub bob: f32,
    /// Bob cycles per orbit radian.
    pub bob_rate: f32,
}

impl Default for ScrollOrbit {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            radius: 20.0,
            radians_per_offset: 0.01,
            bob: 5.0,
            bob_rate: 0.1,
        }
    }
}

impl ScrollOrbit {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self {
            center,
            radius,
            ..Default::default()
        }
    }

    pub fn radians_per_offset(mut self, rate: f32) -> Self {
        self.radians_per_offset = rate;
        self
    }

    pub fn bob(mut self, amplitude: f32, rate: f32) -> Self {
        self.bob = amplitude;
        self.bob_rate = rate;
        self
    }

    /// Camera pose at scroll `offset`.
    pub fn pose_at(&self, offset: f32) -> CameraPose {
        let angle = offset * self.radians_per_offset;
        let offset = Vec3::new(
            angle.sin() * self.radius,
            (angle * self.bob_rate).sin() * self.bob,
            angle.cos() * self.radius,
        );
        CameraPose::new(self.center + offset, self.center)
    }
}
