//! Data-driven experience definitions.
//!
//! An [`ExperienceConfig`] is a JSON document describing the window, the
//! stages with their objects and lighting, the camera shots between stages,
//! and the scroll thresholds that fire them. See `assets/portfolio.json` for
//! the built-in portfolio.

use std::path::Path;

use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::app::AppConfig;
use crate::camera::{Camera, CameraPose};
use crate::error::ConfigError;
use crate::orbit::ScrollOrbit;
use crate::picking::Collider;
use crate::shot::{Shot, ShotStep};
use crate::stage::{LightingRig, StageId};
use crate::trigger::ScrollTrigger;

const PORTFOLIO: &str = include_str!("../assets/portfolio.json");

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExperienceConfig {
    #[serde(default)]
    pub window: AppConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    pub initial_stage: StageId,
    /// Stage the reset control flies back to.
    #[serde(default)]
    pub reset_stage: Option<StageId>,
    pub stages: Vec<StageConfig>,
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
    #[serde(default)]
    pub scroll_triggers: Vec<ScrollTrigger>,
}

impl ExperienceConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        log::info!("loading experience from {}", path.display());
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// The built-in space → ground → gallery portfolio.
    pub fn portfolio() -> Result<Self, ConfigError> {
        Self::from_json_str(PORTFOLIO)
    }
}

/// Starting camera.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: Vec3,
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        let camera = Camera::default();
        Self {
            position: camera.position,
            target: camera.target,
            fov: camera.fov.to_degrees(),
        }
    }
}

impl CameraConfig {
    pub fn to_camera(&self) -> Camera {
        Camera {
            position: self.position,
            target: self.target,
            ..Camera::new().with_fov(self.fov)
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    pub id: StageId,
    #[serde(default)]
    pub lighting: LightingRig,
    #[serde(default)]
    pub entry_pose: Option<CameraPose>,
    /// Scroll-driven camera orbit while this stage is current.
    #[serde(default)]
    pub scroll_orbit: Option<ScrollOrbit>,
    #[serde(default)]
    pub objects: Vec<ObjectConfig>,
}

fn unit_scale() -> Vec3 {
    Vec3::ONE
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectConfig {
    pub name: String,
    #[serde(default)]
    pub position: Vec3,
    /// Euler angles in degrees, applied X then Y then Z.
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default = "unit_scale")]
    pub scale: Vec3,
    #[serde(default)]
    pub collider: Option<Collider>,
    /// Whether pointer rays can hit this object. Requires a collider.
    #[serde(default)]
    pub pickable: bool,
    /// Stage a click on this object flies to.
    #[serde(default)]
    pub hand_off: Option<StageId>,
}

impl ObjectConfig {
    pub fn rotation(&self) -> Quat {
        let r = self.rotation;
        Quat::from_euler(EulerRot::XYZ, r.x.to_radians(), r.y.to_radians(), r.z.to_radians())
    }
}

/// Camera shot for transitions into `to`. Without `from`, the route applies
/// from any stage that has no more specific route.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteConfig {
    #[serde(default)]
    pub from: Option<StageId>,
    pub to: StageId,
    pub steps: Vec<ShotStep>,
}

impl RouteConfig {
    pub fn shot(&self) -> Shot {
        Shot {
            steps: self.steps.clone(),
        }
    }
}
