//! # Flythrough
//!
//! **Scroll- and pointer-driven camera choreography through staged 3D scenes.**
//!
//! A flythrough is a handful of hand-placed stages (say *space*, *ground* and
//! *gallery*) with a camera that flies between them. Scrolling past a
//! threshold or clicking an object starts a camera shot; when the shot lands,
//! the stage swaps in one step: objects, lighting and what the pointer can hit.
//!
//! ## Quick Start
//!
//! ```no_run
//! use flythrough::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExperienceConfig::portfolio()?;
//!     let mut experience = Experience::from_config(&config)?;
//!     experience.on_stage_changed(|change| println!("now at {}", change.to));
//!     run(experience, config.window.clone())?;
//!     Ok(())
//! }
//! ```
//!
//! ## Pieces
//!
//! - [`TweenEngine`] advances [`Tween`]s once per frame.
//! - [`CameraPath`] plays a [`Shot`] (sequential steps of parallel tracks) on the camera.
//! - [`StageRegistry`] owns the [`Stage`]s and the current render and hit-test sets.
//! - [`Sequencer`] runs one transition at a time and commits the stage swap.
//! - [`pick`] casts a ray from the camera through the pointer.
//! - [`ScrollOrbit`] lets the scroll offset steer the camera within a stage.
//! - [`Experience`] ties them together for the render loop in [`run`].

mod app;
mod camera;
mod clock;
mod color;
mod config;
mod easing;
mod error;
mod experience;
mod gpu;
mod input;
mod orbit;
mod picking;
mod sequencer;
mod shot;
mod stage;
mod transform;
mod trigger;
mod tween;

pub use app::{AppConfig, run};
pub use camera::{Camera, CameraPose};
pub use clock::Clock;
pub use color::Color;
pub use config::{CameraConfig, ExperienceConfig, ObjectConfig, RouteConfig, StageConfig};
pub use easing::Easing;
pub use error::{ConfigError, GpuError, RunError, SequencerError, ShotError, StageError};
pub use experience::Experience;
pub use gpu::GpuContext;
pub use input::{Input, to_ndc};
pub use orbit::ScrollOrbit;
pub use picking::{Collider, Ray, RayHit, pick, raycast};
pub use sequencer::{Sequencer, SequencerState, StageChange, TriggerOutcome};
pub use shot::{
    CameraPath, CameraProperty, PropertyValue, Shot, ShotHandle, ShotStatus, ShotStep, Track,
};
pub use stage::{AmbientLight, DirectionalLight, LightingRig, Stage, StageId, StageRegistry};
pub use transform::{Name, Transform};
pub use trigger::{HandOff, ObjectClick, ScrollTrigger, ScrollTriggers, hand_off_target};
pub use tween::{OnComplete, Tween, TweenEngine, TweenId, Tweenable};

// Re-export glam math types for convenience
pub use glam::{Mat4, Quat, Vec2, Vec3};

// Stage objects live in a hecs world
pub use hecs::{Entity, World};
