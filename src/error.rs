//! Error types for shots, stages, sequencing, configuration and the GPU surface.

use thiserror::Error;

use crate::shot::CameraProperty;
use crate::stage::StageId;

/// A shot definition that can never complete.
///
/// Raised synchronously by [`CameraPath::run_shot`](crate::CameraPath::run_shot)
/// before anything is scheduled.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShotError {
    #[error("shot has no steps")]
    EmptyShot,
    #[error("step {step} has no tracks")]
    EmptyStep { step: usize },
    #[error("step {step} track {track}: duration must be finite and positive, got {duration}")]
    InvalidDuration {
        step: usize,
        track: usize,
        duration: f32,
    },
    #[error("step {step} track {track}: missing end value")]
    MissingEndValue { step: usize, track: usize },
    #[error("step {step} track {track}: value kind does not match property {property:?}")]
    ValueKindMismatch {
        step: usize,
        track: usize,
        property: CameraProperty,
    },
}

/// Errors raised while building or querying the stage table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageError {
    #[error("stage '{0}' is already defined")]
    DuplicateStage(StageId),
    #[error("unknown stage '{0}'")]
    UnknownStage(StageId),
}

/// Errors reported to callers of
/// [`Sequencer::trigger_transition`](crate::Sequencer::trigger_transition).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SequencerError {
    #[error("unknown stage '{0}'")]
    UnknownStage(StageId),
    #[error("no route from {} to '{to}'", from.as_ref().map(|s| s.as_str()).unwrap_or("<start>"))]
    NoRoute { from: Option<StageId>, to: StageId },
    #[error(transparent)]
    Shot(#[from] ShotError),
}

/// Errors raised while loading or assembling an experience definition.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("invalid experience definition: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Stage(#[from] StageError),
    #[error(transparent)]
    Sequencer(#[from] SequencerError),
}

/// Failures bringing up the wgpu surface.
#[derive(Error, Debug)]
pub enum GpuError {
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
}

/// Failures that end the windowed run loop.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error(transparent)]
    Gpu(#[from] GpuError),
    #[error("surface ran out of memory")]
    OutOfMemory,
}
