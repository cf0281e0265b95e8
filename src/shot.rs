//! Declarative camera moves.
//!
//! A [`Shot`] is an ordered list of steps. Tracks inside one step run in
//! parallel; each step starts when every track of the previous step has
//! finished. Sequencing is data, not nested callbacks:
//!
//! ```
//! use flythrough::{Camera, CameraPath, Easing, Shot, ShotStatus, Track, TweenEngine, Vec3};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let camera = Rc::new(RefCell::new(Camera::new()));
//! let path = CameraPath::new(Rc::clone(&camera));
//! let mut engine = TweenEngine::new();
//!
//! // Turn towards the earth, then fly in.
//! let shot = Shot::new()
//!     .then(Track::target(Vec3::new(0.0, 1.0, 0.0), 0.5))
//!     .then(Track::position(Vec3::new(0.0, 0.0, 4.25), 1.0).easing(Easing::EaseInOut));
//!
//! let handle = path.run_shot(&shot, &mut engine).unwrap();
//! for _ in 0..15 {
//!     engine.tick(0.1);
//! }
//! assert_eq!(handle.status(), ShotStatus::Completed);
//! assert_eq!(camera.borrow().position, Vec3::new(0.0, 0.0, 4.25));
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::camera::Camera;
use crate::easing::Easing;
use crate::error::ShotError;
use crate::tween::{Tween, TweenEngine, TweenId};

/// Camera property a track animates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraProperty {
    Position,
    /// Look-at point.
    Target,
    /// Vertical field of view, in degrees.
    Fov,
}

impl CameraProperty {
    fn expects_vector(self) -> bool {
        matches!(self, CameraProperty::Position | CameraProperty::Target)
    }

    /// Current value of this property on `camera`.
    pub fn read(self, camera: &Camera) -> PropertyValue {
        match self {
            CameraProperty::Position => PropertyValue::Vector(camera.position),
            CameraProperty::Target => PropertyValue::Vector(camera.target),
            CameraProperty::Fov => PropertyValue::Scalar(camera.fov.to_degrees()),
        }
    }

    fn write_vector(self, camera: &mut Camera, value: Vec3) {
        match self {
            CameraProperty::Position => camera.position = value,
            CameraProperty::Target => camera.target = value,
            CameraProperty::Fov => {}
        }
    }

    fn write_scalar(self, camera: &mut Camera, value: f32) {
        if self == CameraProperty::Fov {
            camera.fov = value.to_radians();
        }
    }

    fn write(self, camera: &mut Camera, value: PropertyValue) {
        match value {
            PropertyValue::Vector(v) => self.write_vector(camera, v),
            PropertyValue::Scalar(s) => self.write_scalar(camera, s),
        }
    }
}

/// Start or end value of a track.
///
/// Serialized untagged: a number is a scalar, `[x, y, z]` is a vector.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Scalar(f32),
    Vector(Vec3),
}

impl PropertyValue {
    fn is_vector(self) -> bool {
        matches!(self, PropertyValue::Vector(_))
    }
}

impl From<Vec3> for PropertyValue {
    fn from(v: Vec3) -> Self {
        PropertyValue::Vector(v)
    }
}

impl From<f32> for PropertyValue {
    fn from(s: f32) -> Self {
        PropertyValue::Scalar(s)
    }
}

/// One property interpolation inside a shot step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub property: CameraProperty,
    /// Start value. `None` starts from wherever the camera is when the step begins.
    #[serde(default)]
    pub from: Option<PropertyValue>,
    #[serde(default)]
    pub to: Option<PropertyValue>,
    /// Seconds.
    pub duration: f32,
    #[serde(default)]
    pub easing: Easing,
}

impl Track {
    pub fn new(property: CameraProperty, to: impl Into<PropertyValue>, duration: f32) -> Self {
        Self {
            property,
            from: None,
            to: Some(to.into()),
            duration,
            easing: Easing::Linear,
        }
    }

    pub fn position(to: Vec3, duration: f32) -> Self {
        Self::new(CameraProperty::Position, to, duration)
    }

    pub fn target(to: Vec3, duration: f32) -> Self {
        Self::new(CameraProperty::Target, to, duration)
    }

    pub fn fov(to_degrees: f32, duration: f32) -> Self {
        Self::new(CameraProperty::Fov, to_degrees, duration)
    }

    pub fn starting_at(mut self, value: impl Into<PropertyValue>) -> Self {
        self.from = Some(value.into());
        self
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }
}

/// Tracks that start together.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ShotStep {
    pub tracks: Vec<Track>,
}

/// An ordered list of steps forming one camera move.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Shot {
    pub steps: Vec<ShotStep>,
}

impl Shot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new step that starts after everything before it has finished.
    pub fn then(mut self, track: Track) -> Self {
        self.steps.push(ShotStep {
            tracks: vec![track],
        });
        self
    }

    /// Add a track that runs alongside the last step.
    pub fn with(mut self, track: Track) -> Self {
        match self.steps.last_mut() {
            Some(step) => step.tracks.push(track),
            None => self.steps.push(ShotStep {
                tracks: vec![track],
            }),
        }
        self
    }

    /// Check that every track can reach its end value.
    pub fn validate(&self) -> Result<(), ShotError> {
        self.resolve().map(|_| ())
    }

    /// Total duration if every step runs back to back.
    pub fn duration(&self) -> f32 {
        self.steps
            .iter()
            .map(|step| {
                step.tracks
                    .iter()
                    .map(|track| track.duration)
                    .fold(0.0, f32::max)
            })
            .sum()
    }

    fn resolve(&self) -> Result<Vec<Vec<ResolvedTrack>>, ShotError> {
        if self.steps.is_empty() {
            return Err(ShotError::EmptyShot);
        }

        let mut steps = Vec::with_capacity(self.steps.len());
        for (step_index, step) in self.steps.iter().enumerate() {
            if step.tracks.is_empty() {
                return Err(ShotError::EmptyStep { step: step_index });
            }

            let mut tracks = Vec::with_capacity(step.tracks.len());
            for (track_index, track) in step.tracks.iter().enumerate() {
                if !track.duration.is_finite() || track.duration <= 0.0 {
                    return Err(ShotError::InvalidDuration {
                        step: step_index,
                        track: track_index,
                        duration: track.duration,
                    });
                }
                let Some(to) = track.to else {
                    return Err(ShotError::MissingEndValue {
                        step: step_index,
                        track: track_index,
                    });
                };
                let expects_vector = track.property.expects_vector();
                let kinds_match = to.is_vector() == expects_vector
                    && track.from.is_none_or(|from| from.is_vector() == expects_vector);
                if !kinds_match {
                    return Err(ShotError::ValueKindMismatch {
                        step: step_index,
                        track: track_index,
                        property: track.property,
                    });
                }

                tracks.push(ResolvedTrack {
                    property: track.property,
                    from: track.from,
                    to,
                    duration: track.duration,
                    easing: track.easing,
                });
            }
            steps.push(tracks);
        }
        Ok(steps)
    }
}

#[derive(Clone, Copy, Debug)]
struct ResolvedTrack {
    property: CameraProperty,
    from: Option<PropertyValue>,
    to: PropertyValue,
    duration: f32,
    easing: Easing,
}

/// Where a running shot is in its life.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShotStatus {
    Running,
    Completed,
    Cancelled,
}

struct ShotRun {
    status: ShotStatus,
    /// Tweens of the step currently playing.
    live: Vec<TweenId>,
    /// Tracks of the current step that have not finished yet.
    pending: usize,
}

/// Handle to a shot started by [`CameraPath::run_shot`].
///
/// Poll [`status`](Self::status) after each engine tick; it turns
/// `Completed` on the tick that finishes the last step.
#[derive(Clone)]
pub struct ShotHandle {
    run: Rc<RefCell<ShotRun>>,
}

impl ShotHandle {
    pub fn status(&self) -> ShotStatus {
        self.run.borrow().status
    }

    pub fn is_running(&self) -> bool {
        self.status() == ShotStatus::Running
    }

    /// Stop the shot where it is. The completion snap does not happen.
    ///
    /// Returns `false` if the shot had already completed or been cancelled.
    pub fn cancel(&self, engine: &mut TweenEngine) -> bool {
        let live = {
            let mut run = self.run.borrow_mut();
            if run.status != ShotStatus::Running {
                return false;
            }
            run.status = ShotStatus::Cancelled;
            run.pending = 0;
            std::mem::take(&mut run.live)
        };
        for id in live {
            engine.cancel(id);
        }
        true
    }
}

impl std::fmt::Debug for ShotHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShotHandle")
            .field("status", &self.status())
            .finish()
    }
}

/// Drives shots against a shared camera.
#[derive(Clone)]
pub struct CameraPath {
    camera: Rc<RefCell<Camera>>,
}

impl CameraPath {
    pub fn new(camera: Rc<RefCell<Camera>>) -> Self {
        Self { camera }
    }

    pub fn camera(&self) -> &Rc<RefCell<Camera>> {
        &self.camera
    }

    /// Validate `shot` and schedule its first step.
    ///
    /// Invalid shots are rejected before anything is scheduled. When the last
    /// step finishes, every track's end value is written to the camera so the
    /// final pose is exact.
    pub fn run_shot(&self, shot: &Shot, engine: &mut TweenEngine) -> Result<ShotHandle, ShotError> {
        let steps: Rc<[Vec<ResolvedTrack>]> = shot.resolve()?.into();
        let run = Rc::new(RefCell::new(ShotRun {
            status: ShotStatus::Running,
            live: Vec::new(),
            pending: 0,
        }));

        log::debug!(
            "running shot: {} step(s), {:.2}s",
            steps.len(),
            shot.duration()
        );
        schedule_step(engine, &self.camera, &steps, 0, &run);

        Ok(ShotHandle { run })
    }
}

fn schedule_step(
    engine: &mut TweenEngine,
    camera: &Rc<RefCell<Camera>>,
    steps: &Rc<[Vec<ResolvedTrack>]>,
    index: usize,
    run: &Rc<RefCell<ShotRun>>,
) {
    let tracks = &steps[index];
    let mut live = Vec::with_capacity(tracks.len());

    for track in tracks {
        let on_done = {
            let camera = Rc::clone(camera);
            let steps = Rc::clone(steps);
            let run = Rc::clone(run);
            move |engine: &mut TweenEngine| track_finished(engine, &camera, &steps, index, &run)
        };

        let start = track
            .from
            .unwrap_or_else(|| track.property.read(&camera.borrow()));
        let property = track.property;
        let sink = Rc::clone(camera);

        let id = match (start, track.to) {
            (PropertyValue::Vector(from), PropertyValue::Vector(to)) => engine.schedule(
                Tween::new(from, to, track.duration, move |v| {
                    property.write_vector(&mut sink.borrow_mut(), v)
                })
                .easing(track.easing)
                .on_complete(on_done),
            ),
            (PropertyValue::Scalar(from), PropertyValue::Scalar(to)) => engine.schedule(
                Tween::new(from, to, track.duration, move |v| {
                    property.write_scalar(&mut sink.borrow_mut(), v)
                })
                .easing(track.easing)
                .on_complete(on_done),
            ),
            // Kinds are checked in `Shot::resolve`.
            _ => continue,
        };
        live.push(id);
    }

    let mut run = run.borrow_mut();
    run.pending = live.len();
    run.live = live;
}

fn track_finished(
    engine: &mut TweenEngine,
    camera: &Rc<RefCell<Camera>>,
    steps: &Rc<[Vec<ResolvedTrack>]>,
    index: usize,
    run: &Rc<RefCell<ShotRun>>,
) {
    {
        let mut state = run.borrow_mut();
        if state.status != ShotStatus::Running {
            return;
        }
        state.pending = state.pending.saturating_sub(1);
        if state.pending > 0 {
            return;
        }
    }

    if index + 1 < steps.len() {
        schedule_step(engine, camera, steps, index + 1, run);
        return;
    }

    let mut camera = camera.borrow_mut();
    for track in steps.iter().flatten() {
        track.property.write(&mut camera, track.to);
    }
    let mut state = run.borrow_mut();
    state.status = ShotStatus::Completed;
    state.live.clear();
}
