//! Scene transition sequencer.
//!
//! The sequencer turns a trigger ("go to `ground`") into a camera shot and,
//! when the shot lands, swaps the current stage in a single step:
//!
//! ```text
//!   Idle / At(a) --trigger(b)--> InFlight { a -> b } --shot completes--> At(b)
//!                                       |
//!                                       +--cancel--> Idle
//! ```
//!
//! At most one shot is in flight at a time. Triggers that arrive while one is
//! running are dropped, never queued.

use log::{debug, info, warn};

use crate::error::SequencerError;
use crate::shot::{CameraPath, Shot, ShotHandle, ShotStatus};
use crate::stage::{LightingRig, StageId, StageRegistry};
use crate::tween::TweenEngine;

/// Where the sequencer is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SequencerState {
    /// No stage has settled yet, or the last transition was cancelled.
    Idle,
    /// A shot is running; the lock is held.
    InFlight {
        from: Option<StageId>,
        to: StageId,
    },
    /// Settled on a stage.
    At(StageId),
}

/// What a trigger did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// A shot started.
    Started,
    /// Another transition holds the lock; the trigger was dropped.
    Ignored,
    /// The target is already the current stage.
    AlreadyThere,
}

/// Notification sent to stage-change listeners.
#[derive(Clone, Debug, PartialEq)]
pub struct StageChange {
    pub from: Option<StageId>,
    pub to: StageId,
    pub lighting: LightingRig,
}

/// A shot bound to a `from -> to` pair. `from: None` matches any stage.
#[derive(Clone, Debug)]
struct Route {
    from: Option<StageId>,
    to: StageId,
    shot: Shot,
}

/// Single-flight guard.
#[derive(Debug, Default)]
struct TransitionLock(bool);

impl TransitionLock {
    fn try_acquire(&mut self) -> bool {
        !std::mem::replace(&mut self.0, true)
    }

    fn release(&mut self) {
        self.0 = false;
    }

    fn is_held(&self) -> bool {
        self.0
    }
}

type StageListener = Box<dyn FnMut(&StageChange)>;

pub struct Sequencer {
    state: SequencerState,
    lock: TransitionLock,
    routes: Vec<Route>,
    path: CameraPath,
    in_flight: Option<ShotHandle>,
    listeners: Vec<StageListener>,
}

impl Sequencer {
    pub fn new(path: CameraPath) -> Self {
        Self {
            state: SequencerState::Idle,
            lock: TransitionLock::default(),
            routes: Vec::new(),
            path,
            in_flight: None,
            listeners: Vec::new(),
        }
    }

    pub fn state(&self) -> &SequencerState {
        &self.state
    }

    pub fn is_locked(&self) -> bool {
        self.lock.is_held()
    }

    /// Bind `shot` to transitions into `to`, from `from` or from anywhere.
    ///
    /// The shot is validated now so a bad route fails at setup, not mid-show.
    /// An exact `from` route wins over a wildcard one.
    pub fn add_route(
        &mut self,
        from: Option<StageId>,
        to: StageId,
        shot: Shot,
    ) -> Result<(), SequencerError> {
        shot.validate()?;
        self.routes.push(Route { from, to, shot });
        Ok(())
    }

    fn route(&self, from: Option<&StageId>, to: &StageId) -> Option<&Shot> {
        let exact = self
            .routes
            .iter()
            .find(|r| &r.to == to && r.from.is_some() && r.from.as_ref() == from);
        exact
            .or_else(|| self.routes.iter().find(|r| &r.to == to && r.from.is_none()))
            .map(|r| &r.shot)
    }

    /// Register a callback run after every stage swap.
    pub fn on_stage_changed(&mut self, listener: impl FnMut(&StageChange) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Make `stage` current immediately, without a shot. Used at startup.
    pub fn enter(
        &mut self,
        stage: &StageId,
        registry: &mut StageRegistry,
    ) -> Result<(), SequencerError> {
        if !registry.contains(stage) {
            return Err(SequencerError::UnknownStage(stage.clone()));
        }
        if self.lock.is_held() {
            warn!("ignoring enter('{}') while a transition is in flight", stage);
            return Ok(());
        }
        self.commit(stage, registry);
        Ok(())
    }

    /// Start the shot from the current stage to `target`.
    ///
    /// Unknown ids are an error even while locked. A trigger that arrives
    /// while a shot is in flight returns [`TriggerOutcome::Ignored`].
    pub fn trigger_transition(
        &mut self,
        target: &StageId,
        registry: &StageRegistry,
        engine: &mut TweenEngine,
    ) -> Result<TriggerOutcome, SequencerError> {
        if !registry.contains(target) {
            return Err(SequencerError::UnknownStage(target.clone()));
        }
        if self.lock.is_held() {
            debug!("transition to '{}' dropped: lock held", target);
            return Ok(TriggerOutcome::Ignored);
        }

        let current = registry.current_id();
        if current == Some(target) {
            return Ok(TriggerOutcome::AlreadyThere);
        }

        let shot = self
            .route(current, target)
            .ok_or_else(|| SequencerError::NoRoute {
                from: current.cloned(),
                to: target.clone(),
            })?;
        let handle = self.path.run_shot(shot, engine)?;

        self.lock.try_acquire();
        self.in_flight = Some(handle);
        self.state = SequencerState::InFlight {
            from: current.cloned(),
            to: target.clone(),
        };
        info!(
            "transition {} -> {} started",
            current.map(StageId::as_str).unwrap_or("<start>"),
            target
        );
        Ok(TriggerOutcome::Started)
    }

    /// Check the in-flight shot after an engine tick and commit the stage swap
    /// once it has landed. Returns the change, if one happened.
    pub fn poll(&mut self, registry: &mut StageRegistry) -> Option<StageChange> {
        let status = self.in_flight.as_ref()?.status();
        match status {
            ShotStatus::Running => None,
            ShotStatus::Cancelled => {
                self.abort();
                None
            }
            ShotStatus::Completed => {
                self.in_flight = None;
                let SequencerState::InFlight { to, .. } = self.state.clone() else {
                    self.lock.release();
                    return None;
                };
                self.commit(&to, registry)
            }
        }
    }

    /// Cancel the in-flight shot, if any. The current stage is unchanged and
    /// the lock is released.
    ///
    /// A shot that has already landed is not cancelled: it returns `false`
    /// and the next [`poll`](Self::poll) commits the swap.
    pub fn cancel(&mut self, engine: &mut TweenEngine) -> bool {
        let Some(handle) = self.in_flight.as_ref() else {
            return false;
        };
        if !handle.cancel(engine) {
            return false;
        }
        self.abort();
        true
    }

    fn abort(&mut self) {
        if let SequencerState::InFlight { to, .. } = &self.state {
            info!("transition to '{}' cancelled", to);
        }
        self.in_flight = None;
        self.lock.release();
        self.state = SequencerState::Idle;
    }

    /// Swap stages, place the camera, release the lock and notify listeners.
    fn commit(&mut self, to: &StageId, registry: &mut StageRegistry) -> Option<StageChange> {
        let from = match registry.activate(to) {
            Ok(from) => from,
            Err(e) => {
                warn!("stage swap failed: {}", e);
                self.lock.release();
                self.state = SequencerState::Idle;
                return None;
            }
        };

        let stage = registry.current()?;
        if let Some(pose) = stage.entry() {
            self.path.camera().borrow_mut().set_pose(pose);
        }
        let change = StageChange {
            from,
            to: to.clone(),
            lighting: *stage.lighting_rig(),
        };

        self.lock.release();
        self.state = SequencerState::At(to.clone());
        info!("now at stage '{}'", to);

        for listener in &mut self.listeners {
            listener(&change);
        }
        Some(change)
    }
}
