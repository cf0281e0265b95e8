//! Frame-driven interpolation engine.
//!
//! A [`Tween`] interpolates one value from `from` to `to` over a duration and
//! hands every sample to its update callback. The [`TweenEngine`] owns all live
//! tweens and advances them once per frame:
//!
//! ```
//! use flythrough::{Easing, Tween, TweenEngine};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let zoom = Rc::new(Cell::new(0.0));
//! let mut engine = TweenEngine::new();
//!
//! let sink = Rc::clone(&zoom);
//! engine.schedule(
//!     Tween::new(1.0_f32, 2.0, 0.5, move |v| sink.set(v)).easing(Easing::EaseOut),
//! );
//!
//! engine.tick(0.25);
//! engine.tick(0.25);
//! assert_eq!(zoom.get(), 2.0);
//! assert!(engine.is_empty());
//! ```
//!
//! Tweens are independent: there is no implicit ordering between them. A
//! sequence is expressed by scheduling the next tween from the previous one's
//! completion callback, which receives the engine for exactly that purpose.

use glam::{Vec2, Vec3};

use crate::easing::Easing;

/// Slack allowed when deciding that accumulated frame time has reached the
/// duration. Frame deltas arrive as `f32` and their sum drifts by a few ulps.
const COMPLETION_EPSILON: f64 = 1e-5;

/// Values that can be linearly interpolated.
pub trait Tweenable: Copy + 'static {
    fn lerp(from: Self, to: Self, t: f32) -> Self;
}

impl Tweenable for f32 {
    fn lerp(from: Self, to: Self, t: f32) -> Self {
        from + (to - from) * t
    }
}

impl Tweenable for Vec2 {
    fn lerp(from: Self, to: Self, t: f32) -> Self {
        from.lerp(to, t)
    }
}

impl Tweenable for Vec3 {
    fn lerp(from: Self, to: Self, t: f32) -> Self {
        from.lerp(to, t)
    }
}

/// Handle to a scheduled tween.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TweenId(u64);

/// Callback run once when a tween reaches its end value.
///
/// It runs after the tween has been removed, with mutable access to the engine
/// so it can schedule follow-up tweens.
pub type OnComplete = Box<dyn FnOnce(&mut TweenEngine)>;

/// One time-parameterised interpolation.
pub struct Tween<T: Tweenable> {
    from: T,
    to: T,
    duration: f32,
    easing: Easing,
    elapsed: f64,
    on_update: Box<dyn FnMut(T)>,
    on_complete: Option<OnComplete>,
}

impl<T: Tweenable> Tween<T> {
    /// Create a linear tween. `duration` is in seconds.
    ///
    /// A non-positive duration completes on the first tick.
    pub fn new(from: T, to: T, duration: f32, on_update: impl FnMut(T) + 'static) -> Self {
        Self {
            from,
            to,
            duration,
            easing: Easing::Linear,
            elapsed: 0.0,
            on_update: Box::new(on_update),
            on_complete: None,
        }
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn on_complete(mut self, callback: impl FnOnce(&mut TweenEngine) + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    /// Value at linear progress `t`.
    ///
    /// `t <= 0` yields `from` and `t >= 1` yields `to` bit-for-bit, whatever
    /// the easing curve.
    pub fn sample(&self, t: f32) -> T {
        if t <= 0.0 {
            self.from
        } else if t >= 1.0 {
            self.to
        } else {
            T::lerp(self.from, self.to, self.easing.apply(t))
        }
    }

    fn progress(&self) -> f32 {
        let duration = f64::from(self.duration);
        if duration.is_nan() || duration <= 0.0 || self.elapsed + COMPLETION_EPSILON >= duration {
            1.0
        } else {
            (self.elapsed / duration).clamp(0.0, 1.0) as f32
        }
    }
}

/// Type-erased view of a tween so the engine can hold mixed value types.
trait ActiveTween {
    /// Advance by `dt` seconds and publish the new sample. Returns `true` once finished.
    fn advance(&mut self, dt: f64) -> bool;
    fn take_on_complete(&mut self) -> Option<OnComplete>;
}

impl<T: Tweenable> ActiveTween for Tween<T> {
    fn advance(&mut self, dt: f64) -> bool {
        self.elapsed += dt.max(0.0);
        let t = self.progress();
        let value = self.sample(t);
        (self.on_update)(value);
        t >= 1.0
    }

    fn take_on_complete(&mut self) -> Option<OnComplete> {
        self.on_complete.take()
    }
}

/// Owns the live set of tweens and advances them once per frame.
#[derive(Default)]
pub struct TweenEngine {
    tweens: Vec<(TweenId, Box<dyn ActiveTween>)>,
    next_id: u64,
}

impl TweenEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a tween. It is first sampled on the next [`tick`](Self::tick).
    pub fn schedule<T: Tweenable>(&mut self, tween: Tween<T>) -> TweenId {
        let id = TweenId(self.next_id);
        self.next_id += 1;
        self.tweens.push((id, Box::new(tween)));
        id
    }

    /// Remove a tween without running its completion callback.
    ///
    /// Returns `false` if the tween already finished or was cancelled.
    pub fn cancel(&mut self, id: TweenId) -> bool {
        match self.tweens.iter().position(|(live, _)| *live == id) {
            Some(index) => {
                self.tweens.remove(index);
                log::debug!("cancelled tween {:?}", id);
                true
            }
            None => false,
        }
    }

    /// Advance all tweens by `dt` seconds.
    ///
    /// Tweens that reach their end are removed, then their completion
    /// callbacks run in scheduling order. Returns how many tweens finished.
    pub fn tick(&mut self, dt: f32) -> usize {
        let dt = f64::from(dt);
        let mut finished = Vec::new();
        let mut running = Vec::with_capacity(self.tweens.len());

        for (id, mut tween) in self.tweens.drain(..) {
            if tween.advance(dt) {
                finished.push(tween);
            } else {
                running.push((id, tween));
            }
        }
        // Anything scheduled by a callback below lands after the survivors.
        self.tweens = running;

        let count = finished.len();
        for mut tween in finished {
            if let Some(callback) = tween.take_on_complete() {
                callback(self);
            }
        }
        count
    }

    pub fn is_active(&self, id: TweenId) -> bool {
        self.tweens.iter().any(|(live, _)| *live == id)
    }

    pub fn len(&self) -> usize {
        self.tweens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tweens.is_empty()
    }
}
