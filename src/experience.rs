//! The top-level context tying stages, camera, tweens and triggers together.
//!
//! An [`Experience`] is what the render loop talks to. Input arrives as scroll
//! offsets and pointer positions in normalized device coordinates; the loop
//! calls [`tick`](Experience::tick) once per frame and reads back the camera
//! and the current stage's lighting.
//!
//! ```
//! use flythrough::{Camera, Experience, Shot, Stage, Track, Vec3};
//!
//! let mut exp = Experience::new(Camera::new());
//! exp.define_stage(Stage::new("space")).unwrap();
//! exp.define_stage(Stage::new("ground")).unwrap();
//! exp.add_route(
//!     Some("space".into()),
//!     "ground".into(),
//!     Shot::new().then(Track::position(Vec3::new(0.0, 0.0, 4.25), 1.0)),
//! )
//! .unwrap();
//! exp.start(&"space".into()).unwrap();
//!
//! exp.trigger_transition(&"ground".into()).unwrap();
//! exp.tick(1.0);
//! assert_eq!(exp.current_stage().map(|s| s.as_str()), Some("ground"));
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use hecs::{EntityBuilder, World};
use log::debug;

use crate::camera::Camera;
use crate::clock::Clock;
use crate::color::Color;
use crate::config::ExperienceConfig;
use crate::error::{ConfigError, SequencerError, StageError};
use crate::picking::{self, RayHit};
use crate::sequencer::{Sequencer, SequencerState, StageChange, TriggerOutcome};
use crate::shot::{CameraPath, Shot};
use crate::stage::{LightingRig, Stage, StageId, StageRegistry};
use crate::transform::{Name, Transform};
use crate::trigger::{self, HandOff, ObjectClick, ScrollTrigger, ScrollTriggers};
use crate::tween::TweenEngine;

type ClickListener = Box<dyn FnMut(&ObjectClick)>;

pub struct Experience {
    world: World,
    registry: StageRegistry,
    sequencer: Sequencer,
    engine: TweenEngine,
    camera: Rc<RefCell<Camera>>,
    clock: Clock,
    scroll: ScrollTriggers,
    reset_stage: Option<StageId>,
    click_listeners: Vec<ClickListener>,
}

impl Experience {
    /// Empty experience with the camera at its starting pose.
    pub fn new(camera: Camera) -> Self {
        let camera = Rc::new(RefCell::new(camera));
        Self {
            world: World::new(),
            registry: StageRegistry::new(),
            sequencer: Sequencer::new(CameraPath::new(Rc::clone(&camera))),
            engine: TweenEngine::new(),
            camera,
            clock: Clock::new(),
            scroll: ScrollTriggers::default(),
            reset_stage: None,
            click_listeners: Vec::new(),
        }
    }

    /// Build an experience from a data definition and enter its initial stage.
    ///
    /// Every stage id the definition mentions is checked before anything runs.
    pub fn from_config(config: &ExperienceConfig) -> Result<Self, ConfigError> {
        let mut exp = Self::new(config.camera.to_camera());

        let known: Vec<StageId> = config.stages.iter().map(|s| s.id.clone()).collect();
        let check = |id: &StageId| {
            if known.contains(id) {
                Ok(())
            } else {
                Err(StageError::UnknownStage(id.clone()))
            }
        };

        for stage_config in &config.stages {
            let mut stage = Stage::new(stage_config.id.clone()).lighting(stage_config.lighting);
            if let Some(pose) = stage_config.entry_pose {
                stage = stage.entry_pose(pose);
            }
            if let Some(orbit) = stage_config.scroll_orbit {
                stage = stage.scroll_orbit(orbit);
            }

            for object in &stage_config.objects {
                let mut builder = EntityBuilder::new();
                builder.add(Name::new(object.name.clone())).add(
                    Transform::from_position(object.position)
                        .rotation(object.rotation())
                        .scale(object.scale),
                );
                if let Some(collider) = object.collider {
                    builder.add(collider);
                }
                if let Some(target) = &object.hand_off {
                    check(target)?;
                    builder.add(HandOff(target.clone()));
                }
                let entity = exp.world.spawn(builder.build());

                stage = if object.pickable {
                    stage.pickable(entity)
                } else {
                    stage.member(entity)
                };
            }
            exp.define_stage(stage)?;
        }

        for route in &config.routes {
            if let Some(from) = &route.from {
                check(from)?;
            }
            check(&route.to)?;
            exp.add_route(route.from.clone(), route.to.clone(), route.shot())?;
        }

        for scroll in &config.scroll_triggers {
            check(&scroll.to)?;
            if let Some(from) = &scroll.from {
                check(from)?;
            }
            exp.add_scroll_trigger(scroll.clone());
        }

        if let Some(reset) = &config.reset_stage {
            check(reset)?;
            exp.reset_stage = Some(reset.clone());
        }

        exp.start(&config.initial_stage)?;
        Ok(exp)
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Spawn objects here before handing them to [`define_stage`](Self::define_stage).
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn registry(&self) -> &StageRegistry {
        &self.registry
    }

    pub fn define_stage(&mut self, stage: Stage) -> Result<(), StageError> {
        self.registry.define(stage)
    }

    pub fn add_route(
        &mut self,
        from: Option<StageId>,
        to: StageId,
        shot: Shot,
    ) -> Result<(), SequencerError> {
        self.sequencer.add_route(from, to, shot)
    }

    pub fn add_scroll_trigger(&mut self, trigger: ScrollTrigger) {
        self.scroll.push(trigger);
    }

    /// Enter `stage` without a shot.
    pub fn start(&mut self, stage: &StageId) -> Result<(), SequencerError> {
        self.sequencer.enter(stage, &mut self.registry)?;
        self.follow_orbit();
        Ok(())
    }

    /// Request a transition to `target`. See [`Sequencer::trigger_transition`].
    pub fn trigger_transition(
        &mut self,
        target: &StageId,
    ) -> Result<TriggerOutcome, SequencerError> {
        self.sequencer
            .trigger_transition(target, &self.registry, &mut self.engine)
    }

    pub fn on_stage_changed(&mut self, listener: impl FnMut(&StageChange) + 'static) {
        self.sequencer.on_stage_changed(listener);
    }

    /// Register a callback run for every click that hits an object, before
    /// any hand-off it triggers.
    pub fn on_object_clicked(&mut self, listener: impl FnMut(&ObjectClick) + 'static) {
        self.click_listeners.push(Box::new(listener));
    }

    /// Nearest pickable object of the current stage under `ndc`.
    pub fn pick(&self, ndc: Vec2, aspect: f32) -> Option<RayHit> {
        picking::pick(
            &self.world,
            &self.camera.borrow(),
            aspect,
            ndc,
            self.registry.hit_test_set(),
        )
    }

    /// Feed the page scroll offset. Fires a transition when a threshold is
    /// crossed upward, otherwise moves the camera along the current stage's
    /// scroll orbit.
    pub fn handle_scroll(
        &mut self,
        offset: f32,
    ) -> Result<Option<TriggerOutcome>, SequencerError> {
        let crossed = self.scroll.update(offset, self.registry.current_id());
        let outcome = match crossed {
            Some(target) => {
                debug!("scroll offset {:.1} crossed into '{}'", offset, target);
                self.trigger_transition(&target).map(Some)
            }
            None => Ok(None),
        };
        self.follow_orbit();
        outcome
    }

    /// Place the camera on the current stage's scroll orbit. Does nothing
    /// while a shot owns the camera.
    fn follow_orbit(&mut self) {
        if self.sequencer.is_locked() {
            return;
        }
        let Some(orbit) = self.registry.current().and_then(|stage| stage.orbit()) else {
            return;
        };
        let pose = orbit.pose_at(self.scroll.offset());
        self.camera.borrow_mut().set_pose(pose);
    }

    /// Pick at `ndc`, notify click listeners and follow the hit object's
    /// hand-off, if it has one.
    pub fn handle_click(
        &mut self,
        ndc: Vec2,
        aspect: f32,
    ) -> Result<Option<TriggerOutcome>, SequencerError> {
        let Some(hit) = self.pick(ndc, aspect) else {
            return Ok(None);
        };
        let name = self
            .world
            .get::<&Name>(hit.entity)
            .ok()
            .map(|name| name.as_str().to_string());
        debug!("clicked '{}'", name.as_deref().unwrap_or("<unnamed>"));

        let click = ObjectClick {
            entity: hit.entity,
            name,
            point: hit.point,
        };
        for listener in &mut self.click_listeners {
            listener(&click);
        }

        let target = trigger::hand_off_target(&self.world, hit.entity);
        match target {
            Some(target) => self.trigger_transition(&target).map(Some),
            None => Ok(None),
        }
    }

    /// Fly back to the reset stage, if one is configured.
    pub fn reset(&mut self) -> Result<Option<TriggerOutcome>, SequencerError> {
        match self.reset_stage.clone() {
            Some(stage) => self.trigger_transition(&stage).map(Some),
            None => Ok(None),
        }
    }

    /// Advance every tween by `dt` seconds, then commit a landed transition.
    pub fn tick(&mut self, dt: f32) -> Option<StageChange> {
        self.engine.tick(dt);
        let change = self.sequencer.poll(&mut self.registry);
        if change.is_some() {
            self.follow_orbit();
        }
        change
    }

    /// [`tick`](Self::tick) by the wall time since the previous frame.
    pub fn frame(&mut self) -> Option<StageChange> {
        let dt = self.clock.tick();
        self.tick(dt)
    }

    pub fn cancel_transition(&mut self) -> bool {
        self.sequencer.cancel(&mut self.engine)
    }

    pub fn current_stage(&self) -> Option<&StageId> {
        self.registry.current_id()
    }

    pub fn state(&self) -> &SequencerState {
        self.sequencer.state()
    }

    pub fn is_transitioning(&self) -> bool {
        self.sequencer.is_locked()
    }

    /// Snapshot of the camera.
    pub fn camera(&self) -> Camera {
        *self.camera.borrow()
    }

    pub fn lighting(&self) -> LightingRig {
        self.registry
            .current()
            .map(|stage| *stage.lighting_rig())
            .unwrap_or_default()
    }

    pub fn background(&self) -> Color {
        self.lighting().background
    }

    pub fn tweens(&self) -> &TweenEngine {
        &self.engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orbit::ScrollOrbit;
    use crate::picking::Collider;
    use approx::assert_relative_eq;
    use crate::shot::Track;
    use glam::Vec3;

    fn experience() -> (Experience, hecs::Entity) {
        let mut exp = Experience::new(Camera::new());
        let earth = exp.world_mut().spawn((
            Name::new("earth"),
            Transform::new(),
            Collider::sphere(5.0),
            HandOff("ground".into()),
        ));
        exp.define_stage(Stage::new("space").pickable(earth)).unwrap();
        exp.define_stage(Stage::new("ground").lighting(LightingRig::new(Color::hex(0x448ee4))))
            .unwrap();
        exp.add_route(
            None,
            "ground".into(),
            Shot::new().then(Track::position(Vec3::new(0.0, 0.0, 4.25), 2.0)),
        )
        .unwrap();
        exp.add_scroll_trigger(ScrollTrigger {
            threshold: 1.0,
            to: "ground".into(),
            from: None,
        });
        exp.start(&"space".into()).unwrap();
        (exp, earth)
    }

    #[test]
    fn click_on_hand_off_object_starts_transition() {
        let (mut exp, earth) = experience();
        assert_eq!(exp.pick(Vec2::ZERO, 1.0).map(|h| h.entity), Some(earth));

        let outcome = exp.handle_click(Vec2::ZERO, 1.0).unwrap();
        assert_eq!(outcome, Some(TriggerOutcome::Started));
        assert!(exp.is_transitioning());
    }

    #[test]
    fn click_on_empty_space_does_nothing() {
        let (mut exp, _) = experience();
        assert_eq!(exp.handle_click(Vec2::new(0.95, 0.95), 1.0).unwrap(), None);
        assert!(!exp.is_transitioning());
    }

    #[test]
    fn scroll_then_tick_lands_on_ground() {
        let (mut exp, earth) = experience();
        assert_eq!(exp.background(), Color::BLACK);

        assert_eq!(exp.handle_scroll(0.5).unwrap(), None);
        assert_eq!(exp.handle_scroll(3.0).unwrap(), Some(TriggerOutcome::Started));
        assert_eq!(exp.tick(1.0), None);

        let change = exp.tick(1.0).unwrap();
        assert_eq!(change.to, StageId::new("ground"));
        assert_eq!(exp.background(), Color::hex(0x448ee4));
        assert_eq!(exp.camera().position, Vec3::new(0.0, 0.0, 4.25));
        assert!(!exp.registry().is_hit_testable(earth));
        assert_eq!(exp.pick(Vec2::ZERO, 1.0), None);
    }

    #[test]
    fn reset_without_stage_is_noop() {
        let (mut exp, _) = experience();
        assert_eq!(exp.reset().unwrap(), None);
    }

    #[test]
    fn click_listeners_see_every_hit() {
        let (mut exp, earth) = experience();
        let clicks = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&clicks);
        exp.on_object_clicked(move |click| sink.borrow_mut().push(click.clone()));

        exp.handle_click(Vec2::new(0.95, 0.95), 1.0).unwrap();
        assert!(clicks.borrow().is_empty());

        exp.handle_click(Vec2::ZERO, 1.0).unwrap();
        let clicks = clicks.borrow();
        assert_eq!(clicks.len(), 1);
        assert_eq!(clicks[0].entity, earth);
        assert_eq!(clicks[0].name.as_deref(), Some("earth"));
        assert_relative_eq!(clicks[0].point.z, 5.0, epsilon = 1e-3);
    }

    #[test]
    fn scroll_orbit_drives_the_camera_when_settled() {
        let mut exp = Experience::new(Camera::new());
        let center = Vec3::new(0.0, 10.0, 0.0);
        let orbit = ScrollOrbit::new(center, 20.0).radians_per_offset(0.3);
        exp.define_stage(Stage::new("pole").scroll_orbit(orbit)).unwrap();
        exp.start(&"pole".into()).unwrap();
        assert_eq!(exp.camera().pose(), orbit.pose_at(0.0));

        assert_eq!(exp.handle_scroll(4.0).unwrap(), None);
        assert_eq!(exp.camera().pose(), orbit.pose_at(4.0));
        assert_eq!(exp.camera().target, center);
    }

    #[test]
    fn scroll_orbit_waits_for_the_shot_to_land() {
        let (mut exp, _) = experience();
        let orbit = ScrollOrbit::new(Vec3::ZERO, 30.0);
        exp.define_stage(Stage::new("ring").scroll_orbit(orbit)).unwrap();
        exp.add_route(
            None,
            "ring".into(),
            Shot::new().then(Track::position(Vec3::new(0.0, 0.0, 30.0), 1.0)),
        )
        .unwrap();

        exp.trigger_transition(&"ring".into()).unwrap();
        exp.tick(0.5);
        let mid_flight = exp.camera().pose();
        exp.handle_scroll(0.5).unwrap();
        assert_eq!(exp.camera().pose(), mid_flight);

        exp.tick(0.5).unwrap();
        assert_eq!(exp.camera().pose(), orbit.pose_at(0.5));
    }

    #[test]
    fn cancel_keeps_current_stage() {
        let (mut exp, _) = experience();
        exp.trigger_transition(&"ground".into()).unwrap();
        exp.tick(0.5);

        assert!(exp.cancel_transition());
        assert_eq!(exp.state(), &SequencerState::Idle);
        assert_eq!(exp.current_stage(), Some(&StageId::new("space")));
        assert!(exp.tweens().is_empty());
    }
}
