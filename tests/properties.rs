use std::cell::Cell;
use std::rc::Rc;

use flythrough::{
    Camera, Easing, Experience, Shot, Stage, StageId, Track, TriggerOutcome, Tween, TweenEngine,
    Vec3,
};
use proptest::prelude::*;

fn easing() -> impl Strategy<Value = Easing> {
    prop::sample::select(Easing::ALL.to_vec())
}

fn vec3() -> impl Strategy<Value = Vec3> {
    (-1.0e4f32..1.0e4, -1.0e4f32..1.0e4, -1.0e4f32..1.0e4).prop_map(|(x, y, z)| Vec3::new(x, y, z))
}

fn locked_experience() -> Experience {
    let mut exp = Experience::new(Camera::new());
    for id in ["space", "ground", "gallery"] {
        exp.define_stage(Stage::new(id)).unwrap();
        exp.add_route(
            None,
            id.into(),
            Shot::new().then(Track::position(Vec3::new(0.0, 0.0, 4.25), 1.0)),
        )
        .unwrap();
    }
    exp.start(&"space".into()).unwrap();
    exp
}

proptest! {
    #[test]
    fn sample_endpoints_are_exact(from in vec3(), to in vec3(), easing in easing()) {
        let tween = Tween::new(from, to, 1.0, |_| {}).easing(easing);
        prop_assert_eq!(tween.sample(0.0), from);
        prop_assert_eq!(tween.sample(1.0), to);
    }

    #[test]
    fn completion_fires_once_on_the_last_tick(
        duration in 0.05f32..10.0,
        steps in 1usize..200,
        easing in easing(),
    ) {
        let fired = Rc::new(Cell::new(0u32));
        let last = Rc::new(Cell::new(f32::NAN));
        let counter = Rc::clone(&fired);
        let sink = Rc::clone(&last);

        let mut engine = TweenEngine::new();
        let id = engine.schedule(
            Tween::new(0.0f32, 7.5, duration, move |v| sink.set(v))
                .easing(easing)
                .on_complete(move |_| counter.set(counter.get() + 1)),
        );

        let dt = duration / steps as f32;
        for _ in 0..steps - 1 {
            engine.tick(dt);
        }
        prop_assert_eq!(fired.get(), 0);

        engine.tick(dt);
        prop_assert_eq!(fired.get(), 1);
        prop_assert_eq!(last.get(), 7.5);

        for _ in 0..5 {
            engine.tick(dt);
        }
        prop_assert!(!engine.cancel(id));
        prop_assert_eq!(fired.get(), 1);
    }

    #[test]
    fn triggers_while_locked_change_nothing(targets in prop::collection::vec(0usize..3, 1..20)) {
        let ids = ["space", "ground", "gallery"];
        let mut exp = locked_experience();
        prop_assert_eq!(exp.trigger_transition(&"ground".into()).unwrap(), TriggerOutcome::Started);

        let state = exp.state().clone();
        let render = exp.registry().render_set().to_vec();
        for &i in &targets {
            let outcome = exp.trigger_transition(&StageId::new(ids[i])).unwrap();
            prop_assert_eq!(outcome, TriggerOutcome::Ignored);
            prop_assert_eq!(exp.state(), &state);
            prop_assert_eq!(exp.registry().render_set(), &render[..]);
            prop_assert_eq!(exp.current_stage(), Some(&StageId::new("space")));
            prop_assert_eq!(exp.tweens().len(), 1);
        }

        prop_assert!(exp.tick(1.0).is_some());
        prop_assert_eq!(exp.current_stage(), Some(&StageId::new("ground")));
        // No queued backlog drains after the lock is released.
        prop_assert!(exp.tweens().is_empty());
        prop_assert!(exp.tick(5.0).is_none());
        prop_assert_eq!(exp.current_stage(), Some(&StageId::new("ground")));
    }
}
