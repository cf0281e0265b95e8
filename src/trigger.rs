//! Input-side triggers that request stage transitions.

use glam::Vec3;
use hecs::{Entity, World};
use serde::{Deserialize, Serialize};

use crate::stage::StageId;

/// Fires a transition the first time the scroll offset rises past `threshold`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScrollTrigger {
    pub threshold: f32,
    pub to: StageId,
    /// Only fire while this stage is current. `None` fires from any stage.
    #[serde(default)]
    pub from: Option<StageId>,
}

/// Scroll thresholds plus the last offset seen.
///
/// Only upward crossings fire. Scrolling back below a threshold does nothing.
#[derive(Clone, Debug, Default)]
pub struct ScrollTriggers {
    triggers: Vec<ScrollTrigger>,
    last_offset: f32,
}

impl ScrollTriggers {
    pub fn new(triggers: Vec<ScrollTrigger>) -> Self {
        Self {
            triggers,
            last_offset: 0.0,
        }
    }

    pub fn push(&mut self, trigger: ScrollTrigger) {
        self.triggers.push(trigger);
    }

    pub fn offset(&self) -> f32 {
        self.last_offset
    }

    /// Record a new scroll offset.
    ///
    /// Returns the target of the first trigger, in definition order, whose
    /// threshold lies in `(previous, offset]` and whose `from` matches `current`.
    pub fn update(&mut self, offset: f32, current: Option<&StageId>) -> Option<StageId> {
        let previous = std::mem::replace(&mut self.last_offset, offset);
        if offset <= previous {
            return None;
        }

        self.triggers
            .iter()
            .find(|t| {
                previous < t.threshold
                    && t.threshold <= offset
                    && t.from.as_ref().is_none_or(|from| Some(from) == current)
            })
            .map(|t| t.to.clone())
    }
}

/// Component marking an object that, when clicked, moves to another stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HandOff(pub StageId);

/// Notification sent to click listeners when the pointer hits an object.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectClick {
    pub entity: Entity,
    /// The object's [`Name`](crate::Name), if it has one.
    pub name: Option<String>,
    /// World-space hit point.
    pub point: Vec3,
}

/// Stage an entity hands off to, if it carries a [`HandOff`].
pub fn hand_off_target(world: &World, entity: Entity) -> Option<StageId> {
    world
        .get::<&HandOff>(entity)
        .ok()
        .map(|hand_off| hand_off.0.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triggers() -> ScrollTriggers {
        ScrollTriggers::new(vec![
            ScrollTrigger {
                threshold: 1.0,
                to: "ground".into(),
                from: Some("space".into()),
            },
            ScrollTrigger {
                threshold: 10.0,
                to: "gallery".into(),
                from: None,
            },
        ])
    }

    #[test]
    fn fires_on_upward_crossing_only() {
        let mut t = triggers();
        let space = StageId::new("space");

        assert_eq!(t.update(0.5, Some(&space)), None);
        assert_eq!(t.update(1.5, Some(&space)), Some("ground".into()));
        assert_eq!(t.update(2.0, Some(&space)), None);
        assert_eq!(t.update(0.0, Some(&space)), None);
        assert_eq!(t.update(1.0, Some(&space)), Some("ground".into()));
        assert_eq!(t.offset(), 1.0);
    }

    #[test]
    fn from_filter_applies() {
        let mut t = triggers();
        let ground = StageId::new("ground");

        assert_eq!(t.update(5.0, Some(&ground)), None);
        assert_eq!(t.update(12.0, Some(&ground)), Some("gallery".into()));
    }

    #[test]
    fn big_jump_picks_first_matching() {
        let mut t = triggers();
        assert_eq!(t.update(50.0, Some(&"space".into())), Some("ground".into()));
    }

    #[test]
    fn hand_off_lookup() {
        let mut world = World::new();
        let earth = world.spawn((HandOff("ground".into()),));
        let moon = world.spawn(());

        assert_eq!(hand_off_target(&world, earth), Some("ground".into()));
        assert_eq!(hand_off_target(&world, moon), None);
    }
}
