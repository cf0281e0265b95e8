//! Stages and the registry that owns them.
//!
//! A [`Stage`] is a named group of world objects plus the lighting rig that is
//! active while it is current. Exactly one stage is current at a time; objects
//! of every other stage are neither rendered nor hit-tested.
//!
//! Stage membership is fixed once a stage is defined. Only the
//! [`Sequencer`](crate::Sequencer) switches the current stage.

use std::collections::HashMap;

use glam::Vec3;
use hecs::Entity;
use serde::{Deserialize, Serialize};

use crate::camera::CameraPose;
use crate::color::Color;
use crate::error::StageError;
use crate::orbit::ScrollOrbit;

/// Unique identifier for a stage.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageId(pub(crate) String);

impl StageId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StageId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for StageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Ambient fill light.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AmbientLight {
    pub color: Color,
    pub intensity: f32,
}

impl Default for AmbientLight {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            intensity: 0.5,
        }
    }
}

/// A directional "sun" light.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLight {
    pub color: Color,
    pub intensity: f32,
    pub position: Vec3,
}

/// Lighting and backdrop in effect while a stage is current.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LightingRig {
    /// Clear color behind everything.
    #[serde(default)]
    pub background: Color,
    #[serde(default)]
    pub ambient: AmbientLight,
    #[serde(default)]
    pub sun: Option<DirectionalLight>,
}

impl LightingRig {
    pub fn new(background: Color) -> Self {
        Self {
            background,
            ..Default::default()
        }
    }

    pub fn ambient(mut self, color: Color, intensity: f32) -> Self {
        self.ambient = AmbientLight { color, intensity };
        self
    }

    pub fn sun(mut self, color: Color, intensity: f32, position: Vec3) -> Self {
        self.sun = Some(DirectionalLight {
            color,
            intensity,
            position,
        });
        self
    }
}

/// A named, ordered set of world objects plus its lighting.
#[derive(Clone, Debug)]
pub struct Stage {
    id: StageId,
    members: Vec<Entity>,
    pickable: Vec<Entity>,
    lighting: LightingRig,
    entry_pose: Option<CameraPose>,
    orbit: Option<ScrollOrbit>,
}

impl Stage {
    pub fn new(id: impl Into<StageId>) -> Self {
        Self {
            id: id.into(),
            members: Vec::new(),
            pickable: Vec::new(),
            lighting: LightingRig::default(),
            entry_pose: None,
            orbit: None,
        }
    }

    /// Add a rendered object that does not take part in picking.
    pub fn member(mut self, entity: Entity) -> Self {
        if !self.members.contains(&entity) {
            self.members.push(entity);
        }
        self
    }

    /// Add a rendered object that pointer rays can hit.
    pub fn pickable(mut self, entity: Entity) -> Self {
        self = self.member(entity);
        if !self.pickable.contains(&entity) {
            self.pickable.push(entity);
        }
        self
    }

    pub fn lighting(mut self, lighting: LightingRig) -> Self {
        self.lighting = lighting;
        self
    }

    /// Camera pose applied when the stage becomes current.
    pub fn entry_pose(mut self, pose: CameraPose) -> Self {
        self.entry_pose = Some(pose);
        self
    }

    /// Let the scroll offset drive the camera while this stage is current.
    pub fn scroll_orbit(mut self, orbit: ScrollOrbit) -> Self {
        self.orbit = Some(orbit);
        self
    }

    pub fn id(&self) -> &StageId {
        &self.id
    }

    pub fn members(&self) -> &[Entity] {
        &self.members
    }

    pub fn pickable_members(&self) -> &[Entity] {
        &self.pickable
    }

    pub fn lighting_rig(&self) -> &LightingRig {
        &self.lighting
    }

    pub fn entry(&self) -> Option<CameraPose> {
        self.entry_pose
    }

    pub fn orbit(&self) -> Option<&ScrollOrbit> {
        self.orbit.as_ref()
    }
}

/// Owns every stage and tracks which one is current.
///
/// The render set and hit-test set always mirror the current stage and are
/// replaced together in [`activate`](Self::activate).
#[derive(Debug, Default)]
pub struct StageRegistry {
    stages: Vec<Stage>,
    index: HashMap<StageId, usize>,
    current: Option<usize>,
    render_set: Vec<Entity>,
    hit_test_set: Vec<Entity>,
}

impl StageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stage. Ids must be unique.
    pub fn define(&mut self, stage: Stage) -> Result<(), StageError> {
        if self.index.contains_key(&stage.id) {
            return Err(StageError::DuplicateStage(stage.id));
        }
        log::debug!(
            "defined stage '{}' ({} objects, {} pickable)",
            stage.id,
            stage.members.len(),
            stage.pickable.len()
        );
        self.index.insert(stage.id.clone(), self.stages.len());
        self.stages.push(stage);
        Ok(())
    }

    pub fn stage(&self, id: &StageId) -> Option<&Stage> {
        self.index.get(id).map(|&i| &self.stages[i])
    }

    pub fn contains(&self, id: &StageId) -> bool {
        self.index.contains_key(id)
    }

    /// Stages in definition order.
    pub fn stages(&self) -> impl Iterator<Item = &Stage> {
        self.stages.iter()
    }

    pub fn current(&self) -> Option<&Stage> {
        self.current.map(|i| &self.stages[i])
    }

    pub fn current_id(&self) -> Option<&StageId> {
        self.current().map(Stage::id)
    }

    /// Objects that should be drawn this frame.
    pub fn render_set(&self) -> &[Entity] {
        &self.render_set
    }

    /// Objects that pointer rays may hit this frame.
    pub fn hit_test_set(&self) -> &[Entity] {
        &self.hit_test_set
    }

    pub fn is_rendered(&self, entity: Entity) -> bool {
        self.render_set.contains(&entity)
    }

    pub fn is_hit_testable(&self, entity: Entity) -> bool {
        self.hit_test_set.contains(&entity)
    }

    /// Make `id` current, swapping the render and hit-test sets in one step.
    ///
    /// Returns the previously current stage.
    pub(crate) fn activate(&mut self, id: &StageId) -> Result<Option<StageId>, StageError> {
        let next = *self
            .index
            .get(id)
            .ok_or_else(|| StageError::UnknownStage(id.clone()))?;
        let previous = self.current.map(|i| self.stages[i].id.clone());

        let stage = &self.stages[next];
        self.render_set = stage.members.clone();
        self.hit_test_set = stage.pickable.clone();
        self.current = Some(next);

        Ok(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hecs::World;

    fn populated() -> (World, StageRegistry, [Entity; 4]) {
        let mut world = World::new();
        let earth = world.spawn(());
        let stars = world.spawn(());
        let ground = world.spawn(());
        let panel = world.spawn(());

        let mut registry = StageRegistry::new();
        registry
            .define(Stage::new("space").pickable(earth).member(stars))
            .unwrap();
        registry
            .define(Stage::new("ground").member(ground).pickable(panel))
            .unwrap();
        (world, registry, [earth, stars, ground, panel])
    }

    #[test]
    fn nothing_is_current_until_activated() {
        let (_, registry, [earth, ..]) = populated();
        assert!(registry.current().is_none());
        assert!(registry.render_set().is_empty());
        assert!(!registry.is_hit_testable(earth));
    }

    #[test]
    fn activate_swaps_both_sets() {
        let (_, mut registry, [earth, stars, ground, panel]) = populated();

        assert_eq!(registry.activate(&"space".into()).unwrap(), None);
        assert_eq!(registry.render_set(), &[earth, stars]);
        assert_eq!(registry.hit_test_set(), &[earth]);

        let previous = registry.activate(&"ground".into()).unwrap();
        assert_eq!(previous, Some(StageId::new("space")));
        assert_eq!(registry.current_id(), Some(&StageId::new("ground")));
        assert!(!registry.is_rendered(earth));
        assert!(!registry.is_hit_testable(earth));
        assert!(registry.is_rendered(ground));
        assert!(registry.is_hit_testable(panel));
    }

    #[test]
    fn unknown_stage_leaves_state_alone() {
        let (_, mut registry, [earth, ..]) = populated();
        registry.activate(&"space".into()).unwrap();

        let err = registry.activate(&"gallery".into()).unwrap_err();
        assert_eq!(err, StageError::UnknownStage("gallery".into()));
        assert_eq!(registry.current_id(), Some(&StageId::new("space")));
        assert!(registry.is_hit_testable(earth));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let (_, mut registry, _) = populated();
        let err = registry.define(Stage::new("space")).unwrap_err();
        assert_eq!(err, StageError::DuplicateStage("space".into()));
        assert_eq!(registry.stages().count(), 2);
    }

    #[test]
    fn pickable_implies_member_once() {
        let mut world = World::new();
        let e = world.spawn(());
        let stage = Stage::new("s").member(e).pickable(e).pickable(e);
        assert_eq!(stage.members(), &[e]);
        assert_eq!(stage.pickable_members(), &[e]);
    }

    #[test]
    fn lighting_rig_from_json() {
        let rig: LightingRig = serde_json::from_str(
            r##"{ "background": "#448ee4",
                  "ambient": { "color": "#ffffff", "intensity": 1.5 },
                  "sun": { "color": [1, 1, 1], "intensity": 2, "position": [10, 10, -10] } }"##,
        )
        .unwrap();

        assert_eq!(rig.background, Color::hex(0x448ee4));
        assert_eq!(rig.ambient.intensity, 1.5);
        assert_eq!(rig.sun.unwrap().position, Vec3::new(10.0, 10.0, -10.0));
    }
}
