//! In-memory scene backend.
//!
//! Object state is set directly by the caller between ticks. Relations
//! (contact, containment, on-top) are stored per object and are not
//! inferred from poses, which keeps the geometric predicates opaque exactly
//! as they are against a real simulator.

use std::collections::{HashMap, HashSet};

use crate::geometry::{Axis, Pose};

use super::{PhysicalObject, Scene, SceneError, SceneResult};

/// Mutable state of one simulated object.
#[derive(Debug, Clone, Default)]
pub struct SceneObject {
    name: String,
    pose: Pose,
    up_axis: Option<Axis>,
    touching: HashSet<String>,
    contains: HashSet<String>,
    supports: HashSet<String>,
    open: Option<bool>,
    open_ratio: Option<f64>,
    powered: Option<bool>,
    destroyed: bool,
}

impl SceneObject {
    /// Creates an object at the origin with identity orientation.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the pose.
    #[must_use]
    pub fn with_pose(mut self, pose: Pose) -> Self {
        self.pose = pose;
        self
    }

    /// Declares the canonical up axis.
    #[must_use]
    pub fn with_up_axis(mut self, axis: Axis) -> Self {
        self.up_axis = Some(axis);
        self
    }

    /// Makes the object articulated with the given open/closed state.
    #[must_use]
    pub fn articulated(mut self, open: bool) -> Self {
        self.open = Some(open);
        self.open_ratio = Some(if open { 1.0 } else { 0.0 });
        self
    }

    /// Makes the object switchable with the given power state.
    #[must_use]
    pub fn switchable(mut self, powered: bool) -> Self {
        self.powered = Some(powered);
        self
    }

    /// Replaces the pose.
    pub fn set_pose(&mut self, pose: Pose) {
        self.pose = pose;
    }

    /// Records (or clears) contact as seen from this object only.
    pub fn set_touching(&mut self, other: &str, touching: bool) {
        toggle(&mut self.touching, other, touching);
    }

    /// Records (or clears) that this object contains `other`.
    pub fn set_contains(&mut self, other: &str, contains: bool) {
        toggle(&mut self.contains, other, contains);
    }

    /// Records (or clears) that `other` rests on this object.
    pub fn set_supports(&mut self, other: &str, supports: bool) {
        toggle(&mut self.supports, other, supports);
    }

    /// Sets the open state and derives the open ratio from it.
    pub fn set_open(&mut self, open: bool) {
        self.open = Some(open);
        self.open_ratio = Some(if open { 1.0 } else { 0.0 });
    }

    /// Sets a partial opening. Anything above zero counts as open.
    pub fn set_open_ratio(&mut self, ratio: f64) {
        let ratio = ratio.clamp(0.0, 1.0);
        self.open_ratio = Some(ratio);
        self.open = Some(ratio > 0.0);
    }

    /// Sets the power state.
    pub fn set_powered(&mut self, powered: bool) {
        self.powered = Some(powered);
    }

    /// Marks the object as removed from the simulation.
    pub fn destroy(&mut self) {
        self.destroyed = true;
    }

    fn live(&self) -> SceneResult<()> {
        if self.destroyed {
            Err(SceneError::Destroyed {
                name: self.name.clone(),
            })
        } else {
            Ok(())
        }
    }

    fn unsupported(&self, capability: &'static str) -> SceneError {
        SceneError::Unsupported {
            name: self.name.clone(),
            capability,
        }
    }
}

fn toggle(set: &mut HashSet<String>, name: &str, on: bool) {
    if on {
        set.insert(name.to_string());
    } else {
        set.remove(name);
    }
}

impl PhysicalObject for SceneObject {
    fn name(&self) -> &str {
        &self.name
    }

    fn check_contact(&self, other: &dyn PhysicalObject) -> SceneResult<bool> {
        self.live()?;
        Ok(self.touching.contains(other.name()))
    }

    fn check_contain(&self, other: &dyn PhysicalObject) -> SceneResult<bool> {
        self.live()?;
        Ok(self.contains.contains(other.name()))
    }

    fn check_ontop(&self, other: &dyn PhysicalObject) -> SceneResult<bool> {
        self.live()?;
        Ok(self.supports.contains(other.name()))
    }

    fn pose(&self) -> SceneResult<Pose> {
        self.live()?;
        Ok(self.pose)
    }

    fn is_open(&self) -> SceneResult<bool> {
        self.live()?;
        self.open.ok_or_else(|| self.unsupported("is_open"))
    }

    fn is_close(&self) -> SceneResult<bool> {
        self.live()?;
        self.open.map(|open| !open).ok_or_else(|| self.unsupported("is_close"))
    }

    fn turn_on(&self) -> SceneResult<bool> {
        self.live()?;
        self.powered.ok_or_else(|| self.unsupported("turn_on"))
    }

    fn turn_off(&self) -> SceneResult<bool> {
        self.live()?;
        self.powered.map(|on| !on).ok_or_else(|| self.unsupported("turn_off"))
    }

    fn open_ratio(&self) -> SceneResult<f64> {
        self.live()?;
        self.open_ratio.ok_or_else(|| self.unsupported("open_ratio"))
    }

    fn up_axis(&self) -> Option<Axis> {
        self.up_axis
    }
}

/// A scene held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryScene {
    objects: HashMap<String, SceneObject>,
}

impl InMemoryScene {
    /// Creates an empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) an object.
    pub fn insert(&mut self, object: SceneObject) {
        self.objects.insert(object.name.clone(), object);
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, object: SceneObject) -> Self {
        self.insert(object);
        self
    }

    /// Removes an object entirely; later lookups fail with `UnknownObject`.
    pub fn remove(&mut self, name: &str) -> Option<SceneObject> {
        self.objects.remove(name)
    }

    /// Mutable access to an object.
    pub fn object_mut(&mut self, name: &str) -> SceneResult<&mut SceneObject> {
        self.objects
            .get_mut(name)
            .ok_or_else(|| SceneError::UnknownObject {
                name: name.to_string(),
            })
    }

    /// Replaces an object's pose.
    pub fn set_pose(&mut self, name: &str, pose: Pose) -> SceneResult<()> {
        self.object_mut(name)?.set_pose(pose);
        Ok(())
    }

    /// Records (or clears) contact in both directions.
    pub fn set_contact(&mut self, a: &str, b: &str, touching: bool) -> SceneResult<()> {
        self.object_mut(b)?;
        self.object_mut(a)?.set_touching(b, touching);
        self.object_mut(b)?.set_touching(a, touching);
        Ok(())
    }

    /// Records (or clears) that `container` holds `item`.
    pub fn set_contains(&mut self, container: &str, item: &str, contains: bool) -> SceneResult<()> {
        self.object_mut(item)?;
        self.object_mut(container)?.set_contains(item, contains);
        Ok(())
    }

    /// Records (or clears) that `item` rests on `base`.
    pub fn set_on_top(&mut self, base: &str, item: &str, on_top: bool) -> SceneResult<()> {
        self.object_mut(item)?;
        self.object_mut(base)?.set_supports(item, on_top);
        Ok(())
    }

    /// Number of objects in the scene.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns true if the scene holds no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl Scene for InMemoryScene {
    fn resolve(&self, name: &str) -> SceneResult<&dyn PhysicalObject> {
        self.objects
            .get(name)
            .map(|o| o as &dyn PhysicalObject)
            .ok_or_else(|| SceneError::UnknownObject {
                name: name.to_string(),
            })
    }
}
