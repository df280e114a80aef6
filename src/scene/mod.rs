//! Capability surface consumed from the simulation side.
//!
//! The evaluator never owns or mutates simulated objects. Each tick the
//! simulation hands it a [`Scene`] that resolves names to
//! [`PhysicalObject`] handles, and the atomic predicates query those
//! handles. Implementations are expected to answer from the current
//! simulation state without blocking.
//!
//! [`memory::InMemoryScene`] is a self-contained implementation used by the
//! tests and benches, and as a reference for adapters.

/// In-memory scene implementation.
pub mod memory;

use thiserror::Error;

use crate::geometry::{Axis, Pose};

pub use memory::{InMemoryScene, SceneObject};

/// Errors raised by a scene or one of its objects.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SceneError {
    /// No object with this name exists at the current tick.
    #[error("Unknown object: {name}")]
    UnknownObject {
        /// Requested name.
        name: String,
    },

    /// The object existed but has been removed from the simulation.
    #[error("Object '{name}' has been destroyed")]
    Destroyed {
        /// Object name.
        name: String,
    },

    /// The object does not expose the requested capability.
    #[error("Object '{name}' does not support {capability}")]
    Unsupported {
        /// Object name.
        name: String,
        /// Capability that was queried.
        capability: &'static str,
    },

    /// Any other failure reported by the simulation backend.
    #[error("Scene backend error: {0}")]
    Backend(String),
}

/// Result alias for scene queries.
pub type SceneResult<T> = Result<T, SceneError>;

/// A named object in the simulated world.
///
/// Relation queries are phrased from `self`'s point of view:
/// `container.check_contain(item)` asks whether `container` holds `item`,
/// `base.check_ontop(item)` asks whether `item` rests on `base`.
pub trait PhysicalObject {
    /// Name the object is addressed by in goal expressions.
    fn name(&self) -> &str;

    /// Whether the contact geometry of `self` and `other` overlaps.
    fn check_contact(&self, other: &dyn PhysicalObject) -> SceneResult<bool>;

    /// Whether `self` (a region or receptacle) contains `other`.
    fn check_contain(&self, other: &dyn PhysicalObject) -> SceneResult<bool>;

    /// Whether `other` rests on top of `self`.
    fn check_ontop(&self, other: &dyn PhysicalObject) -> SceneResult<bool>;

    /// Current world pose.
    fn pose(&self) -> SceneResult<Pose>;

    /// Whether an articulated object is open.
    fn is_open(&self) -> SceneResult<bool>;

    /// Whether an articulated object is closed.
    fn is_close(&self) -> SceneResult<bool>;

    /// Whether a switchable object is powered on.
    fn turn_on(&self) -> SceneResult<bool>;

    /// Whether a switchable object is powered off.
    fn turn_off(&self) -> SceneResult<bool>;

    /// How far an articulated object is open, in `[0, 1]`.
    fn open_ratio(&self) -> SceneResult<f64> {
        Err(SceneError::Unsupported {
            name: self.name().to_string(),
            capability: "open_ratio",
        })
    }

    /// Local axis that points up when the object rests in its reference
    /// orientation.
    ///
    /// `Upright`, `UpsideDown` and `UprightWithin45` are only meaningful
    /// relative to this axis and refuse to evaluate when it is `None`.
    fn up_axis(&self) -> Option<Axis> {
        None
    }
}

/// Name resolution for the current tick.
pub trait Scene {
    /// Resolves `name` to a live object.
    ///
    /// # Errors
    /// `SceneError::UnknownObject` if no such object exists right now.
    fn resolve(&self, name: &str) -> SceneResult<&dyn PhysicalObject>;
}
