//! # goalcheck - Temporal goal checking for simulated manipulation tasks
//!
//! goalcheck decides, tick by tick, whether a robot manipulation episode has
//! reached its goal. A goal is a tree of atomic spatial and articulation
//! predicates over named scene objects, combined with boolean connectives
//! and with temporal operators whose verdict depends on every tick seen so
//! far in the episode.
//!
//! ## Core Concepts
//!
//! - **Scene**: the simulation-side capability surface the predicates query
//! - **Expr**: a goal tree of predicates, combinators and temporal nodes
//! - **Goal**: a validated tree plus its language instruction
//! - **GoalEvaluator**: owns the temporal state of one episode
//!
//! ## Usage
//!
//! ```rust
//! use goalcheck::{Expr, GoalEvaluator, InMemoryScene, Pose, PredicateKind, SceneObject};
//!
//! let mut scene = InMemoryScene::new()
//!     .with(SceneObject::new("bottle").with_pose(Pose::at(0.0, 0.0, 0.8)));
//!
//! let lifted = Expr::atomic(PredicateKind::InAir, vec!["bottle".into(), 0.9.into()])?;
//! let goal = Expr::once("lift", lifted);
//!
//! let mut evaluator = GoalEvaluator::new();
//! assert!(!evaluator.evaluate(&goal, &scene)?);
//!
//! scene.set_pose("bottle", Pose::at(0.0, 0.0, 1.0))?;
//! assert!(evaluator.evaluate(&goal, &scene)?);
//!
//! scene.set_pose("bottle", Pose::at(0.0, 0.0, 0.8))?;
//! assert!(evaluator.evaluate(&goal, &scene)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod geometry;
pub mod scene;

pub mod expr;
pub mod goal;
pub mod predicate;
pub mod report;
pub mod temporal;

pub mod evaluator;

pub use config::{EvaluatorConfig, StackBowlThresholds};
pub use error::{ExecutionError, GoalError, GoalResult, ValidationError};
pub use evaluator::{EpisodeId, GoalEvaluator};
pub use expr::{Expr, Measurement, Operand};
pub use geometry::{Axis, Pose};
pub use goal::Goal;
pub use predicate::{PredicateKind, Signature, Slot};
pub use report::{BoolResult, Explanation, TickReport};
pub use scene::{InMemoryScene, PhysicalObject, Scene, SceneError, SceneObject};
pub use temporal::{ConstraintKind, ConstraintRegistry, Gate, SequenceKind, SequenceState};
