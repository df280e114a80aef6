//! Error types for goalcheck.
//!
//! Errors are split the way goal authoring and goal evaluation fail:
//! a [`ValidationError`] means the goal (or the evaluator configuration)
//! is malformed and will never evaluate, an [`ExecutionError`] aborts a
//! single tick. Latched temporal failures are not errors at all; they are
//! ordinary `false` verdicts.

use thiserror::Error;

use crate::scene::SceneError;

/// Authoring and configuration errors, detected before any tick runs.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Unknown predicate '{name}'")]
    UnknownPredicate {
        name: String,
    },

    #[error("Unknown measurement '{name}'")]
    UnknownMeasure {
        name: String,
    },

    #[error("Invalid axis '{value}' (expected x, y or z)")]
    InvalidAxis {
        value: String,
    },

    #[error("{predicate} expects {expected} operands, got {actual}")]
    ArityMismatch {
        predicate: String,
        expected: String,
        actual: usize,
    },

    #[error("{predicate} operand {index} must be {expected}, got {actual}")]
    OperandTypeMismatch {
        predicate: String,
        index: usize,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("{predicate} operand {index} must be a finite number, got {value}")]
    NonFiniteOperand {
        predicate: String,
        index: usize,
        value: f64,
    },

    #[error("{combinator} needs at least one child")]
    EmptyCombinator {
        combinator: &'static str,
    },

    #[error("{kind} '{name}' expects {expected} arguments, got {actual}")]
    ConstraintArity {
        kind: &'static str,
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Constraint name cannot be empty ({kind})")]
    EmptyConstraintName {
        kind: &'static str,
    },

    #[error("{kind} '{name}' appears more than once in the goal")]
    DuplicateConstraint {
        kind: &'static str,
        name: String,
    },

    #[error("{kind} '{name}' was given an empty step vector")]
    EmptySequence {
        kind: &'static str,
        name: String,
    },

    #[error("{kind} '{name}' was tracking {expected} steps, got {actual}")]
    SequenceLengthChanged {
        kind: &'static str,
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid evaluator config: {reason}")]
    InvalidConfig {
        reason: String,
    },

    #[error("Malformed goal: {reason}")]
    MalformedGoal {
        reason: String,
    },
}

/// Errors that abort the evaluation of one tick.
#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Object '{name}' could not be resolved in the current scene")]
    UnresolvedObject {
        name: String,
    },

    #[error("Scene query failed: {0}")]
    SceneQuery(#[source] SceneError),

    #[error("Object '{object}' declares no canonical up axis; {predicate} cannot be evaluated")]
    MissingUpAxis {
        object: String,
        predicate: &'static str,
    },

    #[error("{predicate} produced a non-finite measurement")]
    NonFiniteMeasurement {
        predicate: String,
    },
}

/// Top-level error type for goalcheck.
#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum GoalError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl GoalError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is an execution error.
    #[must_use]
    pub const fn is_execution(&self) -> bool {
        matches!(self, Self::Execution(_))
    }

    /// Returns true if this is an internal error.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }
}

impl From<SceneError> for GoalError {
    fn from(err: SceneError) -> Self {
        Self::Execution(ExecutionError::from(err))
    }
}

impl From<SceneError> for ExecutionError {
    fn from(err: SceneError) -> Self {
        match err {
            SceneError::UnknownObject { name } => Self::UnresolvedObject { name },
            other => Self::SceneQuery(other),
        }
    }
}

/// Result type alias for goalcheck operations.
pub type GoalResult<T> = Result<T, GoalError>;
