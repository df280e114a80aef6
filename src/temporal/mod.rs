//! Named temporal constraints folded across ticks.
//!
//! Every wrapper instance is addressed by its kind and a caller-chosen name,
//! so `Always("a")` and `Never("a")` are independent, as are two `Always`
//! constraints with different names. State records are created on the first
//! observation of a name and live until [`ConstraintRegistry::reset`].
//!
//! A registry belongs to exactly one episode. Running episodes side by side
//! means running one registry (one [`GoalEvaluator`](crate::GoalEvaluator))
//! per episode.

/// Sequential / relaxed-sequential tracking.
pub mod sequence;

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::report::BoolResult;

pub use sequence::{SequenceKind, SequenceState};

/// Single-boolean-input-family constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintKind {
    /// True until the input is false once, then false forever.
    Always,
    /// True until the input is true once, then false forever.
    Never,
    /// False until the input is true once, then true forever.
    Once,
    /// After `x` first holds, `y` must hold on every later tick.
    AlwaysAfter,
}

impl ConstraintKind {
    /// Canonical name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Always => "Always",
            Self::Never => "Never",
            Self::Once => "Once",
            Self::AlwaysAfter => "AlwaysAfter",
        }
    }

    /// Number of boolean inputs per tick.
    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            Self::Always | Self::Never | Self::Once => 1,
            Self::AlwaysAfter => 2,
        }
    }

    /// Parses an authored name, case-insensitively, with or without the
    /// `Constraint` prefix.
    pub fn from_name(name: &str) -> Option<Self> {
        let lowered = name.trim().to_ascii_lowercase();
        let bare = lowered.strip_prefix("constraint").unwrap_or(&lowered);
        match bare {
            "always" => Some(Self::Always),
            "never" => Some(Self::Never),
            "once" => Some(Self::Once),
            "alwaysafter" => Some(Self::AlwaysAfter),
            _ => None,
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of an `AlwaysAfter` constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gate {
    /// Latched once the trigger condition has been observed.
    pub phase_one: bool,
    /// Running conjunction of the follow-up condition since the trigger.
    pub phase_two: bool,
}

impl Default for Gate {
    fn default() -> Self {
        Self {
            phase_one: false,
            phase_two: true,
        }
    }
}

impl Gate {
    /// Combined verdict.
    #[must_use]
    pub const fn holds(&self) -> bool {
        self.phase_one && self.phase_two
    }
}

/// Keyed state for every temporal constraint of one episode.
#[derive(Debug, Clone, Default)]
pub struct ConstraintRegistry {
    latches: HashMap<(ConstraintKind, String), bool>,
    gates: HashMap<String, Gate>,
    sequences: HashMap<(SequenceKind, String), SequenceState>,
}

impl ConstraintRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears every constraint's state. Call between episodes.
    pub fn reset(&mut self) {
        self.latches.clear();
        self.gates.clear();
        self.sequences.clear();
    }

    /// Number of named constraint instances currently tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.latches.len() + self.gates.len() + self.sequences.len()
    }

    /// Returns true if nothing has been observed since the last reset.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn fold_latch(&mut self, kind: ConstraintKind, name: &str, initial: bool, next: impl FnOnce(bool) -> bool) -> bool {
        let state = self
            .latches
            .entry((kind, name.to_string()))
            .or_insert(initial);
        let before = *state;
        *state = next(before);
        tracing::trace!(kind = kind.as_str(), constraint = name, before, after = *state, "constraint update");
        if before && !*state {
            tracing::warn!(kind = kind.as_str(), constraint = name, "constraint latched to false");
        }
        *state
    }

    /// `Always(name, x)`: `state = x && state`, starting true.
    pub fn always(&mut self, name: &str, x: bool) -> bool {
        self.fold_latch(ConstraintKind::Always, name, true, |s| x && s)
    }

    /// `Never(name, x)`: `state = !x && state`, starting true.
    pub fn never(&mut self, name: &str, x: bool) -> bool {
        self.fold_latch(ConstraintKind::Never, name, true, |s| !x && s)
    }

    /// `Once(name, x)`: `state = x || state`, starting false.
    pub fn once(&mut self, name: &str, x: bool) -> bool {
        self.fold_latch(ConstraintKind::Once, name, false, |s| x || s)
    }

    /// `AlwaysAfter(name, x, y)`.
    ///
    /// Until `x` is first observed the constraint is in its pre-phase and
    /// returns false whatever `y` is. The tick on which `x` first holds
    /// latches phase one without consulting `y`; from the next tick on,
    /// `y` is folded into phase two with `&&`.
    pub fn always_after(&mut self, name: &str, x: bool, y: bool) -> bool {
        let gate = self.gates.entry(name.to_string()).or_default();
        let before = *gate;
        if gate.phase_one {
            gate.phase_two = y && gate.phase_two;
        } else {
            gate.phase_one = x;
        }
        tracing::trace!(
            kind = "AlwaysAfter",
            constraint = name,
            phase_one = gate.phase_one,
            phase_two = gate.phase_two,
            "constraint update"
        );
        if before.phase_two && !gate.phase_two {
            tracing::warn!(kind = "AlwaysAfter", constraint = name, "constraint latched to false");
        }
        gate.holds()
    }

    /// Dispatches a constraint by kind.
    ///
    /// # Errors
    /// `ValidationError::ConstraintArity` if `args` does not match the kind.
    pub fn observe(&mut self, kind: ConstraintKind, name: &str, args: &[bool]) -> Result<bool, ValidationError> {
        if args.len() != kind.arity() {
            return Err(ValidationError::ConstraintArity {
                kind: kind.as_str(),
                name: name.to_string(),
                expected: kind.arity(),
                actual: args.len(),
            });
        }
        Ok(match kind {
            ConstraintKind::Always => self.always(name, args[0]),
            ConstraintKind::Never => self.never(name, args[0]),
            ConstraintKind::Once => self.once(name, args[0]),
            ConstraintKind::AlwaysAfter => self.always_after(name, args[0], args[1]),
        })
    }

    /// `Sequential(name, xs)`.
    ///
    /// # Errors
    /// `EmptySequence` for a zero-length vector, `SequenceLengthChanged` if
    /// `name` was previously observed with a different length.
    pub fn sequential(&mut self, name: &str, xs: &[bool]) -> Result<BoolResult, ValidationError> {
        self.observe_sequence(SequenceKind::Sequential, name, xs)
    }

    /// `RelaxedSequential(name, xs)`.
    ///
    /// # Errors
    /// Same as [`sequential`](Self::sequential).
    pub fn relaxed_sequential(&mut self, name: &str, xs: &[bool]) -> Result<BoolResult, ValidationError> {
        self.observe_sequence(SequenceKind::RelaxedSequential, name, xs)
    }

    /// Dispatches a sequence wrapper by kind.
    ///
    /// # Errors
    /// Same as [`sequential`](Self::sequential).
    pub fn observe_sequence(
        &mut self,
        kind: SequenceKind,
        name: &str,
        xs: &[bool],
    ) -> Result<BoolResult, ValidationError> {
        if xs.is_empty() {
            return Err(ValidationError::EmptySequence {
                kind: kind.as_str(),
                name: name.to_string(),
            });
        }
        let state = self
            .sequences
            .entry((kind, name.to_string()))
            .or_insert_with(|| SequenceState::new(xs.len()));
        state.check_len(kind, name, xs.len())?;

        let was_valid = state.is_valid();
        let result = match kind {
            SequenceKind::Sequential => state.step_strict(xs),
            SequenceKind::RelaxedSequential => state.step_relaxed(xs),
        };
        tracing::trace!(
            kind = kind.as_str(),
            constraint = name,
            next_index = state.next_expected_index(),
            value = result.value,
            "sequence update"
        );
        if was_valid && !state.is_valid() {
            tracing::warn!(kind = kind.as_str(), constraint = name, reason = %result, "sequence violated");
        }
        Ok(result)
    }

    /// Current state of a single-boolean constraint, if it has been observed.
    #[must_use]
    pub fn latch(&self, kind: ConstraintKind, name: &str) -> Option<bool> {
        self.latches.get(&(kind, name.to_string())).copied()
    }

    /// Current state of an `AlwaysAfter` constraint, if it has been observed.
    #[must_use]
    pub fn gate(&self, name: &str) -> Option<Gate> {
        self.gates.get(name).copied()
    }

    /// Current state of a sequence wrapper, if it has been observed.
    #[must_use]
    pub fn sequence(&self, kind: SequenceKind, name: &str) -> Option<&SequenceState> {
        self.sequences.get(&(kind, name.to_string()))
    }
}
