//! Sequential and relaxed-sequential step tracking.
//!
//! Both wrappers watch a fixed-length vector of step booleans across ticks
//! and require that steps first become true in left-to-right order.
//! `Sequential` additionally forbids a completed step from turning false
//! again; `RelaxedSequential` only cares about the order in which steps are
//! first reached.
//!
//! On a violation the tick returns immediately: `last` keeps the snapshot
//! from the previous good tick and later indices are not examined.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::report::BoolResult;

/// Which sequence rule a node or registry entry follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SequenceKind {
    /// Steps latch once reached; regressions invalidate.
    Sequential,
    /// Steps may regress; only first-reach order matters.
    RelaxedSequential,
}

impl SequenceKind {
    /// Canonical name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sequential => "Sequential",
            Self::RelaxedSequential => "RelaxedSequential",
        }
    }

    /// Parses an authored name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "sequential" => Some(Self::Sequential),
            "relaxedsequential" => Some(Self::RelaxedSequential),
            _ => None,
        }
    }
}

impl fmt::Display for SequenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-name state of a sequence wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceState {
    valid: bool,
    last: Vec<bool>,
    next_index: usize,
}

impl SequenceState {
    /// Fresh state for `len` steps: valid, nothing observed, expecting step 0.
    pub(crate) fn new(len: usize) -> Self {
        Self {
            valid: true,
            last: vec![false; len],
            next_index: 0,
        }
    }

    /// False once the sequence has been violated; never recovers.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.valid
    }

    /// Step vector from the last tick that passed the checks.
    #[must_use]
    pub fn last_observed(&self) -> &[bool] {
        &self.last
    }

    /// Index of the step that is allowed to become true next.
    #[must_use]
    pub const fn next_expected_index(&self) -> usize {
        self.next_index
    }

    /// Number of steps tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.last.len()
    }

    /// Always false for states built through the registry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.last.is_empty()
    }

    pub(crate) fn check_len(&self, kind: SequenceKind, name: &str, actual: usize) -> Result<(), ValidationError> {
        if actual == self.last.len() {
            Ok(())
        } else {
            Err(ValidationError::SequenceLengthChanged {
                kind: kind.as_str(),
                name: name.to_string(),
                expected: self.last.len(),
                actual,
            })
        }
    }

    fn fail(&mut self, explanation: String) -> BoolResult {
        self.valid = false;
        BoolResult::failure(explanation)
    }

    /// Advances a `Sequential` wrapper by one tick.
    pub(crate) fn step_strict(&mut self, xs: &[bool]) -> BoolResult {
        if !self.valid {
            return BoolResult::failure(format!("{xs:?} failed earlier"));
        }

        for (i, (&was, &now)) in self.last.iter().zip(xs).enumerate() {
            if was && !now {
                return self.fail(format!("{xs:?} failed: step {i} regressed to false"));
            }
            if !was && now {
                if i != self.next_index {
                    let expected = self.next_index;
                    return self.fail(format!(
                        "{xs:?} failed: step {i} became true before step {expected}"
                    ));
                }
                self.next_index += 1;
            }
        }

        self.last = xs.to_vec();
        let complete = xs.iter().all(|&x| x);
        if complete {
            BoolResult::new(true, format!("{xs:?} is sequential"))
        } else {
            BoolResult::new(false, format!("{xs:?} is not sequential yet"))
        }
    }

    /// Advances a `RelaxedSequential` wrapper by one tick.
    pub(crate) fn step_relaxed(&mut self, xs: &[bool]) -> BoolResult {
        if !self.valid {
            return BoolResult::failure(format!("{xs:?} failed earlier"));
        }

        let start = self.next_index;
        for i in start..xs.len() {
            if !self.last[i] && xs[i] {
                if i != self.next_index {
                    let expected = self.next_index;
                    return self.fail(format!(
                        "{xs:?} failed: step {i} became true before step {expected}"
                    ));
                }
                self.next_index += 1;
            }
        }

        self.last = xs.to_vec();
        let holding = xs.last().copied().unwrap_or(false);
        if holding {
            BoolResult::new(true, format!("{xs:?} is relaxed sequential"))
        } else {
            BoolResult::new(
                false,
                format!("{xs:?} is relaxed sequential, final step not holding"),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_scripted_ticks() {
        let mut s = SequenceState::new(3);

        let r = s.step_strict(&[true, false, false]);
        assert_eq!(r, false);
        assert!(r.explanation().contains("not sequential yet"));
        assert!(s.is_valid());
        assert_eq!(s.next_expected_index(), 1);

        let r = s.step_strict(&[true, true, false]);
        assert_eq!(r, false);
        assert!(s.is_valid());
        assert_eq!(s.next_expected_index(), 2);

        let r = s.step_strict(&[true, false, false]);
        assert_eq!(r, false);
        assert!(r.explanation().contains("step 1 regressed"));
        assert!(!s.is_valid());

        let r = s.step_strict(&[true, true, true]);
        assert_eq!(r, false);
        assert!(r.explanation().contains("failed earlier"));
    }

    #[test]
    fn test_strict_completes_when_every_step_holds() {
        let mut s = SequenceState::new(2);
        assert_eq!(s.step_strict(&[true, false]), false);
        let r = s.step_strict(&[true, true]);
        assert_eq!(r, true);
        assert_eq!(r.explanation(), "[true, true] is sequential");
    }

    #[test]
    fn test_strict_allows_several_steps_in_one_tick_when_in_order() {
        let mut s = SequenceState::new(3);
        assert_eq!(s.step_strict(&[true, true, true]), true);
        assert_eq!(s.next_expected_index(), 3);
    }

    #[test]
    fn test_strict_out_of_order_fails() {
        let mut s = SequenceState::new(3);
        let r = s.step_strict(&[false, true, false]);
        assert_eq!(r, false);
        assert!(r.explanation().contains("step 1 became true before step 0"));
        assert!(!s.is_valid());
    }

    #[test]
    fn test_violation_freezes_last_good_snapshot() {
        let mut s = SequenceState::new(3);
        s.step_strict(&[true, false, false]);
        // Step 0 regresses; step 2 jumping ahead in the same tick is never looked at
        // and the stored snapshot stays at the previous good tick.
        s.step_strict(&[false, false, true]);
        assert!(!s.is_valid());
        assert_eq!(s.last_observed(), &[true, false, false]);
        assert_eq!(s.next_expected_index(), 1);
    }

    #[test]
    fn test_relaxed_allows_regression_of_passed_steps() {
        let mut s = SequenceState::new(3);
        assert_eq!(s.step_relaxed(&[true, false, false]), false);
        assert_eq!(s.step_relaxed(&[true, true, false]), false);
        let r = s.step_relaxed(&[true, false, false]);
        assert!(s.is_valid());
        assert_eq!(r, false);
        assert_eq!(s.next_expected_index(), 2);
        let r = s.step_relaxed(&[false, false, true]);
        assert!(s.is_valid());
        assert_eq!(r, true);
        assert!(r.explanation().contains("relaxed sequential"));
    }

    #[test]
    fn test_relaxed_payload_tracks_final_step_only() {
        let mut s = SequenceState::new(2);
        s.step_relaxed(&[true, false]);
        assert_eq!(s.step_relaxed(&[true, true]), true);
        let r = s.step_relaxed(&[true, false]);
        assert!(s.is_valid());
        assert_eq!(r, false);
        assert!(r.explanation().contains("final step not holding"));
    }

    #[test]
    fn test_relaxed_out_of_order_new_true_fails() {
        let mut s = SequenceState::new(3);
        s.step_relaxed(&[true, false, false]);
        let r = s.step_relaxed(&[true, false, true]);
        assert_eq!(r, false);
        assert!(!s.is_valid());
        assert_eq!(s.step_relaxed(&[true, true, true]), false);
    }

    #[test]
    fn test_check_len_rejects_resized_vector() {
        let s = SequenceState::new(3);
        assert!(s.check_len(SequenceKind::Sequential, "s", 3).is_ok());
        assert!(matches!(
            s.check_len(SequenceKind::Sequential, "s", 2),
            Err(ValidationError::SequenceLengthChanged { expected: 3, actual: 2, .. })
        ));
    }

    #[test]
    fn test_kind_names_parse_case_insensitively() {
        assert_eq!(SequenceKind::from_name("sequential"), Some(SequenceKind::Sequential));
        assert_eq!(
            SequenceKind::from_name("RelaxedSequential"),
            Some(SequenceKind::RelaxedSequential)
        );
        assert_eq!(SequenceKind::from_name("Ordered"), None);
    }
}
