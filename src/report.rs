//! Boolean results that carry an explanation.
//!
//! A [`BoolResult`] behaves like a `bool` everywhere a verdict is combined;
//! the explanation is only for whoever logs or debugs the tick.

use std::fmt;
use std::ops::{BitAnd, BitOr, Not};

use serde::{Deserialize, Serialize};

use crate::evaluator::EpisodeId;

/// A boolean paired with a human-readable explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoolResult {
    /// The boolean payload.
    pub value: bool,
    /// Why the value is what it is.
    pub explanation: String,
}

impl BoolResult {
    /// Creates a result.
    #[must_use]
    pub fn new(value: bool, explanation: impl Into<String>) -> Self {
        Self {
            value,
            explanation: explanation.into(),
        }
    }

    /// Creates a `false` result.
    #[must_use]
    pub fn failure(explanation: impl Into<String>) -> Self {
        Self::new(false, explanation)
    }

    /// The boolean payload.
    #[must_use]
    pub const fn is_true(&self) -> bool {
        self.value
    }

    /// The explanation text.
    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }
}

impl From<BoolResult> for bool {
    fn from(r: BoolResult) -> Self {
        r.value
    }
}

impl From<&BoolResult> for bool {
    fn from(r: &BoolResult) -> Self {
        r.value
    }
}

impl PartialEq<bool> for BoolResult {
    fn eq(&self, other: &bool) -> bool {
        self.value == *other
    }
}

impl Not for BoolResult {
    type Output = bool;

    fn not(self) -> bool {
        !self.value
    }
}

impl Not for &BoolResult {
    type Output = bool;

    fn not(self) -> bool {
        !self.value
    }
}

impl BitAnd<bool> for BoolResult {
    type Output = bool;

    fn bitand(self, rhs: bool) -> bool {
        self.value & rhs
    }
}

impl BitAnd<BoolResult> for bool {
    type Output = bool;

    fn bitand(self, rhs: BoolResult) -> bool {
        self & rhs.value
    }
}

impl BitOr<bool> for BoolResult {
    type Output = bool;

    fn bitor(self, rhs: bool) -> bool {
        self.value | rhs
    }
}

impl BitOr<BoolResult> for bool {
    type Output = bool;

    fn bitor(self, rhs: BoolResult) -> bool {
        self | rhs.value
    }
}

impl fmt::Display for BoolResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.explanation)
    }
}

/// One explained node reached during a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explanation {
    /// Node label, e.g. `Sequential(seq1)` or `Watch`.
    pub node: String,
    /// The node's result.
    pub result: BoolResult,
}

/// Outcome of one evaluated tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    /// Episode the evaluator was in.
    pub episode: EpisodeId,
    /// Zero-based tick index within the episode.
    pub tick: u64,
    /// The goal verdict.
    pub satisfied: bool,
    /// Sequence and watch explanations, in evaluation order.
    pub explanations: Vec<Explanation>,
}

impl TickReport {
    /// Explanations recorded for nodes whose label starts with `prefix`.
    pub fn explanations_for<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a Explanation> + 'a {
        self.explanations.iter().filter(move |e| e.node.starts_with(prefix))
    }
}

impl fmt::Display for TickReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tick {}: {}", self.tick, if self.satisfied { "satisfied" } else { "not satisfied" })?;
        for e in &self.explanations {
            write!(f, "; {}: {}", e.node, e.result)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_result_truthiness() {
        let ok = BoolResult::new(true, "fine");
        let bad = BoolResult::failure("nope");
        assert!(bool::from(&ok));
        assert!(!bool::from(&bad));
        assert_eq!(ok, true);
        assert_eq!(bad, false);
        assert!(!bad.clone());
    }

    #[test]
    fn test_bool_result_logical_combination() {
        let ok = BoolResult::new(true, "a");
        let bad = BoolResult::failure("b");
        assert!(ok.clone() & true);
        assert!(!(true & bad.clone()));
        assert!(bad.clone() | true);
        assert!(!(false | bad));
    }

    #[test]
    fn test_bool_result_display_is_explanation() {
        let r = BoolResult::new(false, "[true, false] is not sequential yet");
        assert_eq!(format!("{r}"), "[true, false] is not sequential yet");
    }

    #[test]
    fn test_tick_report_display() {
        let report = TickReport {
            episode: EpisodeId::new(),
            tick: 3,
            satisfied: false,
            explanations: vec![Explanation {
                node: "Sequential(s)".to_string(),
                result: BoolResult::failure("[true] failed earlier"),
            }],
        };
        let text = format!("{report}");
        assert!(text.starts_with("tick 3: not satisfied"));
        assert!(text.contains("Sequential(s): [true] failed earlier"));
        assert_eq!(report.explanations_for("Sequential").count(), 1);
        assert_eq!(report.explanations_for("Watch").count(), 0);
    }
}
