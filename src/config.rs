//! Evaluator configuration.
//!
//! Thresholds used by the geometric predicates. The defaults reproduce the
//! values the task suite was authored against; override them only when the
//! simulated assets use a different scale.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Thresholds for the `StackBowl` predicate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackBowlThresholds {
    /// Maximum |dx| and |dy| between the two centres (exclusive).
    pub xy_threshold: f64,
    /// Minimum |dz| between the two centres (exclusive).
    pub z_min_gap: f64,
    /// Maximum |dz| between the two centres (exclusive).
    pub z_max_gap: f64,
}

impl Default for StackBowlThresholds {
    fn default() -> Self {
        Self {
            xy_threshold: 0.02,
            z_min_gap: 0.001,
            z_max_gap: 0.5,
        }
    }
}

/// Configuration shared by every predicate evaluated by one
/// [`GoalEvaluator`](crate::GoalEvaluator).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    /// World height at or above which `Up` holds.
    pub up_height: f64,
    /// Minimum world-z component of the up axis for `Upright`.
    pub upright_z: f64,
    /// `UpsideDown` holds when the up axis' world-z component is below this.
    pub upside_down_z: f64,
    /// Minimum world-z component of the up axis for `UprightWithin45`.
    pub upright_45_z: f64,
    /// Planar centre distance below which `OnCentre` holds.
    pub on_centre_xy_tolerance: f64,
    /// `StackBowl` thresholds.
    pub stack_bowl: StackBowlThresholds,
    /// Allowed |ratio - target| for `OpenRatio`.
    pub open_ratio_tolerance: f64,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            up_height: 1.0,
            upright_z: 0.95,
            upside_down_z: -0.95,
            upright_45_z: 0.7071,
            on_centre_xy_tolerance: 0.005,
            stack_bowl: StackBowlThresholds::default(),
            open_ratio_tolerance: 0.1,
        }
    }
}

fn invalid(reason: impl Into<String>) -> ValidationError {
    ValidationError::InvalidConfig {
        reason: reason.into(),
    }
}

impl EvaluatorConfig {
    /// Validate configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidConfig` naming the first field that
    /// is non-finite or outside its allowed range.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let finite = [
            ("up_height", self.up_height),
            ("upright_z", self.upright_z),
            ("upside_down_z", self.upside_down_z),
            ("upright_45_z", self.upright_45_z),
            ("on_centre_xy_tolerance", self.on_centre_xy_tolerance),
            ("stack_bowl.xy_threshold", self.stack_bowl.xy_threshold),
            ("stack_bowl.z_min_gap", self.stack_bowl.z_min_gap),
            ("stack_bowl.z_max_gap", self.stack_bowl.z_max_gap),
            ("open_ratio_tolerance", self.open_ratio_tolerance),
        ];
        for (field, value) in finite {
            if !value.is_finite() {
                return Err(invalid(format!("{field} must be finite")));
            }
        }

        for (field, value) in [
            ("upright_z", self.upright_z),
            ("upside_down_z", self.upside_down_z),
            ("upright_45_z", self.upright_45_z),
        ] {
            if !(-1.0..=1.0).contains(&value) {
                return Err(invalid(format!("{field} ({value}) must be within [-1, 1]")));
            }
        }

        if self.upside_down_z >= self.upright_z {
            return Err(invalid(format!(
                "upside_down_z ({}) must be < upright_z ({})",
                self.upside_down_z, self.upright_z
            )));
        }

        if self.on_centre_xy_tolerance <= 0.0 {
            return Err(invalid("on_centre_xy_tolerance must be > 0"));
        }
        if self.stack_bowl.xy_threshold <= 0.0 {
            return Err(invalid("stack_bowl.xy_threshold must be > 0"));
        }
        if self.stack_bowl.z_min_gap < 0.0 || self.stack_bowl.z_min_gap >= self.stack_bowl.z_max_gap {
            return Err(invalid(format!(
                "stack_bowl gap window ({}, {}) is empty",
                self.stack_bowl.z_min_gap, self.stack_bowl.z_max_gap
            )));
        }
        if !(0.0..=1.0).contains(&self.open_ratio_tolerance) {
            return Err(invalid("open_ratio_tolerance must be within [0, 1]"));
        }
        Ok(())
    }
}
