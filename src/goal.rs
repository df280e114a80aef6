//! Goal definitions.
//!
//! A [`Goal`] pairs the task's natural-language instruction with its
//! validated expression tree. Goals can be stored as JSON with
//! [`to_json_pretty`] / [`from_json`], or read from the nested-list form
//! task files are written in with [`parse_authored`]:
//!
//! ```json
//! [["ConstraintNever", ["InContact", "gripper0_hand", "wine_bottle_1"]],
//!  ["Sequential", [["In", "ketchup_1", "basket_1"],
//!                  ["In", "alphabet_soup_1", "basket_1"]]],
//!  ["Equal", ["GetPosi", "milk_1", "z"], 0.463, 0.001]]
//! ```
//!
//! Temporal nodes in that form may carry an explicit name as their first
//! argument. Unnamed ones are named after the text of their arguments, so
//! the same authored goal always maps to the same registry keys.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::error::{GoalError, GoalResult, ValidationError};
use crate::expr::{Expr, Measurement, Operand};
use crate::geometry::Axis;
use crate::predicate::{PredicateKind, Slot};
use crate::temporal::{ConstraintKind, SequenceKind};

/// A task goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    /// Instruction given to the agent.
    pub language: String,
    /// Objects the task is about.
    #[serde(default)]
    pub objects_of_interest: Vec<String>,
    /// Root expression.
    pub root: Expr,
}

impl Goal {
    /// Creates a goal after validating `root`.
    ///
    /// # Errors
    /// Any [`ValidationError`] from [`Expr::validate`].
    pub fn new(
        language: impl Into<String>,
        objects_of_interest: Vec<String>,
        root: Expr,
    ) -> Result<Self, ValidationError> {
        root.validate()?;
        Ok(Self {
            language: language.into(),
            objects_of_interest,
            root,
        })
    }

    /// Creates a goal whose root is the conjunction of `states`.
    ///
    /// # Errors
    /// `EmptyCombinator` for an empty list, or any error from validation.
    pub fn from_states(
        language: impl Into<String>,
        objects_of_interest: Vec<String>,
        states: Vec<Expr>,
    ) -> Result<Self, ValidationError> {
        Self::new(language, objects_of_interest, Expr::And(states))
    }

    /// Creates a goal from a list of goal states in the nested-list form.
    ///
    /// # Errors
    /// `MalformedGoal` if `states` is not a list, or any parse or
    /// validation error.
    pub fn from_authored(
        language: impl Into<String>,
        objects_of_interest: Vec<String>,
        states: &Json,
    ) -> Result<Self, ValidationError> {
        let items = states.as_array().ok_or_else(|| malformed("goal states must be a list"))?;
        let states = items.iter().map(parse_authored).collect::<Result<Vec<_>, _>>()?;
        Self::from_states(language, objects_of_interest, states)
    }

    /// Validates the goal. Needed after deserializing or editing `root`.
    ///
    /// # Errors
    /// Any [`ValidationError`] from [`Expr::validate`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.root.validate()
    }

    /// Object names referenced by the expression tree.
    #[must_use]
    pub fn referenced_objects(&self) -> Vec<String> {
        self.root.objects()
    }
}

/// Serializes a goal to pretty JSON.
///
/// # Errors
///
/// Returns `GoalError::Internal` if serde_json fails to serialize the goal.
pub fn to_json_pretty(goal: &Goal) -> GoalResult<String> {
    serde_json::to_string_pretty(goal).map_err(|e| GoalError::internal(format!("serialize goal: {e}")))
}

/// Deserializes and validates a goal.
///
/// # Errors
///
/// Returns `ValidationError::MalformedGoal` for JSON that does not describe a
/// goal, or the first error reported by [`Goal::validate`].
pub fn from_json(s: &str) -> GoalResult<Goal> {
    let goal: Goal = serde_json::from_str(s).map_err(|e| malformed(format!("deserialize goal: {e}")))?;
    goal.validate()?;
    Ok(goal)
}

fn malformed(reason: impl Into<String>) -> ValidationError {
    ValidationError::MalformedGoal {
        reason: reason.into(),
    }
}

fn head(value: &Json) -> Result<(&str, &[Json]), ValidationError> {
    let items = value
        .as_array()
        .ok_or_else(|| malformed(format!("expected a list, got {value}")))?;
    let (first, rest) = items
        .split_first()
        .ok_or_else(|| malformed("empty expression"))?;
    let name = first
        .as_str()
        .ok_or_else(|| malformed(format!("expression must start with a name, got {first}")))?;
    Ok((name, rest))
}

fn is_expression(value: &Json) -> bool {
    value
        .as_array()
        .and_then(|items| items.first())
        .is_some_and(Json::is_string)
}

/// Children either listed inline or wrapped in one extra list.
fn children(args: &[Json]) -> Result<Vec<Expr>, ValidationError> {
    let items = match args {
        [single] if !is_expression(single) && single.is_array() => {
            single.as_array().map_or(args, Vec::as_slice)
        }
        _ => args,
    };
    items.iter().map(parse_authored).collect()
}

fn split_name(
    args: &[Json],
    fallback: impl FnOnce(&[Expr]) -> String,
) -> Result<(String, Vec<Expr>), ValidationError> {
    match args.split_first() {
        Some((Json::String(name), rest)) => Ok((name.clone(), children(rest)?)),
        _ => {
            let exprs = children(args)?;
            Ok((fallback(&exprs), exprs))
        }
    }
}

fn joined(exprs: &[Expr]) -> String {
    exprs.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Parses one expression in the nested-list form.
///
/// # Errors
/// `MalformedGoal` for structural problems, `UnknownPredicate` /
/// `UnknownMeasure` / `InvalidAxis` for bad names, or a signature error.
pub fn parse_authored(value: &Json) -> Result<Expr, ValidationError> {
    let (name, args) = head(value)?;

    match name.to_ascii_lowercase().as_str() {
        "not" => match args {
            [child] => Ok(Expr::not(parse_authored(child)?)),
            _ => Err(malformed(format!("Not expects one argument, got {}", args.len()))),
        },
        "watch" => match args {
            [child] => Ok(Expr::watch(parse_authored(child)?)),
            _ => Err(malformed(format!("Watch expects one argument, got {}", args.len()))),
        },
        "and" => Ok(Expr::And(children(args)?)),
        "or" => Ok(Expr::Or(children(args)?)),
        "any" => Ok(Expr::Any(children(args)?)),
        "all" => Ok(Expr::All(children(args)?)),
        _ => {
            if let Some(kind) = ConstraintKind::from_name(name) {
                let (name, exprs) = split_name(args, joined)?;
                return Ok(Expr::constraint(kind, name, exprs));
            }
            if let Some(kind) = SequenceKind::from_name(name) {
                let (name, steps) = split_name(args, |steps| format!("[{}]", joined(steps)))?;
                return Ok(Expr::Sequence { kind, name, steps });
            }
            let predicate = PredicateKind::from_name(name)?;
            let signature = predicate.signature();
            let operands = args
                .iter()
                .enumerate()
                .map(|(i, arg)| parse_operand(signature.slot(i), arg))
                .collect::<Result<Vec<_>, _>>()?;
            Expr::atomic(predicate, operands)
        }
    }
}

fn parse_operand(slot: Option<Slot>, value: &Json) -> Result<Operand, ValidationError> {
    match (slot, value) {
        (Some(Slot::Axis), Json::String(s)) => Ok(Operand::Axis(s.parse()?)),
        (Some(Slot::Scalar), Json::Array(_)) => Ok(Operand::Measure(parse_measurement(value)?)),
        (_, Json::String(s)) => Ok(Operand::object(s.as_str())),
        (_, Json::Number(n)) => n
            .as_f64()
            .map(Operand::Number)
            .ok_or_else(|| malformed(format!("number out of range: {n}"))),
        (_, other) => Err(malformed(format!("unsupported operand {other}"))),
    }
}

fn parse_measurement(value: &Json) -> Result<Measurement, ValidationError> {
    let (name, args) = head(value)?;
    let text = |i: usize| -> Result<&str, ValidationError> {
        args.get(i)
            .and_then(Json::as_str)
            .ok_or_else(|| malformed(format!("{name} operand {i} must be a name")))
    };
    let expect = |n: usize| -> Result<(), ValidationError> {
        if args.len() == n {
            Ok(())
        } else {
            Err(malformed(format!("{name} expects {n} operands, got {}", args.len())))
        }
    };

    match name.to_ascii_lowercase().as_str() {
        "getposi" | "position" => {
            expect(2)?;
            let axis: Axis = text(1)?.parse()?;
            Ok(Measurement::position(text(0)?, axis))
        }
        "planardistance" => {
            expect(2)?;
            Ok(Measurement::planar_distance(text(0)?, text(1)?))
        }
        "distance" => {
            expect(2)?;
            Ok(Measurement::distance(text(0)?, text(1)?))
        }
        _ => Err(ValidationError::UnknownMeasure {
            name: name.to_string(),
        }),
    }
}
