//! Atomic predicate library.
//!
//! A predicate is a pure function of the current scene: given resolved
//! operands it answers one boolean question about object geometry or
//! articulation. The set is closed; [`PredicateKind`] enumerates every
//! predicate a goal may name, and [`evaluate`] dispatches on it.
//!
//! Operands are checked twice. [`Signature::check`] runs when an
//! expression is built, so a malformed goal is rejected before any tick.
//! The typed accessors on [`Args`] repeat the check at evaluation time for
//! trees that were assembled by hand without going through validation.

pub mod articulation;
pub mod numeric;
pub mod orientation;
pub mod spatial;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::EvaluatorConfig;
use crate::error::{GoalResult, ValidationError};
use crate::expr::Operand;
use crate::geometry::Axis;
use crate::scene::{PhysicalObject, Scene};

/// Type of a single operand position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// An object name, resolved against the scene.
    Object,
    /// A numeric literal.
    Number,
    /// An axis literal.
    Axis,
    /// A numeric literal or a measurement.
    Scalar,
}

impl Slot {
    /// Human-readable slot name used in error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Object => "object",
            Self::Number => "number",
            Self::Axis => "axis",
            Self::Scalar => "scalar",
        }
    }

    /// Whether `operand` may fill this slot.
    #[must_use]
    pub fn accepts(self, operand: &Operand) -> bool {
        matches!(
            (self, operand),
            (Self::Object, Operand::Object(_))
                | (Self::Number | Self::Scalar, Operand::Number(_))
                | (Self::Axis, Operand::Axis(_))
                | (Self::Scalar, Operand::Measure(_))
        )
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operand list a predicate accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signature {
    /// Exactly these slots.
    Fixed(&'static [Slot]),
    /// `head` followed by at least `min_rest` operands of type `rest`.
    Variadic {
        /// Leading fixed slots.
        head: &'static [Slot],
        /// Type of every trailing operand.
        rest: Slot,
        /// Minimum number of trailing operands.
        min_rest: usize,
    },
    /// Any number of operands of any type.
    Any,
}

impl Signature {
    /// Expected slot at `index`, or `None` if any operand is accepted there.
    #[must_use]
    pub fn slot(&self, index: usize) -> Option<Slot> {
        match self {
            Self::Fixed(slots) => slots.get(index).copied(),
            Self::Variadic { head, rest, .. } => Some(head.get(index).copied().unwrap_or(*rest)),
            Self::Any => None,
        }
    }

    /// Whether `n` operands is an acceptable count.
    #[must_use]
    pub fn accepts_len(&self, n: usize) -> bool {
        match self {
            Self::Fixed(slots) => slots.len() == n,
            Self::Variadic { head, min_rest, .. } => n >= head.len() + min_rest,
            Self::Any => true,
        }
    }

    /// Arity as it appears in error messages.
    #[must_use]
    pub fn describe_arity(&self) -> String {
        match self {
            Self::Fixed(slots) => slots.len().to_string(),
            Self::Variadic { head, min_rest, .. } => format!("at least {}", head.len() + min_rest),
            Self::Any => "any number of".to_string(),
        }
    }

    /// Checks count and slot types of `operands` for predicate `name`.
    /// Number literals must be finite.
    ///
    /// # Errors
    /// `ArityMismatch`, `OperandTypeMismatch` or `NonFiniteOperand`.
    pub fn check(&self, name: &str, operands: &[Operand]) -> Result<(), ValidationError> {
        if !self.accepts_len(operands.len()) {
            return Err(ValidationError::ArityMismatch {
                predicate: name.to_string(),
                expected: self.describe_arity(),
                actual: operands.len(),
            });
        }
        for (index, operand) in operands.iter().enumerate() {
            if let Operand::Number(value) = *operand {
                if !value.is_finite() {
                    return Err(ValidationError::NonFiniteOperand {
                        predicate: name.to_string(),
                        index,
                        value,
                    });
                }
            }
            if let Some(slot) = self.slot(index) {
                if !slot.accepts(operand) {
                    return Err(ValidationError::OperandTypeMismatch {
                        predicate: name.to_string(),
                        index,
                        expected: slot.as_str(),
                        actual: operand.type_name(),
                    });
                }
            }
        }
        Ok(())
    }
}

const O: Slot = Slot::Object;
const N: Slot = Slot::Number;
const A: Slot = Slot::Axis;
const S: Slot = Slot::Scalar;

/// Every atomic predicate a goal may reference.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PredicateKind {
    True,
    False,
    InContact,
    In,
    On,
    OnCentre,
    Stack,
    StackBowl,
    Under,
    Up,
    InAir,
    UpsideDown,
    Upright,
    UprightWithin45,
    Open,
    Close,
    TurnOn,
    TurnOff,
    OpenRatio,
    PositionWithin,
    PositionWithinObject,
    PositionWithinObjectAnnulus,
    PosiGreaterThan,
    PosiLessThan,
    PosiGreaterThanObject,
    PosiLessThanObject,
    PosiSameWith,
    DistanceBetween,
    MidBetween,
    RelaxedBetween,
    OrderAlongAxis,
    AxisAlignedWithin,
    AxisAlignedWithinWorldAxis,
    AxisAlignedWithinObjectAxis,
    OrientedAtDegree,
    IsFacingObject,
    Equal,
    GreaterThan,
    LessThan,
}

impl PredicateKind {
    /// All predicates, in declaration order.
    pub const ALL: [Self; 39] = [
        Self::True,
        Self::False,
        Self::InContact,
        Self::In,
        Self::On,
        Self::OnCentre,
        Self::Stack,
        Self::StackBowl,
        Self::Under,
        Self::Up,
        Self::InAir,
        Self::UpsideDown,
        Self::Upright,
        Self::UprightWithin45,
        Self::Open,
        Self::Close,
        Self::TurnOn,
        Self::TurnOff,
        Self::OpenRatio,
        Self::PositionWithin,
        Self::PositionWithinObject,
        Self::PositionWithinObjectAnnulus,
        Self::PosiGreaterThan,
        Self::PosiLessThan,
        Self::PosiGreaterThanObject,
        Self::PosiLessThanObject,
        Self::PosiSameWith,
        Self::DistanceBetween,
        Self::MidBetween,
        Self::RelaxedBetween,
        Self::OrderAlongAxis,
        Self::AxisAlignedWithin,
        Self::AxisAlignedWithinWorldAxis,
        Self::AxisAlignedWithinObjectAxis,
        Self::OrientedAtDegree,
        Self::IsFacingObject,
        Self::Equal,
        Self::GreaterThan,
        Self::LessThan,
    ];

    /// Canonical name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::True => "True",
            Self::False => "False",
            Self::InContact => "InContact",
            Self::In => "In",
            Self::On => "On",
            Self::OnCentre => "OnCentre",
            Self::Stack => "Stack",
            Self::StackBowl => "StackBowl",
            Self::Under => "Under",
            Self::Up => "Up",
            Self::InAir => "InAir",
            Self::UpsideDown => "UpsideDown",
            Self::Upright => "Upright",
            Self::UprightWithin45 => "UprightWithin45",
            Self::Open => "Open",
            Self::Close => "Close",
            Self::TurnOn => "TurnOn",
            Self::TurnOff => "TurnOff",
            Self::OpenRatio => "OpenRatio",
            Self::PositionWithin => "PositionWithin",
            Self::PositionWithinObject => "PositionWithinObject",
            Self::PositionWithinObjectAnnulus => "PositionWithinObjectAnnulus",
            Self::PosiGreaterThan => "PosiGreaterThan",
            Self::PosiLessThan => "PosiLessThan",
            Self::PosiGreaterThanObject => "PosiGreaterThanObject",
            Self::PosiLessThanObject => "PosiLessThanObject",
            Self::PosiSameWith => "PosiSameWith",
            Self::DistanceBetween => "DistanceBetween",
            Self::MidBetween => "MidBetween",
            Self::RelaxedBetween => "RelaxedBetween",
            Self::OrderAlongAxis => "OrderAlongAxis",
            Self::AxisAlignedWithin => "AxisAlignedWithin",
            Self::AxisAlignedWithinWorldAxis => "AxisAlignedWithinWorldAxis",
            Self::AxisAlignedWithinObjectAxis => "AxisAlignedWithinObjectAxis",
            Self::OrientedAtDegree => "OrientedAtDegree",
            Self::IsFacingObject => "IsFacingObject",
            Self::Equal => "Equal",
            Self::GreaterThan => "GreaterThan",
            Self::LessThan => "LessThan",
        }
    }

    /// Looks a predicate up by name, ignoring ASCII case.
    ///
    /// `UpRight45` is accepted as an alias of `UprightWithin45`.
    pub fn from_name(name: &str) -> Result<Self, ValidationError> {
        let name = name.trim();
        if name.eq_ignore_ascii_case("UpRight45") {
            return Ok(Self::UprightWithin45);
        }
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| ValidationError::UnknownPredicate {
                name: name.to_string(),
            })
    }

    /// Operand signature.
    #[must_use]
    pub const fn signature(self) -> Signature {
        match self {
            Self::True | Self::False => Signature::Any,
            Self::InContact
            | Self::In
            | Self::On
            | Self::OnCentre
            | Self::Stack
            | Self::StackBowl
            | Self::Under => Signature::Fixed(&[O, O]),
            Self::Up
            | Self::UpsideDown
            | Self::Upright
            | Self::UprightWithin45
            | Self::Open
            | Self::Close
            | Self::TurnOn
            | Self::TurnOff => Signature::Fixed(&[O]),
            Self::InAir | Self::OpenRatio => Signature::Fixed(&[O, N]),
            Self::PositionWithin | Self::OrientedAtDegree => Signature::Fixed(&[O, N, N, N, N, N, N]),
            Self::PositionWithinObject => Signature::Fixed(&[O, O, N, N, N, N, N, N]),
            Self::PositionWithinObjectAnnulus => Signature::Fixed(&[O, O, N, N]),
            Self::PosiGreaterThan | Self::PosiLessThan => Signature::Fixed(&[O, A, N]),
            Self::PosiGreaterThanObject | Self::PosiLessThanObject | Self::PosiSameWith => {
                Signature::Fixed(&[O, O, A, N])
            }
            Self::DistanceBetween => Signature::Fixed(&[O, O, N, N, N]),
            Self::MidBetween | Self::RelaxedBetween => Signature::Fixed(&[O, O, O, A]),
            Self::OrderAlongAxis => Signature::Variadic {
                head: &[A],
                rest: O,
                min_rest: 2,
            },
            Self::AxisAlignedWithin => Signature::Fixed(&[O, A, N, N]),
            Self::AxisAlignedWithinWorldAxis => Signature::Fixed(&[O, A, N, N, A]),
            Self::AxisAlignedWithinObjectAxis => Signature::Fixed(&[O, O, A, A, N, N]),
            Self::IsFacingObject => Signature::Fixed(&[O, O, N, N, N, N]),
            Self::Equal => Signature::Fixed(&[S, S, N]),
            Self::GreaterThan | Self::LessThan => Signature::Fixed(&[S, S]),
        }
    }

    /// Checks `operands` against this predicate's signature.
    ///
    /// # Errors
    /// `ArityMismatch` or `OperandTypeMismatch`.
    pub fn check_operands(self, operands: &[Operand]) -> Result<(), ValidationError> {
        self.signature().check(self.name(), operands)
    }
}

impl fmt::Display for PredicateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A resolved operand, ready for a predicate to consume.
#[derive(Clone, Copy)]
pub enum Arg<'s> {
    /// A live object handle.
    Object(&'s dyn PhysicalObject),
    /// A number (literal or measured).
    Number(f64),
    /// An axis.
    Axis(Axis),
}

impl Arg<'_> {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Object(_) => "object",
            Self::Number(_) => "number",
            Self::Axis(_) => "axis",
        }
    }
}

impl fmt::Debug for Arg<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Object(o) => write!(f, "Object({})", o.name()),
            Self::Number(n) => write!(f, "Number({n})"),
            Self::Axis(a) => write!(f, "Axis({a})"),
        }
    }
}

/// Typed view over the resolved operands of one predicate call.
#[derive(Debug, Clone, Copy)]
pub struct Args<'a, 's> {
    predicate: PredicateKind,
    args: &'a [Arg<'s>],
}

impl<'a, 's> Args<'a, 's> {
    /// Wraps `args` for `predicate`.
    #[must_use]
    pub const fn new(predicate: PredicateKind, args: &'a [Arg<'s>]) -> Self {
        Self { predicate, args }
    }

    /// Number of operands.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.args.len()
    }

    /// Returns true if there are no operands.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    fn mismatch(&self, index: usize, expected: &'static str) -> ValidationError {
        match self.args.get(index) {
            Some(arg) => ValidationError::OperandTypeMismatch {
                predicate: self.predicate.name().to_string(),
                index,
                expected,
                actual: arg.type_name(),
            },
            None => ValidationError::ArityMismatch {
                predicate: self.predicate.name().to_string(),
                expected: self.predicate.signature().describe_arity(),
                actual: self.args.len(),
            },
        }
    }

    /// Object operand at `index`.
    pub fn object(&self, index: usize) -> GoalResult<&'s dyn PhysicalObject> {
        match self.args.get(index) {
            Some(Arg::Object(o)) => Ok(*o),
            _ => Err(self.mismatch(index, "object").into()),
        }
    }

    /// Numeric operand at `index`.
    pub fn number(&self, index: usize) -> GoalResult<f64> {
        match self.args.get(index) {
            Some(Arg::Number(n)) => Ok(*n),
            _ => Err(self.mismatch(index, "number").into()),
        }
    }

    /// Axis operand at `index`.
    pub fn axis(&self, index: usize) -> GoalResult<Axis> {
        match self.args.get(index) {
            Some(Arg::Axis(a)) => Ok(*a),
            _ => Err(self.mismatch(index, "axis").into()),
        }
    }

    /// Three consecutive numbers starting at `index`.
    pub fn triple(&self, index: usize) -> GoalResult<[f64; 3]> {
        Ok([self.number(index)?, self.number(index + 1)?, self.number(index + 2)?])
    }

    /// Every operand from `index` on, as objects.
    pub fn objects_from(&self, index: usize) -> GoalResult<Vec<&'s dyn PhysicalObject>> {
        (index..self.args.len()).map(|i| self.object(i)).collect()
    }
}

/// Resolves object names against `scene` and measurements to numbers.
///
/// # Errors
/// `ExecutionError::UnresolvedObject` for a name the scene does not know,
/// or any error raised while taking a measurement.
pub fn resolve_operands<'s>(operands: &[Operand], scene: &'s dyn Scene) -> GoalResult<Vec<Arg<'s>>> {
    operands
        .iter()
        .map(|operand| -> GoalResult<Arg<'s>> {
            match operand {
                Operand::Object(name) => Ok(Arg::Object(scene.resolve(name)?)),
                Operand::Number(n) => Ok(Arg::Number(*n)),
                Operand::Axis(a) => Ok(Arg::Axis(*a)),
                Operand::Measure(m) => Ok(Arg::Number(numeric::measure(m, scene)?)),
            }
        })
        .collect()
}

/// Evaluates `kind` against already-resolved operands.
///
/// # Errors
/// A `ValidationError` if the operands do not fit the signature, or an
/// `ExecutionError` if a scene query fails.
pub fn evaluate(kind: PredicateKind, args: &[Arg<'_>], config: &EvaluatorConfig) -> GoalResult<bool> {
    if !kind.signature().accepts_len(args.len()) {
        return Err(ValidationError::ArityMismatch {
            predicate: kind.name().to_string(),
            expected: kind.signature().describe_arity(),
            actual: args.len(),
        }
        .into());
    }
    let args = Args::new(kind, args);

    let value = match kind {
        PredicateKind::True => true,
        PredicateKind::False => false,

        PredicateKind::InContact => spatial::in_contact(&args)?,
        PredicateKind::In => spatial::inside(&args)?,
        PredicateKind::On => spatial::on(&args)?,
        PredicateKind::OnCentre => spatial::on_centre(&args, config)?,
        PredicateKind::Stack => spatial::stack(&args)?,
        PredicateKind::StackBowl => spatial::stack_bowl(&args, config)?,
        PredicateKind::Under => spatial::under(&args)?,
        PredicateKind::Up => spatial::up(&args, config)?,
        PredicateKind::InAir => spatial::in_air(&args)?,
        PredicateKind::PositionWithin => spatial::position_within(&args)?,
        PredicateKind::PositionWithinObject => spatial::position_within_object(&args)?,
        PredicateKind::PositionWithinObjectAnnulus => spatial::position_within_annulus(&args)?,
        PredicateKind::PosiGreaterThan => spatial::coordinate_greater(&args)?,
        PredicateKind::PosiLessThan => spatial::coordinate_less(&args)?,
        PredicateKind::PosiGreaterThanObject => spatial::coordinate_greater_than_object(&args)?,
        PredicateKind::PosiLessThanObject => spatial::coordinate_less_than_object(&args)?,
        PredicateKind::PosiSameWith => spatial::coordinate_same(&args)?,
        PredicateKind::DistanceBetween => spatial::distance_between(&args)?,
        PredicateKind::MidBetween => spatial::between(&args, false)?,
        PredicateKind::RelaxedBetween => spatial::between(&args, true)?,
        PredicateKind::OrderAlongAxis => spatial::order_along_axis(&args)?,

        PredicateKind::UpsideDown => orientation::upside_down(&args, config)?,
        PredicateKind::Upright => orientation::upright(&args, config)?,
        PredicateKind::UprightWithin45 => orientation::upright_within_45(&args, config)?,
        PredicateKind::AxisAlignedWithin => orientation::axis_aligned_within(&args)?,
        PredicateKind::AxisAlignedWithinWorldAxis => orientation::axis_aligned_within_world_axis(&args)?,
        PredicateKind::AxisAlignedWithinObjectAxis => orientation::axis_aligned_within_object_axis(&args)?,
        PredicateKind::OrientedAtDegree => orientation::oriented_at_degree(&args)?,
        PredicateKind::IsFacingObject => orientation::is_facing_object(&args)?,

        PredicateKind::Open => articulation::open(&args)?,
        PredicateKind::Close => articulation::close(&args)?,
        PredicateKind::TurnOn => articulation::turn_on(&args)?,
        PredicateKind::TurnOff => articulation::turn_off(&args)?,
        PredicateKind::OpenRatio => articulation::open_ratio(&args, config)?,

        PredicateKind::Equal => numeric::equal(&args)?,
        PredicateKind::GreaterThan => numeric::greater_than(&args)?,
        PredicateKind::LessThan => numeric::less_than(&args)?,
    };

    tracing::trace!(predicate = kind.name(), ?args, value, "predicate evaluated");
    Ok(value)
}

/// Validates, resolves and evaluates one predicate call with the default
/// configuration.
#[cfg(test)]
pub(crate) fn check(scene: &dyn Scene, kind: PredicateKind, operands: &[Operand]) -> GoalResult<bool> {
    kind.check_operands(operands)?;
    let args = resolve_operands(operands, scene)?;
    evaluate(kind, &args, &EvaluatorConfig::default())
}
