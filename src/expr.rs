//! Goal expression trees.
//!
//! An [`Expr`] is built once, validated, and then evaluated every tick.
//! The tree itself never changes; the only state that evolves across ticks
//! lives in the evaluator's constraint registry, keyed by the names given
//! to the temporal nodes.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::geometry::Axis;
use crate::predicate::PredicateKind;
use crate::temporal::{ConstraintKind, SequenceKind};

/// A numeric query over the scene, usable wherever a predicate expects a
/// scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Measurement {
    /// Coordinate of an object's centre along an axis.
    Position {
        /// Object name.
        object: String,
        /// Axis to read.
        axis: Axis,
    },
    /// Distance between two centres projected onto the xy plane.
    PlanarDistance {
        /// First object.
        a: String,
        /// Second object.
        b: String,
    },
    /// Euclidean distance between two centres.
    Distance {
        /// First object.
        a: String,
        /// Second object.
        b: String,
    },
}

impl Measurement {
    /// Canonical name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Position { .. } => "Position",
            Self::PlanarDistance { .. } => "PlanarDistance",
            Self::Distance { .. } => "Distance",
        }
    }

    /// Creates a position measurement.
    #[must_use]
    pub fn position(object: impl Into<String>, axis: Axis) -> Self {
        Self::Position {
            object: object.into(),
            axis,
        }
    }

    /// Creates a planar distance measurement.
    #[must_use]
    pub fn planar_distance(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self::PlanarDistance { a: a.into(), b: b.into() }
    }

    /// Creates a 3-D distance measurement.
    #[must_use]
    pub fn distance(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self::Distance { a: a.into(), b: b.into() }
    }

    /// Object names this measurement reads.
    pub fn objects(&self) -> impl Iterator<Item = &str> {
        let (first, second) = match self {
            Self::Position { object, .. } => (object.as_str(), None),
            Self::PlanarDistance { a, b } | Self::Distance { a, b } => (a.as_str(), Some(b.as_str())),
        };
        std::iter::once(first).chain(second)
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Position { object, axis } => write!(f, "Position({object}, {axis})"),
            Self::PlanarDistance { a, b } => write!(f, "PlanarDistance({a}, {b})"),
            Self::Distance { a, b } => write!(f, "Distance({a}, {b})"),
        }
    }
}

/// A predicate operand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    /// An object name.
    Object(String),
    /// A numeric literal.
    Number(f64),
    /// An axis literal.
    Axis(Axis),
    /// A measurement taken at evaluation time.
    Measure(Measurement),
}

impl Operand {
    /// Creates an object operand.
    #[must_use]
    pub fn object(name: impl Into<String>) -> Self {
        Self::Object(name.into())
    }

    /// Operand type name used in error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Object(_) => "object",
            Self::Number(_) => "number",
            Self::Axis(_) => "axis",
            Self::Measure(_) => "measurement",
        }
    }
}

impl From<&str> for Operand {
    fn from(name: &str) -> Self {
        Self::Object(name.to_string())
    }
}

impl From<f64> for Operand {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<Axis> for Operand {
    fn from(axis: Axis) -> Self {
        Self::Axis(axis)
    }
}

impl From<Measurement> for Operand {
    fn from(m: Measurement) -> Self {
        Self::Measure(m)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Object(name) => f.write_str(name),
            Self::Number(n) => write!(f, "{n}"),
            Self::Axis(a) => write!(f, "{a}"),
            Self::Measure(m) => write!(f, "{m}"),
        }
    }
}

/// A node of a goal expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// A predicate applied to operands.
    Atomic {
        /// Which predicate.
        predicate: PredicateKind,
        /// Its operands, in signature order.
        operands: Vec<Operand>,
    },
    /// Negation.
    Not(Box<Expr>),
    /// Conjunction.
    And(Vec<Expr>),
    /// Disjunction.
    Or(Vec<Expr>),
    /// Disjunction (authoring alias of `Or`).
    Any(Vec<Expr>),
    /// Conjunction (authoring alias of `And`).
    All(Vec<Expr>),
    /// A named single-boolean temporal constraint.
    Constraint {
        /// Constraint rule.
        kind: ConstraintKind,
        /// Registry key.
        name: String,
        /// One child, or two for `AlwaysAfter`.
        args: Vec<Expr>,
    },
    /// A named sequence constraint.
    Sequence {
        /// Sequence rule.
        kind: SequenceKind,
        /// Registry key.
        name: String,
        /// Steps, in required order.
        steps: Vec<Expr>,
    },
    /// Evaluates the child for diagnostics; always true.
    Watch(Box<Expr>),
}

impl Expr {
    /// Creates an atomic node, checking operands against the predicate's
    /// signature.
    ///
    /// # Errors
    /// `ArityMismatch` or `OperandTypeMismatch`.
    pub fn atomic(predicate: PredicateKind, operands: Vec<Operand>) -> Result<Self, ValidationError> {
        predicate.check_operands(&operands)?;
        Ok(Self::Atomic { predicate, operands })
    }

    /// Like [`atomic`](Self::atomic), looking the predicate up by name.
    ///
    /// # Errors
    /// `UnknownPredicate`, `ArityMismatch` or `OperandTypeMismatch`.
    pub fn predicate(name: &str, operands: Vec<Operand>) -> Result<Self, ValidationError> {
        Self::atomic(PredicateKind::from_name(name)?, operands)
    }

    /// Negates `child`.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(child: Self) -> Self {
        Self::Not(Box::new(child))
    }

    /// Conjunction of `children`.
    #[must_use]
    pub fn and(children: impl IntoIterator<Item = Self>) -> Self {
        Self::And(children.into_iter().collect())
    }

    /// Disjunction of `children`.
    #[must_use]
    pub fn or(children: impl IntoIterator<Item = Self>) -> Self {
        Self::Or(children.into_iter().collect())
    }

    /// `Any(children)`.
    #[must_use]
    pub fn any(children: impl IntoIterator<Item = Self>) -> Self {
        Self::Any(children.into_iter().collect())
    }

    /// `All(children)`.
    #[must_use]
    pub fn all(children: impl IntoIterator<Item = Self>) -> Self {
        Self::All(children.into_iter().collect())
    }

    /// A constraint node of any kind. Arity is checked by
    /// [`validate`](Self::validate).
    #[must_use]
    pub fn constraint(kind: ConstraintKind, name: impl Into<String>, args: Vec<Self>) -> Self {
        Self::Constraint {
            kind,
            name: name.into(),
            args,
        }
    }

    /// `Always(name, child)`.
    #[must_use]
    pub fn always(name: impl Into<String>, child: Self) -> Self {
        Self::constraint(ConstraintKind::Always, name, vec![child])
    }

    /// `Never(name, child)`.
    #[must_use]
    pub fn never(name: impl Into<String>, child: Self) -> Self {
        Self::constraint(ConstraintKind::Never, name, vec![child])
    }

    /// `Once(name, child)`.
    #[must_use]
    pub fn once(name: impl Into<String>, child: Self) -> Self {
        Self::constraint(ConstraintKind::Once, name, vec![child])
    }

    /// `AlwaysAfter(name, trigger, then)`.
    #[must_use]
    pub fn always_after(name: impl Into<String>, trigger: Self, then: Self) -> Self {
        Self::constraint(ConstraintKind::AlwaysAfter, name, vec![trigger, then])
    }

    /// `Sequential(name, steps)`.
    #[must_use]
    pub fn sequential(name: impl Into<String>, steps: impl IntoIterator<Item = Self>) -> Self {
        Self::Sequence {
            kind: SequenceKind::Sequential,
            name: name.into(),
            steps: steps.into_iter().collect(),
        }
    }

    /// `RelaxedSequential(name, steps)`.
    #[must_use]
    pub fn relaxed_sequential(name: impl Into<String>, steps: impl IntoIterator<Item = Self>) -> Self {
        Self::Sequence {
            kind: SequenceKind::RelaxedSequential,
            name: name.into(),
            steps: steps.into_iter().collect(),
        }
    }

    /// `Watch(child)`.
    #[must_use]
    pub fn watch(child: Self) -> Self {
        Self::Watch(Box::new(child))
    }

    /// Short label for reports: the node kind, plus the name for temporal
    /// nodes and the predicate for atomic ones.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Atomic { predicate, .. } => predicate.name().to_string(),
            Self::Not(_) => "Not".to_string(),
            Self::And(_) => "And".to_string(),
            Self::Or(_) => "Or".to_string(),
            Self::Any(_) => "Any".to_string(),
            Self::All(_) => "All".to_string(),
            Self::Constraint { kind, name, .. } => format!("{kind}({name})"),
            Self::Sequence { kind, name, .. } => format!("{kind}({name})"),
            Self::Watch(_) => "Watch".to_string(),
        }
    }

    /// Object names referenced anywhere in the tree, in first-seen order.
    #[must_use]
    pub fn objects(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        self.visit(&mut |node| {
            if let Self::Atomic { operands, .. } = node {
                for operand in operands {
                    let names: Vec<&str> = match operand {
                        Operand::Object(name) => vec![name.as_str()],
                        Operand::Measure(m) => m.objects().collect(),
                        Operand::Number(_) | Operand::Axis(_) => Vec::new(),
                    };
                    for name in names {
                        if seen.insert(name.to_string()) {
                            out.push(name.to_string());
                        }
                    }
                }
            }
        });
        out
    }

    /// Pre-order walk over every node.
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a Self)) {
        f(self);
        match self {
            Self::Atomic { .. } => {}
            Self::Not(child) | Self::Watch(child) => child.visit(f),
            Self::And(children) | Self::Or(children) | Self::Any(children) | Self::All(children) => {
                for child in children {
                    child.visit(f);
                }
            }
            Self::Constraint { args: children, .. } | Self::Sequence { steps: children, .. } => {
                for child in children {
                    child.visit(f);
                }
            }
        }
    }

    /// Checks the whole tree: predicate signatures, non-empty combinators,
    /// constraint arity and names, and that no `(kind, name)` pair is used
    /// twice.
    ///
    /// # Errors
    /// The first problem found, in pre-order.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut keys: HashSet<(&'static str, &str)> = HashSet::new();
        let mut result = Ok(());
        self.visit(&mut |node| {
            if result.is_ok() {
                result = node.validate_node(&mut keys);
            }
        });
        result
    }

    fn validate_node<'a>(&'a self, keys: &mut HashSet<(&'static str, &'a str)>) -> Result<(), ValidationError> {
        match self {
            Self::Atomic { predicate, operands } => predicate.check_operands(operands),
            Self::And(children) | Self::Or(children) | Self::Any(children) | Self::All(children) => {
                if children.is_empty() {
                    return Err(ValidationError::EmptyCombinator {
                        combinator: self.combinator_name(),
                    });
                }
                Ok(())
            }
            Self::Constraint { kind, name, args } => {
                check_name(kind.as_str(), name)?;
                if args.len() != kind.arity() {
                    return Err(ValidationError::ConstraintArity {
                        kind: kind.as_str(),
                        name: name.clone(),
                        expected: kind.arity(),
                        actual: args.len(),
                    });
                }
                claim(keys, kind.as_str(), name)
            }
            Self::Sequence { kind, name, steps } => {
                check_name(kind.as_str(), name)?;
                if steps.is_empty() {
                    return Err(ValidationError::EmptySequence {
                        kind: kind.as_str(),
                        name: name.clone(),
                    });
                }
                claim(keys, kind.as_str(), name)
            }
            Self::Not(_) | Self::Watch(_) => Ok(()),
        }
    }

    fn combinator_name(&self) -> &'static str {
        match self {
            Self::And(_) => "And",
            Self::Or(_) => "Or",
            Self::Any(_) => "Any",
            Self::All(_) => "All",
            _ => "combinator",
        }
    }
}

fn check_name(kind: &'static str, name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyConstraintName { kind });
    }
    Ok(())
}

fn claim<'a>(
    keys: &mut HashSet<(&'static str, &'a str)>,
    kind: &'static str,
    name: &'a str,
) -> Result<(), ValidationError> {
    if keys.insert((kind, name)) {
        Ok(())
    } else {
        Err(ValidationError::DuplicateConstraint {
            kind,
            name: name.to_string(),
        })
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[impl fmt::Display]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atomic { predicate, operands } => {
                write!(f, "{predicate}(")?;
                write_list(f, operands)?;
                f.write_str(")")
            }
            Self::Not(child) => write!(f, "Not({child})"),
            Self::Watch(child) => write!(f, "Watch({child})"),
            Self::And(children) | Self::Or(children) | Self::Any(children) | Self::All(children) => {
                write!(f, "{}(", self.combinator_name())?;
                write_list(f, children)?;
                f.write_str(")")
            }
            Self::Constraint { kind, name, args } => {
                write!(f, "{kind}[{name}](")?;
                write_list(f, args)?;
                f.write_str(")")
            }
            Self::Sequence { kind, name, steps } => {
                write!(f, "{kind}[{name}](")?;
                write_list(f, steps)?;
                f.write_str(")")
            }
        }
    }
}
