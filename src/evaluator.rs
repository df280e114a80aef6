//! Per-tick goal evaluation.
//!
//! A [`GoalEvaluator`] owns the temporal state of one episode. Each call to
//! [`GoalEvaluator::evaluate`] walks the goal tree against the scene as it
//! is at that tick:
//!
//! - children are evaluated left to right, and every child is evaluated
//!   even when the result of a combinator is already decided, so that every
//!   temporal node sees every tick;
//! - a leaf error aborts the tick, and the constraint registry is restored
//!   to what it was before the tick started;
//! - the tick counter advances only when a tick completes.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::EvaluatorConfig;
use crate::error::{GoalResult, ValidationError};
use crate::expr::Expr;
use crate::goal::Goal;
use crate::predicate;
use crate::report::{BoolResult, Explanation, TickReport};
use crate::scene::Scene;
use crate::temporal::ConstraintRegistry;

/// Identifies one episode of an evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EpisodeId(Uuid);

impl EpisodeId {
    /// Creates a new random episode ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EpisodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EpisodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Evaluates goal expressions tick by tick for a single episode.
#[derive(Debug, Clone)]
pub struct GoalEvaluator {
    registry: ConstraintRegistry,
    config: EvaluatorConfig,
    episode: EpisodeId,
    tick: u64,
}

impl Default for GoalEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl GoalEvaluator {
    /// Creates an evaluator with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: ConstraintRegistry::new(),
            config: EvaluatorConfig::default(),
            episode: EpisodeId::new(),
            tick: 0,
        }
    }

    /// Creates an evaluator with a custom configuration.
    ///
    /// # Errors
    /// `InvalidConfig` if the configuration is inconsistent.
    pub fn with_config(config: EvaluatorConfig) -> Result<Self, ValidationError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new()
        })
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Temporal state accumulated so far in this episode.
    #[must_use]
    pub const fn registry(&self) -> &ConstraintRegistry {
        &self.registry
    }

    /// Number of ticks completed in this episode.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Current episode.
    #[must_use]
    pub const fn episode(&self) -> EpisodeId {
        self.episode
    }

    /// Evaluates `root` for the current tick.
    ///
    /// The tree is validated first, so hand-built trees get the same checks
    /// as goals built through [`Goal::new`].
    ///
    /// # Errors
    /// A `ValidationError` for a malformed tree, or an `ExecutionError` if a
    /// predicate cannot be evaluated against `scene`. Either way the
    /// temporal state is left as it was before the call.
    pub fn evaluate(&mut self, root: &Expr, scene: &dyn Scene) -> GoalResult<bool> {
        self.run(root, scene, None)
    }

    /// Evaluates a goal's root expression for the current tick.
    ///
    /// # Errors
    /// Same as [`evaluate`](Self::evaluate).
    pub fn evaluate_goal(&mut self, goal: &Goal, scene: &dyn Scene) -> GoalResult<bool> {
        self.evaluate(&goal.root, scene)
    }

    /// Like [`evaluate`](Self::evaluate), also collecting the explanations
    /// of every sequence and watch node reached.
    ///
    /// # Errors
    /// Same as [`evaluate`](Self::evaluate).
    pub fn evaluate_report(&mut self, root: &Expr, scene: &dyn Scene) -> GoalResult<TickReport> {
        let tick = self.tick;
        let mut explanations = Vec::new();
        let satisfied = self.run(root, scene, Some(&mut explanations))?;
        Ok(TickReport {
            episode: self.episode,
            tick,
            satisfied,
            explanations,
        })
    }

    /// Clears all temporal state and starts a new episode.
    pub fn reset(&mut self) {
        let previous = self.episode;
        self.registry.reset();
        self.tick = 0;
        self.episode = EpisodeId::new();
        tracing::info!(previous = %previous, episode = %self.episode, "evaluator reset");
    }

    fn run(
        &mut self,
        root: &Expr,
        scene: &dyn Scene,
        explanations: Option<&mut Vec<Explanation>>,
    ) -> GoalResult<bool> {
        root.validate()?;

        let snapshot = self.registry.clone();
        let mut pass = Pass {
            registry: &mut self.registry,
            config: &self.config,
            scene,
            explanations,
        };

        match pass.eval(root) {
            Ok(satisfied) => {
                tracing::debug!(episode = %self.episode, tick = self.tick, satisfied, "goal evaluated");
                self.tick += 1;
                Ok(satisfied)
            }
            Err(err) => {
                self.registry = snapshot;
                tracing::warn!(episode = %self.episode, tick = self.tick, error = %err, "tick aborted");
                Err(err)
            }
        }
    }
}

/// One walk over the tree.
struct Pass<'e, 's> {
    registry: &'e mut ConstraintRegistry,
    config: &'e EvaluatorConfig,
    scene: &'s dyn Scene,
    explanations: Option<&'e mut Vec<Explanation>>,
}

impl Pass<'_, '_> {
    fn eval(&mut self, expr: &Expr) -> GoalResult<bool> {
        let value = match expr {
            Expr::Atomic { predicate, operands } => {
                let args = predicate::resolve_operands(operands, self.scene)?;
                predicate::evaluate(*predicate, &args, self.config)?
            }
            Expr::Not(child) => !self.eval(child)?,
            Expr::And(children) | Expr::All(children) => self.eval_all(children)?.iter().all(|&v| v),
            Expr::Or(children) | Expr::Any(children) => self.eval_all(children)?.iter().any(|&v| v),
            Expr::Constraint { kind, name, args } => {
                let values = self.eval_all(args)?;
                self.registry.observe(*kind, name, &values)?
            }
            Expr::Sequence { kind, name, steps } => {
                let values = self.eval_all(steps)?;
                let result = self.registry.observe_sequence(*kind, name, &values)?;
                let value = result.value;
                self.record(expr, result);
                value
            }
            Expr::Watch(child) => {
                let observed = self.eval(child)?;
                self.record(expr, BoolResult::new(observed, format!("{child} = {observed}")));
                true
            }
        };
        tracing::trace!(node = %expr.label(), value, "node evaluated");
        Ok(value)
    }

    /// Evaluates every child, in order, without short-circuiting.
    fn eval_all(&mut self, children: &[Expr]) -> GoalResult<Vec<bool>> {
        children.iter().map(|child| self.eval(child)).collect()
    }

    fn record(&mut self, node: &Expr, result: BoolResult) {
        if let Some(out) = self.explanations.as_deref_mut() {
            out.push(Explanation {
                node: node.label(),
                result,
            });
        }
    }
}
