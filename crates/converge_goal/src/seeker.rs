//! The `seek` evaluation engine.
//!
//! [`Seeker`] walks a goal graph and drives the world toward the described
//! condition: probe first, backtrack into pre-conditions when the probe
//! fails, run the remediation at most once, and re-probe to verify. The
//! walk is re-entrant and idempotent: seeking a goal the world already
//! satisfies returns `true` without side effects.
//!
//! # Example
//!
//! ```ignore
//! use converge_goal::{Seeker, log::RecordingLogger};
//!
//! let trace = RecordingLogger::new();
//! let seeker = Seeker::with_logger(trace.clone());
//! let reached = seeker.seek(&goal, ctx).await?;
//! for line in trace.lines() {
//!     eprintln!("{line}");
//! }
//! ```

use core::fmt;
use std::sync::Arc;

use converge_state::{ActionError, StateError};
use futures::future::{BoxFuture, join_all, try_join_all};

use crate::goal::Goal;
use crate::log::{NopLogger, SeekLogger};
use crate::node::{Actionable, Node, Op, Operation, ProbeFn};

/// Errors that abort a `seek`.
///
/// Returning `false` from `seek` is a normal, recoverable outcome;
/// `SeekError` is reserved for unexpected failures from user-supplied
/// probes and actions. The failing node is identified by its rendered
/// description.
#[derive(Debug)]
pub enum SeekError {
    /// A probe failed with something other than the benign
    /// [`StateNotFound`](converge_state::StateNotFound) signal.
    State {
        /// Rendered description of the failing node.
        goal: String,
        /// The underlying read failure.
        source: StateError,
    },
    /// A remediation action failed.
    Action {
        /// Rendered description of the failing node.
        goal: String,
        /// The underlying action failure.
        source: ActionError,
    },
}

impl SeekError {
    /// Returns the rendered description of the failing node.
    #[must_use]
    pub fn goal(&self) -> &str {
        match self {
            SeekError::State { goal, .. } | SeekError::Action { goal, .. } => goal,
        }
    }
}

impl fmt::Display for SeekError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeekError::State { goal, source } => write!(f, "goal '{goal}': {source}"),
            SeekError::Action { goal, source } => write!(f, "goal '{goal}': {source}"),
        }
    }
}

impl core::error::Error for SeekError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            SeekError::State { source, .. } => Some(source),
            SeekError::Action { source, .. } => Some(source),
        }
    }
}

/// Goal graph evaluation engine.
///
/// The seeker holds no mutable state of its own; the only configuration is
/// the injected trace sink. One seeker can evaluate any number of goals,
/// concurrently or in sequence.
pub struct Seeker {
    logger: Arc<dyn SeekLogger>,
}

impl Default for Seeker {
    fn default() -> Self {
        Self::new()
    }
}

impl Seeker {
    /// Creates a seeker with a silent trace sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            logger: Arc::new(NopLogger),
        }
    }

    /// Creates a seeker that emits one trace line per evaluation event to
    /// the given sink.
    #[must_use]
    pub fn with_logger(logger: impl SeekLogger + 'static) -> Self {
        Self {
            logger: Arc::new(logger),
        }
    }

    /// Drives the world toward the goal.
    ///
    /// Returns `Ok(true)` when the goal is (or has been made) ready and
    /// `Ok(false)` when it could not be reached in this attempt. At most
    /// one action runs per actionable node per traversal.
    ///
    /// # Errors
    ///
    /// Returns [`SeekError`] on an unexpected probe or action failure.
    pub async fn seek<C, T>(&self, goal: &Goal<C, T>, ctx: C) -> Result<bool, SeekError>
    where
        C: Clone + Send + Sync + 'static,
        T: Send + 'static,
    {
        self.seek_node(goal.node(), ctx).await
    }

    /// Recursive node dispatch. Boxed to permit arbitrary nesting.
    fn seek_node<'a, C>(&'a self, node: &'a Node<C>, ctx: C) -> BoxFuture<'a, Result<bool, SeekError>>
    where
        C: Clone + Send + Sync + 'static,
    {
        Box::pin(async move {
            match node {
                Node::Operation(operation) => self.seek_operation(operation, ctx).await,
                Node::Testable(_) => self.seek_testable(node, ctx).await,
                Node::Actionable(actionable) => self.seek_actionable(node, actionable, ctx).await,
            }
        })
    }

    /// Evaluates a combinator node by its operator's rule. No probe or
    /// action runs at this level.
    async fn seek_operation<C>(&self, operation: &Operation<C>, ctx: C) -> Result<bool, SeekError>
    where
        C: Clone + Send + Sync + 'static,
    {
        match operation.op {
            Op::And => {
                for child in &operation.children {
                    if !self.seek_node(child.as_ref(), ctx.clone()).await? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Op::Or => {
                // A rejected child is "not yet true": move on to the next.
                for child in &operation.children {
                    if let Ok(true) = self.seek_node(child.as_ref(), ctx.clone()).await {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Op::All => {
                let seeks = operation
                    .children
                    .iter()
                    .map(|child| self.seek_node(child.as_ref(), ctx.clone()));
                let results = try_join_all(seeks).await?;
                Ok(results.into_iter().all(|ready| ready))
            }
            Op::Any => {
                let seeks = operation
                    .children
                    .iter()
                    .map(|child| self.seek_node(child.as_ref(), ctx.clone()));
                let results = join_all(seeks).await;
                Ok(results
                    .into_iter()
                    .any(|result| matches!(result, Ok(true))))
            }
        }
    }

    /// Probes a bare leaf: no remediation, so a failed probe is final.
    async fn seek_testable<C>(&self, node: &Node<C>, ctx: C) -> Result<bool, SeekError>
    where
        C: Clone + Send + Sync + 'static,
    {
        let label = node.describe(&ctx);
        self.trace(&label, "checking...");
        if self.probe(node.probe(), &label, ctx).await? {
            self.trace(&label, "ready!");
            Ok(true)
        } else {
            self.trace(&label, "failed!");
            Ok(false)
        }
    }

    /// Probes an actionable leaf, backtracking into its pre-conditions and
    /// running its remediation at most once before re-probing.
    async fn seek_actionable<C>(
        &self,
        node: &Node<C>,
        actionable: &Actionable<C>,
        ctx: C,
    ) -> Result<bool, SeekError>
    where
        C: Clone + Send + Sync + 'static,
    {
        let label = node.describe(&ctx);
        self.trace(&label, "checking...");
        if self.probe(&actionable.probe, &label, ctx.clone()).await? {
            self.trace(&label, "ready!");
            return Ok(true);
        }
        self.trace(&label, "not ready");

        if let Some(requirement) = &actionable.requires {
            self.trace(&label, "seeking preconditions...");
            if !self.seek_node(requirement.as_ref(), ctx.clone()).await? {
                self.trace(&label, "failed!");
                return Ok(false);
            }
            self.trace(&label, "preconditions met!");
        }

        if let Some(action) = &actionable.action {
            self.trace(&label, "running the action...");
            action(ctx.clone()).await.map_err(|source| SeekError::Action {
                goal: label.clone(),
                source,
            })?;
        }

        if self.probe(&actionable.probe, &label, ctx).await? {
            self.trace(&label, "ready!");
            Ok(true)
        } else {
            self.trace(&label, "failed!");
            Ok(false)
        }
    }

    /// Runs a probe, demoting the benign `StateNotFound` signal to a
    /// failed test.
    async fn probe<C>(&self, probe: &ProbeFn<C>, label: &str, ctx: C) -> Result<bool, SeekError>
    where
        C: Send + 'static,
    {
        match probe(ctx).await {
            Ok(passed) => Ok(passed),
            Err(err) if err.is_not_found() => Ok(false),
            Err(source) => Err(SeekError::State {
                goal: label.to_owned(),
                source,
            }),
        }
    }

    fn trace(&self, label: &str, event: &str) {
        self.logger.info(&format!("{label}: {event}"));
    }
}
