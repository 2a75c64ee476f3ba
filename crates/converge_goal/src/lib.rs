//! Goal graphs and the `seek` evaluation engine for converge (Layer 2).
//!
//! `converge_goal` turns the Layer 1 primitives (state readers, tests,
//! actions) into composite *goal graphs* and evaluates them: the operator
//! describes a desired system condition, and [`Seeker`] drives the
//! observable world toward it through idempotent probes and at-most-once
//! remediation actions.
//!
//! # Core Concepts
//!
//! - [`Goal`] - user-facing handle wrapping one graph node with typed
//!   state/test access and combinators
//! - [`Node`] - the recursive graph datatype (testable, actionable,
//!   operation variants)
//! - [`Op`] - the operator algebra: `and`/`or` sequential, `all`/`any`
//!   concurrent, conjunctive/disjunctive
//! - [`Seeker`] - the evaluation engine: probe, backtrack into
//!   pre-conditions, act at most once, re-probe
//! - [`SeekLogger`](log::SeekLogger) - injected trace sink, silent by
//!   default
//!
//! # Example
//!
//! ```ignore
//! use converge_goal::prelude::*;
//! use converge_state::prelude::*;
//!
//! let service_up = Goal::of(State::new(probe_service))
//!     .action(Action::new(restart_service))
//!     .requires(config_present)
//!     .named("service answers on :8080");
//!
//! if service_up.seek(device).await? {
//!     // world now satisfies the goal
//! }
//! ```
//!
//! # Architecture
//!
//! This crate is Layer 2 of the converge architecture:
//!
//! - **Layer 1** (`converge_state`): state/test/action primitives
//! - **Layer 2** (`converge_goal`): goal graph and evaluation engine
//!   (this crate)

/// User-facing goal handles and combinators.
pub mod goal;

/// Trace sinks for the evaluation engine.
pub mod log;

/// Node types for goal graphs.
pub mod node;

/// The `seek` evaluation engine.
pub mod seeker;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::goal::{Goal, GoalGroup, IntoGoal, always, never};
    pub use crate::log::{NopLogger, RecordingLogger, SeekLogger};
    #[cfg(feature = "tracing")]
    pub use crate::log::TracingLogger;
    pub use crate::node::{Node, Op};
    pub use crate::seeker::{SeekError, Seeker};
}

pub use goal::{Goal, GoalGroup, IntoGoal, always, never};
pub use node::{Node, Op};
pub use seeker::{SeekError, Seeker};
