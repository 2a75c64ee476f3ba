//! A declarative goal engine for building self-healing agents on edge devices.
//!
//! Describe a desired system condition as a composite goal graph, call
//! `seek`, and the engine drives the observable world toward that
//! condition through idempotent probes and at-most-once remediation
//! actions.

/// Layer 1: state, test, and action primitives.
pub use converge_state;

/// Layer 2: goal graphs and the `seek` evaluation engine.
pub use converge_goal;

pub use converge_goal::{Goal, Node, Op, SeekError, Seeker, always, never};
pub use converge_state::{Action, State, StateError, StateNotFound, Test};

/// Re-export all common types for easy access.
pub mod prelude {
    pub use converge_goal::prelude::*;
    pub use converge_state::prelude::*;
}
