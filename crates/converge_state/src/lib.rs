//! Typed primitives for the converge goal engine (Layer 1).
//!
//! `converge_state` provides the three small pieces every goal is built
//! from, plus the state-absence protocol that ties them together:
//!
//! - [`State`] - an async reader producing a typed snapshot of the world
//!   from a context value
//! - [`Test`] - a pure predicate deciding whether a snapshot satisfies the
//!   goal
//! - [`Action`] - an effectful mutator that moves the world toward the
//!   goal
//! - [`StateNotFound`] - the distinguished signal a reader raises to demote
//!   "the world is unobservable" to an ordinary failed test
//!
//! All three primitives compose in the same shapes (positional tuples,
//! `Vec`s, keyed records for readers and predicates) and all three support
//! context re-mapping, so a piece authored against one context type can be
//! embedded in a graph that threads another.
//!
//! # Architecture
//!
//! This crate is Layer 1 of the converge architecture:
//!
//! - **Layer 1** (`converge_state`): state/test/action primitives (this crate)
//! - **Layer 2** (`converge_goal`): goal graph and the `seek` evaluation engine

/// Effectful remediation actions.
pub mod action;

/// Error types and the state-absence protocol.
pub mod error;

/// Asynchronous state readers and their composition.
pub mod state;


/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::action::Action;
    pub use crate::error::{ActionError, BoxError, StateError, StateNotFound};
    pub use crate::state::{IntoState, State};
    pub use crate::test::{Test, TestGroup};
}

pub use action::Action;
pub use error::{ActionError, BoxError, StateError, StateNotFound};
pub use state::{IntoState, State};
pub use test::{Test, TestGroup};
