//! Error types shared by the state, test, and action primitives.
//!
//! The only error the engine treats specially is [`StateNotFound`]: a probe
//! raises it to say "the world does not currently present a readable
//! snapshot", and the evaluator demotes it to a failed test instead of
//! aborting. Every other read failure is unexpected and propagates.

/// Boxed error type used for user-supplied probe and action failures.
pub type BoxError = Box<dyn core::error::Error + Send + Sync>;

/// Distinguished signal raised by a state reader to mean "unobservable,
/// treat as a test failure".
///
/// Raising `StateNotFound` is how a probe demotes a read failure (a missing
/// file, an absent container, a 404) to an ordinary "not ready" outcome so
/// that a remediation action still gets a chance to run.
///
/// # Example
///
/// ```ignore
/// let contents = State::new(|path: String| async move {
///     tokio::fs::read_to_string(&path)
///         .await
///         .map_err(|err| StateNotFound::with_cause("config file missing", err).into())
/// });
/// ```
#[derive(Debug, thiserror::Error)]
#[error("state not found: {message}")]
pub struct StateNotFound {
    message: String,
    #[source]
    cause: Option<BoxError>,
}

impl StateNotFound {
    /// Creates a new `StateNotFound` with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    /// Creates a new `StateNotFound` wrapping the underlying read failure.
    #[must_use]
    pub fn with_cause(message: impl Into<String>, cause: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            cause: Some(cause.into()),
        }
    }

    /// Returns the human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors produced while reading a state snapshot.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// The world presents no readable snapshot; the evaluator treats this
    /// as a failed test rather than a fault.
    #[error(transparent)]
    NotFound(#[from] StateNotFound),

    /// An unexpected probe failure, fatal for the subtree being evaluated.
    #[error("state read failed: {0}")]
    Read(#[source] BoxError),
}

impl StateError {
    /// Shorthand for a [`StateNotFound`] with the given message.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(StateNotFound::new(message))
    }

    /// Wraps an unexpected read failure.
    #[must_use]
    pub fn read(err: impl Into<BoxError>) -> Self {
        Self::Read(err.into())
    }

    /// Returns `true` if this error is the benign [`StateNotFound`] signal.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Error from a remediation action. Always fatal: the evaluator propagates
/// it to the caller of `seek`.
#[derive(Debug, thiserror::Error)]
#[error("action failed: {source}")]
pub struct ActionError {
    #[source]
    source: BoxError,
}

impl ActionError {
    /// Wraps the underlying action failure.
    #[must_use]
    pub fn new(source: impl Into<BoxError>) -> Self {
        Self {
            source: source.into(),
        }
    }
}
