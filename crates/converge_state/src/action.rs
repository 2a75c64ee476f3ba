//! Effectful remediation actions.
//!
//! An [`Action`] mutates the world to move it toward a desired condition.
//! The snapshot argument is optional: the evaluator re-reads state right
//! before acting and substitutes `None` when the re-read fails, so actions
//! must cope with acting blind. Return values are discarded; only
//! success or failure matters. The core never composes actions.

use core::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::error::ActionError;

type RunFn<C, T> = Arc<dyn Fn(C, Option<T>) -> BoxFuture<'static, Result<(), ActionError>> + Send + Sync>;

/// An effectful mutator over a context and an optional snapshot.
pub struct Action<C, T> {
    run: RunFn<C, T>,
}

impl<C, T> Clone for Action<C, T> {
    fn clone(&self) -> Self {
        Self {
            run: Arc::clone(&self.run),
        }
    }
}

impl<C, T> fmt::Debug for Action<C, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("snapshot_type", &core::any::type_name::<T>())
            .finish()
    }
}

impl<C, T> Action<C, T>
where
    C: Send + 'static,
    T: Send + 'static,
{
    /// Creates an action from an async closure.
    #[must_use]
    pub fn new<F, Fut>(run: F) -> Self
    where
        F: Fn(C, Option<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ActionError>> + Send + 'static,
    {
        Self {
            run: Arc::new(move |ctx, snapshot| Box::pin(run(ctx, snapshot))),
        }
    }

    /// Runs the action.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError`] when the mutation fails; the evaluator
    /// treats this as fatal for the enclosing `seek`.
    pub async fn run(&self, ctx: C, snapshot: Option<T>) -> Result<(), ActionError> {
        (self.run)(ctx, snapshot).await
    }

    /// Re-maps the context: the returned action runs `self` against
    /// `map(ctx)`.
    #[must_use]
    pub fn map_context<C2>(&self, map: impl Fn(C2) -> C + Send + Sync + 'static) -> Action<C2, T>
    where
        C2: Send + 'static,
    {
        let run = Arc::clone(&self.run);
        Action {
            run: Arc::new(move |ctx, snapshot| run(map(ctx), snapshot)),
        }
    }
}
