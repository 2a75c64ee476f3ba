//! Asynchronous state readers.
//!
//! A [`State`] reads a typed snapshot of the world from a context value.
//! Readers compose: a positional tuple of readers becomes a reader of a
//! tuple snapshot, and a keyed record of readers becomes a reader of a
//! keyed snapshot. Composite children are always evaluated concurrently.
//!
//! # Example
//!
//! ```ignore
//! use converge_state::{State, StateNotFound};
//!
//! #[derive(Clone)]
//! struct Device { config_path: String }
//!
//! let contents = State::new(|device: Device| async move {
//!     std::fs::read_to_string(&device.config_path)
//!         .map_err(|err| StateNotFound::with_cause("config missing", err).into())
//! });
//! ```

use core::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use hashbrown::HashMap;
use variadics_please::all_tuples;

use crate::error::StateError;

type ReadFn<C, T> = Arc<dyn Fn(C) -> BoxFuture<'static, Result<T, StateError>> + Send + Sync>;

/// Reads a typed snapshot of the world from a context.
///
/// A `State` is a shared handle around an async reader `C -> T`; cloning is
/// cheap and clones observe the same reader. A reader signals the
/// distinguished [`StateNotFound`](crate::StateNotFound) to mean
/// "unobservable, treat as test failure"; any other failure propagates as a
/// fault.
pub struct State<C, T> {
    read: ReadFn<C, T>,
}

impl<C, T> Clone for State<C, T> {
    fn clone(&self) -> Self {
        Self {
            read: Arc::clone(&self.read),
        }
    }
}

impl<C, T> fmt::Debug for State<C, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("snapshot_type", &core::any::type_name::<T>())
            .finish()
    }
}

impl<C, T> State<C, T>
where
    C: Send + 'static,
    T: Send + 'static,
{
    /// Creates a state reader from an async closure.
    #[must_use]
    pub fn new<F, Fut>(read: F) -> Self
    where
        F: Fn(C) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, StateError>> + Send + 'static,
    {
        Self {
            read: Arc::new(move |ctx| Box::pin(read(ctx))),
        }
    }

    /// A reader that always yields the same snapshot, ignoring the context.
    #[must_use]
    pub fn value(snapshot: T) -> Self
    where
        T: Clone + Sync,
    {
        Self::new(move |_ctx| {
            let snapshot = snapshot.clone();
            async move { Ok(snapshot) }
        })
    }

    /// Builds a reader from a spec: a single reader, a positional tuple of
    /// readers, a `Vec` of readers, or a keyed record of readers.
    ///
    /// Tuple, `Vec`, and record children are evaluated concurrently; the
    /// composite snapshot preserves positions and keys.
    #[must_use]
    pub fn of<S>(spec: S) -> Self
    where
        S: IntoState<C, Snapshot = T>,
    {
        spec.into_state()
    }

    /// Reads a snapshot for the given context.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::NotFound`] when the world presents no readable
    /// snapshot, or [`StateError::Read`] on any unexpected probe failure.
    pub async fn read(&self, ctx: C) -> Result<T, StateError> {
        (self.read)(ctx).await
    }

    /// Re-maps the context: the returned reader runs `self` against
    /// `map(ctx)`.
    ///
    /// This is the mechanism for embedding a reader authored against one
    /// context type into a graph that threads another.
    #[must_use]
    pub fn map_context<C2>(&self, map: impl Fn(C2) -> C + Send + Sync + 'static) -> State<C2, T>
    where
        C2: Send + 'static,
    {
        let read = Arc::clone(&self.read);
        State {
            read: Arc::new(move |ctx| read(map(ctx))),
        }
    }
}

/// Conversion into a [`State`], implemented for single readers, positional
/// tuples (up to 8 elements), `Vec`s, and keyed records of readers.
pub trait IntoState<C> {
    /// The snapshot type produced by the composed reader.
    type Snapshot;

    /// Performs the conversion.
    fn into_state(self) -> State<C, Self::Snapshot>;
}

impl<C, T> IntoState<C> for State<C, T>
where
    C: Send + 'static,
    T: Send + 'static,
{
    type Snapshot = T;

    fn into_state(self) -> State<C, T> {
        self
    }
}

impl<C, S1> IntoState<C> for (State<C, S1>,)
where
    C: Clone + Send + Sync + 'static,
    S1: Send + 'static,
{
    type Snapshot = (S1,);

    fn into_state(self) -> State<C, (S1,)> {
        let (only,) = self;
        State::new(move |ctx: C| {
            let only = only.clone();
            async move { Ok((only.read(ctx).await?,)) }
        })
    }
}

macro_rules! impl_state_tuple {
    ($(($S:ident, $s:ident)),*) => {
        impl<C, $($S),*> IntoState<C> for ($(State<C, $S>,)*)
        where
            C: Clone + Send + Sync + 'static,
            $($S: Send + 'static,)*
        {
            type Snapshot = ($($S,)*);

            fn into_state(self) -> State<C, ($($S,)*)> {
                let ($($s,)*) = self;
                State::new(move |ctx: C| {
                    $(let $s = $s.clone();)*
                    async move {
                        // All children run to completion; the first failing
                        // child in positional order wins.
                        let ($($s,)*) = futures::join!($($s.read(ctx.clone()),)*);
                        Ok(($($s?,)*))
                    }
                })
            }
        }
    };
}

all_tuples!(impl_state_tuple, 2, 8, S, s);

impl<C, V> IntoState<C> for Vec<State<C, V>>
where
    C: Clone + Send + Sync + 'static,
    V: Send + 'static,
{
    type Snapshot = Vec<V>;

    fn into_state(self) -> State<C, Vec<V>> {
        State::new(move |ctx: C| {
            let readers = self.clone();
            async move {
                let results = futures::future::join_all(readers.into_iter().map(|state| {
                    let ctx = ctx.clone();
                    async move { state.read(ctx).await }
                }))
                .await;
                results.into_iter().collect()
            }
        })
    }
}

impl<C, V> IntoState<C> for HashMap<&'static str, State<C, V>>
where
    C: Clone + Send + Sync + 'static,
    V: Send + 'static,
{
    type Snapshot = HashMap<&'static str, V>;

    fn into_state(self) -> State<C, HashMap<&'static str, V>> {
        State::new(move |ctx: C| {
            let readers: Vec<(&'static str, State<C, V>)> = self
                .iter()
                .map(|(key, state)| (*key, state.clone()))
                .collect();
            async move {
                let results =
                    futures::future::join_all(readers.into_iter().map(|(key, state)| {
                        let ctx = ctx.clone();
                        async move { (key, state.read(ctx).await) }
                    }))
                    .await;
                let mut snapshot = HashMap::with_capacity(results.len());
                for (key, result) in results {
                    snapshot.insert(key, result?);
                }
                Ok(snapshot)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StateNotFound;

    #[tokio::test]
    async fn reads_snapshot_from_context() {
        let double = State::new(|n: i64| async move { Ok(n * 2) });
        assert_eq!(double.read(21).await.unwrap(), 42);
    }

    #[tokio::test]
    async fn value_ignores_context() {
        let constant = State::<(), _>::value("up");
        assert_eq!(constant.read(()).await.unwrap(), "up");
    }

    #[tokio::test]
    async fn tuple_form_preserves_positions() {
        let number = State::new(|_: ()| async move { Ok(10) });
        let text = State::new(|_: ()| async move { Ok("hello".to_owned()) });

        let composite = State::of((number, text));
        let (n, s) = composite.read(()).await.unwrap();
        assert_eq!(n, 10);
        assert_eq!(s, "hello");
    }

    #[tokio::test]
    async fn tuple_form_propagates_not_found() {
        let ok = State::new(|_: ()| async move { Ok(1) });
        let missing: State<(), i32> =
            State::new(|_: ()| async move { Err(StateNotFound::new("gone").into()) });

        let composite = State::of((ok, missing));
        let err = composite.read(()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn tuple_form_first_positional_error_wins() {
        let read_failure: State<(), i32> =
            State::new(|_: ()| async move { Err(StateError::read("boom")) });
        let not_found: State<(), i32> =
            State::new(|_: ()| async move { Err(StateNotFound::new("gone").into()) });

        let composite = State::of((read_failure, not_found));
        let err = composite.read(()).await.unwrap_err();
        assert!(!err.is_not_found());
    }

    #[tokio::test]
    async fn vec_form_orders_by_position() {
        let readers: Vec<State<(), usize>> = (0..4)
            .map(|i| State::new(move |_: ()| async move { Ok(i) }))
            .collect();

        let composite = State::of(readers);
        assert_eq!(composite.read(()).await.unwrap(), vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn record_form_preserves_keys() {
        let mut readers: HashMap<&'static str, State<(), i64>> = HashMap::new();
        readers.insert("cpu", State::new(|_: ()| async move { Ok(75) }));
        readers.insert("mem", State::new(|_: ()| async move { Ok(20) }));

        let composite = State::of(readers);
        let snapshot = composite.read(()).await.unwrap();
        assert_eq!(snapshot.get("cpu"), Some(&75));
        assert_eq!(snapshot.get("mem"), Some(&20));
    }

    #[tokio::test]
    async fn map_context_recomposes_the_reader() {
        #[derive(Clone)]
        struct Outer {
            inner: i64,
        }

        let double = State::new(|n: i64| async move { Ok(n * 2) });
        let mapped = double.map_context(|outer: Outer| outer.inner);
        assert_eq!(mapped.read(Outer { inner: 3 }).await.unwrap(), 6);
    }
}
