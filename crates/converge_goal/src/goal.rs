//! User-facing goal handles and combinators.
//!
//! A [`Goal`] pairs one graph [`Node`] with the typed state/test pair it
//! was built from, so aggregated snapshots stay typed at the API surface
//! while the graph itself stays heterogeneous. Goals are immutable: every
//! combinator rebuilds, and cloning is cheap.
//!
//! # Example
//!
//! ```ignore
//! use converge_goal::prelude::*;
//! use converge_state::prelude::*;
//!
//! #[derive(Clone)]
//! struct Device { config_path: String }
//!
//! let file_exists = Goal::of(State::new(|device: Device| async move {
//!     Ok(std::path::Path::new(&device.config_path).exists())
//! }))
//! .action(Action::new(|device: Device, _| async move {
//!     std::fs::write(&device.config_path, "").map_err(ActionError::new)?;
//!     Ok(())
//! }))
//! .named("config file exists");
//!
//! // file_exists.seek(device).await? drives the world toward the goal.
//! ```

use std::sync::Arc;

use converge_state::{Action, IntoState, State, StateError, Test};
use hashbrown::HashMap;
use variadics_please::all_tuples;

use crate::node::{ContextFn, Node, Op, Operation, ProbeFn, RemedyFn, Testable};
use crate::seeker::{SeekError, Seeker};

/// A user-facing handle over one goal graph node.
///
/// `C` is the context type threaded through every probe, test, and action
/// of a `seek`; `T` is the snapshot type this goal's state reader
/// produces. For combinator goals `T` is the aggregated shape of the
/// children's snapshots (a tuple, `Vec`, or keyed record).
pub struct Goal<C, T> {
    state: State<C, T>,
    test: Test<C, T>,
    node: Arc<Node<C>>,
}

impl<C, T> Clone for Goal<C, T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            test: self.test.clone(),
            node: Arc::clone(&self.node),
        }
    }
}

impl<C, T> core::fmt::Debug for Goal<C, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Goal")
            .field("snapshot_type", &core::any::type_name::<T>())
            .field("node", &self.node)
            .finish()
    }
}

/// Builds the erased probe for a node: read state, apply the test.
fn probe_of<C, T>(state: &State<C, T>, test: &Test<C, T>) -> ProbeFn<C>
where
    C: Clone + Send + Sync + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    let test = test.clone();
    Arc::new(move |ctx: C| {
        let state = state.clone();
        let test = test.clone();
        Box::pin(async move {
            let snapshot = state.read(ctx.clone()).await?;
            Ok(test.check(&ctx, &snapshot))
        })
    })
}

/// Builds the erased remedy for a node: re-read state tolerating any
/// failure, then run the action against the fresh snapshot (or `None`).
fn remedy_of<C, T>(state: &State<C, T>, action: &Action<C, T>) -> RemedyFn<C>
where
    C: Clone + Send + Sync + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    let action = action.clone();
    Arc::new(move |ctx: C| {
        let state = state.clone();
        let action = action.clone();
        Box::pin(async move {
            let snapshot = state.read(ctx.clone()).await.ok();
            action.run(ctx, snapshot).await
        })
    })
}

impl<C, T> Goal<C, T>
where
    C: Clone + Send + Sync + 'static,
    T: Send + 'static,
{
    /// Creates a leaf goal from a state reader and a test.
    #[must_use]
    pub fn new(state: State<C, T>, test: Test<C, T>) -> Self {
        let probe = probe_of(&state, &test);
        Self {
            state,
            test,
            node: Arc::new(Node::Testable(Testable::new(probe))),
        }
    }

    /// Builds a goal from a spec: an existing goal, a boolean state reader
    /// (tested for truthiness), or a tuple, `Vec`, or keyed record of
    /// goals aggregated via [`Op::All`].
    #[must_use]
    pub fn of<G>(spec: G) -> Self
    where
        G: IntoGoal<C, Snapshot = T>,
    {
        spec.into_goal()
    }

    /// Reads this goal's snapshot for the given context.
    ///
    /// # Errors
    ///
    /// Propagates any [`StateError`] from the reader, including the benign
    /// [`StateNotFound`](converge_state::StateNotFound) signal.
    pub async fn state(&self, ctx: C) -> Result<T, StateError> {
        self.state.read(ctx).await
    }

    /// Probes the goal: reads the snapshot and applies the test.
    ///
    /// A [`StateNotFound`](converge_state::StateNotFound) read is swallowed
    /// into `Ok(false)`.
    ///
    /// # Errors
    ///
    /// Propagates any other [`StateError`] from the reader.
    pub async fn test(&self, ctx: C) -> Result<bool, StateError> {
        match self.state.read(ctx.clone()).await {
            Ok(snapshot) => Ok(self.test.check(&ctx, &snapshot)),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Drives the world toward this goal with a silent [`Seeker`].
    ///
    /// Returns `Ok(true)` when the goal is (or has been made) ready and
    /// `Ok(false)` when it could not be reached in this attempt.
    ///
    /// # Errors
    ///
    /// Returns [`SeekError`] on an unexpected probe or action failure.
    pub async fn seek(&self, ctx: C) -> Result<bool, SeekError> {
        Seeker::new().seek(self, ctx).await
    }

    /// Returns the underlying graph node.
    #[must_use]
    pub fn node(&self) -> &Node<C> {
        &self.node
    }

    /// Re-maps the context: the returned goal runs this goal's whole
    /// sub-graph against `map(ctx)`.
    ///
    /// This is the mechanism for plugging a generic sub-goal into a more
    /// specific parent graph.
    #[must_use]
    pub fn map<C2>(&self, map: impl Fn(C2) -> C + Send + Sync + 'static) -> Goal<C2, T>
    where
        C2: Clone + Send + Sync + 'static,
    {
        let map: ContextFn<C2, C> = Arc::new(map);
        let state = {
            let map = Arc::clone(&map);
            self.state.map_context(move |ctx| map(ctx))
        };
        let test = {
            let map = Arc::clone(&map);
            self.test.map_context(move |ctx| map(ctx))
        };
        Goal {
            state,
            test,
            node: Arc::new(self.node.map(&map)),
        }
    }

    /// Attaches a remediation action.
    ///
    /// Attaching an action to an operation goal demotes its node to an
    /// actionable that keeps the operation's aggregated state/test and
    /// loses the operator's evaluation semantics.
    #[must_use]
    pub fn action(self, action: Action<C, T>) -> Self {
        let remedy = remedy_of(&self.state, &action);
        let node = Arc::new(self.node.as_ref().clone().with_action(remedy));
        Self {
            state: self.state,
            test: self.test,
            node,
        }
    }

    /// Attaches a pre-condition goal, evaluated with the same context as
    /// this goal whenever the first probe fails.
    ///
    /// As with [`action`](Self::action), attaching a pre-condition to an
    /// operation goal demotes its node to an actionable.
    #[must_use]
    pub fn requires<U>(self, requirement: Goal<C, U>) -> Self
    where
        U: Send + 'static,
    {
        let node = Arc::new(
            self.node
                .as_ref()
                .clone()
                .with_requires(Arc::clone(&requirement.node)),
        );
        Self {
            state: self.state,
            test: self.test,
            node,
        }
    }

    /// Attaches a context-dependent description used for trace output.
    #[must_use]
    pub fn description(self, describe: impl Fn(&C) -> String + Send + Sync + 'static) -> Self {
        let node = Arc::new(
            self.node
                .as_ref()
                .clone()
                .with_description(Arc::new(describe)),
        );
        Self {
            state: self.state,
            test: self.test,
            node,
        }
    }

    /// Attaches a fixed label used for trace output.
    #[must_use]
    pub fn named(self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.description(move |_| name.clone())
    }

    /// Sequential conjunction: children are sought left to right and the
    /// first child that is not ready stops the traversal.
    ///
    /// # Panics
    ///
    /// Panics if `children` is empty.
    #[must_use]
    pub fn and<G>(children: G) -> Self
    where
        G: GoalGroup<C, Snapshot = T>,
    {
        Self::operation(Op::And, children)
    }

    /// Sequential disjunction: children are sought left to right, the
    /// first ready child stops the traversal, and a child error counts as
    /// "not yet true".
    ///
    /// # Panics
    ///
    /// Panics if `children` is empty.
    #[must_use]
    pub fn or<G>(children: G) -> Self
    where
        G: GoalGroup<C, Snapshot = T>,
    {
        Self::operation(Op::Or, children)
    }

    /// Concurrent conjunction: every child is launched; ready iff every
    /// child resolves ready.
    ///
    /// # Panics
    ///
    /// Panics if `children` is empty.
    #[must_use]
    pub fn all<G>(children: G) -> Self
    where
        G: GoalGroup<C, Snapshot = T>,
    {
        Self::operation(Op::All, children)
    }

    /// Concurrent disjunction: every child is launched; ready iff at least
    /// one child resolves ready. Child errors are absorbed.
    ///
    /// # Panics
    ///
    /// Panics if `children` is empty.
    #[must_use]
    pub fn any<G>(children: G) -> Self
    where
        G: GoalGroup<C, Snapshot = T>,
    {
        Self::operation(Op::Any, children)
    }

    fn operation<G>(op: Op, children: G) -> Self
    where
        G: GoalGroup<C, Snapshot = T>,
    {
        let parts = children.into_parts();
        assert!(
            !parts.nodes.is_empty(),
            "a goal operation needs at least one child"
        );
        let test = match op {
            Op::And | Op::All => parts.all,
            Op::Or | Op::Any => parts.any,
        };
        let probe = probe_of(&parts.state, &test);
        Self {
            state: parts.state,
            test,
            node: Arc::new(Node::Operation(Operation::new(op, parts.nodes, probe))),
        }
    }
}

/// A goal that is unconditionally satisfied.
#[must_use]
pub fn always<C>() -> Goal<C, bool>
where
    C: Clone + Send + Sync + 'static,
{
    Goal::of(State::value(true)).named("always")
}

/// A goal that is never satisfied and has no remediation.
#[must_use]
pub fn never<C>() -> Goal<C, bool>
where
    C: Clone + Send + Sync + 'static,
{
    Goal::of(State::value(false)).named("never")
}

/// The aggregated pieces of a goal group: composed state, conjunctive and
/// disjunctive composed tests, and the children's nodes.
pub struct GoalParts<C, T> {
    pub(crate) state: State<C, T>,
    pub(crate) all: Test<C, T>,
    pub(crate) any: Test<C, T>,
    pub(crate) nodes: Vec<Arc<Node<C>>>,
}

/// A group of goals that can back an operation node.
///
/// Implemented for positional tuples (up to 8 elements, heterogeneous
/// snapshots), `Vec`s, and keyed records of goals.
pub trait GoalGroup<C> {
    /// The aggregated snapshot shape of the group.
    type Snapshot;

    /// Decomposes the group into aggregated state/tests and child nodes.
    fn into_parts(self) -> GoalParts<C, Self::Snapshot>;
}

macro_rules! impl_goal_group_tuple {
    ($(($S:ident, $g:ident)),*) => {
        impl<C, $($S),*> GoalGroup<C> for ($(Goal<C, $S>,)*)
        where
            C: Clone + Send + Sync + 'static,
            $($S: Send + 'static,)*
        {
            type Snapshot = ($($S,)*);

            fn into_parts(self) -> GoalParts<C, ($($S,)*)> {
                let ($($g,)*) = self;
                GoalParts {
                    state: ($($g.state.clone(),)*).into_state(),
                    all: Test::all(($($g.test.clone(),)*)),
                    any: Test::any(($($g.test.clone(),)*)),
                    nodes: vec![$(Arc::clone(&$g.node),)*],
                }
            }
        }
    };
}

all_tuples!(impl_goal_group_tuple, 1, 8, S, g);

impl<C, V> GoalGroup<C> for Vec<Goal<C, V>>
where
    C: Clone + Send + Sync + 'static,
    V: Send + 'static,
{
    type Snapshot = Vec<V>;

    fn into_parts(self) -> GoalParts<C, Vec<V>> {
        let states: Vec<State<C, V>> = self.iter().map(|goal| goal.state.clone()).collect();
        let tests: Vec<Test<C, V>> = self.iter().map(|goal| goal.test.clone()).collect();
        let nodes = self.iter().map(|goal| Arc::clone(&goal.node)).collect();
        GoalParts {
            state: states.into_state(),
            all: Test::all(tests.clone()),
            any: Test::any(tests),
            nodes,
        }
    }
}

impl<C, V> GoalGroup<C> for HashMap<&'static str, Goal<C, V>>
where
    C: Clone + Send + Sync + 'static,
    V: Send + 'static,
{
    type Snapshot = HashMap<&'static str, V>;

    fn into_parts(self) -> GoalParts<C, HashMap<&'static str, V>> {
        let states: HashMap<&'static str, State<C, V>> = self
            .iter()
            .map(|(key, goal)| (*key, goal.state.clone()))
            .collect();
        let tests: HashMap<&'static str, Test<C, V>> = self
            .iter()
            .map(|(key, goal)| (*key, goal.test.clone()))
            .collect();
        let nodes = self.values().map(|goal| Arc::clone(&goal.node)).collect();
        GoalParts {
            state: states.into_state(),
            all: Test::all(tests.clone()),
            any: Test::any(tests),
            nodes,
        }
    }
}

/// Conversion into a [`Goal`], accepted by [`Goal::of`].
pub trait IntoGoal<C> {
    /// The snapshot type of the produced goal.
    type Snapshot;

    /// Performs the conversion.
    fn into_goal(self) -> Goal<C, Self::Snapshot>;
}

impl<C, T> IntoGoal<C> for Goal<C, T>
where
    C: Clone + Send + Sync + 'static,
    T: Send + 'static,
{
    type Snapshot = T;

    fn into_goal(self) -> Goal<C, T> {
        self
    }
}

/// A bare boolean state reader becomes a goal whose test is the snapshot's
/// truthiness.
impl<C> IntoGoal<C> for State<C, bool>
where
    C: Clone + Send + Sync + 'static,
{
    type Snapshot = bool;

    fn into_goal(self) -> Goal<C, bool> {
        Goal::new(self, Test::new(|_, ready: &bool| *ready))
    }
}

macro_rules! impl_into_goal_tuple {
    ($($S:ident),*) => {
        impl<C, $($S),*> IntoGoal<C> for ($(Goal<C, $S>,)*)
        where
            C: Clone + Send + Sync + 'static,
            $($S: Send + 'static,)*
        {
            type Snapshot = ($($S,)*);

            fn into_goal(self) -> Goal<C, ($($S,)*)> {
                Goal::all(self)
            }
        }
    };
}

all_tuples!(impl_into_goal_tuple, 1, 8, S);

impl<C, V> IntoGoal<C> for Vec<Goal<C, V>>
where
    C: Clone + Send + Sync + 'static,
    V: Send + 'static,
{
    type Snapshot = Vec<V>;

    fn into_goal(self) -> Goal<C, Vec<V>> {
        Goal::all(self)
    }
}

impl<C, V> IntoGoal<C> for HashMap<&'static str, Goal<C, V>>
where
    C: Clone + Send + Sync + 'static,
    V: Send + 'static,
{
    type Snapshot = HashMap<&'static str, V>;

    fn into_goal(self) -> Goal<C, HashMap<&'static str, V>> {
        Goal::all(self)
    }
}
