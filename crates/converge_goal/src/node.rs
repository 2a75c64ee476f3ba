//! Node types for goal graphs.
//!
//! A [`Node`] is the single recursive datatype of a goal graph: a tagged
//! sum of leaf assertions ([`Testable`]), leaf assertions with a
//! remediation ([`Actionable`]), and combinator nodes ([`Operation`]).
//! Any node may additionally carry a description facet used for trace
//! output.
//!
//! Nodes are immutable values behind `Arc`: combinators build new nodes,
//! never mutate, and sub-graphs may be shared between parents. The typed
//! state/test pair that a node was built from lives on the owning
//! [`Goal`](crate::goal::Goal); the node itself stores type-erased probe
//! and remedy closures so that heterogeneous snapshots can coexist in one
//! graph.

use core::fmt;
use std::sync::Arc;

use converge_state::{ActionError, StateError};
use futures::future::BoxFuture;

/// Type-erased probe: reads state and applies the test in one step.
///
/// A probe yields `Ok(passed)`, the benign
/// [`StateNotFound`](converge_state::StateNotFound) signal (demoted to a
/// failed test by the evaluator), or a fatal read error.
pub(crate) type ProbeFn<C> =
    Arc<dyn Fn(C) -> BoxFuture<'static, Result<bool, StateError>> + Send + Sync>;

/// Type-erased remediation: re-reads state (tolerating failure) and runs
/// the action against the fresh snapshot.
pub(crate) type RemedyFn<C> =
    Arc<dyn Fn(C) -> BoxFuture<'static, Result<(), ActionError>> + Send + Sync>;

/// Context-dependent label used for trace output.
pub(crate) type DescribeFn<C> = Arc<dyn Fn(&C) -> String + Send + Sync>;

/// Context re-mapping function shared across every closure of a node.
pub(crate) type ContextFn<C2, C> = Arc<dyn Fn(C2) -> C + Send + Sync>;

/// Operator tag for combinator nodes.
///
/// Two axes: sequential (`And`/`Or`) versus concurrent (`All`/`Any`), and
/// conjunctive (`And`/`All`) versus disjunctive (`Or`/`Any`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// Sequential conjunction; stops at the first child that is not ready.
    And,
    /// Sequential disjunction; stops at the first child that is ready and
    /// treats a child error as "not yet true".
    Or,
    /// Concurrent conjunction; every child is launched.
    All,
    /// Concurrent disjunction; every child is launched and child errors
    /// are absorbed.
    Any,
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Op::And => "and",
            Op::Or => "or",
            Op::All => "all",
            Op::Any => "any",
        };
        write!(f, "{name}")
    }
}

/// A node in a goal graph.
pub enum Node<C> {
    /// A leaf assertion without remediation.
    Testable(Testable<C>),
    /// A leaf assertion with a remediation and an optional pre-condition.
    Actionable(Actionable<C>),
    /// A combinator over child nodes.
    Operation(Operation<C>),
}

/// A leaf assertion: probe the world, report ready or not.
pub struct Testable<C> {
    pub(crate) probe: ProbeFn<C>,
    pub(crate) description: Option<DescribeFn<C>>,
}

/// A leaf assertion extended with a remediation.
///
/// The `action` slot is optional: attaching only a pre-condition still
/// produces an `Actionable`, whose remediation consists of seeking the
/// pre-conditions and re-probing.
pub struct Actionable<C> {
    pub(crate) probe: ProbeFn<C>,
    pub(crate) action: Option<RemedyFn<C>>,
    pub(crate) requires: Option<Arc<Node<C>>>,
    pub(crate) description: Option<DescribeFn<C>>,
}

/// A combinator node over child nodes.
///
/// The aggregated `probe` reflects the children's composed state/test
/// shapes; it exists so an operation can be embedded where a testable
/// interface is required (for example as a `requires` target) and is never
/// consulted when the operation itself is sought.
pub struct Operation<C> {
    pub(crate) op: Op,
    pub(crate) children: Vec<Arc<Node<C>>>,
    pub(crate) probe: ProbeFn<C>,
    pub(crate) description: Option<DescribeFn<C>>,
}

impl<C> Testable<C> {
    pub(crate) fn new(probe: ProbeFn<C>) -> Self {
        Self {
            probe,
            description: None,
        }
    }
}

impl<C> Operation<C> {
    pub(crate) fn new(op: Op, children: Vec<Arc<Node<C>>>, probe: ProbeFn<C>) -> Self {
        Self {
            op,
            children,
            probe,
            description: None,
        }
    }
}

impl<C> Clone for Testable<C> {
    fn clone(&self) -> Self {
        Self {
            probe: Arc::clone(&self.probe),
            description: self.description.clone(),
        }
    }
}

impl<C> Clone for Actionable<C> {
    fn clone(&self) -> Self {
        Self {
            probe: Arc::clone(&self.probe),
            action: self.action.clone(),
            requires: self.requires.clone(),
            description: self.description.clone(),
        }
    }
}

impl<C> Clone for Operation<C> {
    fn clone(&self) -> Self {
        Self {
            op: self.op,
            children: self.children.clone(),
            probe: Arc::clone(&self.probe),
            description: self.description.clone(),
        }
    }
}

impl<C> Clone for Node<C> {
    fn clone(&self) -> Self {
        match self {
            Node::Testable(node) => Node::Testable(node.clone()),
            Node::Actionable(node) => Node::Actionable(node.clone()),
            Node::Operation(node) => Node::Operation(node.clone()),
        }
    }
}

impl<C> Node<C> {
    /// Returns `true` for a bare leaf assertion.
    #[must_use]
    pub fn is_testable(&self) -> bool {
        matches!(self, Node::Testable(_))
    }

    /// Returns `true` for a leaf that carries a remediation or a
    /// pre-condition.
    #[must_use]
    pub fn is_actionable(&self) -> bool {
        matches!(self, Node::Actionable(_))
    }

    /// Returns `true` for a combinator node.
    #[must_use]
    pub fn is_operation(&self) -> bool {
        matches!(self, Node::Operation(_))
    }

    /// Returns the operator tag of a combinator node.
    #[must_use]
    pub fn op(&self) -> Option<Op> {
        match self {
            Node::Operation(operation) => Some(operation.op),
            _ => None,
        }
    }

    /// Returns the children of a combinator node, empty for leaves.
    #[must_use]
    pub fn children(&self) -> &[Arc<Node<C>>] {
        match self {
            Node::Operation(operation) => &operation.children,
            _ => &[],
        }
    }

    /// Renders the node's label for the given context.
    ///
    /// Nodes without a description facet render as `"anonymous goal"`.
    #[must_use]
    pub fn describe(&self, ctx: &C) -> String {
        match self.description() {
            Some(describe) => describe(ctx),
            None => "anonymous goal".to_owned(),
        }
    }

    pub(crate) fn probe(&self) -> &ProbeFn<C> {
        match self {
            Node::Testable(node) => &node.probe,
            Node::Actionable(node) => &node.probe,
            Node::Operation(node) => &node.probe,
        }
    }

    pub(crate) fn description(&self) -> Option<&DescribeFn<C>> {
        match self {
            Node::Testable(node) => node.description.as_ref(),
            Node::Actionable(node) => node.description.as_ref(),
            Node::Operation(node) => node.description.as_ref(),
        }
    }

    /// Rebuilds the node with a description facet.
    pub(crate) fn with_description(self, describe: DescribeFn<C>) -> Self {
        match self {
            Node::Testable(mut node) => {
                node.description = Some(describe);
                Node::Testable(node)
            }
            Node::Actionable(mut node) => {
                node.description = Some(describe);
                Node::Actionable(node)
            }
            Node::Operation(mut node) => {
                node.description = Some(describe);
                Node::Operation(node)
            }
        }
    }

    /// Rebuilds the node with a remediation.
    ///
    /// Attaching an action to an [`Operation`] demotes it to an
    /// [`Actionable`] that keeps the operation's aggregated probe and
    /// discards the operator tag.
    pub(crate) fn with_action(self, remedy: RemedyFn<C>) -> Self {
        match self {
            Node::Testable(node) => Node::Actionable(Actionable {
                probe: node.probe,
                action: Some(remedy),
                requires: None,
                description: node.description,
            }),
            Node::Actionable(mut node) => {
                node.action = Some(remedy);
                Node::Actionable(node)
            }
            Node::Operation(node) => Node::Actionable(Actionable {
                probe: node.probe,
                action: Some(remedy),
                requires: None,
                description: node.description,
            }),
        }
    }

    /// Rebuilds the node with a pre-condition sub-node.
    ///
    /// As with [`with_action`](Self::with_action), attaching a
    /// pre-condition to an [`Operation`] demotes it to an [`Actionable`].
    pub(crate) fn with_requires(self, requirement: Arc<Node<C>>) -> Self {
        match self {
            Node::Testable(node) => Node::Actionable(Actionable {
                probe: node.probe,
                action: None,
                requires: Some(requirement),
                description: node.description,
            }),
            Node::Actionable(mut node) => {
                node.requires = Some(requirement);
                Node::Actionable(node)
            }
            Node::Operation(node) => Node::Actionable(Actionable {
                probe: node.probe,
                action: None,
                requires: Some(requirement),
                description: node.description,
            }),
        }
    }

    /// Structurally re-maps the context of the whole sub-graph.
    ///
    /// Every probe, remedy, and description closure is pre-composed with
    /// `map`; Operation children and `requires` sub-nodes are individually
    /// re-mapped; variant tags are preserved.
    pub(crate) fn map<C2>(&self, map: &ContextFn<C2, C>) -> Node<C2>
    where
        C: 'static,
        C2: Clone + Send + Sync + 'static,
    {
        match self {
            Node::Testable(node) => Node::Testable(Testable {
                probe: map_probe(&node.probe, map),
                description: node.description.as_ref().map(|d| map_describe(d, map)),
            }),
            Node::Actionable(node) => Node::Actionable(Actionable {
                probe: map_probe(&node.probe, map),
                action: node.action.as_ref().map(|remedy| map_remedy(remedy, map)),
                requires: node
                    .requires
                    .as_ref()
                    .map(|requirement| Arc::new(requirement.map(map))),
                description: node.description.as_ref().map(|d| map_describe(d, map)),
            }),
            Node::Operation(node) => Node::Operation(Operation {
                op: node.op,
                children: node
                    .children
                    .iter()
                    .map(|child| Arc::new(child.map(map)))
                    .collect(),
                probe: map_probe(&node.probe, map),
                description: node.description.as_ref().map(|d| map_describe(d, map)),
            }),
        }
    }
}

fn map_probe<C, C2>(probe: &ProbeFn<C>, map: &ContextFn<C2, C>) -> ProbeFn<C2>
where
    C: 'static,
    C2: Send + Sync + 'static,
{
    let probe = Arc::clone(probe);
    let map = Arc::clone(map);
    Arc::new(move |ctx: C2| probe(map(ctx)))
}

fn map_remedy<C, C2>(remedy: &RemedyFn<C>, map: &ContextFn<C2, C>) -> RemedyFn<C2>
where
    C: 'static,
    C2: Send + Sync + 'static,
{
    let remedy = Arc::clone(remedy);
    let map = Arc::clone(map);
    Arc::new(move |ctx: C2| remedy(map(ctx)))
}

fn map_describe<C, C2>(describe: &DescribeFn<C>, map: &ContextFn<C2, C>) -> DescribeFn<C2>
where
    C: 'static,
    C2: Clone + Send + Sync + 'static,
{
    let describe = Arc::clone(describe);
    let map = Arc::clone(map);
    Arc::new(move |ctx: &C2| describe(&map(ctx.clone())))
}

impl<C> fmt::Debug for Node<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Testable(node) => f
                .debug_struct("Testable")
                .field("has_description", &node.description.is_some())
                .finish(),
            Node::Actionable(node) => f
                .debug_struct("Actionable")
                .field("has_action", &node.action.is_some())
                .field("has_requires", &node.requires.is_some())
                .field("has_description", &node.description.is_some())
                .finish(),
            Node::Operation(node) => f
                .debug_struct("Operation")
                .field("op", &node.op)
                .field("children", &node.children.len())
                .field("has_description", &node.description.is_some())
                .finish(),
        }
    }
}
