// ============================================================================
// spark-observables - Engine Graph
// The capability bundle an observable engine runs on
// ============================================================================
//
// The engine never talks to a reactive library directly. It asks its graph
// to batch, to run effects and to create the two kinds of tracking nodes,
// and any reactive runtime that can provide those four capabilities can
// drive it.
// ============================================================================

use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::core::types::AnySource;

use super::value::Value;

// =============================================================================
// CAPABILITIES
// =============================================================================

/// A disposer returned by [`GraphCapabilities::effect`].
pub trait Subscription {
    /// Stop the effect. Idempotent.
    fn dispose(&self);

    fn is_disposed(&self) -> bool;
}

/// Tracking node for a plain field.
///
/// Carries no value of its own, only a revision counter: the engine stores
/// the data, the atom only routes subscriptions and notifications.
pub trait AtomNode {
    /// The reactive primitive behind this atom.
    fn node(&self) -> Rc<dyn AnySource>;

    /// Bump the revision, notifying every subscriber. Returns the new one.
    fn report_changed(&self) -> u64;

    /// Read the revision, subscribing the running computation.
    fn report_observed(&self) -> u64;
}

/// Tracking node for a getter: a lazy, memoized derivation.
pub trait ComputedNode {
    fn node(&self) -> Rc<dyn AnySource>;

    /// Current value, subscribing the running computation.
    fn get(&self) -> Value;

    /// Current value without subscribing.
    fn peek(&self) -> Value;
}

/// The derivation behind a computed node. It captures the object it is
/// evaluated against.
pub type ComputeFn = Box<dyn Fn() -> Value>;

pub trait GraphCapabilities {
    /// Run `f`, flushing notifications once at the end of the outermost batch.
    fn batch(&self, f: &mut dyn FnMut());

    /// Run `f` now and again whenever something it read changes.
    fn effect(&self, f: Box<dyn FnMut()>) -> Box<dyn Subscription>;

    fn create_computed(&self, f: ComputeFn) -> Rc<dyn ComputedNode>;

    fn create_atom(&self) -> Rc<dyn AtomNode>;
}

// =============================================================================
// INTERNAL NODES
// =============================================================================

/// Identity of a tracking node: the address of its reactive primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn of(source: &Rc<dyn AnySource>) -> Self {
        NodeId(Rc::as_ptr(source) as *const () as usize)
    }
}

/// The tracking node backing one property of an observable.
#[derive(Clone)]
pub enum InternalNode {
    Atom(Rc<dyn AtomNode>),
    Computed(Rc<dyn ComputedNode>),
}

impl InternalNode {
    pub fn source(&self) -> Rc<dyn AnySource> {
        match self {
            InternalNode::Atom(atom) => atom.node(),
            InternalNode::Computed(computed) => computed.node(),
        }
    }

    pub fn id(&self) -> NodeId {
        NodeId::of(&self.source())
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, InternalNode::Computed(_))
    }
}

impl fmt::Debug for InternalNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_computed() { "Computed" } else { "Atom" };
        f.debug_tuple(kind).field(&self.id()).finish()
    }
}

// =============================================================================
// OPTIONS
// =============================================================================

/// What a write to a not-present sigil name (`"$foo"`) does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SigilWrites {
    /// Fail with `ObservableError::SigilWrite`.
    #[default]
    Reject,
    /// Create a literal field with that name.
    Literal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphOptions {
    /// Prefix that turns a property read into a signal-handle read.
    /// `None` disables sigil access.
    pub sigil: Option<char>,
    pub sigil_writes: SigilWrites,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            sigil: Some('$'),
            sigil_writes: SigilWrites::default(),
        }
    }
}

impl GraphOptions {
    pub fn with_sigil(mut self, sigil: Option<char>) -> Self {
        self.sigil = sigil;
        self
    }

    pub fn with_sigil_writes(mut self, policy: SigilWrites) -> Self {
        self.sigil_writes = policy;
        self
    }
}

// =============================================================================
// GRAPH
// =============================================================================

struct GraphInner {
    capabilities: Rc<dyn GraphCapabilities>,
    options: GraphOptions,
}

/// An engine instance: capabilities plus options, fixed at creation.
///
/// Clones share the instance. Observables are bound to the graph that
/// wrapped them.
#[derive(Clone)]
pub struct Graph {
    inner: Rc<GraphInner>,
}

impl Graph {
    pub fn capabilities(&self) -> &dyn GraphCapabilities {
        &*self.inner.capabilities
    }

    pub fn options(&self) -> &GraphOptions {
        &self.inner.options
    }

    pub fn ptr_eq(&self, other: &Graph) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Batch through the graph's capability.
    pub fn batch(&self, f: impl FnOnce()) {
        let mut f = Some(f);
        self.inner.capabilities.batch(&mut || {
            if let Some(f) = f.take() {
                f();
            }
        });
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("options", &self.inner.options)
            .finish_non_exhaustive()
    }
}

/// Build a graph over `capabilities`.
pub fn create_graph(capabilities: Rc<dyn GraphCapabilities>, options: GraphOptions) -> Graph {
    debug!(sigil = ?options.sigil, sigil_writes = ?options.sigil_writes, "graph created");
    Graph {
        inner: Rc::new(GraphInner {
            capabilities,
            options,
        }),
    }
}
