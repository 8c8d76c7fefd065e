// ============================================================================
// spark-observables - Property Signals
// Identity-stable signal handles over single properties
// ============================================================================
//
// A field handle is synthesized on first request and cached by the identity
// of the field's tracking node. The cache holds the node and the handle
// weakly, so it never extends either lifetime: while anyone holds the
// handle, every request for that property returns the same handle.
//
// A getter's handle is its computed node itself; the engine already keeps
// one per property.
// ============================================================================

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::core::types::AnySource;
use crate::observable::{
    get_internal_node, ComputedNode, InternalNode, Key, NodeId, Observable, ObservableError,
    Result, Value,
};
use crate::primitives::{effect, Effect};

// =============================================================================
// HANDLE CACHE
// =============================================================================

/// Inserts between sweeps of dead entries
const PRUNE_INTERVAL: usize = 64;

struct CacheEntry {
    // Holding a Weak also keeps the address from being reused, so a live
    // entry's NodeId cannot collide with a newer node
    node: Weak<dyn AnySource>,
    handle: Weak<FieldSignalInner>,
}

#[derive(Default)]
struct SignalCache {
    entries: HashMap<NodeId, CacheEntry>,
    inserts: usize,
}

impl SignalCache {
    fn lookup(&self, id: NodeId) -> Option<Rc<FieldSignalInner>> {
        let entry = self.entries.get(&id)?;
        if entry.node.strong_count() == 0 {
            return None;
        }
        entry.handle.upgrade()
    }

    fn insert(&mut self, id: NodeId, node: &Rc<dyn AnySource>, handle: &Rc<FieldSignalInner>) {
        self.entries.insert(
            id,
            CacheEntry {
                node: Rc::downgrade(node),
                handle: Rc::downgrade(handle),
            },
        );

        self.inserts += 1;
        if self.inserts >= PRUNE_INTERVAL {
            self.inserts = 0;
            let before = self.entries.len();
            self.entries
                .retain(|_, e| e.node.strong_count() > 0 && e.handle.strong_count() > 0);
            trace!(before, after = self.entries.len(), "signal cache pruned");
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

thread_local! {
    static SIGNAL_CACHE: RefCell<SignalCache> = RefCell::new(SignalCache::default());
}

/// Number of entries in this thread's handle cache, dead ones included
/// until the next sweep.
pub fn cached_signal_count() -> usize {
    SIGNAL_CACHE.with(|cache| cache.borrow().len())
}

// =============================================================================
// HANDLES
// =============================================================================

struct FieldSignalInner {
    object: Observable,
    key: Key,
    id: NodeId,
}

/// Handle over a plain field. Reads and writes go through the observable,
/// so they track and notify like `object.get(key)` / `object.set(key, v)`.
#[derive(Clone)]
pub struct FieldSignal(Rc<FieldSignalInner>);

impl FieldSignal {
    pub fn get(&self) -> Value {
        self.0.object.get(&self.0.key)
    }

    pub fn set(&self, value: impl Into<Value>) -> Result<bool> {
        self.0.object.set(&self.0.key, value)
    }

    /// The raw stored value; never subscribes.
    pub fn peek(&self) -> Value {
        self.0.object.source().get(&self.0.key)
    }

    pub fn object(&self) -> &Observable {
        &self.0.object
    }
}

/// Handle over a getter: the property's memoized computed node.
#[derive(Clone)]
pub struct DerivedSignal {
    node: Rc<dyn ComputedNode>,
    key: Key,
}

impl DerivedSignal {
    pub fn get(&self) -> Value {
        self.node.get()
    }

    pub fn peek(&self) -> Value {
        self.node.peek()
    }
}

/// A signal-shaped handle for one property of an observable.
#[derive(Clone)]
pub enum PropertySignal {
    Field(FieldSignal),
    Derived(DerivedSignal),
}

impl PropertySignal {
    /// Current value, subscribing the running computation.
    pub fn get(&self) -> Value {
        match self {
            PropertySignal::Field(s) => s.get(),
            PropertySignal::Derived(s) => s.get(),
        }
    }

    /// Current value without subscribing.
    pub fn peek(&self) -> Value {
        match self {
            PropertySignal::Field(s) => s.peek(),
            PropertySignal::Derived(s) => s.peek(),
        }
    }

    /// Write through to the property. Getter handles are read-only.
    pub fn set(&self, value: impl Into<Value>) -> Result<bool> {
        match self {
            PropertySignal::Field(s) => s.set(value),
            PropertySignal::Derived(s) => Err(ObservableError::ReadOnly { key: s.key.clone() }),
        }
    }

    pub fn key(&self) -> &Key {
        match self {
            PropertySignal::Field(s) => &s.0.key,
            PropertySignal::Derived(s) => &s.key,
        }
    }

    pub fn is_writable(&self) -> bool {
        matches!(self, PropertySignal::Field(_))
    }

    /// Identity of the tracking node behind this handle.
    pub fn id(&self) -> NodeId {
        match self {
            PropertySignal::Field(s) => s.0.id,
            PropertySignal::Derived(s) => NodeId::of(&s.node.node()),
        }
    }

    pub fn ptr_eq(&self, other: &PropertySignal) -> bool {
        match (self, other) {
            (PropertySignal::Field(a), PropertySignal::Field(b)) => Rc::ptr_eq(&a.0, &b.0),
            (PropertySignal::Derived(a), PropertySignal::Derived(b)) => {
                Rc::ptr_eq(&a.node, &b.node)
            }
            _ => false,
        }
    }

    /// Call `f` with the value now and on every change, from an effect of
    /// its own: whoever calls `subscribe` is not subscribed.
    pub fn subscribe(&self, mut f: impl FnMut(Value) + 'static) -> Effect {
        let this = self.clone();
        effect(move || f(this.get()))
    }
}

impl PartialEq for PropertySignal {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for PropertySignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_writable() { "Field" } else { "Derived" };
        f.debug_struct(kind)
            .field("key", self.key())
            .field("id", &self.id())
            .finish()
    }
}

// =============================================================================
// GET SIGNAL
// =============================================================================

/// The signal handle for `object[key]`.
///
/// Fields (present or not yet present) get a cached [`FieldSignal`]: the
/// same handle comes back for as long as anyone holds it. Getters get their
/// computed node as a read-only [`DerivedSignal`].
///
/// # Example
///
/// ```
/// use spark_observables::{get_signal, try_observable, Target, Value};
///
/// let o = try_observable(Target::object().with("value", 1)).unwrap();
/// let h = get_signal(&o, "value");
/// assert_eq!(h, get_signal(&o, "value"));
///
/// h.set(5).unwrap();
/// assert_eq!(o.get("value"), Value::from(5));
///
/// o.set("value", 9).unwrap();
/// assert_eq!(h.get(), Value::from(9));
/// assert_eq!(h.peek(), Value::from(9));
/// ```
pub fn get_signal(object: &Observable, key: impl Into<Key>) -> PropertySignal {
    let key = key.into();
    let atom = match get_internal_node(object, &key) {
        InternalNode::Computed(node) => {
            return PropertySignal::Derived(DerivedSignal { node, key });
        }
        InternalNode::Atom(atom) => atom,
    };

    let node = atom.node();
    let id = NodeId::of(&node);

    SIGNAL_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        if let Some(inner) = cache.lookup(id) {
            trace!(%key, "signal handle reused");
            return PropertySignal::Field(FieldSignal(inner));
        }

        let inner = Rc::new(FieldSignalInner {
            object: object.clone(),
            key,
            id,
        });
        cache.insert(id, &node, &inner);
        trace!(key = %inner.key, "signal handle created");
        PropertySignal::Field(FieldSignal(inner))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::surface::try_observable;
    use crate::observable::Target;
    use std::cell::Cell;

    fn counter_object() -> Observable {
        try_observable(
            Target::object()
                .with("value", 1)
                .with_getter("double", |this| {
                    Value::from(this.get("value").as_f64().unwrap_or(0.0) * 2.0)
                }),
        )
        .unwrap()
    }

    #[test]
    fn identity_is_stable() {
        let o = counter_object();
        let a = get_signal(&o, "value");
        let b = get_signal(&o, "value");
        assert!(a.ptr_eq(&b));
        assert_eq!(a.id(), b.id());
        assert_ne!(a, get_signal(&o, "double"));
    }

    #[test]
    fn handle_is_recreated_after_drop() {
        let o = counter_object();
        let first = get_signal(&o, "value");
        let id = first.id();
        drop(first);

        let second = get_signal(&o, "value");
        assert_eq!(second.id(), id, "same node");
        assert_eq!(second.get(), Value::from(1));
    }

    #[test]
    fn derived_handle_is_read_only() {
        let o = counter_object();
        let double = get_signal(&o, "double");

        assert!(!double.is_writable());
        assert_eq!(double.get(), Value::from(2));
        assert_eq!(
            double.set(3),
            Err(ObservableError::ReadOnly { key: Key::from("double") })
        );

        o.set("value", 4).unwrap();
        assert_eq!(double.get(), Value::from(8));
        assert_eq!(double, get_signal(&o, "double"));
    }

    #[test]
    fn missing_key_is_a_valid_handle() {
        let o = counter_object();
        let later = get_signal(&o, "later");
        assert!(later.get().is_undefined());

        o.set("later", "now").unwrap();
        assert_eq!(later.get(), Value::from("now"));
        assert_eq!(later, get_signal(&o, "later"));
    }

    #[test]
    fn peek_does_not_subscribe() {
        let o = counter_object();
        let h = get_signal(&o, "value");
        let runs = Rc::new(Cell::new(0));

        let _e = effect({
            let (h, runs) = (h.clone(), runs.clone());
            move || {
                let _ = h.peek();
                runs.set(runs.get() + 1);
            }
        });

        h.set(2).unwrap();
        assert_eq!(runs.get(), 1);
        assert_eq!(h.peek(), Value::from(2));
    }

    #[test]
    fn subscribe_follows_changes() {
        let o = counter_object();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let sub = get_signal(&o, "value").subscribe({
            let seen = seen.clone();
            move |v| seen.borrow_mut().push(v)
        });

        o.set("value", 3).unwrap();
        sub.dispose();
        o.set("value", 4).unwrap();
        assert_eq!(*seen.borrow(), vec![Value::from(1), Value::from(3)]);
    }

    #[test]
    fn array_index_keys_share_a_handle() {
        let list = try_observable(Target::array_from(["a", "b"])).unwrap();
        let by_index = get_signal(&list, 1);
        let by_name = get_signal(&list, "1");
        assert_eq!(by_index, by_name);
    }

    #[test]
    fn cache_prunes_dead_entries() {
        for _ in 0..PRUNE_INTERVAL * 2 {
            let o = counter_object();
            let _ = get_signal(&o, "value");
        }
        assert!(cached_signal_count() <= PRUNE_INTERVAL);
    }
}
