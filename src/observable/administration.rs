// ============================================================================
// spark-observables - Object Administration
// Per-target, per-graph bookkeeping of tracking nodes
// ============================================================================
//
// Three kinds of atom, all created lazily on first observation:
//   - one per field: reads of that field
//   - a structure atom: keys, `has`, array length
//   - an object atom: "anything changed", used by report_observed
// plus one computed node per getter.
//
// Writes report only on atoms that exist. An atom nobody observed has no
// subscribers to notify.
// ============================================================================

use std::cell::{OnceCell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use tracing::{debug, trace, warn};

use super::error::{ObservableError, Result};
use super::graph::{AtomNode, ComputedNode, Graph, InternalNode, SigilWrites};
use super::proxy::Observable;
use super::target::{Getter, Property, Target, TargetInner};
use super::value::{Key, Value};

pub struct ObjectAdministration {
    target: Weak<TargetInner>,
    graph: Graph,
    object_atom: OnceCell<Rc<dyn AtomNode>>,
    keys_atom: OnceCell<Rc<dyn AtomNode>>,
    values: RefCell<HashMap<Key, Rc<dyn AtomNode>>>,
    computeds: RefCell<HashMap<Key, Rc<dyn ComputedNode>>>,
    this: Weak<ObjectAdministration>,
}

impl ObjectAdministration {
    pub(crate) fn new(target: &Target, graph: Graph) -> Rc<Self> {
        debug!(kind = target.kind(), len = target.len(), "administration created");
        Rc::new_cyclic(|this| Self {
            target: Rc::downgrade(&target.0),
            graph,
            object_atom: OnceCell::new(),
            keys_atom: OnceCell::new(),
            values: RefCell::new(HashMap::new()),
            computeds: RefCell::new(HashMap::new()),
            this: this.clone(),
        })
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn target(&self) -> Option<Target> {
        self.target.upgrade().map(Target)
    }

    fn key_for(&self, target: &Target, key: &Key) -> Key {
        key.clone().normalize(target.is_array())
    }

    // =========================================================================
    // NODES
    // =========================================================================

    fn object_atom(&self) -> &Rc<dyn AtomNode> {
        self.object_atom
            .get_or_init(|| self.graph.capabilities().create_atom())
    }

    fn keys_atom(&self) -> &Rc<dyn AtomNode> {
        self.keys_atom
            .get_or_init(|| self.graph.capabilities().create_atom())
    }

    fn value_atom(&self, key: &Key) -> Rc<dyn AtomNode> {
        if let Some(atom) = self.values.borrow().get(key) {
            return atom.clone();
        }
        let atom = self.graph.capabilities().create_atom();
        trace!(%key, "field atom created");
        self.values.borrow_mut().insert(key.clone(), atom.clone());
        atom
    }

    fn existing_value_atom(&self, key: &Key) -> Option<Rc<dyn AtomNode>> {
        self.values.borrow().get(key).cloned()
    }

    fn computed(&self, key: &Key, getter: Getter) -> Rc<dyn ComputedNode> {
        if let Some(node) = self.computeds.borrow().get(key) {
            return node.clone();
        }

        // Weak on both: the node is owned by this administration, which is
        // owned by the target
        let target = self.target.clone();
        let adm = self.this.clone();
        let node = self
            .graph
            .capabilities()
            .create_computed(Box::new(move || {
                let (Some(target), Some(adm)) = (target.upgrade(), adm.upgrade()) else {
                    return Value::Undefined;
                };
                let this = Observable::from_parts(Target(target), adm);
                getter(&this)
            }));
        trace!(%key, "computed node created");
        self.computeds.borrow_mut().insert(key.clone(), node.clone());
        node
    }

    /// The tracking node behind `key`: a computed for getters, an atom for
    /// everything else, including keys that do not exist yet.
    pub fn internal_node(&self, key: &Key) -> InternalNode {
        let Some(target) = self.target() else {
            return InternalNode::Atom(self.value_atom(key));
        };
        let key = self.key_for(&target, key);
        match target.property(&key) {
            Some(Property::Getter(getter)) => InternalNode::Computed(self.computed(&key, getter)),
            _ if is_length(&target, &key) => InternalNode::Atom(self.keys_atom().clone()),
            _ => InternalNode::Atom(self.value_atom(&key)),
        }
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Tracked read. Nested raw objects come back wrapped for this graph.
    pub fn get(&self, key: &Key) -> Value {
        let Some(target) = self.target() else {
            return Value::Undefined;
        };
        let key = self.key_for(&target, key);

        let value = match target.property(&key) {
            Some(Property::Getter(getter)) => self.computed(&key, getter).get(),
            Some(Property::Field(value)) if is_length(&target, &key) => {
                self.keys_atom().report_observed();
                value
            }
            Some(Property::Field(value)) => {
                self.value_atom(&key).report_observed();
                value
            }
            None => {
                self.value_atom(&key).report_observed();
                Value::Undefined
            }
        };
        self.wrap(value)
    }

    fn wrap(&self, value: Value) -> Value {
        match value {
            Value::Object(target) if !target.is_frozen() => {
                Value::Observable(Observable::bind(target, &self.graph))
            }
            other => other,
        }
    }

    pub fn has(&self, key: &Key) -> bool {
        self.keys_atom().report_observed();
        self.target().is_some_and(|t| t.has(key))
    }

    pub fn keys(&self) -> Vec<Key> {
        self.keys_atom().report_observed();
        self.target().map(|t| t.keys()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.keys_atom().report_observed();
        self.target().map_or(0, |t| t.len())
    }

    // =========================================================================
    // WRITES
    // =========================================================================

    /// Write through to the target and notify. Returns whether the value
    /// changed.
    pub fn set(&self, key: &Key, value: Value) -> Result<bool> {
        let Some(target) = self.target() else {
            return Ok(false);
        };
        let key = self.key_for(&target, key);
        self.check_sigil_write(&target, &key)?;

        let had_key = target.has(&key);
        let old_len = target.len();
        if !target.set(key.clone(), value)? {
            return Ok(false);
        }
        let new_len = target.len();

        self.graph.batch(|| {
            if is_length(&target, &key) {
                for i in new_len.min(old_len)..new_len.max(old_len) {
                    self.report_field(&Key::Index(i));
                }
            } else {
                self.report_field(&key);
            }
            if !had_key || old_len != new_len {
                self.report_structure();
            }
            self.report_object();
        });
        Ok(true)
    }

    pub fn delete(&self, key: &Key) -> Result<bool> {
        let Some(target) = self.target() else {
            return Ok(false);
        };
        let key = self.key_for(&target, key);
        if !target.delete(key.clone())? {
            return Ok(false);
        }

        self.computeds.borrow_mut().remove(&key);
        self.graph.batch(|| {
            self.report_field(&key);
            if !target.is_array() {
                self.report_structure();
            }
            self.report_object();
        });
        Ok(true)
    }

    /// Append to an array. Returns the new length.
    pub fn push(&self, value: Value) -> Result<usize> {
        let Some(target) = self.target() else {
            return Ok(0);
        };
        if !target.is_array() {
            return Err(ObservableError::InvalidKey {
                key: Key::from("push"),
                kind: "object",
            });
        }
        let len = target.len();
        self.set(&Key::Index(len), value)?;
        Ok(len + 1)
    }

    /// Remove the last element of an array.
    pub fn pop(&self) -> Result<Value> {
        let Some(target) = self.target() else {
            return Ok(Value::Undefined);
        };
        if !target.is_array() {
            return Err(ObservableError::InvalidKey {
                key: Key::from("pop"),
                kind: "object",
            });
        }
        let len = target.len();
        if len == 0 {
            return Ok(Value::Undefined);
        }
        let last = target.get(len - 1);
        self.set(&Key::from("length"), Value::from(len - 1))?;
        Ok(self.wrap(last))
    }

    fn check_sigil_write(&self, target: &Target, key: &Key) -> Result<()> {
        let options = self.graph.options();
        let Some(sigil) = options.sigil else {
            return Ok(());
        };
        if options.sigil_writes == SigilWrites::Reject
            && key.strip_sigil(sigil).is_some()
            && !target.has(key)
        {
            warn!(%key, "rejected write to sigil name");
            return Err(ObservableError::SigilWrite { key: key.clone() });
        }
        Ok(())
    }

    // =========================================================================
    // REPORTING
    // =========================================================================

    fn report_field(&self, key: &Key) {
        if let Some(atom) = self.existing_value_atom(key) {
            atom.report_changed();
        }
    }

    fn report_structure(&self) {
        if let Some(atom) = self.keys_atom.get() {
            atom.report_changed();
        }
    }

    fn report_object(&self) {
        if let Some(atom) = self.object_atom.get() {
            atom.report_changed();
        }
    }

    /// Notify everything observing this object, field by field, as if every
    /// property had been rewritten. For raw mutations made through `source`.
    pub fn report_changed(&self) {
        let atoms: Vec<Rc<dyn AtomNode>> = self.values.borrow().values().cloned().collect();
        debug!(fields = atoms.len(), "report_changed");

        self.graph.batch(|| {
            self.object_atom().report_changed();
            self.keys_atom().report_changed();
            for atom in &atoms {
                atom.report_changed();
            }
        });
    }

    /// Subscribe the running computation to any change of this object, and
    /// with `deep` of every object reachable from it.
    pub fn report_observed(&self, deep: bool) {
        self.object_atom().report_observed();
        if deep {
            let mut visited = Vec::new();
            self.observe_nested(&mut visited);
        }
    }

    fn observe_nested(&self, visited: &mut Vec<*const TargetInner>) {
        let Some(target) = self.target() else {
            return;
        };
        let ptr = Rc::as_ptr(&target.0);
        if visited.contains(&ptr) {
            return;
        }
        visited.push(ptr);

        // Structure too, so added or removed children are picked up
        self.keys_atom().report_observed();
        for key in target.keys() {
            let Some(Property::Field(Value::Object(child))) = target.property(&key) else {
                continue;
            };
            if child.is_frozen() {
                continue;
            }
            let adm = child.administration_or_init(&self.graph);
            adm.object_atom().report_observed();
            adm.observe_nested(visited);
        }
    }
}

fn is_length(target: &Target, key: &Key) -> bool {
    target.is_array() && key.name() == Some("length")
}
