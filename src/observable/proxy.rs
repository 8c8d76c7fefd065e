// ============================================================================
// spark-observables - Observable
// The tracked view over a target
// ============================================================================

use std::fmt;
use std::rc::Rc;

use super::administration::ObjectAdministration;
use super::error::Result;
use super::graph::Graph;
use super::target::{PropertyReader, Target};
use super::value::{Key, Value};

/// A tracked object or array.
///
/// Reads subscribe the running effect or computed to the property read;
/// writes go to the raw target and notify exactly the properties that
/// changed. Two `Observable`s are equal when they view the same target
/// through the same graph.
///
/// # Example
///
/// ```
/// use spark_observables::{effect, observable, Target};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let todo = observable(Target::object().with("done", false));
/// let todo = todo.as_observable().unwrap().clone();
/// let seen = Rc::new(Cell::new(false));
///
/// let _e = effect({
///     let (todo, seen) = (todo.clone(), seen.clone());
///     move || seen.set(todo.get("done").as_bool().unwrap_or(false))
/// });
///
/// todo.set("done", true).unwrap();
/// assert!(seen.get());
/// ```
#[derive(Clone)]
pub struct Observable {
    target: Target,
    adm: Rc<ObjectAdministration>,
}

impl Observable {
    /// Wrap `target` for `graph`, reusing its administration if it has one.
    pub(crate) fn bind(target: Target, graph: &Graph) -> Self {
        let adm = target.administration_or_init(graph);
        Self { target, adm }
    }

    pub(crate) fn from_parts(target: Target, adm: Rc<ObjectAdministration>) -> Self {
        Self { target, adm }
    }

    pub fn get(&self, key: impl Into<Key>) -> Value {
        self.adm.get(&key.into())
    }

    pub fn set(&self, key: impl Into<Key>, value: impl Into<Value>) -> Result<bool> {
        self.adm.set(&key.into(), value.into())
    }

    pub fn delete(&self, key: impl Into<Key>) -> Result<bool> {
        self.adm.delete(&key.into())
    }

    pub fn has(&self, key: impl Into<Key>) -> bool {
        self.adm.has(&key.into())
    }

    pub fn keys(&self) -> Vec<Key> {
        self.adm.keys()
    }

    pub fn len(&self) -> usize {
        self.adm.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every property value in key order, each read tracked.
    pub fn values(&self) -> Vec<Value> {
        self.keys().into_iter().map(|key| self.adm.get(&key)).collect()
    }

    pub fn push(&self, value: impl Into<Value>) -> Result<usize> {
        self.adm.push(value.into())
    }

    pub fn pop(&self) -> Result<Value> {
        self.adm.pop()
    }

    pub fn is_array(&self) -> bool {
        self.target.is_array()
    }

    /// The raw target. Reading it never tracks.
    pub fn source(&self) -> Target {
        self.target.clone()
    }

    pub fn graph(&self) -> &Graph {
        self.adm.graph()
    }

    pub fn administration(&self) -> &Rc<ObjectAdministration> {
        &self.adm
    }

    pub fn ptr_eq(&self, other: &Observable) -> bool {
        Rc::ptr_eq(&self.adm, &other.adm)
    }

    /// Notify every observer of this object. Returns `self` for chaining.
    pub fn report_changed(&self) -> &Self {
        self.adm.report_changed();
        self
    }

    /// Subscribe the running computation to any change of this object.
    pub fn report_observed(&self, deep: bool) -> &Self {
        self.adm.report_observed(deep);
        self
    }
}

impl PropertyReader for Observable {
    fn read(&self, key: &Key) -> Value {
        self.adm.get(key)
    }
}

impl PartialEq for Observable {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Observable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}
