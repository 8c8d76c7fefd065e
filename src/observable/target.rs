// ============================================================================
// spark-observables - Raw Targets
// The untracked objects and arrays that observables wrap
// ============================================================================
//
// A target is plain shared data. Reading or writing it directly never tracks
// and never notifies; that is what `source()` hands out. Each graph that
// wraps a target parks its administration on the target itself, so the
// administration and its tracking nodes live exactly as long as the data.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::administration::ObjectAdministration;
use super::error::{ObservableError, Result};
use super::graph::Graph;
use super::value::{Key, Value};

/// Largest array length a target accepts. Arrays are stored densely, so
/// index and `length` writes past this fail instead of allocating.
pub const MAX_ARRAY_LENGTH: usize = 1 << 24;

// =============================================================================
// PROPERTIES
// =============================================================================

/// Read access handed to getters: tracked when the getter runs against an
/// observable, untracked when it runs against a raw target.
pub trait PropertyReader {
    fn read(&self, key: &Key) -> Value;
}

impl dyn PropertyReader + '_ {
    pub fn get(&self, key: impl Into<Key>) -> Value {
        self.read(&key.into())
    }
}

pub type Getter = Rc<dyn Fn(&dyn PropertyReader) -> Value>;

#[derive(Clone)]
pub enum Property {
    Field(Value),
    /// Derived from other properties; read-only.
    Getter(Getter),
}

pub(crate) enum TargetData {
    Object(IndexMap<Rc<str>, Property>),
    Array(Vec<Value>),
}

pub struct TargetInner {
    data: RefCell<TargetData>,
    frozen: Cell<bool>,
    /// One per graph that wrapped this target
    administrations: RefCell<Vec<Rc<ObjectAdministration>>>,
}

// =============================================================================
// TARGET
// =============================================================================

/// A raw object or array.
///
/// Cloning shares the data. Objects keep their properties in insertion
/// order.
///
/// # Example
///
/// ```
/// use spark_observables::Target;
///
/// let point = Target::object().with("x", 1).with("y", 2);
/// assert_eq!(point.get("x").as_f64(), Some(1.0));
///
/// let list = Target::array_from([1, 2, 3]);
/// assert_eq!(list.len(), 3);
/// ```
#[derive(Clone)]
pub struct Target(pub(crate) Rc<TargetInner>);

impl Target {
    fn from_data(data: TargetData) -> Self {
        Target(Rc::new(TargetInner {
            data: RefCell::new(data),
            frozen: Cell::new(false),
            administrations: RefCell::new(Vec::new()),
        }))
    }

    pub fn object() -> Self {
        Self::from_data(TargetData::Object(IndexMap::new()))
    }

    pub fn array() -> Self {
        Self::from_data(TargetData::Array(Vec::new()))
    }

    pub fn from_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<Rc<str>>,
        V: Into<Value>,
    {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), Property::Field(store(v.into()))))
            .collect();
        Self::from_data(TargetData::Object(map))
    }

    pub fn array_from<V: Into<Value>>(items: impl IntoIterator<Item = V>) -> Self {
        let items = items.into_iter().map(|v| store(v.into())).collect();
        Self::from_data(TargetData::Array(items))
    }

    /// Builder: add or replace a field. On arrays `key` must be an index.
    pub fn with(self, key: impl Into<Key>, value: impl Into<Value>) -> Self {
        let key = key.into().normalize(self.is_array());
        match &mut *self.0.data.borrow_mut() {
            TargetData::Object(map) => {
                if let Key::Name(name) = key {
                    map.insert(name, Property::Field(store(value.into())));
                }
            }
            TargetData::Array(items) => {
                if let Key::Index(i) = key {
                    if i >= items.len() {
                        items.resize(i + 1, Value::Undefined);
                    }
                    items[i] = store(value.into());
                }
            }
        }
        self
    }

    /// Builder: add a derived, read-only property. Ignored on arrays.
    pub fn with_getter(
        self,
        name: impl Into<Rc<str>>,
        getter: impl Fn(&dyn PropertyReader) -> Value + 'static,
    ) -> Self {
        if let TargetData::Object(map) = &mut *self.0.data.borrow_mut() {
            map.insert(name.into(), Property::Getter(Rc::new(getter)));
        }
        self
    }

    /// Make the target read-only. Frozen targets are not wrapped by
    /// `observable`.
    pub fn freeze(&self) -> &Self {
        self.0.frozen.set(true);
        self
    }

    pub fn is_frozen(&self) -> bool {
        self.0.frozen.get()
    }

    pub fn is_array(&self) -> bool {
        matches!(&*self.0.data.borrow(), TargetData::Array(_))
    }

    pub(crate) fn kind(&self) -> &'static str {
        if self.is_array() { "array" } else { "object" }
    }

    pub fn ptr_eq(&self, other: &Target) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// The property stored under `key`, without evaluating getters.
    pub fn property(&self, key: &Key) -> Option<Property> {
        let key = key.clone().normalize(self.is_array());
        match (&*self.0.data.borrow(), &key) {
            (TargetData::Object(map), Key::Name(name)) => map.get(name).cloned(),
            (TargetData::Array(items), Key::Index(i)) => {
                items.get(*i).cloned().map(Property::Field)
            }
            (TargetData::Array(items), Key::Name(name)) if &**name == "length" => {
                Some(Property::Field(Value::from(items.len())))
            }
            _ => None,
        }
    }

    /// Read `key`, evaluating getters against this raw target.
    pub fn get(&self, key: impl Into<Key>) -> Value {
        self.read(&key.into())
    }

    /// Arrays have no holes: every index below the length is present, a
    /// deleted slot included.
    pub fn has(&self, key: impl Into<Key>) -> bool {
        self.property(&key.into()).is_some()
    }

    /// Own keys in order: names for objects, indices for arrays.
    pub fn keys(&self) -> Vec<Key> {
        match &*self.0.data.borrow() {
            TargetData::Object(map) => map.keys().cloned().map(Key::Name).collect(),
            TargetData::Array(items) => (0..items.len()).map(Key::Index).collect(),
        }
    }

    pub fn len(&self) -> usize {
        match &*self.0.data.borrow() {
            TargetData::Object(map) => map.len(),
            TargetData::Array(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // =========================================================================
    // WRITES
    // =========================================================================

    /// Write `key` without notifying anyone. Returns whether the stored value
    /// changed.
    ///
    /// On arrays, writing past the end extends with `Undefined` and writing
    /// `"length"` truncates or extends, up to [`MAX_ARRAY_LENGTH`].
    pub fn set(&self, key: impl Into<Key>, value: impl Into<Value>) -> Result<bool> {
        let key = key.into().normalize(self.is_array());
        let value = store(value.into());
        if self.is_frozen() {
            return Err(ObservableError::Frozen { key });
        }

        match &mut *self.0.data.borrow_mut() {
            TargetData::Object(map) => {
                let Key::Name(name) = &key else {
                    return Err(ObservableError::InvalidKey { key, kind: "object" });
                };
                match map.get_mut(name) {
                    Some(Property::Getter(_)) => Err(ObservableError::ReadOnly { key }),
                    Some(Property::Field(current)) if *current == value => Ok(false),
                    Some(Property::Field(current)) => {
                        *current = value;
                        Ok(true)
                    }
                    None => {
                        map.insert(name.clone(), Property::Field(value));
                        Ok(true)
                    }
                }
            }
            TargetData::Array(items) => match key {
                Key::Index(i) if i < items.len() => {
                    if items[i] == value {
                        return Ok(false);
                    }
                    items[i] = value;
                    Ok(true)
                }
                Key::Index(i) if i >= MAX_ARRAY_LENGTH => {
                    Err(ObservableError::InvalidKey { key, kind: "array" })
                }
                Key::Index(i) => {
                    items.resize(i, Value::Undefined);
                    items.push(value);
                    Ok(true)
                }
                Key::Name(ref name) if &**name == "length" => {
                    let len = array_length(&value).ok_or(ObservableError::InvalidKey {
                        key: key.clone(),
                        kind: "array",
                    })?;
                    if len == items.len() {
                        return Ok(false);
                    }
                    items.resize(len, Value::Undefined);
                    Ok(true)
                }
                Key::Name(_) => Err(ObservableError::InvalidKey { key, kind: "array" }),
            },
        }
    }

    /// Remove `key`. Array slots are reset to `Undefined`; the length stays.
    pub fn delete(&self, key: impl Into<Key>) -> Result<bool> {
        let key = key.into().normalize(self.is_array());
        if self.is_frozen() {
            return Err(ObservableError::Frozen { key });
        }

        match (&mut *self.0.data.borrow_mut(), &key) {
            (TargetData::Object(map), Key::Name(name)) => Ok(map.shift_remove(name).is_some()),
            (TargetData::Array(items), Key::Index(i)) => match items.get_mut(*i) {
                Some(slot) if !slot.is_undefined() => {
                    *slot = Value::Undefined;
                    Ok(true)
                }
                _ => Ok(false),
            },
            (TargetData::Object(_), _) => Err(ObservableError::InvalidKey { key, kind: "object" }),
            (TargetData::Array(_), _) => Err(ObservableError::InvalidKey { key, kind: "array" }),
        }
    }

    // =========================================================================
    // ADMINISTRATIONS
    // =========================================================================

    pub(crate) fn administration(&self, graph: &Graph) -> Option<Rc<ObjectAdministration>> {
        self.0
            .administrations
            .borrow()
            .iter()
            .find(|adm| adm.graph().ptr_eq(graph))
            .cloned()
    }

    /// The administration for `graph`, created on first use.
    pub(crate) fn administration_or_init(&self, graph: &Graph) -> Rc<ObjectAdministration> {
        if let Some(adm) = self.administration(graph) {
            return adm;
        }
        let adm = ObjectAdministration::new(self, graph.clone());
        self.0.administrations.borrow_mut().push(adm.clone());
        adm
    }
}

impl PropertyReader for Target {
    fn read(&self, key: &Key) -> Value {
        match self.property(key) {
            Some(Property::Field(value)) => value,
            Some(Property::Getter(getter)) => getter(self),
            None => Value::Undefined,
        }
    }
}

/// Targets store raw data only: an observable is unwrapped to its target.
fn store(value: Value) -> Value {
    match value {
        Value::Observable(o) => Value::Object(o.source()),
        other => other,
    }
}

fn array_length(value: &Value) -> Option<usize> {
    let n = value.as_f64()?;
    (n >= 0.0 && n.fract() == 0.0 && n <= MAX_ARRAY_LENGTH as f64).then_some(n as usize)
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("kind", &self.kind())
            .field("len", &self.len())
            .field("frozen", &self.is_frozen())
            .finish()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_array() {
            return f.write_str("[object Object]");
        }
        let items = match &*self.0.data.borrow() {
            TargetData::Array(items) => items.clone(),
            TargetData::Object(_) => Vec::new(),
        };
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            if !(item.is_undefined() || item.is_null()) {
                write!(f, "{}", item)?;
            }
        }
        Ok(())
    }
}
