// ============================================================================
// spark-observables - Values & Keys
// The dynamic data stored in observable objects and arrays
// ============================================================================

use std::fmt;
use std::rc::Rc;

use super::proxy::Observable;
use super::target::Target;

// =============================================================================
// KEY
// =============================================================================

/// A property name or array index.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Name(Rc<str>),
    Index(usize),
}

impl Key {
    pub fn name(&self) -> Option<&str> {
        match self {
            Key::Name(name) => Some(name),
            Key::Index(_) => None,
        }
    }

    /// The index this key addresses on an array, accepting canonical
    /// numeric names ("3" but not "03").
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Key::Index(i) => Some(*i),
            Key::Name(name) => {
                let i: usize = name.parse().ok()?;
                (i.to_string() == **name).then_some(i)
            }
        }
    }

    /// Canonical form for a target: indices on arrays, names on objects.
    pub(crate) fn normalize(self, array: bool) -> Key {
        match (array, &self) {
            (true, Key::Name(_)) => self.as_index().map(Key::Index).unwrap_or(self),
            (false, Key::Index(i)) => Key::Name(i.to_string().into()),
            _ => self,
        }
    }

    /// `"$foo"` with sigil `$` gives `Some("foo")`. A bare sigil is not a
    /// sigil name.
    pub fn strip_sigil(&self, sigil: char) -> Option<Key> {
        let rest = self.name()?.strip_prefix(sigil)?;
        (!rest.is_empty()).then(|| Key::from(rest))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Name(name) => f.write_str(name),
            Key::Index(i) => write!(f, "{}", i),
        }
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Name(name) => write!(f, "{:?}", name),
            Key::Index(i) => write!(f, "[{}]", i),
        }
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Name(name.into())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Name(name.into())
    }
}

impl From<Rc<str>> for Key {
    fn from(name: Rc<str>) -> Self {
        Key::Name(name)
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Key::Index(index)
    }
}

/// Integer literals default to `i32`. Negative numbers become names.
impl From<i32> for Key {
    fn from(n: i32) -> Self {
        usize::try_from(n).map_or_else(|_| Key::Name(n.to_string().into()), Key::Index)
    }
}

impl From<&Key> for Key {
    fn from(key: &Key) -> Self {
        key.clone()
    }
}

// =============================================================================
// VALUE
// =============================================================================

/// A dynamically typed property value.
///
/// Equality is "same value": `NaN` equals `NaN`, and objects compare by
/// identity, never by contents.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
    /// A raw object or array. Reading it never tracks.
    Object(Target),
    /// A tracked view over an object or array.
    Observable(Observable),
}

impl Value {
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Objects and arrays, raw or observed.
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_) | Value::Observable(_))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_observable(&self) -> Option<&Observable> {
        match self {
            Value::Observable(o) => Some(o),
            _ => None,
        }
    }

    /// The raw target behind an object value, observed or not.
    pub fn as_target(&self) -> Option<Target> {
        match self {
            Value::Object(t) => Some(t.clone()),
            Value::Observable(o) => Some(o.source()),
            _ => None,
        }
    }

    /// Short type name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Object(t) => t.kind(),
            Value::Observable(o) => o.source().kind(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Observable(a), Value::Observable(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("Undefined"),
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Number(n) => write!(f, "Number({})", n),
            Value::Str(s) => write!(f, "Str({:?})", s),
            Value::Object(t) => write!(f, "Object({:?})", t),
            Value::Observable(o) => write!(f, "{:?}", o),
        }
    }
}

/// Renders the way a text binding would: integral numbers without a
/// fraction, arrays comma-joined.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Value::Number(n) => write!(f, "{}", n),
            Value::Str(s) => f.write_str(s),
            Value::Object(t) => fmt::Display::fmt(t, f),
            Value::Observable(o) => fmt::Display::fmt(&o.source(), f),
        }
    }
}

macro_rules! value_from_number {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::Number(n as f64)
                }
            }
        )*
    };
}

value_from_number!(f64, f32, i32, i64, u32, u64, usize);

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s.into())
    }
}

impl From<Rc<str>> for Value {
    fn from(s: Rc<str>) -> Self {
        Value::Str(s)
    }
}

impl From<Target> for Value {
    fn from(t: Target) -> Self {
        Value::Object(t)
    }
}

impl From<Observable> for Value {
    fn from(o: Observable) -> Self {
        Value::Observable(o)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
