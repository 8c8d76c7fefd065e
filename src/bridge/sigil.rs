// ============================================================================
// spark-observables - Sigil Access
// `obj.access("$foo")` as an alias for `get_signal(obj, "foo")`
// ============================================================================

use tracing::trace;

use crate::observable::{Key, Observable, Value};

use super::handle::{get_signal, PropertySignal};

/// Result of a sigil-aware property read.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyAccess {
    /// An ordinary tracked read.
    Value(Value),
    /// A sigil name resolved to the signal handle of the stripped name.
    Signal(PropertySignal),
}

impl PropertyAccess {
    pub fn is_signal(&self) -> bool {
        matches!(self, PropertyAccess::Signal(_))
    }

    pub fn into_signal(self) -> Option<PropertySignal> {
        match self {
            PropertyAccess::Signal(s) => Some(s),
            PropertyAccess::Value(_) => None,
        }
    }

    /// The value either way; a signal is read (and tracked).
    pub fn into_value(self) -> Value {
        match self {
            PropertyAccess::Value(v) => v,
            PropertyAccess::Signal(s) => s.get(),
        }
    }
}

/// Signal-handle access on observables.
pub trait SignalAccess {
    /// Same as [`get_signal`].
    fn signal(&self, key: impl Into<Key>) -> PropertySignal;

    /// Read `key`, resolving sigil names.
    ///
    /// A key that exists on the target is always read as-is, even when it
    /// starts with the sigil. Otherwise a name starting with the graph's
    /// sigil yields the signal handle for the rest of the name. Everything
    /// else is an ordinary read.
    ///
    /// Object-valued properties resolve too, but nested objects are meant to
    /// be read as observables rather than through a handle.
    ///
    /// ```
    /// use spark_observables::{get_signal, try_observable, SignalAccess, Target};
    ///
    /// let o = try_observable(Target::object().with("foo", 1)).unwrap();
    /// let handle = o.access("$foo").into_signal().unwrap();
    /// assert_eq!(handle, get_signal(&o, "foo"));
    /// ```
    fn access(&self, key: impl Into<Key>) -> PropertyAccess;
}

impl SignalAccess for Observable {
    fn signal(&self, key: impl Into<Key>) -> PropertySignal {
        get_signal(self, key)
    }

    fn access(&self, key: impl Into<Key>) -> PropertyAccess {
        let key = key.into();
        if self.source().has(&key) {
            return PropertyAccess::Value(self.get(key));
        }

        let stripped = self
            .graph()
            .options()
            .sigil
            .and_then(|sigil| key.strip_sigil(sigil));
        match stripped {
            Some(name) => {
                trace!(%key, "sigil access");
                PropertyAccess::Signal(get_signal(self, name))
            }
            None => PropertyAccess::Value(self.get(key)),
        }
    }
}
