// ============================================================================
// spark-observables - Signal Primitive
// The writable reactive cell everything else is built on
// ============================================================================

use std::fmt;
use std::rc::Rc;

use crate::core::types::{AnySource, EqualsFn, SourceInner};
use crate::reactivity::tracking::{notify_write, track_read};

/// A writable reactive value.
///
/// Reading with [`get`](Signal::get) inside an effect or computed subscribes
/// that reaction; [`set`](Signal::set) notifies every subscriber whose view
/// actually changed.
///
/// # Example
///
/// ```
/// use spark_observables::signal;
///
/// let count = signal(0);
/// count.set(5);
/// assert_eq!(count.get(), 5);
/// ```
pub struct Signal<T> {
    inner: Rc<SourceInner<T>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: 'static> Signal<T> {
    pub fn new(value: T) -> Self
    where
        T: PartialEq,
    {
        Self {
            inner: Rc::new(SourceInner::new(value)),
        }
    }

    /// Create a signal whose writes count as changes unless `equals` says
    /// otherwise.
    pub fn new_with_equals(value: T, equals: EqualsFn<T>) -> Self {
        Self {
            inner: Rc::new(SourceInner::new_with_equals(value, equals)),
        }
    }

    /// Read the value, subscribing the running reaction.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        track_read(self.as_any_source());
        self.inner.get()
    }

    /// Read the value without subscribing anything.
    pub fn peek(&self) -> T
    where
        T: Clone,
    {
        self.inner.get()
    }

    /// Borrow the value, subscribing the running reaction.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        track_read(self.as_any_source());
        self.inner.with(f)
    }

    /// Store `value`. Returns whether it differed from the old one; equal
    /// writes notify nobody.
    pub fn set(&self, value: T) -> bool {
        let changed = self.inner.replace(value);
        if changed {
            notify_write(self.as_any_source());
        }
        changed
    }

    /// Modify a copy of the value and store it back.
    pub fn update(&self, f: impl FnOnce(&mut T)) -> bool
    where
        T: Clone,
    {
        let mut value = self.inner.get();
        f(&mut value);
        self.set(value)
    }

    pub fn as_any_source(&self) -> Rc<dyn AnySource> {
        self.inner.clone()
    }

    /// Whether both handles point at the same cell.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: fmt::Debug + Clone + 'static> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal").field("value", &self.peek()).finish()
    }
}

/// Create a new signal.
pub fn signal<T>(value: T) -> Signal<T>
where
    T: PartialEq + 'static,
{
    Signal::new(value)
}
