// ============================================================================
// spark-observables - Graph Node Types
// Type-erased source/reaction traits and the cell behind Signal<T>
// ============================================================================
//
// Graph bookkeeping (status flags, versions, edges) never needs the value
// type, so nodes are stored as `Rc<dyn AnySource>` / `Weak<dyn AnyReaction>`
// and only `Signal<T>` / `Computed<T>` know their `T`.
//
// Edges: a reaction owns its sources strongly (`Dependencies`), a source
// only points back weakly (`Reactions`). Dropping the last handle to an
// effect therefore unsubscribes it.
// ============================================================================

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use super::constants::*;

/// Read and write clocks. Never wraps in practice, so plain `<` / `>`
/// comparisons stay valid.
pub type Version = u64;

// =============================================================================
// EDGE LISTS
// =============================================================================

/// Weak back-edges from a source to the reactions reading it.
#[derive(Default)]
pub struct Reactions {
    list: RefCell<Vec<Weak<dyn AnyReaction>>>,
}

impl Reactions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, reaction: Weak<dyn AnyReaction>) {
        self.list.borrow_mut().push(reaction);
    }

    /// Remove `reaction` (and any dead entries met along the way).
    pub fn remove(&self, reaction: &Rc<dyn AnyReaction>) {
        let target = Rc::as_ptr(reaction) as *const ();
        self.list
            .borrow_mut()
            .retain(|weak| weak.strong_count() > 0 && weak.as_ptr() as *const () != target);
    }

    /// Upgrade every live reaction into an owned Vec.
    ///
    /// The RefCell borrow ends before this returns, so callers can mutate the
    /// graph while walking the result.
    pub fn live(&self) -> Vec<Rc<dyn AnyReaction>> {
        let mut list = self.list.borrow_mut();
        list.retain(|weak| weak.strong_count() > 0);
        list.iter().filter_map(Weak::upgrade).collect()
    }

    pub fn len(&self) -> usize {
        self.list.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Strong forward edges from a reaction to the sources it read last run.
#[derive(Default)]
pub struct Dependencies {
    list: RefCell<Vec<Rc<dyn AnySource>>>,
}

impl Dependencies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, source: Rc<dyn AnySource>) {
        self.list.borrow_mut().push(source);
    }

    /// Detach and return every dependency from `start` onwards.
    pub fn split_off(&self, start: usize) -> Vec<Rc<dyn AnySource>> {
        let mut list = self.list.borrow_mut();
        if start >= list.len() {
            return Vec::new();
        }
        list.split_off(start)
    }

    pub fn snapshot(&self) -> Vec<Rc<dyn AnySource>> {
        self.list.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.list.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// TYPE-ERASED TRAITS
// =============================================================================

/// A node other nodes can depend on: signals and computeds.
pub trait AnySource: Any {
    fn flags(&self) -> u32;

    fn set_flags(&self, flags: u32);

    /// Global write version at which this source last changed
    fn write_version(&self) -> Version;

    fn set_write_version(&self, version: Version);

    /// Read cycle in which this source was last recorded as a dependency
    fn read_version(&self) -> Version;

    fn set_read_version(&self, version: Version);

    fn reactions(&self) -> &Reactions;

    /// The reaction side of a computed; `None` for plain signals.
    fn as_computed_reaction(&self) -> Option<Rc<dyn AnyReaction>> {
        None
    }

    fn is_computed(&self) -> bool {
        self.flags() & DERIVED != 0
    }

    fn is_dirty(&self) -> bool {
        self.flags() & DIRTY != 0
    }

    fn is_clean(&self) -> bool {
        self.flags() & CLEAN != 0
    }

    fn set_status(&self, status: u32) {
        self.set_flags((self.flags() & STATUS_MASK) | status);
    }
}

/// A node that reads sources and must be re-run when they change:
/// computeds and effects.
pub trait AnyReaction: Any {
    fn flags(&self) -> u32;

    fn set_flags(&self, flags: u32);

    fn deps(&self) -> &Dependencies;

    /// Global write version at which this reaction last ran or was verified
    /// clean. A dependency written after this point makes it stale.
    fn verified_at(&self) -> Version;

    /// Re-run the reaction. For computeds, returns whether the value changed.
    fn update(&self) -> bool;

    /// The source side of a computed; `None` for effects.
    fn as_computed_source(&self) -> Option<Rc<dyn AnySource>> {
        None
    }

    fn is_effect(&self) -> bool {
        self.flags() & EFFECT != 0
    }

    fn is_dirty(&self) -> bool {
        self.flags() & DIRTY != 0
    }

    fn is_maybe_dirty(&self) -> bool {
        self.flags() & MAYBE_DIRTY != 0
    }

    fn is_destroyed(&self) -> bool {
        self.flags() & DESTROYED != 0
    }

    fn set_status(&self, status: u32) {
        self.set_flags((self.flags() & STATUS_MASK) | status);
    }
}

// =============================================================================
// SOURCE CELL
// =============================================================================

/// Equality used to decide whether a write is a change
pub type EqualsFn<T> = fn(&T, &T) -> bool;

pub fn default_equals<T: PartialEq>(a: &T, b: &T) -> bool {
    a == b
}

/// The storage behind a `Signal<T>`.
pub struct SourceInner<T> {
    flags: Cell<u32>,
    value: RefCell<T>,
    write_version: Cell<Version>,
    read_version: Cell<Version>,
    reactions: Reactions,
    equals: EqualsFn<T>,
}

impl<T> SourceInner<T> {
    pub fn new(value: T) -> Self
    where
        T: PartialEq,
    {
        Self::new_with_equals(value, default_equals)
    }

    pub fn new_with_equals(value: T, equals: EqualsFn<T>) -> Self {
        Self {
            flags: Cell::new(SOURCE | CLEAN),
            value: RefCell::new(value),
            write_version: Cell::new(0),
            read_version: Cell::new(0),
            reactions: Reactions::new(),
            equals,
        }
    }

    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.value.borrow().clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.borrow())
    }

    /// Store `value` if it differs from the current one. Returns whether it did.
    pub fn replace(&self, value: T) -> bool {
        if (self.equals)(&self.value.borrow(), &value) {
            return false;
        }
        *self.value.borrow_mut() = value;
        true
    }
}

impl<T: 'static> AnySource for SourceInner<T> {
    fn flags(&self) -> u32 {
        self.flags.get()
    }

    fn set_flags(&self, flags: u32) {
        self.flags.set(flags);
    }

    fn write_version(&self) -> Version {
        self.write_version.get()
    }

    fn set_write_version(&self, version: Version) {
        self.write_version.set(version);
    }

    fn read_version(&self) -> Version {
        self.read_version.get()
    }

    fn set_read_version(&self, version: Version) {
        self.read_version.set(version);
    }

    fn reactions(&self) -> &Reactions {
        &self.reactions
    }
}
