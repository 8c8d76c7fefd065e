// ============================================================================
// spark-observables - Reactive Context
// Per-thread tracking state: who is reading, what was read, batch depth
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use super::types::{AnyReaction, AnySource, Version};

/// All mutable state of the reactive runtime for one thread.
pub struct ReactiveContext {
    /// Reaction currently collecting dependencies
    active_reaction: RefCell<Option<Weak<dyn AnyReaction>>>,

    /// Set inside `untrack`: reads do not register dependencies
    untracking: Cell<bool>,

    /// Bumped on every successful write
    write_version: Cell<Version>,

    /// Id of the reaction run collecting dependencies right now
    read_version: Cell<Version>,

    /// Last run id handed out; never reused, even after a nested run ends
    read_clock: Cell<Version>,

    /// Sources read by the running reaction, in first-read order
    new_deps: RefCell<Vec<Rc<dyn AnySource>>>,

    batch_depth: Cell<u32>,

    /// Effects dirtied while batching or flushing
    pending: RefCell<Vec<Weak<dyn AnyReaction>>>,

    flushing: Cell<bool>,
}

impl ReactiveContext {
    pub fn new() -> Self {
        Self {
            active_reaction: RefCell::new(None),
            untracking: Cell::new(false),
            write_version: Cell::new(1),
            read_version: Cell::new(0),
            read_clock: Cell::new(0),
            new_deps: RefCell::new(Vec::new()),
            batch_depth: Cell::new(0),
            pending: RefCell::new(Vec::new()),
            flushing: Cell::new(false),
        }
    }

    // =========================================================================
    // REACTION TRACKING
    // =========================================================================

    /// Install `reaction` as the active reaction, returning the previous one.
    pub fn set_active_reaction(
        &self,
        reaction: Option<Weak<dyn AnyReaction>>,
    ) -> Option<Weak<dyn AnyReaction>> {
        self.active_reaction.replace(reaction)
    }

    pub fn active_reaction(&self) -> Option<Rc<dyn AnyReaction>> {
        self.active_reaction.borrow().as_ref().and_then(Weak::upgrade)
    }

    pub fn has_active_reaction(&self) -> bool {
        self.active_reaction.borrow().is_some()
    }

    pub fn set_untracking(&self, value: bool) -> bool {
        self.untracking.replace(value)
    }

    pub fn is_untracking(&self) -> bool {
        self.untracking.get()
    }

    // =========================================================================
    // VERSIONS
    // =========================================================================

    pub fn next_write_version(&self) -> Version {
        let v = self.write_version.get() + 1;
        self.write_version.set(v);
        v
    }

    pub fn write_version(&self) -> Version {
        self.write_version.get()
    }

    /// Start a new reaction run with a fresh id.
    pub fn next_read_version(&self) -> Version {
        let v = self.read_clock.get() + 1;
        self.read_clock.set(v);
        self.read_version.set(v);
        v
    }

    pub fn read_version(&self) -> Version {
        self.read_version.get()
    }

    /// Make `version` the current run id again, returning the one it replaces.
    pub fn set_read_version(&self, version: Version) -> Version {
        self.read_version.replace(version)
    }

    pub fn has_new_dep(&self, source: &Rc<dyn AnySource>) -> bool {
        let target = Rc::as_ptr(source) as *const ();
        self.new_deps
            .borrow()
            .iter()
            .any(|dep| Rc::as_ptr(dep) as *const () == target)
    }

    // =========================================================================
    // DEPENDENCY COLLECTION
    // =========================================================================

    pub fn swap_new_deps(&self, deps: Vec<Rc<dyn AnySource>>) -> Vec<Rc<dyn AnySource>> {
        self.new_deps.replace(deps)
    }

    pub fn push_new_dep(&self, source: Rc<dyn AnySource>) {
        self.new_deps.borrow_mut().push(source);
    }

    pub fn new_dep_count(&self) -> usize {
        self.new_deps.borrow().len()
    }

    // =========================================================================
    // BATCHING & FLUSHING
    // =========================================================================

    pub fn enter_batch(&self) -> u32 {
        let depth = self.batch_depth.get() + 1;
        self.batch_depth.set(depth);
        depth
    }

    pub fn exit_batch(&self) -> u32 {
        let depth = self.batch_depth.get().saturating_sub(1);
        self.batch_depth.set(depth);
        depth
    }

    pub fn is_batching(&self) -> bool {
        self.batch_depth.get() > 0
    }

    pub fn push_pending(&self, reaction: Weak<dyn AnyReaction>) {
        self.pending.borrow_mut().push(reaction);
    }

    pub fn take_pending(&self) -> Vec<Weak<dyn AnyReaction>> {
        self.pending.replace(Vec::new())
    }

    pub fn set_flushing(&self, value: bool) -> bool {
        self.flushing.replace(value)
    }

    pub fn is_flushing(&self) -> bool {
        self.flushing.get()
    }
}

impl Default for ReactiveContext {
    fn default() -> Self {
        Self::new()
    }
}

thread_local! {
    static CONTEXT: ReactiveContext = ReactiveContext::new();
}

/// Run `f` against this thread's reactive context.
///
/// Never call back into user code from inside `f`: the closure must only
/// touch the context itself.
pub fn with_context<R>(f: impl FnOnce(&ReactiveContext) -> R) -> R {
    CONTEXT.with(f)
}

/// True inside a reaction and outside `untrack`.
pub fn is_tracking() -> bool {
    with_context(|ctx| ctx.has_active_reaction() && !ctx.is_untracking())
}

pub fn is_batching() -> bool {
    with_context(|ctx| ctx.is_batching())
}
