// ============================================================================
// spark-observables - Computed Values
// Lazy, memoized derivations
// ============================================================================
//
// A computed is a source (others read it) and a reaction (it reads others)
// at once. It only recomputes when pulled while stale, and a MAYBE_DIRTY
// computed first refreshes the computeds it depends on: if none of them
// produced a new value it is marked clean without running.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::core::constants::*;
use crate::core::context::with_context;
use crate::core::types::{
    default_equals, AnyReaction, AnySource, Dependencies, EqualsFn, Reactions, Version,
};
use crate::reactivity::batching::untrack;
use crate::reactivity::tracking::{needs_update, run_tracked, track_read};

// =============================================================================
// COMPUTED INNER
// =============================================================================

pub struct ComputedInner<T> {
    flags: Cell<u32>,
    func: Box<dyn Fn() -> T>,

    /// `None` until the first run
    value: RefCell<Option<T>>,
    equals: EqualsFn<T>,

    write_version: Cell<Version>,
    read_version: Cell<Version>,
    verified_at: Cell<Version>,

    reactions: Reactions,
    deps: Dependencies,

    this: Weak<ComputedInner<T>>,
}

impl<T: 'static> ComputedInner<T> {
    pub fn new(func: impl Fn() -> T + 'static, equals: EqualsFn<T>) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            flags: Cell::new(DERIVED | DIRTY),
            func: Box::new(func),
            value: RefCell::new(None),
            equals,
            write_version: Cell::new(0),
            read_version: Cell::new(0),
            verified_at: Cell::new(0),
            reactions: Reactions::new(),
            deps: Dependencies::new(),
            this: this.clone(),
        })
    }

    fn as_reaction(&self) -> Option<Rc<dyn AnyReaction>> {
        self.this.upgrade().map(|rc| rc as Rc<dyn AnyReaction>)
    }
}

impl<T: 'static> AnySource for ComputedInner<T> {
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

    fn as_computed_reaction(&self) -> Option<Rc<dyn AnyReaction>> {
        self.as_reaction()
    }
}

impl<T: 'static> AnyReaction for ComputedInner<T> {
    fn flags(&self) -> u32 {
        self.flags.get()
    }

    fn set_flags(&self, flags: u32) {
        self.flags.set(flags);
    }

    fn deps(&self) -> &Dependencies {
        &self.deps
    }

    fn verified_at(&self) -> Version {
        self.verified_at.get()
    }

    fn update(&self) -> bool {
        let Some(reaction) = self.as_reaction() else {
            return false;
        };

        let next = run_tracked(&reaction, || (self.func)());

        let changed = match self.value.borrow().as_ref() {
            Some(current) => !(self.equals)(current, &next),
            None => true,
        };

        with_context(|ctx| {
            if changed {
                self.write_version.set(ctx.next_write_version());
            }
            self.verified_at.set(ctx.write_version());
        });

        if changed {
            *self.value.borrow_mut() = Some(next);
        }
        AnyReaction::set_status(self, CLEAN);
        changed
    }

    fn as_computed_source(&self) -> Option<Rc<dyn AnySource>> {
        self.this.upgrade().map(|rc| rc as Rc<dyn AnySource>)
    }
}

// =============================================================================
// REFRESH
// =============================================================================

/// Bring a stale computed (and the stale computeds under it) up to date.
///
/// Walks down to collect the stale chain, then settles it from the deepest
/// node up, so each `needs_update` sees settled dependencies. Iterative for
/// the same reason `mark_reactions` is.
///
/// # Panics
///
/// When a computed ends up reading itself.
pub(crate) fn refresh(target: Rc<dyn AnySource>) {
    if target.flags() & (DIRTY | MAYBE_DIRTY) == 0 {
        return;
    }

    let mut chain: Vec<Rc<dyn AnyReaction>> = Vec::new();
    let mut visited: Vec<*const ()> = Vec::new();
    let mut queue = vec![target];

    while let Some(current) = queue.pop() {
        let ptr = Rc::as_ptr(&current) as *const ();
        if visited.contains(&ptr) {
            continue;
        }
        visited.push(ptr);

        let Some(reaction) = current.as_computed_reaction() else {
            continue;
        };
        if reaction.flags() & REACTION_IS_UPDATING != 0 {
            panic!("Cycle detected: a computed depends on its own value.");
        }

        for dep in reaction.deps().snapshot() {
            if dep.is_computed() && dep.flags() & (DIRTY | MAYBE_DIRTY) != 0 {
                queue.push(dep);
            }
        }
        chain.push(reaction);
    }

    for reaction in chain.into_iter().rev() {
        if needs_update(&*reaction) {
            reaction.update();
        }
    }
}

// =============================================================================
// COMPUTED<T>
// =============================================================================

/// A read-only value derived from other reactive values.
///
/// # Example
///
/// ```
/// use spark_observables::{computed, signal};
///
/// let n = signal(2);
/// let doubled = computed({
///     let n = n.clone();
///     move || n.get() * 2
/// });
///
/// assert_eq!(doubled.get(), 4);
/// n.set(5);
/// assert_eq!(doubled.get(), 10);
/// ```
pub struct Computed<T> {
    inner: Rc<ComputedInner<T>>,
}

impl<T> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + 'static> Computed<T> {
    pub fn new(func: impl Fn() -> T + 'static) -> Self
    where
        T: PartialEq,
    {
        Self::new_with_equals(func, default_equals)
    }

    pub fn new_with_equals(func: impl Fn() -> T + 'static, equals: EqualsFn<T>) -> Self {
        Self {
            inner: ComputedInner::new(func, equals),
        }
    }

    /// The current value, recomputing first if stale. Subscribes the running
    /// reaction.
    pub fn get(&self) -> T {
        let source = self.as_any_source();
        refresh(source.clone());
        track_read(source);
        self.cached()
    }

    /// The current value without subscribing anything.
    pub fn peek(&self) -> T {
        untrack(|| self.get())
    }

    fn cached(&self) -> T {
        self.inner
            .value
            .borrow()
            .clone()
            .expect("computed is refreshed before it is read")
    }

    pub fn as_any_source(&self) -> Rc<dyn AnySource> {
        self.inner.clone()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computed")
            .field("flags", &format_args!("{:#b}", self.inner.flags.get()))
            .finish_non_exhaustive()
    }
}

/// Create a computed value.
pub fn computed<T, F>(func: F) -> Computed<T>
where
    T: Clone + PartialEq + 'static,
    F: Fn() -> T + 'static,
{
    Computed::new(func)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{effect, signal};

    fn counter() -> Rc<Cell<u32>> {
        Rc::new(Cell::new(0))
    }

    #[test]
    fn computes_lazily_and_caches() {
        let n = signal(1);
        let runs = counter();
        let doubled = computed({
            let (n, runs) = (n.clone(), runs.clone());
            move || {
                runs.set(runs.get() + 1);
                n.get() * 2
            }
        });

        assert_eq!(runs.get(), 0);
        assert_eq!(doubled.get(), 2);
        assert_eq!(doubled.get(), 2);
        assert_eq!(runs.get(), 1);

        n.set(4);
        assert_eq!(runs.get(), 1, "recompute waits for the next read");
        assert_eq!(doubled.get(), 8);
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn unchanged_intermediate_stops_propagation() {
        let n = signal(2);
        let parity = computed({
            let n = n.clone();
            move || n.get() % 2
        });
        let label_runs = counter();
        let label = computed({
            let (parity, label_runs) = (parity.clone(), label_runs.clone());
            move || {
                label_runs.set(label_runs.get() + 1);
                if parity.get() == 0 { "even" } else { "odd" }
            }
        });

        assert_eq!(label.get(), "even");
        n.set(4);
        assert_eq!(label.get(), "even");
        assert_eq!(label_runs.get(), 1);

        n.set(5);
        assert_eq!(label.get(), "odd");
        assert_eq!(label_runs.get(), 2);
    }

    #[test]
    fn diamond_runs_effect_once() {
        let a = signal(1);
        let b = computed({
            let a = a.clone();
            move || a.get() + 1
        });
        let c = computed({
            let a = a.clone();
            move || a.get() * 10
        });
        let seen = Rc::new(RefCell::new(Vec::new()));

        let _e = effect({
            let (b, c, seen) = (b.clone(), c.clone(), seen.clone());
            move || seen.borrow_mut().push(b.get() + c.get())
        });

        a.set(2);
        assert_eq!(*seen.borrow(), vec![12, 23]);
    }

    #[test]
    fn peek_inside_effect_does_not_subscribe() {
        let n = signal(1);
        let doubled = computed({
            let n = n.clone();
            move || n.get() * 2
        });
        let runs = counter();

        let _e = effect({
            let (doubled, runs) = (doubled.clone(), runs.clone());
            move || {
                assert!(doubled.peek() > 0);
                runs.set(runs.get() + 1);
            }
        });

        n.set(2);
        assert_eq!(runs.get(), 1);
        assert_eq!(doubled.peek(), 4);
    }

    #[test]
    fn long_chain_settles() {
        let root = signal(0u64);
        let mut tail = computed({
            let root = root.clone();
            move || root.get()
        });
        for _ in 0..200 {
            let prev = tail.clone();
            tail = computed(move || prev.get() + 1);
        }

        assert_eq!(tail.get(), 200);
        root.set(5);
        assert_eq!(tail.get(), 205);
    }
}
