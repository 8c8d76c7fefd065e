// ============================================================================
// spark-observables - Effects
// Side-effecting reactions that re-run when what they read changes
// ============================================================================
//
// An effect runs once on creation and again, synchronously, whenever a
// dependency changes (or when the outermost batch closes). Each run happens
// inside an implicit batch, so writes made by the effect are flushed after
// it returns rather than re-entering it.
//
// The graph only holds effects weakly. Dropping the last `Effect` handle
// disposes it.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::core::constants::*;
use crate::core::context::with_context;
use crate::core::types::{AnyReaction, Dependencies, Version};
use crate::reactivity::batching::batch;
use crate::reactivity::tracking::{remove_reactions, run_tracked};

type EffectFn = Box<dyn FnMut()>;

// =============================================================================
// EFFECT INNER
// =============================================================================

pub struct EffectInner {
    flags: Cell<u32>,

    /// Taken out while running and dropped on dispose
    func: RefCell<Option<EffectFn>>,

    deps: Dependencies,
    verified_at: Cell<Version>,

    this: Weak<EffectInner>,
}

impl EffectInner {
    fn new(func: EffectFn) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            flags: Cell::new(EFFECT | DIRTY),
            func: RefCell::new(Some(func)),
            deps: Dependencies::new(),
            verified_at: Cell::new(0),
            this: this.clone(),
        })
    }

    fn destroy(&self) {
        if self.is_destroyed() {
            return;
        }
        self.flags.set(self.flags.get() | DESTROYED);
        if let Some(reaction) = self.this.upgrade() {
            remove_reactions(&(reaction as Rc<dyn AnyReaction>));
        }
        // Captured handles go away now, not when the last Rc does
        let func = self.func.borrow_mut().take();
        drop(func);
        trace!("effect disposed");
    }
}

impl AnyReaction for EffectInner {
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
        let flags = self.flags.get();
        if flags & (DESTROYED | REACTION_IS_UPDATING) != 0 {
            return false;
        }
        let Some(reaction) = self.this.upgrade() else {
            return false;
        };
        let Some(mut func) = self.func.borrow_mut().take() else {
            return false;
        };

        self.set_status(CLEAN);
        let reaction: Rc<dyn AnyReaction> = reaction;
        batch(|| {
            run_tracked(&reaction, &mut func);
            self.verified_at.set(with_context(|ctx| ctx.write_version()));

            // Back in place before the batch flushes: that flush may need
            // to run this effect again
            if self.is_destroyed() {
                // Disposed from inside its own run
                remove_reactions(&reaction);
            } else {
                *self.func.borrow_mut() = Some(func);
            }
        });
        true
    }
}

// =============================================================================
// EFFECT HANDLE
// =============================================================================

/// Handle to a running effect.
///
/// Clones share the effect. It stops when [`dispose`](Effect::dispose) is
/// called or when the last clone is dropped.
pub struct Effect {
    inner: Rc<EffectInner>,
}

impl Effect {
    /// Stop the effect for good. Idempotent.
    pub fn dispose(&self) {
        self.inner.destroy();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.is_destroyed()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Clone for Effect {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl Drop for Effect {
    fn drop(&mut self) {
        if Rc::strong_count(&self.inner) == 1 {
            self.inner.destroy();
        }
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("disposed", &self.is_disposed())
            .field("deps", &self.inner.deps.len())
            .finish()
    }
}

/// Run `func` now and again whenever anything it read changes.
///
/// # Example
///
/// ```
/// use spark_observables::{effect, signal};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let name = signal("Ada");
/// let greeting = Rc::new(Cell::new(""));
///
/// let handle = effect({
///     let (name, greeting) = (name.clone(), greeting.clone());
///     move || greeting.set(name.get())
/// });
///
/// name.set("Grace");
/// assert_eq!(greeting.get(), "Grace");
///
/// handle.dispose();
/// name.set("Edsger");
/// assert_eq!(greeting.get(), "Grace");
/// ```
pub fn effect(func: impl FnMut() + 'static) -> Effect {
    let inner = EffectInner::new(Box::new(func));
    inner.update();
    Effect { inner }
}
