// ============================================================================
// spark-observables - Effect Scheduling
// Synchronous flushing of dirtied effects
// ============================================================================
//
// There is no microtask queue: an effect dirtied by a write runs before that
// write returns, unless a batch is open, in which case it runs when the
// outermost batch closes. Effects dirtied while a flush is in progress are
// picked up by the next pass of the same flush.
// ============================================================================

use std::rc::Rc;

use crate::core::constants::*;
use crate::core::context::with_context;
use crate::core::types::AnyReaction;
use crate::reactivity::tracking::needs_update;

/// Queue `effect` and flush right away when nothing is holding the queue.
pub fn schedule(effect: Rc<dyn AnyReaction>) {
    let flush_now = with_context(|ctx| {
        ctx.push_pending(Rc::downgrade(&effect));
        !ctx.is_batching() && !ctx.is_flushing()
    });

    if flush_now {
        flush_pending();
    }
}

/// Run queued effects until the queue stays empty.
///
/// # Panics
///
/// After `MAX_FLUSH_PASSES` passes, which only happens when effects keep
/// dirtying each other (or themselves).
pub fn flush_pending() {
    let was_flushing = with_context(|ctx| ctx.set_flushing(true));

    struct FlushGuard(bool);

    impl Drop for FlushGuard {
        fn drop(&mut self) {
            with_context(|ctx| ctx.set_flushing(self.0));
        }
    }

    let _guard = FlushGuard(was_flushing);
    let mut passes = 0u32;

    loop {
        let pending = with_context(|ctx| ctx.take_pending());
        if pending.is_empty() {
            break;
        }

        passes += 1;
        if passes > MAX_FLUSH_PASSES {
            panic!(
                "Maximum update depth exceeded: an effect keeps writing to \
                 signals it depends on."
            );
        }

        for effect in pending.iter().filter_map(|weak| weak.upgrade()) {
            if effect.is_destroyed() || effect.flags() & EFFECT == 0 {
                continue;
            }
            if needs_update(&*effect) {
                effect.update();
            }
        }
    }
}
