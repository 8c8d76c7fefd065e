// ============================================================================
// spark-observables - Dependency Tracking
// Recording reads and propagating writes through the graph
// ============================================================================
//
// Every walk over an edge list follows collect-then-mutate: the list is
// copied out (`Reactions::live`, `Dependencies::snapshot`) so no RefCell
// borrow is held while flags change or user code runs.
// ============================================================================

use std::rc::Rc;

use crate::core::constants::*;
use crate::core::context::with_context;
use crate::core::types::{AnyReaction, AnySource, Version};
use crate::primitives::computed::refresh;
use crate::reactivity::scheduling::schedule;

// =============================================================================
// TRACK READ
// =============================================================================

/// Register `source` as a dependency of the running reaction, if any.
pub fn track_read(source: Rc<dyn AnySource>) {
    with_context(|ctx| {
        if ctx.is_untracking() {
            return;
        }
        let Some(reaction) = ctx.active_reaction() else {
            return;
        };

        if reaction.flags() & REACTION_IS_UPDATING != 0 {
            // One entry per source per run. A newer stamp comes from a run
            // nested in this one, which may or may not follow our own read.
            let read_version = ctx.read_version();
            let stamp = source.read_version();
            if stamp == read_version {
                return;
            }
            source.set_read_version(read_version);
            if stamp < read_version || !ctx.has_new_dep(&source) {
                ctx.push_new_dep(source);
            }
        } else {
            reaction.deps().push(source.clone());
            source.reactions().add(Rc::downgrade(&reaction));
        }
    });
}

// =============================================================================
// NOTIFY WRITE
// =============================================================================

/// Stamp `source` with a fresh write version and dirty everything
/// downstream of it.
///
/// # Panics
///
/// When called while a computed is running: computeds must be pure.
pub fn notify_write(source: Rc<dyn AnySource>) {
    let inside_computed = with_context(|ctx| {
        source.set_write_version(ctx.next_write_version());
        ctx.active_reaction()
            .is_some_and(|reaction| reaction.flags() & DERIVED != 0)
    });

    if inside_computed {
        panic!(
            "Cannot write to a signal while a computed is running. \
             Computeds must be pure derivations."
        );
    }

    mark_reactions(source, DIRTY);
}

// =============================================================================
// MARK REACTIONS
// =============================================================================

/// Mark the reactions of `source` with `status`, cascading MAYBE_DIRTY
/// through computeds and scheduling every effect that turned dirty.
///
/// Iterative so that long computed chains cannot overflow the stack.
pub fn mark_reactions(source: Rc<dyn AnySource>, status: u32) {
    let mut effects: Vec<Rc<dyn AnyReaction>> = Vec::new();
    let mut stack: Vec<(Rc<dyn AnySource>, u32)> = vec![(source, status)];

    while let Some((current, current_status)) = stack.pop() {
        for reaction in current.reactions().live() {
            let flags = reaction.flags();
            // Anything already stale has had its own reactions marked
            let was_stale = flags & (DIRTY | MAYBE_DIRTY) != 0;

            if flags & DIRTY == 0 {
                reaction.set_status(current_status);
            }
            if was_stale {
                continue;
            }

            if flags & DERIVED != 0 {
                if let Some(as_source) = reaction.as_computed_source() {
                    stack.push((as_source, MAYBE_DIRTY));
                }
            } else if flags & EFFECT != 0 {
                effects.push(reaction);
            }
        }
    }

    for effect in effects {
        schedule(effect);
    }
}

// =============================================================================
// DIRTY CHECK
// =============================================================================

/// Decide whether `reaction` has to re-run.
///
/// DIRTY always does. MAYBE_DIRTY refreshes upstream computeds first and
/// only re-runs if one of them actually produced a new value since the
/// reaction last ran.
pub fn needs_update(reaction: &dyn AnyReaction) -> bool {
    let flags = reaction.flags();
    if flags & DIRTY != 0 {
        return true;
    }
    if flags & MAYBE_DIRTY == 0 {
        return false;
    }

    let verified_at = reaction.verified_at();
    for dep in reaction.deps().snapshot() {
        if dep.is_computed() {
            refresh(dep.clone());
        }
        if dep.write_version() > verified_at {
            return true;
        }
    }

    reaction.set_status(CLEAN);
    false
}

// =============================================================================
// DEPENDENCY INSTALLATION
// =============================================================================

/// Detach `reaction` from every source it depended on.
pub fn remove_reactions(reaction: &Rc<dyn AnyReaction>) {
    for dep in reaction.deps().split_off(0) {
        dep.reactions().remove(reaction);
    }
}

/// Replace the dependencies of `reaction` with `new_deps`, the sources it
/// read during the run that just finished.
pub fn install_dependencies(reaction: &Rc<dyn AnyReaction>, new_deps: Vec<Rc<dyn AnySource>>) {
    remove_reactions(reaction);

    for dep in new_deps {
        dep.reactions().add(Rc::downgrade(reaction));
        reaction.deps().push(dep);
    }
}

/// Run `f` with `reaction` collecting dependencies, then install them.
///
/// Reads inside `f` are tracked even when the caller is inside `untrack`.
/// The previous active reaction is restored afterwards, so reactions can nest
/// (an effect reading a computed that has to recompute).
pub fn run_tracked<R>(reaction: &Rc<dyn AnyReaction>, f: impl FnOnce() -> R) -> R {
    let (prev_reaction, prev_deps, prev_untracking, prev_read_version) = with_context(|ctx| {
        let prev_reaction = ctx.set_active_reaction(Some(Rc::downgrade(reaction)));
        let prev_deps = ctx.swap_new_deps(Vec::new());
        let prev_read_version = ctx.read_version();
        ctx.next_read_version();
        (prev_reaction, prev_deps, ctx.set_untracking(false), prev_read_version)
    });
    reaction.set_flags(reaction.flags() | REACTION_IS_UPDATING);

    // Restores the context even if `f` panics
    struct Restore<'a> {
        reaction: &'a Rc<dyn AnyReaction>,
        prev_reaction: Option<std::rc::Weak<dyn AnyReaction>>,
        prev_deps: Option<Vec<Rc<dyn AnySource>>>,
        prev_untracking: bool,
        prev_read_version: Version,
    }

    impl Drop for Restore<'_> {
        fn drop(&mut self) {
            self.reaction
                .set_flags(self.reaction.flags() & !REACTION_IS_UPDATING);
            let prev_deps = self.prev_deps.take().unwrap_or_default();
            let collected = with_context(|ctx| {
                ctx.set_active_reaction(self.prev_reaction.take());
                ctx.set_untracking(self.prev_untracking);
                ctx.set_read_version(self.prev_read_version);
                ctx.swap_new_deps(prev_deps)
            });
            install_dependencies(self.reaction, collected);
        }
    }

    let _restore = Restore {
        reaction,
        prev_reaction,
        prev_deps: Some(prev_deps),
        prev_untracking,
        prev_read_version,
    };
    f()
}
