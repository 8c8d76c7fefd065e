// ============================================================================
// spark-observables - Batching
// Coalescing writes and reading without subscribing
// ============================================================================

use crate::core::context::with_context;
use crate::reactivity::scheduling::flush_pending;

/// Run `f`, deferring every effect it dirties until the outermost batch
/// closes. Each effect then runs at most once and sees only final values.
///
/// # Example
///
/// ```
/// use spark_observables::{batch, effect, signal};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let a = signal(1);
/// let b = signal(2);
/// let runs = Rc::new(Cell::new(0));
///
/// let _e = effect({
///     let (a, b, runs) = (a.clone(), b.clone(), runs.clone());
///     move || {
///         let _ = a.get() + b.get();
///         runs.set(runs.get() + 1);
///     }
/// });
///
/// batch(|| {
///     a.set(10);
///     b.set(20);
/// });
///
/// assert_eq!(runs.get(), 2);
/// ```
pub fn batch<T>(f: impl FnOnce() -> T) -> T {
    with_context(|ctx| ctx.enter_batch());

    // Closes the batch even if `f` panics
    struct BatchGuard;

    impl Drop for BatchGuard {
        fn drop(&mut self) {
            let (depth, flushing) = with_context(|ctx| (ctx.exit_batch(), ctx.is_flushing()));
            if depth == 0 && !flushing && !std::thread::panicking() {
                flush_pending();
            }
        }
    }

    let _guard = BatchGuard;
    f()
}

/// Run `f` without registering any reads as dependencies.
pub fn untrack<T>(f: impl FnOnce() -> T) -> T {
    let prev = with_context(|ctx| ctx.set_untracking(true));

    struct UntrackGuard(bool);

    impl Drop for UntrackGuard {
        fn drop(&mut self) {
            with_context(|ctx| ctx.set_untracking(self.0));
        }
    }

    let _guard = UntrackGuard(prev);
    f()
}
