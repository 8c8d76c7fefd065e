// ============================================================================
// spark-observables - Signals Adapter
// The reactive core exposed through the engine's capability interface
// ============================================================================

use std::cell::Cell;
use std::rc::Rc;

use tracing::trace;

use crate::core::types::AnySource;
use crate::observable::{AtomNode, ComputeFn, ComputedNode, GraphCapabilities, Subscription, Value};
use crate::primitives::{Computed, Effect, Signal};
use crate::reactivity::batching::batch;

/// Atom over a `Signal<u64>` revision counter.
///
/// The counter carries no meaning; bumping it is simply a write that is
/// never equal to the previous one.
pub struct SignalAtom {
    cell: Signal<u64>,
    revision: Cell<u64>,
}

impl SignalAtom {
    pub fn new() -> Self {
        Self {
            cell: Signal::new(0),
            revision: Cell::new(0),
        }
    }
}

impl Default for SignalAtom {
    fn default() -> Self {
        Self::new()
    }
}

impl AtomNode for SignalAtom {
    fn node(&self) -> Rc<dyn AnySource> {
        self.cell.as_any_source()
    }

    fn report_changed(&self) -> u64 {
        let revision = self.revision.get().wrapping_add(1);
        self.revision.set(revision);
        self.cell.set(revision);
        revision
    }

    fn report_observed(&self) -> u64 {
        self.cell.get()
    }
}

/// Computed node over a `Computed<Value>`.
pub struct SignalComputed {
    computed: Computed<Value>,
}

impl SignalComputed {
    pub fn new(f: ComputeFn) -> Self {
        Self {
            computed: Computed::new(f),
        }
    }
}

impl ComputedNode for SignalComputed {
    fn node(&self) -> Rc<dyn AnySource> {
        self.computed.as_any_source()
    }

    fn get(&self) -> Value {
        self.computed.get()
    }

    fn peek(&self) -> Value {
        self.computed.peek()
    }
}

impl Subscription for Effect {
    fn dispose(&self) {
        Effect::dispose(self);
    }

    fn is_disposed(&self) -> bool {
        Effect::is_disposed(self)
    }
}

/// Graph capabilities backed by this crate's signals.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalsAdapter;

impl GraphCapabilities for SignalsAdapter {
    fn batch(&self, f: &mut dyn FnMut()) {
        batch(f);
    }

    fn effect(&self, f: Box<dyn FnMut()>) -> Box<dyn Subscription> {
        Box::new(crate::primitives::effect(f))
    }

    fn create_computed(&self, f: ComputeFn) -> Rc<dyn ComputedNode> {
        trace!("computed created");
        Rc::new(SignalComputed::new(f))
    }

    fn create_atom(&self) -> Rc<dyn AtomNode> {
        trace!("atom created");
        Rc::new(SignalAtom::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect;
    use std::cell::RefCell;

    #[test]
    fn atom_always_notifies() {
        let atom = SignalAtom::new();
        let runs = Rc::new(Cell::new(0));

        let _e = effect({
            let (cell, runs) = (atom.cell.clone(), runs.clone());
            move || {
                let _ = cell.get();
                runs.set(runs.get() + 1);
            }
        });

        assert_eq!(atom.report_changed(), 1);
        assert_eq!(atom.report_changed(), 2);
        assert_eq!(runs.get(), 3);
        assert_eq!(atom.report_observed(), 2);
    }

    #[test]
    fn capability_batch_coalesces() {
        let adapter = SignalsAdapter;
        let atom = adapter.create_atom();
        let runs = Rc::new(Cell::new(0));

        let _e = effect({
            let (atom, runs) = (atom.clone(), runs.clone());
            move || {
                atom.report_observed();
                runs.set(runs.get() + 1);
            }
        });

        adapter.batch(&mut || {
            atom.report_changed();
            atom.report_changed();
        });
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn capability_effect_disposes() {
        let adapter = SignalsAdapter;
        let atom = adapter.create_atom();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let sub = adapter.effect(Box::new({
            let (atom, seen) = (atom.clone(), seen.clone());
            move || seen.borrow_mut().push(atom.report_observed())
        }));

        atom.report_changed();
        sub.dispose();
        sub.dispose();
        assert!(sub.is_disposed());
        atom.report_changed();
        assert_eq!(*seen.borrow(), vec![0, 1]);
    }

    #[test]
    fn computed_node_memoizes() {
        let adapter = SignalsAdapter;
        let calls = Rc::new(Cell::new(0));
        let node = adapter.create_computed(Box::new({
            let calls = calls.clone();
            move || {
                calls.set(calls.get() + 1);
                Value::from("x")
            }
        }));

        assert_eq!(node.get(), Value::from("x"));
        assert_eq!(node.peek(), Value::from("x"));
        assert_eq!(calls.get(), 1);
        assert!(node.node().is_computed());
    }
}
