// ============================================================================
// spark-observables - Observable Objects on Fine-Grained Signals
// ============================================================================
//
// Plain objects and arrays become tracked observables whose properties are
// read and written like data. Effects and computeds that read them re-run
// on change, and any single property can be handed out as an
// identity-stable signal handle (`get_signal`, or `access("$name")`).
//
// Layers, leaves first:
//   core / reactivity / primitives - signals, computeds, effects, batching
//   observable                     - the engine, over a capability interface
//   bridge                         - the engine running on signals, plus
//                                    per-property signal handles
// ============================================================================

#[macro_use]
mod macros;

pub mod bridge;
pub mod core;
pub mod observable;
pub mod primitives;
pub mod reactivity;

// Reactive core
pub use core::constants;
pub use core::context::{is_batching, is_tracking};
pub use core::types::{AnyReaction, AnySource, EqualsFn};
pub use primitives::{computed, effect, signal, Computed, Effect, Signal};
pub use reactivity::{batch, untrack};

// Observable engine
pub use observable::{
    Getter, Graph, GraphCapabilities, GraphOptions, InternalNode, Key, NodeId, Observable,
    ObservableClass, ObservableError, Property, PropertyReader, SigilWrites, Subscription, Target,
    Value,
};

// Bridge
pub use bridge::{
    construct, construct_in, get_signal, graph, is_observable, observable, observable_in,
    report_changed, report_observed, signals_graph, source, try_observable, try_observable_in,
    DerivedSignal, FieldSignal, ObserveOptions, PropertyAccess, PropertySignal, SignalAccess,
    SignalsAdapter,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_to_end_round_trip() {
        let o = try_observable(object! { "value" => 1 }).unwrap();
        let h = get_signal(&o, "value");

        h.set(5).unwrap();
        assert_eq!(o.get("value"), Value::from(5));

        o.set("value", 9).unwrap();
        assert_eq!(h.get(), Value::from(9));
        assert_eq!(h.peek(), Value::from(9));
    }

    #[test]
    fn end_to_end_batch() {
        let o = try_observable(object! { "a" => 1, "b" => 2 }).unwrap();
        let runs = std::rc::Rc::new(std::cell::Cell::new(0));

        let _e = effect!(o, runs => {
            o.get("a");
            o.get("b");
            runs.set(runs.get() + 1);
        });

        batch(|| {
            o.set("a", 10).unwrap();
            o.set("b", 20).unwrap();
        });
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn macros_build_targets() {
        assert!(object! {}.is_empty());
        assert!(array![].is_array());
        let list = array![1, 2];
        assert_eq!(list.get(1), Value::from(2));
    }
}
