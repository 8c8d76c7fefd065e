// ============================================================================
// spark-observables - Bridge
// The observable engine running on signals, and signal handles over its
// properties
// ============================================================================

pub mod adapter;
pub mod graph;
pub mod handle;
pub mod sigil;
pub mod surface;

pub use adapter::{SignalAtom, SignalComputed, SignalsAdapter};
pub use graph::{graph, signals_graph};
pub use handle::{cached_signal_count, get_signal, DerivedSignal, FieldSignal, PropertySignal};
pub use sigil::{PropertyAccess, SignalAccess};
pub use surface::{
    construct, construct_in, is_observable, observable, observable_in, report_changed,
    report_observed, source, try_observable, try_observable_in, ObserveOptions,
};
