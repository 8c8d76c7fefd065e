// ============================================================================
// spark-observables - Primitives
// Signals, computeds and effects
// ============================================================================

pub mod computed;
pub mod effect;
pub mod signal;

pub use computed::{computed, Computed};
pub use effect::{effect, Effect};
pub use signal::{signal, Signal};
