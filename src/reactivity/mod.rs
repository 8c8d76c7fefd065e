// ============================================================================
// spark-observables - Reactivity Module
// Dependency tracking, dirty propagation, scheduling and batching
// ============================================================================

pub mod batching;
pub mod scheduling;
pub mod tracking;

pub use batching::{batch, untrack};
pub use scheduling::flush_pending;
pub use tracking::{mark_reactions, notify_write, track_read};
