// ============================================================================
// spark-observables - Core Module
// Flags, node traits and the per-thread reactive context
// ============================================================================

pub mod constants;
pub mod context;
pub mod types;
