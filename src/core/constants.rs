// ============================================================================
// spark-observables - Constants
// Flag bits shared by every node in the reactive graph
// ============================================================================

// =============================================================================
// NODE KIND FLAGS
// =============================================================================

/// Writable source cell (signals and atom revision cells)
pub const SOURCE: u32 = 1 << 0;

/// Memoized derivation (computed)
pub const DERIVED: u32 = 1 << 1;

/// Side-effecting reaction
pub const EFFECT: u32 = 1 << 2;

// =============================================================================
// STATUS FLAGS
// =============================================================================

/// Up to date
pub const CLEAN: u32 = 1 << 10;

/// A direct dependency was written
pub const DIRTY: u32 = 1 << 11;

/// An upstream computed may have changed; verify before re-running
pub const MAYBE_DIRTY: u32 = 1 << 12;

/// Reaction is currently running and collecting dependencies
pub const REACTION_IS_UPDATING: u32 = 1 << 13;

/// Effect has been disposed and must never run again
pub const DESTROYED: u32 = 1 << 14;

/// Clears CLEAN / DIRTY / MAYBE_DIRTY while keeping every other bit
pub const STATUS_MASK: u32 = !(DIRTY | MAYBE_DIRTY | CLEAN);

/// Upper bound on flush passes before a self-triggering effect is reported
pub const MAX_FLUSH_PASSES: u32 = 1000;
