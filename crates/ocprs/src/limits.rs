//! Centralized compiler and VM limits.
//!
//! All magic numbers that control compilation and execution are collected
//! here for easy tuning.

// ===== Compiler =====

/// Maximum nesting of parenthesized arithmetic inside one `#` expression.
pub const MAX_ARITH_DEPTH: usize = 200;

/// Keyword that opens a state declaration.
pub const KW_STATE: &str = "state";

/// Keyword that opens a lookup table declaration.
pub const KW_TABLE: &str = "table";

/// State that collects rules written before any `state` declaration.
pub const IMPLICIT_STATE: &str = "INITIAL";

// ===== VM =====

/// Default ceiling on consecutive rule applications that get no further
/// into the input. A rule that keeps requeueing what it consumed never
/// reaches end-of-input; this turns that into a `StepLimit` fault instead
/// of a hang. Input length is not limited.
pub const DEFAULT_MAX_STEPS: u64 = 1 << 24;

/// Consumed prefix length after which the input window compacts itself
/// when new input is fed.
pub const WINDOW_COMPACT_THRESHOLD: usize = 4096;

/// Largest value an action may emit or requeue.
pub const MAX_CHAR_CODE: i64 = u32::MAX as i64;

// ===== Binary format =====

/// Magic number at the start of every serialized program.
pub const PROGRAM_MAGIC: &[u8] = b"\x1bOCP";

/// Current serialized program format version.
pub const PROGRAM_VERSION: u8 = 1;
