//! Error types for draft operations.

use redraft_value::Archetype;
use thiserror::Error;

/// Result type alias for draft operations.
pub type DraftResult<T> = Result<T, DraftError>;

/// Errors reported by the draft engine.
///
/// Everything here is synchronous and deterministic: the engine performs no
/// I/O, so there are no transient failure classes and nothing is retried.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DraftError {
    /// A read or write reached a draft whose scope has already closed.
    #[error("draft used after its scope was finalized")]
    UsedAfterFinalize,

    /// The operation does not fit the target's container shape.
    #[error("operation `{op}` is not supported on {archetype:?} values")]
    UnsupportedArchetype {
        op: &'static str,
        archetype: Archetype,
    },

    /// A patch operation addressed a path that does not exist in the target.
    #[error("patch path not found: {0}")]
    PatchPathNotFound(String),

    /// A draft surrogate escaped the scope that created it.
    #[error("draft escaped the scope that created it")]
    NestedDraftLeak,

    /// An array index was past the end of the array.
    #[error("index {index} out of bounds (len {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    /// A recipe both mutated its draft and returned a replacement value.
    #[error("recipe returned a replacement value after mutating its draft")]
    ReplacedAndMutated,
}
