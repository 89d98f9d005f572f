//! Error types for reference operations.

use thiserror::Error;

/// Errors that can occur during reference operations.
#[derive(Debug, Error)]
pub enum RefError {
    /// The reference was not found.
    #[error("ref not found: {0}")]
    NotFound(String),

    /// A compare-and-swap precondition failed: the stored value is not the
    /// one the caller expected.
    #[error("concurrent modification of {name}: expected {expected}, found {actual}")]
    ConcurrentModification {
        name: String,
        expected: String,
        actual: String,
    },

    /// A symbolic target was requested but the ref is direct.
    #[error("ref is not symbolic: {0}")]
    NotSymbolic(String),

    /// A direct id was requested but the ref is symbolic.
    #[error("ref is not direct: {0}")]
    NotDirect(String),

    /// The ref name is malformed.
    #[error("invalid ref name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    /// Symbolic resolution did not terminate within the hop limit.
    #[error("symbolic ref {name} exceeds {max} levels of indirection")]
    SymbolicDepthExceeded { name: String, max: usize },

    /// An update was requested without a value to write.
    #[error("invalid ref update for {name}: {reason}")]
    InvalidUpdate { name: String, reason: String },

    /// A stored ref could not be parsed.
    #[error("corrupt ref {name}: {reason}")]
    Corrupt { name: String, reason: String },

    /// Another writer held the ref's lock for longer than the wait allows.
    #[error("ref {0} is locked by another writer")]
    Locked(String),

    /// A lock guarding backend state was poisoned.
    #[error("ref database lock poisoned")]
    LockPoisoned,

    /// I/O error during file-based ref operations.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for ref operations.
pub type RefResult<T> = std::result::Result<T, RefError>;
