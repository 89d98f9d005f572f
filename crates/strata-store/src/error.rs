use strata_types::ObjectId;

use crate::object::ObjectKind;

/// Errors from object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested object was not found.
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    /// The stored object is not of the requested kind.
    #[error("object {id} is a {actual}, expected a {expected}")]
    TypeMismatch {
        id: ObjectId,
        expected: ObjectKind,
        actual: ObjectKind,
    },

    /// Content hash mismatch (data corruption or a misbehaving peer).
    #[error("hash mismatch for {id}: content hashes to {computed}")]
    HashMismatch { id: ObjectId, computed: ObjectId },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The object data is malformed or cannot be decoded.
    #[error("corrupt object {id}: {reason}")]
    CorruptObject { id: ObjectId, reason: String },

    /// The null id was used as a store key.
    #[error("the null object id is not a valid store key")]
    NullObjectId,

    /// Two tree entries share a name.
    #[error("duplicate tree entry: {0}")]
    DuplicateEntry(String),

    /// A node path is empty or malformed.
    #[error("invalid node path: {0:?}")]
    InvalidPath(String),

    /// Feature values do not match their feature type.
    #[error("schema violation: {0}")]
    SchemaViolation(String),

    /// A lock guarding backend state was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    LockPoisoned,
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
