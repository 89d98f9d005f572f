//! Error types for the index crate.

/// Errors that can occur while editing the working tree or staging changes.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// Object store operation failed.
    #[error("store error: {0}")]
    Store(#[from] strata_store::StoreError),

    /// Ref read or update failed, including a lost compare-and-swap.
    #[error("ref error: {0}")]
    Ref(#[from] strata_refs::RefError),

    /// The diff walk failed part way.
    #[error("diff error: {0}")]
    Diff(#[from] strata_diff::DiffError),

    /// The progress listener asked for the operation to stop.
    #[error("operation canceled")]
    Canceled,

    /// An invalid node path was provided.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// The feature names a different feature type than the one supplied.
    #[error("feature at {path} does not reference the supplied feature type")]
    FeatureTypeMismatch { path: String },
}

/// Convenience alias for index results.
pub type IndexResult<T> = Result<T, IndexError>;
