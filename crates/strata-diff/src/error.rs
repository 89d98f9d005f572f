//! Error types for the diff crate.

/// Errors that can occur during diff operations.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// Reading a tree or feature failed.
    #[error("store error: {0}")]
    Store(#[from] strata_store::StoreError),

    /// A feature has no feature type to name its attributes.
    #[error("feature at {0} has no feature type")]
    MissingFeatureType(String),

    /// The entry does not describe a feature change.
    #[error("not a feature change: {0}")]
    NotAFeature(String),
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
