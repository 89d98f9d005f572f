use std::fmt;

use thiserror::Error;

/// Which side of a diff a revision was meant for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiffSide {
    Old,
    New,
}

impl fmt::Display for DiffSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Old => f.write_str("old"),
            Self::New => f.write_str("new"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("not a strata repository: {0}")]
    NotARepository(String),

    #[error("repository already exists at {0}")]
    AlreadyExists(String),

    #[error("branch not found: {0}")]
    BranchNotFound(String),

    #[error("branch already exists: {0}")]
    BranchExists(String),

    #[error("cannot delete the checked out branch {0}")]
    CannotDeleteCurrentBranch(String),

    #[error("bad revision: {0}")]
    BadRevision(String),

    #[error("{side} version {spec:?} does not resolve to a commit or tree: {reason}")]
    InvalidRevisionSpec {
        spec: String,
        side: DiffSide,
        reason: String,
    },

    #[error("nothing to commit")]
    NothingToCommit,

    #[error("uncommitted changes would be overwritten")]
    UncommittedChanges,

    #[error("remote already exists: {0}")]
    RemoteExists(String),

    #[error("unknown remote: {0}")]
    UnknownRemote(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(#[from] strata_store::StoreError),

    #[error("ref error: {0}")]
    Ref(#[from] strata_refs::RefError),

    #[error("diff error: {0}")]
    Diff(#[from] strata_diff::DiffError),

    #[error("index error: {0}")]
    Index(#[from] strata_index::IndexError),

    #[error("sync error: {0}")]
    Sync(#[from] strata_sync::SyncError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SdkResult<T> = Result<T, SdkError>;
