use strata_types::ObjectId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("no remote specified and no default remote configured")]
    NoRemotesConfigured,

    #[error("unknown remote: {0}")]
    UnknownRemote(String),

    #[error("invalid refspec: {0}")]
    InvalidRefSpec(String),

    #[error("transport error: {0}")]
    TransportError(String),

    #[error("remote did not send object {0}")]
    MissingObject(ObjectId),

    #[error("remote sent unrequested object {0}")]
    UnexpectedObject(ObjectId),

    #[error("store error: {0}")]
    Store(#[from] strata_store::StoreError),

    #[error("ref error: {0}")]
    Ref(#[from] strata_refs::RefError),
}

pub type SyncResult<T> = Result<T, SyncError>;
