//! High-level SDK for strata.
//!
//! [`Repository`] ties the object store, reference database, working tree,
//! staging area and fetch machinery into one handle. This is the main entry
//! point for applications embedding strata.
//!
//! # Key Types
//!
//! - [`Repository`] -- open, init, insert, add, commit, branch, checkout, diff, fetch
//! - [`CommitOp`] -- commit message, identities and flags
//! - [`DiffOp`] -- two revisions and an optional path filter
//! - [`LogIter`] -- first-parent history walk
//! - [`RepoConfig`] -- `.strata/config.toml`
//! - [`FileTransportFactory`] -- fetch from repositories on disk

pub mod commit;
pub mod config;
pub mod diff_op;
pub mod error;
pub mod log;
pub mod remote;
pub mod repository;
pub mod revparse;

pub use commit::CommitOp;
pub use config::{RemoteSection, RepoConfig, UserConfig};
pub use diff_op::DiffOp;
pub use error::{DiffSide, SdkError, SdkResult};
pub use log::LogIter;
pub use remote::FileTransportFactory;
pub use repository::{Repository, Status, REPO_DIR};
pub use revparse::rev_parse;

// Re-export key types
pub use strata_diff::{ChangeType, DiffEntry, DiffTreeWalk, FeatureDiff, PathFilter};
pub use strata_index::{NullProgress, ProgressListener, ProgressTracker};
pub use strata_refs::{Ref, RefValue};
pub use strata_store::{
    AttributeDescriptor, AttributeKind, NodeRef, RevCommit, RevFeature, RevFeatureType, Value,
};
pub use strata_sync::{
    FetchOp, FetchResult, LocalTransport, LocalTransportRegistry, RefSpec, RemoteConfig,
};
pub use strata_types::{ObjectId, Person};
