//! Remote synchronization for strata.
//!
//! A fetch lists a remote's branches, transfers the objects reachable from
//! each tip that the local store lacks, and moves the matching tracking ref
//! under `refs/remotes/<remote>/` with a compare-and-swap. Fetching again
//! with no remote changes transfers nothing and moves nothing.

pub mod error;
pub mod fetch;
pub mod transport;
pub mod types;
pub mod walker;

pub use error::{SyncError, SyncResult};
pub use fetch::{FetchContext, FetchOp, DEFAULT_REMOTE};
pub use transport::{LocalTransport, LocalTransportRegistry, RemoteTransport, TransportFactory};
pub use types::{FetchResult, RefSpec, RemoteConfig, TrackingRefUpdate};
pub use walker::MissingObjectWalker;
