//! Content-addressed revision object storage for strata.
//!
//! Every revision object -- commits, trees, features, feature types -- is
//! stored as an immutable value keyed by the domain-separated BLAKE3 hash of
//! its canonical encoding. Objects are never updated or deleted; "changing"
//! an object means writing a new one and repointing a ref.
//!
//! # Object Types
//!
//! - [`RevCommit`] -- snapshot of a root tree plus parents and message
//! - [`RevTree`] -- name-ordered entries, transparently sharded into buckets
//! - [`RevFeature`] -- ordered attribute values of one structured record
//! - [`RevFeatureType`] -- schema shared by many features
//!
//! # Storage Backends
//!
//! All backends implement the [`ObjectStore`] trait:
//!
//! - [`InMemoryObjectStore`] -- `HashMap`-based store for tests and embedding
//! - [`FileObjectStore`] -- zstd-compressed loose objects on disk
//!
//! [`ObjectDatabase`] layers typed access on top of any backend, and
//! [`TreeEditor`] performs path-addressed edits of a tree hierarchy.

pub mod commit;
pub mod database;
pub mod editor;
pub mod error;
pub mod feature;
pub mod file;
pub mod memory;
pub mod node;
pub mod object;
pub mod rev;
pub mod traits;
pub mod tree;

pub use commit::RevCommit;
pub use database::ObjectDatabase;
pub use editor::TreeEditor;
pub use error::{StoreError, StoreResult};
pub use feature::{AttributeDescriptor, AttributeKind, RevFeature, RevFeatureType, Value};
pub use file::FileObjectStore;
pub use memory::InMemoryObjectStore;
pub use node::{Node, NodeRef, NodeType};
pub use object::{ObjectKind, StoredObject};
pub use rev::{RevObject, Revision};
pub use traits::ObjectStore;
pub use tree::{Bucket, RevTree, TreeBuilder, MAX_TREE_ENTRIES};
