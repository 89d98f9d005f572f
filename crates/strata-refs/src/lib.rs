//! Reference database for strata.
//!
//! Refs are named pointers into the object graph. A ref holds either a
//! direct [`ObjectId`](strata_types::ObjectId) or the name of another ref
//! (a symbolic ref), resolved transitively up to a small hop limit.
//!
//! # Architecture
//!
//! - **Branches** live under `refs/heads/` and advance as commits are made.
//! - **Tracking refs** live under `refs/remotes/<remote>/` and mirror a
//!   remote branch tip as of the last fetch.
//! - **HEAD** names the current branch symbolically, or holds a commit id
//!   directly when detached.
//! - **WORK_HEAD** and **STAGE_HEAD** hold the root tree ids of the working
//!   and staged snapshots.
//!
//! Every mutation of a shared ref goes through [`UpdateRef`] or
//! [`UpdateSymRef`], which compare the stored value against an expected one
//! inside the backend's atomic read-modify-write.
//!
//! # Modules
//!
//! - [`error`] -- Error types for ref operations
//! - [`types`] -- [`RefValue`], [`Ref`] and the well-known ref names
//! - [`traits`] -- The [`RefDatabase`] backend contract
//! - [`update`] -- The compare-and-swap update protocol
//! - [`names`] -- Ref, branch and remote name validation
//! - [`memory`] -- In-memory [`InMemoryRefDatabase`]
//! - [`file`] -- On-disk [`FileRefDatabase`]

pub mod error;
pub mod file;
pub mod memory;
pub mod names;
pub mod traits;
pub mod types;
pub mod update;

pub use error::{RefError, RefResult};
pub use file::FileRefDatabase;
pub use memory::InMemoryRefDatabase;
pub use names::{validate_branch_name, validate_ref_name, validate_remote_name};
pub use traits::RefDatabase;
pub use types::{Ref, RefValue};
pub use update::{UpdateRef, UpdateSymRef};
