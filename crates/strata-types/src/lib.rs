//! Foundation types for strata.
//!
//! Every other strata crate depends on `strata-types`.
//!
//! # Key Types
//!
//! - [`ObjectId`] -- content-addressed identifier (BLAKE3 hash) of a revision object
//! - [`Person`] -- author/committer identity with a timestamp
//! - [`path`] -- helpers for `/`-joined node paths

pub mod error;
pub mod object;
pub mod path;
pub mod person;

pub use error::TypeError;
pub use object::ObjectId;
pub use person::Person;
