//! Diff engine for strata.
//!
//! Compares two tree snapshots and yields the features that were added,
//! removed or modified between them, in path order. The walk is lazy:
//! entries are produced on demand, and subtrees with identical ids on both
//! sides are skipped without being loaded.
//!
//! # Key Types
//!
//! - [`DiffTreeWalk`] -- Pull-based iterator of [`DiffEntry`] results
//! - [`DiffEntry`] / [`ChangeType`] -- One changed feature
//! - [`PathFilter`] -- Restricts a walk to one subtree or feature
//! - [`FeatureDiff`] / [`AttributeChange`] -- Attribute-level comparison

pub mod entry;
pub mod error;
pub mod feature_diff;
pub mod filter;
pub mod walk;

pub use entry::{ChangeType, DiffEntry};
pub use error::{DiffError, DiffResult};
pub use feature_diff::{AttributeChange, FeatureDiff};
pub use filter::PathFilter;
pub use walk::DiffTreeWalk;
