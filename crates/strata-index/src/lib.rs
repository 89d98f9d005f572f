//! Working tree and staging area for strata.
//!
//! Feature edits land in the working snapshot (`WORK_HEAD`). Staging
//! diffs the working snapshot against the staged one (`STAGE_HEAD`) and
//! replays the differences onto the staged tree, moving `STAGE_HEAD` with a
//! single compare-and-swap once every entry is applied.
//!
//! # Key Types
//!
//! - [`WorkingTree`] -- Insert and delete features, list unstaged changes
//! - [`StagingArea`] -- Staged snapshot, staged changes, entry replay
//! - [`AddOp`] -- Stage everything, a path, or tracked features only
//! - [`ProgressListener`] -- Progress callbacks and cancellation

pub mod add;
pub mod error;
pub mod progress;
pub mod staging;
pub mod working;

pub use add::AddOp;
pub use error::{IndexError, IndexResult};
pub use progress::{NullProgress, ProgressListener, ProgressTracker};
pub use staging::StagingArea;
pub use working::WorkingTree;
