//! Staging working-tree changes.

use strata_diff::{ChangeType, PathFilter};
use strata_types::ObjectId;
use tracing::info;

use crate::error::IndexResult;
use crate::progress::{NullProgress, ProgressListener};
use crate::staging::StagingArea;
use crate::working::WorkingTree;

/// Stages unstaged changes from the working tree.
///
/// With no path filter and nothing already staged, `STAGE_HEAD` is pointed
/// straight at the working tree's root. Otherwise the unstaged diff is
/// walked and applied entry by entry. `update_only` restricts staging to
/// features that are already tracked, so additions stay unstaged.
pub struct AddOp<'a> {
    working: &'a WorkingTree,
    staging: &'a StagingArea,
    path_filter: Option<PathFilter>,
    update_only: bool,
    progress: &'a dyn ProgressListener,
}

impl<'a> AddOp<'a> {
    pub fn new(working: &'a WorkingTree, staging: &'a StagingArea) -> Self {
        Self {
            working,
            staging,
            path_filter: None,
            update_only: false,
            progress: &NullProgress,
        }
    }

    /// Only stage changes at or below `pattern`.
    pub fn path_filter(mut self, pattern: impl AsRef<str>) -> Self {
        self.path_filter = Some(PathFilter::new(pattern)).filter(|f| !f.is_everything());
        self
    }

    pub fn update_only(mut self, update_only: bool) -> Self {
        self.update_only = update_only;
        self
    }

    pub fn progress(mut self, progress: &'a dyn ProgressListener) -> Self {
        self.progress = progress;
        self
    }

    /// Run the add and return the new staged root tree id.
    pub fn call(self) -> IndexResult<ObjectId> {
        if self.path_filter.is_none() && !self.update_only && self.staging.is_clean()? {
            return self.stage_everything();
        }

        let update_only = self.update_only;
        let keep = move |entry: &strata_diff::DiffResult<strata_diff::DiffEntry>| match entry {
            Ok(e) => !(update_only && e.change_type() == ChangeType::Added),
            Err(_) => true,
        };
        let count = self
            .working
            .get_unstaged(self.path_filter.clone())?
            .filter(keep)
            .count();
        let unstaged = self.working.get_unstaged(self.path_filter.clone())?.filter(keep);
        self.staging.stage(self.progress, unstaged, count)
    }

    fn stage_everything(&self) -> IndexResult<ObjectId> {
        self.progress.started();
        let work = self.working.tree_id()?;
        let staged = self.staging.tree_id()?;
        if work != staged {
            self.staging.update_tree(work, staged)?;
        }
        self.progress.progress(100.0);
        self.progress.complete();
        info!(root = %work.short_hex(), "staged working tree");
        Ok(work)
    }
}
