//! The staging area: the snapshot the next commit will record.

use std::fmt;
use std::sync::Arc;

use strata_diff::{ChangeType, DiffEntry, DiffResult, DiffTreeWalk, PathFilter};
use strata_refs::types::{HEAD, STAGE_HEAD};
use strata_refs::{RefDatabase, UpdateRef};
use strata_store::{ObjectDatabase, TreeEditor};
use strata_types::ObjectId;
use tracing::{debug, info};

use crate::error::{IndexError, IndexResult};
use crate::progress::{percent_of, ProgressListener};

/// The snapshot named by `STAGE_HEAD`.
#[derive(Clone)]
pub struct StagingArea {
    db: ObjectDatabase,
    refs: Arc<dyn RefDatabase>,
}

impl fmt::Debug for StagingArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StagingArea").finish_non_exhaustive()
    }
}

impl StagingArea {
    pub fn new(db: ObjectDatabase, refs: Arc<dyn RefDatabase>) -> Self {
        Self { db, refs }
    }

    /// Root tree id of the staged snapshot, null if nothing was staged yet.
    pub fn tree_id(&self) -> IndexResult<ObjectId> {
        Ok(self.refs.resolve_id(STAGE_HEAD)?)
    }

    /// Root tree of the commit `HEAD` resolves to, null on an unborn branch.
    pub fn head_tree_id(&self) -> IndexResult<ObjectId> {
        let head = self.refs.resolve_id(HEAD)?;
        if head.is_null() {
            return Ok(ObjectId::NULL);
        }
        Ok(self.db.get_commit(&head)?.tree_id)
    }

    /// Staged changes not yet committed: `HEAD`'s tree against the staged
    /// tree.
    pub fn get_staged(&self, filter: Option<PathFilter>) -> IndexResult<DiffTreeWalk> {
        let head = self.head_tree_id()?;
        let staged = self.tree_id()?;
        Ok(DiffTreeWalk::new(&self.db, head, staged).with_filter(filter))
    }

    pub fn count_staged(&self, filter: Option<PathFilter>) -> IndexResult<usize> {
        Ok(self.get_staged(filter)?.count_changes()?)
    }

    /// `true` when nothing is staged beyond what `HEAD` already records.
    pub fn is_clean(&self) -> IndexResult<bool> {
        match self.get_staged(None)?.next() {
            None => Ok(true),
            Some(entry) => entry.map(|_| false).map_err(Into::into),
        }
    }

    /// Apply `entries` to the staged tree and move `STAGE_HEAD` once at the
    /// end.
    ///
    /// Added and modified entries copy the new node into place; removed
    /// entries delete the old path. Progress is reported after each entry as
    /// a share of `expected_count`. Cancellation is checked before every
    /// entry and again before the ref update; a canceled or failed run
    /// leaves `STAGE_HEAD` as it was. Returns the new staged root.
    pub fn stage<I>(
        &self,
        progress: &dyn ProgressListener,
        entries: I,
        expected_count: usize,
    ) -> IndexResult<ObjectId>
    where
        I: IntoIterator<Item = DiffResult<DiffEntry>>,
    {
        let base = self.tree_id()?;
        let mut editor = TreeEditor::new(&self.db, base);
        progress.started();

        let mut applied = 0usize;
        for entry in entries {
            if progress.is_canceled() {
                debug!(applied, "staging canceled");
                return Err(IndexError::Canceled);
            }
            let entry = entry?;
            match (entry.change_type(), entry.new.as_ref(), entry.old.as_ref()) {
                (ChangeType::Added | ChangeType::Modified, Some(new), _) => editor.put(new)?,
                (ChangeType::Removed, _, Some(old)) => {
                    editor.remove(&old.path)?;
                }
                _ => {}
            }
            applied += 1;
            progress.progress(percent_of(applied, expected_count));
        }
        if progress.is_canceled() {
            return Err(IndexError::Canceled);
        }

        let new_root = editor.finish()?;
        self.update_tree(new_root, base)?;
        progress.complete();
        info!(entries = applied, root = %new_root.short_hex(), "staged changes");
        Ok(new_root)
    }

    /// Point `STAGE_HEAD` at `tree_id` if it still holds `expected`.
    pub fn update_tree(&self, tree_id: ObjectId, expected: ObjectId) -> IndexResult<()> {
        UpdateRef::new(self.refs.as_ref(), STAGE_HEAD)
            .new_value(tree_id)
            .old_value(expected)
            .reason("stage")
            .call()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{NullProgress, ProgressTracker};
    use crate::working::WorkingTree;
    use strata_refs::{InMemoryRefDatabase, RefError};
    use strata_store::{
        AttributeDescriptor, AttributeKind, RevCommit, RevFeature, RevFeatureType, Value,
    };
    use strata_types::Person;

    struct Fixture {
        db: ObjectDatabase,
        refs: Arc<dyn RefDatabase>,
        work: WorkingTree,
        stage: StagingArea,
        ft: RevFeatureType,
    }

    fn fixture() -> Fixture {
        let db = ObjectDatabase::in_memory();
        let refs: Arc<dyn RefDatabase> = Arc::new(InMemoryRefDatabase::new());
        refs.put_sym_ref(HEAD, "refs/heads/master").unwrap();
        let ft = RevFeatureType::new(
            "points",
            vec![AttributeDescriptor::new("n", AttributeKind::Int, false)],
        );
        Fixture {
            work: WorkingTree::new(db.clone(), Arc::clone(&refs)),
            stage: StagingArea::new(db.clone(), Arc::clone(&refs)),
            db,
            refs,
            ft,
        }
    }

    impl Fixture {
        fn insert(&self, id: &str, n: i64) {
            let type_id = strata_store::Revision::id(&self.ft).unwrap();
            let f = RevFeature::new(type_id, vec![Value::Int(n)]);
            self.work.insert("points", id, &f, &self.ft).unwrap();
        }

        fn stage_all(&self) -> ObjectId {
            let count = self.work.count_unstaged(None).unwrap();
            let entries = self.work.get_unstaged(None).unwrap();
            self.stage.stage(&NullProgress, entries, count).unwrap()
        }

        fn commit(&self, tree_id: ObjectId) -> ObjectId {
            let parent = self.refs.resolve_id(HEAD).unwrap();
            let parents = if parent.is_null() { vec![] } else { vec![parent] };
            let who = Person::anonymous();
            let commit = RevCommit::new(tree_id, parents, who.clone(), who, "c");
            let id = self.db.put(&commit).unwrap();
            self.refs.put_ref("refs/heads/master", id).unwrap();
            id
        }
    }

    #[test]
    fn stage_brings_stage_in_line_with_work() {
        let fx = fixture();
        fx.insert("p1", 1);
        fx.insert("p2", 2);

        let root = fx.stage_all();
        assert_eq!(fx.stage.tree_id().unwrap(), root);
        assert_eq!(fx.work.count_unstaged(None).unwrap(), 0);
        assert_eq!(fx.stage.count_staged(None).unwrap(), 2);
        assert!(!fx.stage.is_clean().unwrap());
    }

    #[test]
    fn removal_is_staged() {
        let fx = fixture();
        fx.insert("p1", 1);
        fx.insert("p2", 2);
        fx.stage_all();
        fx.work.delete("points/p1").unwrap();

        assert_eq!(fx.work.count_unstaged(None).unwrap(), 1);
        let root = fx.stage_all();
        assert!(fx.db.find_node(&root, "points/p1").unwrap().is_none());
        assert!(fx.db.find_node(&root, "points/p2").unwrap().is_some());
    }

    #[test]
    fn commit_makes_index_clean() {
        let fx = fixture();
        assert!(fx.stage.is_clean().unwrap());
        fx.insert("p1", 1);
        let root = fx.stage_all();
        fx.commit(root);
        assert_eq!(fx.stage.head_tree_id().unwrap(), root);
        assert!(fx.stage.is_clean().unwrap());
    }

    #[test]
    fn progress_reaches_completion() {
        let fx = fixture();
        fx.insert("p1", 1);
        fx.insert("p2", 2);
        let tracker = ProgressTracker::new();
        let count = fx.work.count_unstaged(None).unwrap();
        fx.stage
            .stage(&tracker, fx.work.get_unstaged(None).unwrap(), count)
            .unwrap();
        assert!(tracker.is_started());
        assert!(tracker.is_complete());
        assert_eq!(tracker.percent(), 100.0);
    }

    #[test]
    fn cancel_leaves_stage_head_untouched() {
        let fx = fixture();
        fx.insert("p1", 1);
        fx.stage_all();
        let before = fx.stage.tree_id().unwrap();
        fx.insert("p2", 2);

        let tracker = ProgressTracker::new();
        tracker.cancel();
        let result = fx.stage.stage(&tracker, fx.work.get_unstaged(None).unwrap(), 1);
        assert!(matches!(result, Err(IndexError::Canceled)));
        assert_eq!(fx.stage.tree_id().unwrap(), before);
        assert!(!tracker.is_complete());
    }

    #[test]
    fn concurrent_stage_loses_cas() {
        let fx = fixture();
        fx.insert("p1", 1);
        let entries: Vec<_> = fx.work.get_unstaged(None).unwrap().collect();

        // another writer moves STAGE_HEAD while the entries are applied
        struct Interloper<'a>(&'a StagingArea);
        impl ProgressListener for Interloper<'_> {
            fn progress(&self, _percent: f32) {
                let _ = self.0.update_tree(ObjectId::from_bytes(b"other"), ObjectId::NULL);
            }
        }
        let result = fx.stage.stage(&Interloper(&fx.stage), entries, 1);
        assert!(matches!(
            result,
            Err(IndexError::Ref(RefError::ConcurrentModification { .. }))
        ));
        assert_eq!(fx.stage.tree_id().unwrap(), ObjectId::from_bytes(b"other"));
    }

    #[test]
    fn filtered_staging_only_touches_filter() {
        let fx = fixture();
        fx.insert("p1", 1);
        fx.insert("p2", 2);
        let filter = || Some(PathFilter::new("points/p2"));
        let count = fx.work.count_unstaged(filter()).unwrap();
        assert_eq!(count, 1);
        let root = fx
            .stage
            .stage(&NullProgress, fx.work.get_unstaged(filter()).unwrap(), count)
            .unwrap();
        assert!(fx.db.find_node(&root, "points/p2").unwrap().is_some());
        assert!(fx.db.find_node(&root, "points/p1").unwrap().is_none());
        assert_eq!(fx.work.count_unstaged(None).unwrap(), 1);
    }
}
