//! The working tree: the live snapshot that feature edits land in.

use std::fmt;
use std::sync::Arc;

use strata_diff::{DiffTreeWalk, PathFilter};
use strata_refs::types::{STAGE_HEAD, WORK_HEAD};
use strata_refs::{RefDatabase, UpdateRef};
use strata_store::{NodeRef, ObjectDatabase, RevFeature, RevFeatureType, TreeEditor};
use strata_types::{path, ObjectId};
use tracing::debug;

use crate::error::{IndexError, IndexResult};

/// The snapshot named by `WORK_HEAD`.
///
/// Every edit builds a new root tree and moves `WORK_HEAD` with a
/// compare-and-swap against the root it started from, so two writers racing
/// on the same repository cannot silently drop each other's edits.
#[derive(Clone)]
pub struct WorkingTree {
    db: ObjectDatabase,
    refs: Arc<dyn RefDatabase>,
}

impl fmt::Debug for WorkingTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkingTree").finish_non_exhaustive()
    }
}

impl WorkingTree {
    pub fn new(db: ObjectDatabase, refs: Arc<dyn RefDatabase>) -> Self {
        Self { db, refs }
    }

    /// Root tree id of the working snapshot, null if none was ever written.
    pub fn tree_id(&self) -> IndexResult<ObjectId> {
        Ok(self.refs.resolve_id(WORK_HEAD)?)
    }

    /// Look up the node at `node_path`.
    pub fn find(&self, node_path: &str) -> IndexResult<Option<NodeRef>> {
        Ok(self.db.find_node(&self.tree_id()?, node_path)?)
    }

    /// Write `feature` under `parent_path/feature_id`.
    ///
    /// The values are checked against `feature_type`, which must be the type
    /// the feature references. Both objects are stored and the leaf carries
    /// the type id as its metadata.
    pub fn insert(
        &self,
        parent_path: &str,
        feature_id: &str,
        feature: &RevFeature,
        feature_type: &RevFeatureType,
    ) -> IndexResult<NodeRef> {
        let one = std::iter::once((feature_id, feature));
        let mut nodes = self.insert_all(parent_path, one, feature_type)?;
        nodes.pop().ok_or_else(|| IndexError::InvalidPath(feature_id.to_string()))
    }

    /// Write several features of one type under `parent_path` with a single
    /// `WORK_HEAD` update.
    pub fn insert_all<'f, I>(
        &self,
        parent_path: &str,
        features: I,
        feature_type: &RevFeatureType,
    ) -> IndexResult<Vec<NodeRef>>
    where
        I: IntoIterator<Item = (&'f str, &'f RevFeature)>,
    {
        let type_id = self.db.put(feature_type)?;
        let base = self.tree_id()?;
        let mut editor = TreeEditor::new(&self.db, base);
        let mut nodes = Vec::new();

        for (feature_id, feature) in features {
            if feature_id.is_empty() || feature_id.contains(path::SEPARATOR) {
                return Err(IndexError::InvalidPath(feature_id.to_string()));
            }
            let node_path = path::append_child(parent_path, feature_id);
            if feature.feature_type != type_id {
                return Err(IndexError::FeatureTypeMismatch { path: node_path });
            }
            feature_type.validate(&feature.values)?;

            let object_id = self.db.put(feature)?;
            let node = NodeRef::feature(node_path, object_id, type_id);
            editor.put(&node)?;
            nodes.push(node);
        }

        let new_root = editor.finish()?;
        self.advance(base, new_root, "insert")?;
        debug!(
            count = nodes.len(),
            parent = %parent_path,
            root = %new_root.short_hex(),
            "inserted features"
        );
        Ok(nodes)
    }

    /// Remove the feature or subtree at `node_path`. Returns `false` when
    /// nothing was there, in which case `WORK_HEAD` is left alone.
    pub fn delete(&self, node_path: &str) -> IndexResult<bool> {
        if !path::is_valid(node_path) {
            return Err(IndexError::InvalidPath(node_path.to_string()));
        }
        let base = self.tree_id()?;
        let mut editor = TreeEditor::new(&self.db, base);
        if !editor.remove(node_path)? {
            return Ok(false);
        }
        let new_root = editor.finish()?;
        self.advance(base, new_root, "delete")?;
        debug!(path = %node_path, root = %new_root.short_hex(), "deleted node");
        Ok(true)
    }

    /// Point `WORK_HEAD` at `tree_id` if it still holds `expected`.
    pub fn update_tree(&self, tree_id: ObjectId, expected: ObjectId) -> IndexResult<()> {
        self.advance(expected, tree_id, "reset")
    }

    /// Changes in the working tree that are not yet staged, with the staged
    /// tree as the old side.
    pub fn get_unstaged(&self, filter: Option<PathFilter>) -> IndexResult<DiffTreeWalk> {
        let staged = self.refs.resolve_id(STAGE_HEAD)?;
        let working = self.tree_id()?;
        Ok(DiffTreeWalk::new(&self.db, staged, working).with_filter(filter))
    }

    /// Number of entries [`WorkingTree::get_unstaged`] yields for `filter`.
    pub fn count_unstaged(&self, filter: Option<PathFilter>) -> IndexResult<usize> {
        Ok(self.get_unstaged(filter)?.count_changes()?)
    }

    fn advance(&self, old: ObjectId, new: ObjectId, reason: &str) -> IndexResult<()> {
        UpdateRef::new(self.refs.as_ref(), WORK_HEAD)
            .new_value(new)
            .old_value(old)
            .reason(reason)
            .call()?;
        Ok(())
    }
}
