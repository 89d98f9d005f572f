use std::collections::BTreeMap;

use strata_types::{path, ObjectId};

use crate::database::ObjectDatabase;
use crate::error::{StoreError, StoreResult};
use crate::node::{Node, NodeRef};
use crate::tree::{RevTree, TreeBuilder};

/// Path-addressed editor over an immutable tree hierarchy.
///
/// Edits are buffered in memory; only the trees along edited paths are
/// loaded. [`TreeEditor::finish`] writes every modified tree bottom-up and
/// returns the new root id. Untouched subtrees keep their ids.
///
/// Missing intermediate trees are created on [`TreeEditor::put`]. Trees
/// emptied by [`TreeEditor::remove`] are kept as empty entries.
pub struct TreeEditor<'a> {
    db: &'a ObjectDatabase,
    root: EditDir,
}

impl<'a> TreeEditor<'a> {
    /// Start editing the tree `root_tree_id`. The null id starts from the
    /// empty tree.
    pub fn new(db: &'a ObjectDatabase, root_tree_id: ObjectId) -> Self {
        Self {
            db,
            root: EditDir::new(root_tree_id, ObjectId::NULL),
        }
    }

    /// Insert or replace the node at `node.path`.
    pub fn put(&mut self, node: &NodeRef) -> StoreResult<()> {
        if !path::is_valid(&node.path) {
            return Err(StoreError::InvalidPath(node.path.clone()));
        }
        let names = path::components(node.parent_path());
        self.root.put_at(self.db, &names, node.to_node())
    }

    /// Remove the node at `node_path`. Returns `false` if nothing was there.
    pub fn remove(&mut self, node_path: &str) -> StoreResult<bool> {
        if !path::is_valid(node_path) {
            return Err(StoreError::InvalidPath(node_path.to_string()));
        }
        let names = path::components(path::parent_path(node_path));
        self.root
            .remove_at(self.db, &names, path::node_name(node_path))
    }

    /// Write all modified trees and return the new root tree id.
    pub fn finish(self) -> StoreResult<ObjectId> {
        let db = self.db;
        if !self.root.dirty && self.root.original_id.is_null() {
            return db.put(&RevTree::empty());
        }
        self.root.write(db)
    }
}

impl std::fmt::Debug for TreeEditor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeEditor")
            .field("root", &self.root.original_id)
            .field("dirty", &self.root.dirty)
            .finish()
    }
}

struct EditDir {
    original_id: ObjectId,
    metadata_id: ObjectId,
    builder: Option<TreeBuilder>,
    children: BTreeMap<String, EditDir>,
    dirty: bool,
}

impl EditDir {
    fn new(original_id: ObjectId, metadata_id: ObjectId) -> Self {
        Self {
            original_id,
            metadata_id,
            builder: None,
            children: BTreeMap::new(),
            dirty: false,
        }
    }

    fn take_builder(&mut self, db: &ObjectDatabase) -> StoreResult<TreeBuilder> {
        match self.builder.take() {
            Some(builder) => Ok(builder),
            None => db.tree_builder(&db.tree_or_empty(&self.original_id)?),
        }
    }

    fn builder(&mut self, db: &ObjectDatabase) -> StoreResult<&mut TreeBuilder> {
        let builder = self.take_builder(db)?;
        Ok(self.builder.insert(builder))
    }

    /// The edit state of subtree `name`, loading it on first access. With
    /// `create`, a missing entry (or a feature in the way) becomes a new
    /// empty subtree.
    fn child(
        &mut self,
        db: &ObjectDatabase,
        name: &str,
        create: bool,
        metadata_id: ObjectId,
    ) -> StoreResult<Option<&mut EditDir>> {
        if !self.children.contains_key(name) {
            let existing = self.builder(db)?.get(name).cloned();
            let dir = match existing {
                Some(node) if node.is_tree() => EditDir::new(node.object_id, node.metadata_id),
                _ if create => EditDir::new(ObjectId::NULL, metadata_id),
                _ => return Ok(None),
            };
            self.children.insert(name.to_string(), dir);
        }
        Ok(self.children.get_mut(name))
    }

    fn put_at(&mut self, db: &ObjectDatabase, parents: &[&str], node: Node) -> StoreResult<()> {
        self.dirty = true;
        let Some((first, rest)) = parents.split_first() else {
            // a replaced subtree discards any pending edits below it
            self.children.remove(&node.name);
            self.builder(db)?.put(node);
            return Ok(());
        };
        let metadata_id = if rest.is_empty() {
            node.metadata_id
        } else {
            ObjectId::NULL
        };
        match self.child(db, first, true, metadata_id)? {
            Some(child) => child.put_at(db, rest, node),
            None => Err(StoreError::InvalidPath((*first).to_string())),
        }
    }

    fn remove_at(
        &mut self,
        db: &ObjectDatabase,
        parents: &[&str],
        name: &str,
    ) -> StoreResult<bool> {
        let Some((first, rest)) = parents.split_first() else {
            let pending = self.children.remove(name).is_some();
            let removed = self.builder(db)?.remove(name).is_some() || pending;
            self.dirty |= removed;
            return Ok(removed);
        };
        let Some(child) = self.child(db, first, false, ObjectId::NULL)? else {
            return Ok(false);
        };
        let removed = child.remove_at(db, rest, name)?;
        self.dirty |= removed;
        Ok(removed)
    }

    fn write(mut self, db: &ObjectDatabase) -> StoreResult<ObjectId> {
        if !self.dirty {
            return Ok(self.original_id);
        }
        let children = std::mem::take(&mut self.children);
        let mut builder = self.take_builder(db)?;
        for (name, child) in children {
            if !child.dirty {
                continue;
            }
            let metadata_id = child.metadata_id;
            let id = child.write(db)?;
            builder.put(Node::tree(name, id, metadata_id));
        }
        db.write_tree(builder)
    }
}
