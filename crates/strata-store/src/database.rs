use std::sync::Arc;

use strata_types::{path, ObjectId};

use crate::commit::RevCommit;
use crate::error::{StoreError, StoreResult};
use crate::feature::{RevFeature, RevFeatureType};
use crate::memory::InMemoryObjectStore;
use crate::node::{Node, NodeRef};
use crate::object::{ObjectKind, StoredObject};
use crate::rev::{RevObject, Revision};
use crate::traits::ObjectStore;
use crate::tree::{RevTree, TreeBuilder};

/// Typed access to revision objects over any [`ObjectStore`].
///
/// Cloning is cheap; clones share the backend.
#[derive(Clone)]
pub struct ObjectDatabase {
    store: Arc<dyn ObjectStore>,
}

impl ObjectDatabase {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// A database over a fresh [`InMemoryObjectStore`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryObjectStore::new()))
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Store a typed object and return its id.
    pub fn put<T: Revision>(&self, object: &T) -> StoreResult<ObjectId> {
        self.store.write(&object.to_stored_object()?)
    }

    pub fn put_object(&self, object: &RevObject) -> StoreResult<ObjectId> {
        self.store.write(&object.to_stored_object()?)
    }

    /// Build `builder` (writing any buckets) and store the resulting tree.
    pub fn write_tree(&self, builder: TreeBuilder) -> StoreResult<ObjectId> {
        let tree = builder.build(self.store.as_ref())?;
        self.put(&tree)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        if id.is_null() {
            return Ok(false);
        }
        self.store.exists(id)
    }

    /// Read the raw stored form of `id`.
    pub fn get_raw(&self, id: &ObjectId) -> StoreResult<StoredObject> {
        if id.is_null() {
            return Err(StoreError::NotFound(*id));
        }
        self.store.read(id)?.ok_or(StoreError::NotFound(*id))
    }

    /// Read and decode `id`, whatever its kind.
    pub fn get(&self, id: &ObjectId) -> StoreResult<RevObject> {
        let raw = self.get_raw(id)?;
        RevObject::decode(id, &raw)
    }

    /// Read `id`, requiring it to be of `kind`.
    pub fn get_as(&self, id: &ObjectId, kind: ObjectKind) -> StoreResult<RevObject> {
        let raw = self.get_raw(id)?;
        if raw.kind != kind {
            return Err(StoreError::TypeMismatch {
                id: *id,
                expected: kind,
                actual: raw.kind,
            });
        }
        RevObject::decode(id, &raw)
    }

    pub fn get_typed<T: Revision>(&self, id: &ObjectId) -> StoreResult<T> {
        let raw = self.get_raw(id)?;
        T::from_stored_object(id, &raw)
    }

    pub fn get_commit(&self, id: &ObjectId) -> StoreResult<RevCommit> {
        self.get_typed(id)
    }

    pub fn get_tree(&self, id: &ObjectId) -> StoreResult<RevTree> {
        self.get_typed(id)
    }

    pub fn get_feature(&self, id: &ObjectId) -> StoreResult<RevFeature> {
        self.get_typed(id)
    }

    pub fn get_feature_type(&self, id: &ObjectId) -> StoreResult<RevFeatureType> {
        self.get_typed(id)
    }

    /// Like [`ObjectDatabase::get_tree`], but the null id reads as the empty
    /// tree.
    pub fn tree_or_empty(&self, id: &ObjectId) -> StoreResult<RevTree> {
        if id.is_null() {
            Ok(RevTree::empty())
        } else {
            self.get_tree(id)
        }
    }

    // -----------------------------------------------------------------------
    // Tree navigation
    // -----------------------------------------------------------------------

    /// All logical entries of `tree` in name order, expanding buckets.
    pub fn tree_nodes(&self, tree: &RevTree) -> StoreResult<Vec<Node>> {
        if !tree.is_bucketed() {
            return Ok(tree.entries().to_vec());
        }
        let mut nodes = Vec::with_capacity(tree.size() as usize);
        for bucket in tree.buckets() {
            let bucket_tree = self.get_tree(&bucket.tree_id)?;
            nodes.extend(self.tree_nodes(&bucket_tree)?);
        }
        Ok(nodes)
    }

    /// Look up one logical entry of `tree`, loading at most one bucket.
    pub fn tree_entry(&self, tree: &RevTree, name: &str) -> StoreResult<Option<Node>> {
        if !tree.is_bucketed() {
            return Ok(tree.entry(name).cloned());
        }
        match tree.bucket_for(name) {
            Some(bucket) => {
                let bucket_tree = self.get_tree(&bucket.tree_id)?;
                self.tree_entry(&bucket_tree, name)
            }
            None => Ok(None),
        }
    }

    /// A builder pre-filled with the logical entries of `tree`.
    pub fn tree_builder(&self, tree: &RevTree) -> StoreResult<TreeBuilder> {
        Ok(TreeBuilder::from_nodes(self.tree_nodes(tree)?))
    }

    /// Find the node at `node_path` below the tree `root_tree_id`.
    ///
    /// A null root and an empty path both yield `None`.
    pub fn find_node(
        &self,
        root_tree_id: &ObjectId,
        node_path: &str,
    ) -> StoreResult<Option<NodeRef>> {
        let names = path::components(node_path);
        let Some((last, parents)) = names.split_last() else {
            return Ok(None);
        };
        let mut tree = self.tree_or_empty(root_tree_id)?;
        let mut parent = String::new();
        for name in parents {
            match self.tree_entry(&tree, name)? {
                Some(node) if node.is_tree() => {
                    tree = self.get_tree(&node.object_id)?;
                    parent = path::append_child(&parent, name);
                }
                _ => return Ok(None),
            }
        }
        Ok(self
            .tree_entry(&tree, last)?
            .map(|node| NodeRef::from_node(&parent, &node)))
    }

    /// Every feature node below `root_tree_id`, depth first in name order.
    pub fn features(&self, root_tree_id: &ObjectId) -> StoreResult<Vec<NodeRef>> {
        let mut out = Vec::new();
        let root = self.tree_or_empty(root_tree_id)?;
        self.collect_features("", &root, &mut out)?;
        Ok(out)
    }

    fn collect_features(
        &self,
        parent: &str,
        tree: &RevTree,
        out: &mut Vec<NodeRef>,
    ) -> StoreResult<()> {
        for node in self.tree_nodes(tree)? {
            let node_ref = NodeRef::from_node(parent, &node);
            if node.is_tree() {
                let subtree = self.get_tree(&node.object_id)?;
                self.collect_features(&node_ref.path, &subtree, out)?;
            } else {
                out.push(node_ref);
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for ObjectDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectDatabase").finish_non_exhaustive()
    }
}
