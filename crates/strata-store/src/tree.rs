use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strata_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::node::Node;
use crate::object::ObjectKind;
use crate::rev::Revision;
use crate::traits::ObjectStore;

/// Entry count above which a tree is sharded into buckets.
///
/// Part of the object format: the bucket layout feeds into the tree id, so
/// every repository must shard at the same size.
pub const MAX_TREE_ENTRIES: usize = 512;

/// A contiguous, name-ordered slice of a sharded tree.
///
/// `first_name` is the smallest entry name stored in the bucket tree, which
/// lets lookups pick the right bucket without loading the others.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bucket {
    pub first_name: String,
    pub tree_id: ObjectId,
}

/// A tree: either a flat list of entries or a list of buckets.
///
/// Entries are sorted by name with no duplicates. A bucketed tree has no
/// direct entries; its logical contents are the concatenation of its bucket
/// trees' entries, in bucket order. `size` is the logical entry count either
/// way.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RevTree {
    entries: Vec<Node>,
    buckets: Vec<Bucket>,
    size: u64,
}

impl RevTree {
    /// The empty tree.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a flat tree from unsorted nodes. Fails on duplicate names.
    pub fn new(mut nodes: Vec<Node>) -> StoreResult<Self> {
        nodes.sort_by(|a, b| a.name.cmp(&b.name));
        if let Some(dup) = nodes.windows(2).find(|w| w[0].name == w[1].name) {
            return Err(StoreError::DuplicateEntry(dup[0].name.clone()));
        }
        Ok(Self::from_sorted(nodes))
    }

    fn from_sorted(entries: Vec<Node>) -> Self {
        let size = entries.len() as u64;
        Self {
            entries,
            buckets: Vec::new(),
            size,
        }
    }

    fn from_buckets(buckets: Vec<Bucket>, size: u64) -> Self {
        Self {
            entries: Vec::new(),
            buckets,
            size,
        }
    }

    /// Direct entries. Empty for a bucketed tree.
    pub fn entries(&self) -> &[Node] {
        &self.entries
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    pub fn is_bucketed(&self) -> bool {
        !self.buckets.is_empty()
    }

    /// Logical number of entries, counting through buckets.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Look up a direct entry by name (flat trees only).
    pub fn entry(&self, name: &str) -> Option<&Node> {
        self.entries
            .binary_search_by(|n| n.name.as_str().cmp(name))
            .ok()
            .map(|i| &self.entries[i])
    }

    /// The bucket that would hold `name`, if this tree is bucketed.
    pub fn bucket_for(&self, name: &str) -> Option<&Bucket> {
        let idx = self
            .buckets
            .partition_point(|b| b.first_name.as_str() <= name);
        idx.checked_sub(1).map(|i| &self.buckets[i])
    }
}

impl Revision for RevTree {
    const KIND: ObjectKind = ObjectKind::Tree;
}

/// Mutable, name-keyed set of entries that produces a [`RevTree`].
///
/// [`TreeBuilder::build`] shards the result into buckets when it holds more
/// than [`MAX_TREE_ENTRIES`] names, writing each bucket tree to the store.
#[derive(Clone)]
pub struct TreeBuilder {
    entries: BTreeMap<String, Node>,
    max_entries: usize,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            max_entries: MAX_TREE_ENTRIES,
        }
    }

    /// A builder sharding at a smaller size, so tests can reach bucketed
    /// layouts with a handful of entries.
    #[cfg(test)]
    pub(crate) fn with_max_entries(max_entries: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            max_entries: max_entries.max(1),
        }
    }

    /// Seed a builder with existing entries.
    pub fn from_nodes(nodes: impl IntoIterator<Item = Node>) -> Self {
        let mut builder = Self::new();
        for node in nodes {
            builder.put(node);
        }
        builder
    }

    /// Insert or replace the entry with `node.name`, returning the previous.
    pub fn put(&mut self, node: Node) -> Option<Node> {
        self.entries.insert(node.name.clone(), node)
    }

    pub fn remove(&mut self, name: &str) -> Option<Node> {
        self.entries.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Produce the tree. Bucket trees are written to `store`; the returned
    /// root tree itself is not.
    pub fn build(self, store: &dyn ObjectStore) -> StoreResult<RevTree> {
        let size = self.entries.len();
        let nodes: Vec<Node> = self.entries.into_values().collect();
        if size <= self.max_entries {
            return Ok(RevTree::from_sorted(nodes));
        }

        let mut buckets = Vec::with_capacity(size.div_ceil(self.max_entries));
        for chunk in nodes.chunks(self.max_entries) {
            let bucket_tree = RevTree::from_sorted(chunk.to_vec());
            let tree_id = store.write(&bucket_tree.to_stored_object()?)?;
            buckets.push(Bucket {
                first_name: chunk[0].name.clone(),
                tree_id,
            });
        }
        tracing::debug!(entries = size, buckets = buckets.len(), "sharded tree");
        Ok(RevTree::from_buckets(buckets, size as u64))
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TreeBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeBuilder")
            .field("entries", &self.entries.len())
            .field("max_entries", &self.max_entries)
            .finish()
    }
}
