//! Lazy parallel walk over two trees.

use std::collections::{HashSet, VecDeque};

use strata_store::{Node, NodeRef, ObjectDatabase, RevTree};
use strata_types::{path, ObjectId};

use crate::entry::DiffEntry;
use crate::error::DiffResult;
use crate::filter::PathFilter;

/// Pull-based diff between two root trees.
///
/// Both trees are merge-joined level by level in name order, so entries
/// come out sorted by path (depth first). Equal ids on both sides are
/// skipped without loading anything below them. Either root may be null,
/// which reads as the empty tree.
///
/// The walk is single pass. After an error it yields nothing further.
pub struct DiffTreeWalk {
    db: ObjectDatabase,
    filter: Option<PathFilter>,
    roots: Option<(ObjectId, ObjectId)>,
    stack: Vec<Frame>,
    pending: VecDeque<DiffEntry>,
}

/// One level of the merge-join: the entries of the old and new tree at
/// `parent`, with a cursor into each.
struct Frame {
    parent: String,
    old: Vec<Node>,
    new: Vec<Node>,
    i: usize,
    j: usize,
}

enum Step {
    Old(Node),
    New(Node),
    Both(Node, Node),
}

impl Frame {
    fn next_step(&mut self) -> Option<Step> {
        let old = self.old.get(self.i);
        let new = self.new.get(self.j);
        let step = match (old, new) {
            (None, None) => return None,
            (Some(o), None) => Step::Old(o.clone()),
            (None, Some(n)) => Step::New(n.clone()),
            (Some(o), Some(n)) => match o.name.cmp(&n.name) {
                std::cmp::Ordering::Less => Step::Old(o.clone()),
                std::cmp::Ordering::Greater => Step::New(n.clone()),
                std::cmp::Ordering::Equal => Step::Both(o.clone(), n.clone()),
            },
        };
        match step {
            Step::Old(_) => self.i += 1,
            Step::New(_) => self.j += 1,
            Step::Both(..) => {
                self.i += 1;
                self.j += 1;
            }
        }
        Some(step)
    }
}

impl DiffTreeWalk {
    pub fn new(db: &ObjectDatabase, old_tree: ObjectId, new_tree: ObjectId) -> Self {
        Self {
            db: db.clone(),
            filter: None,
            roots: Some((old_tree, new_tree)),
            stack: Vec::new(),
            pending: VecDeque::new(),
        }
    }

    /// Restrict the walk to `filter`. `None` or an empty path walks
    /// everything.
    pub fn with_filter(mut self, filter: Option<PathFilter>) -> Self {
        self.filter = filter.filter(|f| !f.is_everything());
        self
    }

    /// Drain the walk, counting entries.
    pub fn count_changes(self) -> DiffResult<usize> {
        let mut n = 0;
        for entry in self {
            entry?;
            n += 1;
        }
        Ok(n)
    }

    fn visits(&self, node_path: &str) -> bool {
        self.filter.as_ref().map_or(true, |f| f.visits(node_path))
    }

    fn reports(&self, node_path: &str) -> bool {
        self.filter.as_ref().map_or(true, |f| f.reports(node_path))
    }

    /// Logical entries of two trees at the same level, leaving out buckets
    /// present with the same id on both sides.
    fn level_nodes(&self, old: &RevTree, new: &RevTree) -> DiffResult<(Vec<Node>, Vec<Node>)> {
        if old.is_bucketed() && new.is_bucketed() {
            let old_ids: HashSet<ObjectId> = old.buckets().iter().map(|b| b.tree_id).collect();
            let new_ids: HashSet<ObjectId> = new.buckets().iter().map(|b| b.tree_id).collect();
            let load = |tree: &RevTree, other: &HashSet<ObjectId>| -> DiffResult<Vec<Node>> {
                let mut nodes = Vec::new();
                for bucket in tree.buckets().iter().filter(|b| !other.contains(&b.tree_id)) {
                    let bucket_tree = self.db.get_tree(&bucket.tree_id)?;
                    nodes.extend(self.db.tree_nodes(&bucket_tree)?);
                }
                Ok(nodes)
            };
            return Ok((load(old, &new_ids)?, load(new, &old_ids)?));
        }
        Ok((self.db.tree_nodes(old)?, self.db.tree_nodes(new)?))
    }

    fn push_frame(&mut self, parent: String, old_id: ObjectId, new_id: ObjectId) -> DiffResult<()> {
        let old = self.db.tree_or_empty(&old_id)?;
        let new = self.db.tree_or_empty(&new_id)?;
        let (old, new) = self.level_nodes(&old, &new)?;
        tracing::trace!(path = %parent, old = old.len(), new = new.len(), "diff level");
        self.stack.push(Frame {
            parent,
            old,
            new,
            i: 0,
            j: 0,
        });
        Ok(())
    }

    fn on_removed(&mut self, parent: &str, node: Node) -> DiffResult<()> {
        let node_ref = NodeRef::from_node(parent, &node);
        if !self.visits(&node_ref.path) {
            return Ok(());
        }
        if node.is_tree() {
            self.push_frame(node_ref.path, node.object_id, ObjectId::NULL)?;
        } else if self.reports(&node_ref.path) {
            self.pending.push_back(DiffEntry::removed(node_ref));
        }
        Ok(())
    }

    fn on_added(&mut self, parent: &str, node: Node) -> DiffResult<()> {
        let node_ref = NodeRef::from_node(parent, &node);
        if !self.visits(&node_ref.path) {
            return Ok(());
        }
        if node.is_tree() {
            self.push_frame(node_ref.path, ObjectId::NULL, node.object_id)?;
        } else if self.reports(&node_ref.path) {
            self.pending.push_back(DiffEntry::added(node_ref));
        }
        Ok(())
    }

    fn on_both(&mut self, parent: &str, old: Node, new: Node) -> DiffResult<()> {
        if old.object_id == new.object_id && old.node_type == new.node_type {
            return Ok(());
        }
        match (old.is_tree(), new.is_tree()) {
            (true, true) => {
                let node_path = path::append_child(parent, &new.name);
                if self.visits(&node_path) {
                    self.push_frame(node_path, old.object_id, new.object_id)?;
                }
            }
            (false, false) => {
                let old_ref = NodeRef::from_node(parent, &old);
                if self.reports(&old_ref.path) {
                    let new_ref = NodeRef::from_node(parent, &new);
                    self.pending.push_back(DiffEntry::modified(old_ref, new_ref));
                }
            }
            // a feature replaced by a tree, or the reverse
            _ => {
                self.on_removed(parent, old)?;
                self.on_added(parent, new)?;
            }
        }
        Ok(())
    }

    fn advance(&mut self) -> DiffResult<Option<DiffEntry>> {
        if let Some((old, new)) = self.roots.take() {
            if old != new {
                self.push_frame(String::new(), old, new)?;
            }
        }
        loop {
            if let Some(entry) = self.pending.pop_front() {
                return Ok(Some(entry));
            }
            let Some(frame) = self.stack.last_mut() else {
                return Ok(None);
            };
            let Some(step) = frame.next_step() else {
                self.stack.pop();
                continue;
            };
            let parent = frame.parent.clone();
            match step {
                Step::Old(node) => self.on_removed(&parent, node)?,
                Step::New(node) => self.on_added(&parent, node)?,
                Step::Both(old, new) => self.on_both(&parent, old, new)?,
            }
        }
    }
}

impl Iterator for DiffTreeWalk {
    type Item = DiffResult<DiffEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.advance() {
            Ok(entry) => entry.map(Ok),
            Err(e) => {
                self.stack.clear();
                self.pending.clear();
                Some(Err(e))
            }
        }
    }
}

impl std::fmt::Debug for DiffTreeWalk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiffTreeWalk")
            .field("filter", &self.filter)
            .field("depth", &self.stack.len())
            .field("pending", &self.pending.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::ChangeType;
    use crate::error::DiffError;
    use proptest::prelude::*;
    use std::collections::BTreeMap;
    use strata_store::{RevFeature, StoreError, TreeEditor, Value, MAX_TREE_ENTRIES};

    fn put_feature(db: &ObjectDatabase, n: i64) -> ObjectId {
        db.put(&RevFeature::new(ObjectId::NULL, vec![Value::Int(n)])).unwrap()
    }

    /// Build a root tree from `(path, value)` pairs.
    fn build(db: &ObjectDatabase, features: &[(&str, i64)]) -> ObjectId {
        let mut editor = TreeEditor::new(db, ObjectId::NULL);
        for (p, n) in features {
            let id = put_feature(db, *n);
            editor.put(&NodeRef::feature(*p, id, ObjectId::NULL)).unwrap();
        }
        editor.finish().unwrap()
    }

    fn collect(walk: DiffTreeWalk) -> Vec<DiffEntry> {
        walk.map(|e| e.unwrap()).collect()
    }

    fn summary(entries: &[DiffEntry]) -> Vec<(ChangeType, String)> {
        entries
            .iter()
            .map(|e| (e.change_type(), e.path().to_string()))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Basic cases
    // -----------------------------------------------------------------------

    #[test]
    fn both_null_is_empty() {
        let db = ObjectDatabase::in_memory();
        assert!(collect(DiffTreeWalk::new(&db, ObjectId::NULL, ObjectId::NULL)).is_empty());
    }

    #[test]
    fn same_tree_is_empty() {
        let db = ObjectDatabase::in_memory();
        let t = build(&db, &[("a", 1), ("b/c", 2)]);
        assert!(collect(DiffTreeWalk::new(&db, t, t)).is_empty());
    }

    #[test]
    fn null_old_adds_every_leaf() {
        let db = ObjectDatabase::in_memory();
        let t = build(&db, &[("z", 1), ("layer/b", 2), ("layer/a", 3), ("layer/deep/x", 4)]);
        let entries = collect(DiffTreeWalk::new(&db, ObjectId::NULL, t));
        assert_eq!(
            summary(&entries),
            vec![
                (ChangeType::Added, "layer/a".into()),
                (ChangeType::Added, "layer/b".into()),
                (ChangeType::Added, "layer/deep/x".into()),
                (ChangeType::Added, "z".into()),
            ]
        );
        assert!(entries.iter().all(|e| e.old_object_id().is_null()));
    }

    #[test]
    fn null_new_removes_every_leaf() {
        let db = ObjectDatabase::in_memory();
        let t = build(&db, &[("a", 1), ("b/c", 2)]);
        let entries = collect(DiffTreeWalk::new(&db, t, ObjectId::NULL));
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.change_type() == ChangeType::Removed));
        assert!(entries.iter().all(|e| e.new_object_id().is_null()));
    }

    #[test]
    fn modified_leaf() {
        let db = ObjectDatabase::in_memory();
        let old = build(&db, &[("pts/p1", 1), ("pts/p2", 2)]);
        let new = build(&db, &[("pts/p1", 10), ("pts/p2", 2)]);
        let entries = collect(DiffTreeWalk::new(&db, old, new));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].change_type(), ChangeType::Modified);
        assert_eq!(entries[0].path(), "pts/p1");
        assert_eq!(entries[0].old_object_id(), put_feature(&db, 1));
        assert_eq!(entries[0].new_object_id(), put_feature(&db, 10));
    }

    #[test]
    fn mixed_changes_in_path_order() {
        let db = ObjectDatabase::in_memory();
        let old = build(&db, &[("a/1", 1), ("a/2", 2), ("c", 3)]);
        let new = build(&db, &[("a/2", 20), ("a/3", 3), ("b", 4), ("c", 3)]);
        let entries = collect(DiffTreeWalk::new(&db, old, new));
        assert_eq!(
            summary(&entries),
            vec![
                (ChangeType::Removed, "a/1".into()),
                (ChangeType::Modified, "a/2".into()),
                (ChangeType::Added, "a/3".into()),
                (ChangeType::Added, "b".into()),
            ]
        );
    }

    #[test]
    fn feature_replaced_by_tree() {
        let db = ObjectDatabase::in_memory();
        let old = build(&db, &[("x", 1)]);
        let new = build(&db, &[("x/inner", 2)]);
        let entries = collect(DiffTreeWalk::new(&db, old, new));
        assert_eq!(
            summary(&entries),
            vec![
                (ChangeType::Removed, "x".into()),
                (ChangeType::Added, "x/inner".into()),
            ]
        );
    }

    // -----------------------------------------------------------------------
    // Filters
    // -----------------------------------------------------------------------

    #[test]
    fn filter_limits_to_subtree() {
        let db = ObjectDatabase::in_memory();
        let old = build(
            &db,
            &[("points/p1", 1), ("points/p2", 2), ("points/p3", 3), ("roads/r1", 4)],
        );
        let new = build(&db, &[("points/p2", 2), ("roads/r1", 40)]);
        let entries = collect(
            DiffTreeWalk::new(&db, old, new).with_filter(Some(PathFilter::new("points"))),
        );
        assert_eq!(
            summary(&entries),
            vec![
                (ChangeType::Removed, "points/p1".into()),
                (ChangeType::Removed, "points/p3".into()),
            ]
        );
        assert_eq!(entries[0].old_object_id(), put_feature(&db, 1));
        assert_eq!(entries[1].old_object_id(), put_feature(&db, 3));
    }

    #[test]
    fn filter_on_single_feature() {
        let db = ObjectDatabase::in_memory();
        let new = build(&db, &[("points/p1", 1), ("points/p10", 2)]);
        let entries = collect(
            DiffTreeWalk::new(&db, ObjectId::NULL, new)
                .with_filter(Some(PathFilter::new("points/p1"))),
        );
        assert_eq!(summary(&entries), vec![(ChangeType::Added, "points/p1".into())]);
    }

    #[test]
    fn filter_matching_nothing_is_empty() {
        let db = ObjectDatabase::in_memory();
        let new = build(&db, &[("points/p1", 1)]);
        let walk = DiffTreeWalk::new(&db, ObjectId::NULL, new)
            .with_filter(Some(PathFilter::new("nowhere")));
        assert_eq!(walk.count_changes().unwrap(), 0);
    }

    #[test]
    fn count_matches_entries() {
        let db = ObjectDatabase::in_memory();
        let old = build(&db, &[("a", 1), ("b/c", 2)]);
        let new = build(&db, &[("a", 2), ("b/d", 3)]);
        let count = DiffTreeWalk::new(&db, old, new).count_changes().unwrap();
        assert_eq!(count, collect(DiffTreeWalk::new(&db, old, new)).len());
        assert_eq!(count, 3);
    }

    // -----------------------------------------------------------------------
    // Buckets and laziness
    // -----------------------------------------------------------------------

    #[test]
    fn bucketed_trees_diff_like_flat_ones() {
        let db = ObjectDatabase::in_memory();
        let size = MAX_TREE_ENTRIES + 30;
        let old: Vec<(String, i64)> =
            (0..size).map(|i| (format!("pts/p{i:04}"), i as i64)).collect();
        let mut new = old.clone();
        new.remove(5);
        new[400].1 = -1;
        new.push(("pts/p9999".into(), 9999));

        fn build_owned(db: &ObjectDatabase, features: &[(String, i64)]) -> ObjectId {
            let pairs: Vec<(&str, i64)> = features.iter().map(|(p, n)| (p.as_str(), *n)).collect();
            build(db, &pairs)
        }
        let o = build_owned(&db, &old);
        let n = build_owned(&db, &new);
        let pts = db.find_node(&o, "pts").unwrap().unwrap();
        assert!(db.get_tree(&pts.object_id).unwrap().is_bucketed());

        assert_eq!(
            summary(&collect(DiffTreeWalk::new(&db, o, n))),
            vec![
                (ChangeType::Removed, "pts/p0005".to_string()),
                (ChangeType::Modified, "pts/p0401".to_string()),
                (ChangeType::Added, "pts/p9999".to_string()),
            ]
        );
    }

    #[test]
    fn unchanged_subtrees_are_not_loaded() {
        // An unreadable subtree with the same id on both sides must be skipped.
        let db = ObjectDatabase::in_memory();
        let missing = ObjectId::from_bytes(b"never written");
        let feature = put_feature(&db, 1);
        let root = |n: ObjectId| {
            db.put(
                &RevTree::new(vec![
                    Node::tree("ghost", missing, ObjectId::NULL),
                    Node::feature("f", n, ObjectId::NULL),
                ])
                .unwrap(),
            )
            .unwrap()
        };
        let old = root(feature);
        let new = root(put_feature(&db, 2));
        let entries = collect(DiffTreeWalk::new(&db, old, new));
        assert_eq!(summary(&entries), vec![(ChangeType::Modified, "f".into())]);
    }

    #[test]
    fn missing_tree_surfaces_error_then_stops() {
        let db = ObjectDatabase::in_memory();
        let missing = ObjectId::from_bytes(b"never written");
        let root = db
            .put(&RevTree::new(vec![Node::tree("ghost", missing, ObjectId::NULL)]).unwrap())
            .unwrap();
        let mut walk = DiffTreeWalk::new(&db, ObjectId::NULL, root);
        assert!(matches!(
            walk.next(),
            Some(Err(DiffError::Store(StoreError::NotFound(_))))
        ));
        assert!(walk.next().is_none());
    }

    // -----------------------------------------------------------------------
    // Properties
    // -----------------------------------------------------------------------

    fn snapshot() -> impl Strategy<Value = BTreeMap<String, i64>> {
        let path = prop::sample::select(vec![
            "a", "b", "c/d", "c/e", "c/f/g", "h/i", "h/j", "k",
        ]);
        prop::collection::btree_map(path.prop_map(str::to_string), 0i64..4, 0..8)
    }

    fn build_map(db: &ObjectDatabase, map: &BTreeMap<String, i64>) -> ObjectId {
        let pairs: Vec<(&str, i64)> = map.iter().map(|(p, n)| (p.as_str(), *n)).collect();
        build(db, &pairs)
    }

    proptest! {
        #[test]
        fn diff_with_self_is_empty(map in snapshot(), filter in "(|a|c|c/f|h)") {
            let db = ObjectDatabase::in_memory();
            let t = build_map(&db, &map);
            let walk = DiffTreeWalk::new(&db, t, t).with_filter(Some(PathFilter::new(&filter)));
            prop_assert_eq!(walk.count_changes().unwrap(), 0);
        }

        #[test]
        fn diff_is_antisymmetric(a in snapshot(), b in snapshot()) {
            let db = ObjectDatabase::in_memory();
            let ta = build_map(&db, &a);
            let tb = build_map(&db, &b);
            let forward = collect(DiffTreeWalk::new(&db, ta, tb));
            let backward: Vec<DiffEntry> = collect(DiffTreeWalk::new(&db, tb, ta))
                .into_iter()
                .map(DiffEntry::reversed)
                .collect();
            prop_assert_eq!(forward, backward);
        }

        #[test]
        fn diff_from_null_adds_every_leaf(map in snapshot()) {
            let db = ObjectDatabase::in_memory();
            let t = build_map(&db, &map);
            let entries = collect(DiffTreeWalk::new(&db, ObjectId::NULL, t));
            let leaves = db.features(&t).unwrap();
            prop_assert_eq!(entries.len(), leaves.len());
            for (entry, leaf) in entries.iter().zip(&leaves) {
                prop_assert_eq!(entry.change_type(), ChangeType::Added);
                prop_assert_eq!(entry.path(), leaf.path.as_str());
                prop_assert!(entry.old_object_id().is_null());
            }
        }
    }
}
