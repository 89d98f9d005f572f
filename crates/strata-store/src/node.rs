use serde::{Deserialize, Serialize};
use strata_types::{path, ObjectId};

/// What a tree entry points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeType {
    Tree,
    Feature,
}

/// A named entry of a [`crate::RevTree`].
///
/// `metadata_id` references the [`crate::RevFeatureType`] describing the
/// node: for a feature it is the feature's schema, for a subtree the default
/// schema of its contents. It may be null.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub object_id: ObjectId,
    pub metadata_id: ObjectId,
    pub node_type: NodeType,
}

impl Node {
    pub fn new(
        name: impl Into<String>,
        object_id: ObjectId,
        metadata_id: ObjectId,
        node_type: NodeType,
    ) -> Self {
        Self {
            name: name.into(),
            object_id,
            metadata_id,
            node_type,
        }
    }

    pub fn tree(name: impl Into<String>, object_id: ObjectId, metadata_id: ObjectId) -> Self {
        Self::new(name, object_id, metadata_id, NodeType::Tree)
    }

    pub fn feature(name: impl Into<String>, object_id: ObjectId, metadata_id: ObjectId) -> Self {
        Self::new(name, object_id, metadata_id, NodeType::Feature)
    }

    pub fn is_tree(&self) -> bool {
        self.node_type == NodeType::Tree
    }
}

/// A node located by its full path from the root tree.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub path: String,
    pub object_id: ObjectId,
    pub metadata_id: ObjectId,
    pub node_type: NodeType,
}

impl NodeRef {
    /// Locate `node` inside the tree at `parent_path`.
    pub fn from_node(parent_path: &str, node: &Node) -> Self {
        Self {
            path: path::append_child(parent_path, &node.name),
            object_id: node.object_id,
            metadata_id: node.metadata_id,
            node_type: node.node_type,
        }
    }

    pub fn feature(path: impl Into<String>, object_id: ObjectId, metadata_id: ObjectId) -> Self {
        Self {
            path: path.into(),
            object_id,
            metadata_id,
            node_type: NodeType::Feature,
        }
    }

    pub fn tree(path: impl Into<String>, object_id: ObjectId, metadata_id: ObjectId) -> Self {
        Self {
            path: path.into(),
            object_id,
            metadata_id,
            node_type: NodeType::Tree,
        }
    }

    /// The entry name, the last component of the path.
    pub fn name(&self) -> &str {
        path::node_name(&self.path)
    }

    pub fn parent_path(&self) -> &str {
        path::parent_path(&self.path)
    }

    pub fn is_tree(&self) -> bool {
        self.node_type == NodeType::Tree
    }

    /// Strip the path back down to a tree entry.
    pub fn to_node(&self) -> Node {
        Node::new(self.name(), self.object_id, self.metadata_id, self.node_type)
    }
}

impl std::fmt::Display for NodeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.path, self.object_id.short_hex())
    }
}
