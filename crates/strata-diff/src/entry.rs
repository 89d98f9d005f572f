use serde::{Deserialize, Serialize};
use strata_store::NodeRef;
use strata_types::ObjectId;

/// How a feature changed between two snapshots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeType {
    Added,
    Removed,
    Modified,
}

impl ChangeType {
    /// The change seen from the other direction.
    pub fn reversed(self) -> Self {
        match self {
            Self::Added => Self::Removed,
            Self::Removed => Self::Added,
            Self::Modified => Self::Modified,
        }
    }
}

impl std::fmt::Display for ChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Added => write!(f, "ADDED"),
            Self::Removed => write!(f, "REMOVED"),
            Self::Modified => write!(f, "MODIFIED"),
        }
    }
}

/// One changed feature: its node on the old side, the new side, or both.
///
/// At least one side is always present. A missing side reads as the null
/// object id.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DiffEntry {
    pub old: Option<NodeRef>,
    pub new: Option<NodeRef>,
}

impl DiffEntry {
    pub fn added(new: NodeRef) -> Self {
        Self {
            old: None,
            new: Some(new),
        }
    }

    pub fn removed(old: NodeRef) -> Self {
        Self {
            old: Some(old),
            new: None,
        }
    }

    pub fn modified(old: NodeRef, new: NodeRef) -> Self {
        Self {
            old: Some(old),
            new: Some(new),
        }
    }

    pub fn change_type(&self) -> ChangeType {
        match (&self.old, &self.new) {
            (None, _) => ChangeType::Added,
            (_, None) => ChangeType::Removed,
            _ => ChangeType::Modified,
        }
    }

    pub fn old_path(&self) -> Option<&str> {
        self.old.as_ref().map(|n| n.path.as_str())
    }

    pub fn new_path(&self) -> Option<&str> {
        self.new.as_ref().map(|n| n.path.as_str())
    }

    /// The new path if present, otherwise the old one.
    pub fn path(&self) -> &str {
        self.new_path().or(self.old_path()).unwrap_or_default()
    }

    pub fn old_object_id(&self) -> ObjectId {
        self.old.as_ref().map(|n| n.object_id).unwrap_or(ObjectId::NULL)
    }

    pub fn new_object_id(&self) -> ObjectId {
        self.new.as_ref().map(|n| n.object_id).unwrap_or(ObjectId::NULL)
    }

    /// Swap the old and new sides.
    pub fn reversed(self) -> Self {
        Self {
            old: self.new,
            new: self.old,
        }
    }
}

impl std::fmt::Display for DiffEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} -> {}",
            self.change_type(),
            self.path(),
            self.old_object_id().short_hex(),
            self.new_object_id().short_hex()
        )
    }
}
