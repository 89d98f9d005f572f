use serde::{Deserialize, Serialize};
use strata_types::{ObjectId, Person};

use crate::object::ObjectKind;
use crate::rev::Revision;

/// A commit: a root tree snapshot plus its history links.
///
/// The first parent is the mainline; additional parents record merges.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RevCommit {
    pub tree_id: ObjectId,
    pub parent_ids: Vec<ObjectId>,
    pub author: Person,
    pub committer: Person,
    pub message: String,
}

impl RevCommit {
    pub fn new(
        tree_id: ObjectId,
        parent_ids: Vec<ObjectId>,
        author: Person,
        committer: Person,
        message: impl Into<String>,
    ) -> Self {
        Self {
            tree_id,
            parent_ids,
            author,
            committer,
            message: message.into(),
        }
    }

    /// The first parent, if any.
    pub fn parent_id(&self) -> Option<ObjectId> {
        self.parent_ids.first().copied()
    }

    pub fn is_root(&self) -> bool {
        self.parent_ids.is_empty()
    }

    pub fn is_merge(&self) -> bool {
        self.parent_ids.len() > 1
    }
}

impl Revision for RevCommit {
    const KIND: ObjectKind = ObjectKind::Commit;
}
