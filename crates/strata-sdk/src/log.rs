use strata_store::{ObjectDatabase, RevCommit};
use strata_types::ObjectId;

use crate::error::SdkResult;

/// First-parent history, newest first.
///
/// Stops after the root commit, or after the first error.
pub struct LogIter {
    db: ObjectDatabase,
    next: ObjectId,
}

impl LogIter {
    pub fn new(db: &ObjectDatabase, start: ObjectId) -> Self {
        Self {
            db: db.clone(),
            next: start,
        }
    }
}

impl Iterator for LogIter {
    type Item = SdkResult<(ObjectId, RevCommit)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next.is_null() {
            return None;
        }
        let id = self.next;
        match self.db.get_commit(&id) {
            Ok(commit) => {
                self.next = commit.parent_id().unwrap_or(ObjectId::NULL);
                Some(Ok((id, commit)))
            }
            Err(e) => {
                self.next = ObjectId::NULL;
                Some(Err(e.into()))
            }
        }
    }
}
