use strata_refs::types::{HEAD, WORK_HEAD};
use strata_refs::{RefDatabase, RefError};
use strata_store::{ObjectDatabase, RevObject, StoreError};
use strata_types::ObjectId;

use crate::error::{DiffSide, SdkError, SdkResult};
use crate::revparse::rev_parse;

/// Options for [`crate::Repository::diff`]: two revisions and an optional
/// path filter. The old side defaults to `HEAD`, the new side to
/// `WORK_HEAD`.
#[derive(Clone, Debug, Default)]
pub struct DiffOp {
    pub old_version: Option<String>,
    pub new_version: Option<String>,
    pub filter: Option<String>,
}

impl DiffOp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn old_version(mut self, spec: impl Into<String>) -> Self {
        self.old_version = Some(spec.into());
        self
    }

    pub fn new_version(mut self, spec: impl Into<String>) -> Self {
        self.new_version = Some(spec.into());
        self
    }

    pub fn filter(mut self, path: impl Into<String>) -> Self {
        self.filter = Some(path.into());
        self
    }

    pub(crate) fn old_spec(&self) -> &str {
        self.old_version.as_deref().unwrap_or(HEAD)
    }

    pub(crate) fn new_spec(&self) -> &str {
        self.new_version.as_deref().unwrap_or(WORK_HEAD)
    }
}

/// Whether `err` is about the revision string itself rather than the
/// health of the store or ref database.
fn is_revision_error(err: &SdkError) -> bool {
    matches!(
        err,
        SdkError::BadRevision(_)
            | SdkError::Store(
                StoreError::NotFound(_) | StoreError::TypeMismatch { .. } | StoreError::NullObjectId
            )
            | SdkError::Ref(
                RefError::NotFound(_)
                    | RefError::InvalidName { .. }
                    | RefError::SymbolicDepthExceeded { .. }
            )
    )
}

/// Resolve `spec` to the root tree it denotes: a commit's tree, a tree
/// itself, or null. A spec that names nothing, or names a feature or
/// feature type, is an [`SdkError::InvalidRevisionSpec`] naming `side`.
/// Store and ref failures propagate as they are.
pub(crate) fn resolve_tree(
    refs: &dyn RefDatabase,
    db: &ObjectDatabase,
    spec: &str,
    side: DiffSide,
) -> SdkResult<ObjectId> {
    let invalid = |reason: String| SdkError::InvalidRevisionSpec {
        spec: spec.to_string(),
        side,
        reason,
    };
    let id = match rev_parse(refs, db, spec) {
        Ok(id) => id,
        Err(e) if is_revision_error(&e) => return Err(invalid(e.to_string())),
        Err(e) => return Err(e),
    };
    if id.is_null() {
        return Ok(ObjectId::NULL);
    }
    let object = match db.get(&id) {
        Ok(object) => object,
        Err(StoreError::NotFound(_)) => {
            return Err(invalid(format!("{} does not exist", id.short_hex())));
        }
        Err(e) => return Err(e.into()),
    };
    match object {
        RevObject::Commit(commit) => Ok(commit.tree_id),
        RevObject::Tree(_) => Ok(id),
        other => Err(invalid(format!("{} is a {}", id.short_hex(), other.kind()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use strata_refs::InMemoryRefDatabase;
    use strata_store::{FileObjectStore, RevCommit, RevFeature, RevTree, Value};
    use strata_types::Person;

    #[test]
    fn defaults_are_head_and_work_head() {
        let op = DiffOp::new();
        assert_eq!(op.old_spec(), "HEAD");
        assert_eq!(op.new_spec(), "WORK_HEAD");
        let op = DiffOp::new().old_version("a").new_version("b").filter("roads");
        assert_eq!((op.old_spec(), op.new_spec()), ("a", "b"));
        assert_eq!(op.filter.as_deref(), Some("roads"));
    }

    #[test]
    fn resolves_commits_and_trees() {
        let db = ObjectDatabase::in_memory();
        let refs = InMemoryRefDatabase::new();
        let tree = db.put(&RevTree::empty()).unwrap();
        let commit = db
            .put(&RevCommit::new(tree, vec![], Person::anonymous(), Person::anonymous(), "c"))
            .unwrap();
        refs.put_ref("refs/heads/master", commit).unwrap();
        refs.put_ref("WORK_HEAD", tree).unwrap();

        assert_eq!(resolve_tree(&refs, &db, "master", DiffSide::Old).unwrap(), tree);
        assert_eq!(resolve_tree(&refs, &db, "WORK_HEAD", DiffSide::New).unwrap(), tree);
        assert!(resolve_tree(&refs, &db, &ObjectId::NULL.to_hex(), DiffSide::Old)
            .unwrap()
            .is_null());
    }

    #[test]
    fn feature_id_is_invalid_with_side() {
        let db = ObjectDatabase::in_memory();
        let refs = InMemoryRefDatabase::new();
        let feature = db.put(&RevFeature::new(ObjectId::NULL, vec![Value::Int(1)])).unwrap();

        let err = resolve_tree(&refs, &db, &feature.to_hex(), DiffSide::New).unwrap_err();
        match err {
            SdkError::InvalidRevisionSpec { spec, side, .. } => {
                assert_eq!(spec, feature.to_hex());
                assert_eq!(side, DiffSide::New);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(matches!(
            resolve_tree(&refs, &db, "no-such-branch", DiffSide::Old),
            Err(SdkError::InvalidRevisionSpec { side: DiffSide::Old, .. })
        ));
    }

    #[test]
    fn corrupt_object_is_a_store_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileObjectStore::open(dir.path()).unwrap();
        let db = ObjectDatabase::new(Arc::new(store));
        let refs = InMemoryRefDatabase::new();
        let tree = db.put(&RevTree::empty()).unwrap();
        let commit = db
            .put(&RevCommit::new(tree, vec![], Person::anonymous(), Person::anonymous(), "c"))
            .unwrap();
        refs.put_ref("HEAD", commit).unwrap();

        let hex = commit.to_hex();
        std::fs::write(dir.path().join(&hex[..2]).join(&hex[2..]), b"not an object").unwrap();

        let err = resolve_tree(&refs, &db, "HEAD", DiffSide::Old).unwrap_err();
        assert!(matches!(err, SdkError::Store(_)), "unexpected error: {err}");
    }

    #[test]
    fn missing_parent_is_invalid_with_side() {
        let db = ObjectDatabase::in_memory();
        let refs = InMemoryRefDatabase::new();
        let tree = db.put(&RevTree::empty()).unwrap();
        let commit = db
            .put(&RevCommit::new(tree, vec![], Person::anonymous(), Person::anonymous(), "c"))
            .unwrap();
        refs.put_ref("refs/heads/master", commit).unwrap();

        assert!(matches!(
            resolve_tree(&refs, &db, "master~1", DiffSide::New),
            Err(SdkError::InvalidRevisionSpec { side: DiffSide::New, .. })
        ));
    }
}
