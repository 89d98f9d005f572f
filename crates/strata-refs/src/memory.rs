//! In-memory reference database for testing and ephemeral use.

use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::{RefError, RefResult};
use crate::traits::{RefDatabase, RefUpdateFn};
use crate::types::RefValue;

/// An in-memory implementation of [`RefDatabase`].
///
/// All refs live in a `BTreeMap` behind a `RwLock`; [`RefDatabase::update`]
/// holds the write lock across the whole read-modify-write.
#[derive(Debug, Default)]
pub struct InMemoryRefDatabase {
    refs: RwLock<BTreeMap<String, RefValue>>,
}

impl InMemoryRefDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.refs.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RefDatabase for InMemoryRefDatabase {
    fn read(&self, name: &str) -> RefResult<Option<RefValue>> {
        let refs = self.refs.read().map_err(|_| RefError::LockPoisoned)?;
        Ok(refs.get(name).cloned())
    }

    fn write(&self, name: &str, value: RefValue) -> RefResult<()> {
        let mut refs = self.refs.write().map_err(|_| RefError::LockPoisoned)?;
        refs.insert(name.to_string(), value);
        Ok(())
    }

    fn delete(&self, name: &str) -> RefResult<Option<RefValue>> {
        let mut refs = self.refs.write().map_err(|_| RefError::LockPoisoned)?;
        Ok(refs.remove(name))
    }

    fn list(&self, prefix: &str) -> RefResult<Vec<(String, RefValue)>> {
        let refs = self.refs.read().map_err(|_| RefError::LockPoisoned)?;
        Ok(refs
            .range(prefix.to_string()..)
            .take_while(|(name, _)| name.starts_with(prefix))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect())
    }

    fn update(&self, name: &str, f: &mut RefUpdateFn<'_>) -> RefResult<Option<RefValue>> {
        let mut refs = self.refs.write().map_err(|_| RefError::LockPoisoned)?;
        let previous = refs.get(name).cloned();
        match f(previous.as_ref())? {
            Some(value) => {
                refs.insert(name.to_string(), value);
            }
            None => {
                refs.remove(name);
            }
        }
        Ok(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Ref;
    use strata_types::ObjectId;

    fn oid(s: &str) -> ObjectId {
        ObjectId::from_bytes(s.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Primitives
    // -----------------------------------------------------------------------

    #[test]
    fn put_and_get_direct() {
        let db = InMemoryRefDatabase::new();
        db.put_ref("refs/heads/master", oid("c1")).unwrap();
        assert_eq!(db.get_ref("refs/heads/master").unwrap(), oid("c1"));
        assert!(matches!(
            db.get_sym_ref("refs/heads/master"),
            Err(RefError::NotSymbolic(_))
        ));
    }

    #[test]
    fn put_and_get_symbolic() {
        let db = InMemoryRefDatabase::new();
        db.put_sym_ref("HEAD", "refs/heads/master").unwrap();
        assert_eq!(db.get_sym_ref("HEAD").unwrap(), "refs/heads/master");
        assert!(matches!(db.get_ref("HEAD"), Err(RefError::NotDirect(_))));
    }

    #[test]
    fn missing_ref() {
        let db = InMemoryRefDatabase::new();
        assert!(matches!(db.get_ref("nope"), Err(RefError::NotFound(_))));
        assert!(db.resolve("nope").unwrap().is_none());
        assert!(db.resolve_id("nope").unwrap().is_null());
    }

    #[test]
    fn put_validates_names() {
        let db = InMemoryRefDatabase::new();
        assert!(db.put_ref("refs/heads/bad..name", oid("x")).is_err());
        assert!(db.put_sym_ref("HEAD", "refs/heads/a b").is_err());
        assert!(db.is_empty());
    }

    #[test]
    fn remove_returns_previous() {
        let db = InMemoryRefDatabase::new();
        db.put_ref("refs/heads/x", oid("c")).unwrap();
        assert_eq!(db.remove("refs/heads/x").unwrap(), Some(RefValue::Direct(oid("c"))));
        assert_eq!(db.remove("refs/heads/x").unwrap(), None);
    }

    #[test]
    fn list_by_prefix_sorted() {
        let db = InMemoryRefDatabase::new();
        db.put_ref("refs/remotes/origin/b", oid("b")).unwrap();
        db.put_ref("refs/remotes/origin/a", oid("a")).unwrap();
        db.put_ref("refs/remotes/upstream/a", oid("u")).unwrap();
        db.put_ref("refs/heads/master", oid("m")).unwrap();

        let names: Vec<_> = db
            .list("refs/remotes/origin/")
            .unwrap()
            .into_iter()
            .map(|(n, _)| n)
            .collect();
        assert_eq!(names, vec!["refs/remotes/origin/a", "refs/remotes/origin/b"]);
        assert_eq!(db.list("").unwrap().len(), 4);
    }

    // -----------------------------------------------------------------------
    // Resolution
    // -----------------------------------------------------------------------

    #[test]
    fn resolve_follows_chain() {
        let db = InMemoryRefDatabase::new();
        db.put_ref("refs/heads/master", oid("tip")).unwrap();
        db.put_sym_ref("HEAD", "refs/heads/master").unwrap();
        db.put_sym_ref("ALIAS", "HEAD").unwrap();

        let head = db.resolve("HEAD").unwrap().unwrap();
        assert_eq!(head, Ref::symbolic("HEAD", "refs/heads/master", oid("tip")));
        let alias = db.resolve("ALIAS").unwrap().unwrap();
        assert_eq!(alias.object_id, oid("tip"));
        assert_eq!(alias.target.as_deref(), Some("HEAD"));
    }

    #[test]
    fn resolve_unborn_branch_is_null() {
        let db = InMemoryRefDatabase::new();
        db.put_sym_ref("HEAD", "refs/heads/master").unwrap();
        let head = db.resolve("HEAD").unwrap().unwrap();
        assert!(head.object_id.is_null());
        assert!(head.is_symbolic());
    }

    #[test]
    fn resolve_rejects_cycles() {
        let db = InMemoryRefDatabase::new();
        db.put_sym_ref("A", "B").unwrap();
        db.put_sym_ref("B", "A").unwrap();
        assert!(matches!(
            db.resolve("A"),
            Err(RefError::SymbolicDepthExceeded { .. })
        ));
    }

    #[test]
    fn resolve_target_follows_every_hop() {
        let db = InMemoryRefDatabase::new();
        db.put_ref("refs/heads/master", oid("tip")).unwrap();
        db.put_sym_ref("refs/heads/alias", "refs/heads/master").unwrap();
        db.put_sym_ref("HEAD", "refs/heads/alias").unwrap();
        assert_eq!(db.resolve_target("HEAD").unwrap(), "refs/heads/master");
        assert_eq!(db.resolve_target("refs/heads/master").unwrap(), "refs/heads/master");

        db.put_sym_ref("UNBORN", "refs/heads/topic").unwrap();
        assert_eq!(db.resolve_target("UNBORN").unwrap(), "refs/heads/topic");

        db.put_sym_ref("A", "B").unwrap();
        db.put_sym_ref("B", "A").unwrap();
        assert!(matches!(
            db.resolve_target("A"),
            Err(RefError::SymbolicDepthExceeded { .. })
        ));
    }

    #[test]
    fn list_refs_resolves() {
        let db = InMemoryRefDatabase::new();
        db.put_ref("refs/heads/master", oid("m")).unwrap();
        db.put_sym_ref("refs/heads/alias", "refs/heads/master").unwrap();
        let refs = db.list_refs("refs/heads/").unwrap();
        assert_eq!(refs.len(), 2);
        assert!(refs.iter().all(|r| r.object_id == oid("m")));
    }

    // -----------------------------------------------------------------------
    // Atomic update
    // -----------------------------------------------------------------------

    #[test]
    fn update_failure_leaves_value() {
        let db = InMemoryRefDatabase::new();
        db.put_ref("R", oid("a")).unwrap();
        let result = db.update("R", &mut |_| Err(RefError::LockPoisoned));
        assert!(result.is_err());
        assert_eq!(db.get_ref("R").unwrap(), oid("a"));
    }

    #[test]
    fn update_can_delete() {
        let db = InMemoryRefDatabase::new();
        db.put_ref("R", oid("a")).unwrap();
        let previous = db.update("R", &mut |_| Ok(None)).unwrap();
        assert_eq!(previous, Some(RefValue::Direct(oid("a"))));
        assert!(db.read("R").unwrap().is_none());
    }

    #[test]
    fn concurrent_increments_are_serialized() {
        use std::sync::Arc;
        use std::thread;

        let db = Arc::new(InMemoryRefDatabase::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let db = Arc::clone(&db);
                thread::spawn(move || {
                    for _ in 0..100 {
                        db.update("COUNTER", &mut |current| {
                            let n = current
                                .and_then(RefValue::as_symbolic)
                                .and_then(|s| s.strip_prefix("n"))
                                .and_then(|s| s.parse::<u32>().ok())
                                .unwrap_or(0);
                            Ok(Some(RefValue::symbolic(format!("n{}", n + 1))))
                        })
                        .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(db.get_sym_ref("COUNTER").unwrap(), "n800");
    }
}
