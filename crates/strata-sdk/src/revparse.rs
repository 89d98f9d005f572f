//! Resolving revision strings to object ids.
//!
//! A revision is a base followed by any number of parent suffixes:
//!
//! - base: the null id, a full hex id, a ref name (`HEAD`, `WORK_HEAD`,
//!   `refs/heads/master`), a branch short name (`master`), or a tracking ref
//!   short name (`origin/master`).
//! - `^` or `^n`: the first or n-th parent; `^0` is the commit itself.
//! - `~` or `~n`: n first-parent steps.

use strata_refs::types::{HEADS_PREFIX, REMOTES_PREFIX};
use strata_refs::{validate_ref_name, RefDatabase};
use strata_store::ObjectDatabase;
use strata_types::ObjectId;

use crate::error::{SdkError, SdkResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    /// 1-based parent index; 0 keeps the commit.
    Parent(usize),
    /// First-parent steps.
    Ancestor(usize),
}

fn split(spec: &str) -> SdkResult<(&str, Vec<Step>)> {
    let bad = || SdkError::BadRevision(spec.to_string());
    let cut = spec.find(['^', '~']).unwrap_or(spec.len());
    let (base, mut rest) = spec.split_at(cut);
    if base.is_empty() {
        return Err(bad());
    }

    let mut steps = Vec::new();
    while let Some(op) = rest.chars().next() {
        rest = &rest[op.len_utf8()..];
        let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        let n = if digits == 0 {
            1
        } else {
            rest[..digits].parse().map_err(|_| bad())?
        };
        rest = &rest[digits..];
        steps.push(match op {
            '^' => Step::Parent(n),
            '~' => Step::Ancestor(n),
            _ => return Err(bad()),
        });
    }
    Ok((base, steps))
}

fn resolve_base(
    refs: &dyn RefDatabase,
    db: &ObjectDatabase,
    base: &str,
) -> SdkResult<Option<ObjectId>> {
    if ObjectId::looks_like_hex(base) {
        let id = ObjectId::from_hex(base).map_err(|_| SdkError::BadRevision(base.to_string()))?;
        if id.is_null() || db.exists(&id)? {
            return Ok(Some(id));
        }
        return Ok(None);
    }
    let candidates = [
        base.to_string(),
        format!("{HEADS_PREFIX}{base}"),
        format!("{REMOTES_PREFIX}{base}"),
    ];
    for name in candidates.iter().filter(|n| validate_ref_name(n).is_ok()) {
        if let Some(r) = refs.resolve(name)? {
            return Ok(Some(r.object_id));
        }
    }
    Ok(None)
}

/// Resolve `spec` to an object id. An unborn branch resolves to the null
/// id; a parent suffix on it is an error.
pub fn rev_parse(refs: &dyn RefDatabase, db: &ObjectDatabase, spec: &str) -> SdkResult<ObjectId> {
    let (base, steps) = split(spec)?;
    let mut id = resolve_base(refs, db, base)?
        .ok_or_else(|| SdkError::BadRevision(spec.to_string()))?;

    for step in steps {
        let (index, hops) = match step {
            Step::Parent(0) => continue,
            Step::Parent(n) => (n - 1, 1),
            Step::Ancestor(n) => (0, n),
        };
        for _ in 0..hops {
            if id.is_null() {
                return Err(SdkError::BadRevision(spec.to_string()));
            }
            let commit = db.get_commit(&id)?;
            id = *commit
                .parent_ids
                .get(index)
                .ok_or_else(|| SdkError::BadRevision(spec.to_string()))?;
        }
    }
    Ok(id)
}
