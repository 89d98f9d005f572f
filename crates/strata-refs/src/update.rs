//! Compare-and-swap ref updates.
//!
//! [`UpdateRef`] writes direct values and [`UpdateSymRef`] symbolic ones.
//! Both follow the same protocol:
//!
//! 1. If an old value is given, the stored value must equal it exactly,
//!    otherwise the update fails with [`RefError::ConcurrentModification`]
//!    and nothing changes. An absent ref compares equal to the null id.
//!    A ref may change kind between updates, so the comparison covers both
//!    direct and symbolic stored values.
//! 2. On delete, the entry is removed and the ref as it resolved before the
//!    delete is returned (`None` if it never existed).
//! 3. Otherwise the new value is written and the ref is re-resolved.
//!
//! The comparison and the write happen inside one
//! [`RefDatabase::update`] call, so two racing updaters with the same
//! expected value cannot both succeed.

use strata_types::ObjectId;

use crate::error::{RefError, RefResult};
use crate::names::validate_ref_name;
use crate::traits::RefDatabase;
use crate::types::{Ref, RefValue};

fn render_stored(value: Option<&RefValue>) -> String {
    value
        .map(RefValue::render)
        .unwrap_or_else(|| ObjectId::NULL.to_hex())
}

fn check_expected(
    name: &str,
    expected: Option<&RefValue>,
    stored: Option<&RefValue>,
) -> RefResult<()> {
    let Some(expected) = expected else {
        return Ok(());
    };
    let matches = match stored {
        Some(value) => value == expected,
        None => *expected == RefValue::Direct(ObjectId::NULL),
    };
    if matches {
        Ok(())
    } else {
        Err(RefError::ConcurrentModification {
            name: name.to_string(),
            expected: expected.render(),
            actual: render_stored(stored),
        })
    }
}

fn apply(
    db: &dyn RefDatabase,
    name: &str,
    new_value: Option<RefValue>,
    old_value: Option<RefValue>,
    delete: bool,
    reason: Option<&str>,
) -> RefResult<Option<Ref>> {
    validate_ref_name(name)?;
    if !delete && new_value.is_none() {
        return Err(RefError::InvalidUpdate {
            name: name.to_string(),
            reason: "no new value set".into(),
        });
    }
    if let Some(RefValue::Symbolic(target)) = &new_value {
        validate_ref_name(target)?;
    }

    let previous = db.update(name, &mut |stored| {
        check_expected(name, old_value.as_ref(), stored)?;
        if delete {
            Ok(None)
        } else {
            Ok(new_value.clone())
        }
    })?;

    if delete {
        tracing::debug!(name, reason, "deleted ref");
        return match previous {
            None => Ok(None),
            Some(RefValue::Direct(id)) => Ok(Some(Ref::direct(name, id))),
            Some(RefValue::Symbolic(target)) => {
                let id = db.resolve_id(&target)?;
                Ok(Some(Ref::symbolic(name, target, id)))
            }
        };
    }

    let resolved = db.resolve(name)?;
    if let Some(r) = &resolved {
        let id = r.object_id.short_hex();
        tracing::debug!(name, id = %id, target = ?r.target, reason, "updated ref");
    }
    Ok(resolved)
}

/// Conditionally set or delete a direct ref.
///
/// ```
/// use strata_refs::{InMemoryRefDatabase, UpdateRef};
/// use strata_types::ObjectId;
///
/// let db = InMemoryRefDatabase::new();
/// let tip = ObjectId::from_bytes(b"tip");
/// let r = UpdateRef::new(&db, "refs/heads/master")
///     .new_value(tip)
///     .old_value(ObjectId::NULL)
///     .call()
///     .unwrap()
///     .unwrap();
/// assert_eq!(r.object_id, tip);
/// ```
pub struct UpdateRef<'a> {
    db: &'a dyn RefDatabase,
    name: String,
    new_value: Option<ObjectId>,
    old_value: Option<RefValue>,
    delete: bool,
    reason: Option<String>,
}

impl<'a> UpdateRef<'a> {
    pub fn new(db: &'a dyn RefDatabase, name: impl Into<String>) -> Self {
        Self {
            db,
            name: name.into(),
            new_value: None,
            old_value: None,
            delete: false,
            reason: None,
        }
    }

    pub fn new_value(mut self, id: ObjectId) -> Self {
        self.new_value = Some(id);
        self
    }

    /// Require the stored value to be `value` (null: absent or null). A
    /// symbolic expectation lets a symbolic ref be detached under guard.
    pub fn old_value(mut self, value: impl Into<RefValue>) -> Self {
        self.old_value = Some(value.into());
        self
    }

    pub fn delete(mut self) -> Self {
        self.delete = true;
        self
    }

    /// Free-form reason, recorded in the log.
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Run the update. Returns the resulting ref, or the pre-delete ref when
    /// deleting.
    pub fn call(self) -> RefResult<Option<Ref>> {
        apply(
            self.db,
            &self.name,
            self.new_value.map(RefValue::Direct),
            self.old_value,
            self.delete,
            self.reason.as_deref(),
        )
    }
}

/// Conditionally set or delete a symbolic ref.
///
/// The expected old value may be symbolic or direct, so a ref can be
/// converted from one kind to the other under the same guard.
pub struct UpdateSymRef<'a> {
    db: &'a dyn RefDatabase,
    name: String,
    new_value: Option<String>,
    old_value: Option<RefValue>,
    delete: bool,
    reason: Option<String>,
}

impl<'a> UpdateSymRef<'a> {
    pub fn new(db: &'a dyn RefDatabase, name: impl Into<String>) -> Self {
        Self {
            db,
            name: name.into(),
            new_value: None,
            old_value: None,
            delete: false,
            reason: None,
        }
    }

    /// The ref name to point at.
    pub fn new_value(mut self, target: impl Into<String>) -> Self {
        self.new_value = Some(target.into());
        self
    }

    /// Require the stored value to be `value`.
    pub fn old_value(mut self, value: impl Into<RefValue>) -> Self {
        self.old_value = Some(value.into());
        self
    }

    /// Require the ref to currently point symbolically at `target`.
    pub fn old_target(self, target: impl Into<String>) -> Self {
        self.old_value(RefValue::Symbolic(target.into()))
    }

    pub fn delete(mut self) -> Self {
        self.delete = true;
        self
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn call(self) -> RefResult<Option<Ref>> {
        apply(
            self.db,
            &self.name,
            self.new_value.map(RefValue::Symbolic),
            self.old_value,
            self.delete,
            self.reason.as_deref(),
        )
    }
}
