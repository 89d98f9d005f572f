//! The [`RefDatabase`] backend contract.

use strata_types::ObjectId;

use crate::error::{RefError, RefResult};
use crate::names::validate_ref_name;
use crate::types::{Ref, RefValue, MAX_SYMBOLIC_DEPTH};

/// Closure applied by [`RefDatabase::update`]: receives the current value
/// and returns the value to store (`None` deletes the entry).
pub type RefUpdateFn<'a> = dyn FnMut(Option<&RefValue>) -> RefResult<Option<RefValue>> + 'a;

/// Durable mapping from ref names to [`RefValue`]s.
///
/// Backends implement the five primitives below; [`RefDatabase::update`]
/// must be atomic with respect to every other mutation of the same name.
/// The remaining methods are built on the primitives.
///
/// Bare writes through [`RefDatabase::put_ref`] and friends do not guard
/// against concurrent writers. Shared refs should be mutated with
/// [`crate::UpdateRef`] / [`crate::UpdateSymRef`].
pub trait RefDatabase: Send + Sync {
    /// Read the raw stored value.
    fn read(&self, name: &str) -> RefResult<Option<RefValue>>;

    /// Create or overwrite a value.
    fn write(&self, name: &str, value: RefValue) -> RefResult<()>;

    /// Remove a value, returning what was stored.
    fn delete(&self, name: &str) -> RefResult<Option<RefValue>>;

    /// Name-sorted entries whose name starts with `prefix`.
    fn list(&self, prefix: &str) -> RefResult<Vec<(String, RefValue)>>;

    /// Atomic read-modify-write of a single name. If `f` fails, nothing is
    /// written and the error is returned. Returns the value stored before
    /// the update.
    fn update(&self, name: &str, f: &mut RefUpdateFn<'_>) -> RefResult<Option<RefValue>>;

    // -----------------------------------------------------------------------
    // Provided
    // -----------------------------------------------------------------------

    /// The direct id stored under `name`.
    fn get_ref(&self, name: &str) -> RefResult<ObjectId> {
        match self.read(name)? {
            Some(RefValue::Direct(id)) => Ok(id),
            Some(RefValue::Symbolic(_)) => Err(RefError::NotDirect(name.to_string())),
            None => Err(RefError::NotFound(name.to_string())),
        }
    }

    /// The symbolic target stored under `name`.
    fn get_sym_ref(&self, name: &str) -> RefResult<String> {
        match self.read(name)? {
            Some(RefValue::Symbolic(target)) => Ok(target),
            Some(RefValue::Direct(_)) => Err(RefError::NotSymbolic(name.to_string())),
            None => Err(RefError::NotFound(name.to_string())),
        }
    }

    fn put_ref(&self, name: &str, id: ObjectId) -> RefResult<()> {
        validate_ref_name(name)?;
        self.write(name, RefValue::Direct(id))
    }

    fn put_sym_ref(&self, name: &str, target: &str) -> RefResult<()> {
        validate_ref_name(name)?;
        validate_ref_name(target)?;
        self.write(name, RefValue::symbolic(target))
    }

    /// Remove `name`, returning the previous value if there was one.
    fn remove(&self, name: &str) -> RefResult<Option<RefValue>> {
        self.delete(name)
    }

    /// Resolve `name` through any symbolic chain.
    ///
    /// Returns `None` if `name` itself is absent. A symbolic chain ending at
    /// an absent ref resolves to the null id.
    fn resolve(&self, name: &str) -> RefResult<Option<Ref>> {
        let first_target = match self.read(name)? {
            None => return Ok(None),
            Some(RefValue::Direct(id)) => return Ok(Some(Ref::direct(name, id))),
            Some(RefValue::Symbolic(target)) => target,
        };
        let mut current = first_target.clone();
        for _ in 0..MAX_SYMBOLIC_DEPTH {
            match self.read(&current)? {
                None => return Ok(Some(Ref::symbolic(name, first_target, ObjectId::NULL))),
                Some(RefValue::Direct(id)) => {
                    return Ok(Some(Ref::symbolic(name, first_target, id)));
                }
                Some(RefValue::Symbolic(next)) => current = next,
            }
        }
        Err(RefError::SymbolicDepthExceeded {
            name: name.to_string(),
            max: MAX_SYMBOLIC_DEPTH,
        })
    }

    /// Name of the direct ref at the end of `name`'s symbolic chain.
    ///
    /// A direct or absent `name` is its own target, as is an absent ref the
    /// chain points at.
    fn resolve_target(&self, name: &str) -> RefResult<String> {
        let mut current = name.to_string();
        for _ in 0..=MAX_SYMBOLIC_DEPTH {
            match self.read(&current)? {
                Some(RefValue::Symbolic(next)) => current = next,
                _ => return Ok(current),
            }
        }
        Err(RefError::SymbolicDepthExceeded {
            name: name.to_string(),
            max: MAX_SYMBOLIC_DEPTH,
        })
    }

    /// The id `name` resolves to; null if the ref is absent or unborn.
    fn resolve_id(&self, name: &str) -> RefResult<ObjectId> {
        Ok(self
            .resolve(name)?
            .map(|r| r.object_id)
            .unwrap_or(ObjectId::NULL))
    }

    /// Resolved refs under `prefix`, sorted by name.
    fn list_refs(&self, prefix: &str) -> RefResult<Vec<Ref>> {
        let mut refs = Vec::new();
        for (name, _) in self.list(prefix)? {
            if let Some(r) = self.resolve(&name)? {
                refs.push(r);
            }
        }
        Ok(refs)
    }
}
