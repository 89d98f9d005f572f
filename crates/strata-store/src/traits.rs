use strata_types::ObjectId;

use crate::error::StoreResult;
use crate::object::StoredObject;

/// Content-addressed object store backend.
///
/// Implementations must uphold:
/// - Objects are immutable. The same bytes always produce the same id, and
///   writing an object that already exists is a no-op.
/// - The null id is never a key: reading it yields `None`.
/// - Reads of a present object return exactly the bytes that were written.
/// - All I/O errors are propagated.
///
/// There is no delete: objects are never removed by normal operations.
pub trait ObjectStore: Send + Sync {
    /// Read an object by id. `Ok(None)` if it is not present.
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>>;

    /// Write an object and return its content id.
    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId>;

    fn exists(&self, id: &ObjectId) -> StoreResult<bool>;

    /// Read several objects. The default calls [`ObjectStore::read`] per id.
    fn read_batch(&self, ids: &[ObjectId]) -> StoreResult<Vec<Option<StoredObject>>> {
        ids.iter().map(|id| self.read(id)).collect()
    }

    /// Write several objects in order. The default calls
    /// [`ObjectStore::write`] per object.
    fn write_batch(&self, objects: &[StoredObject]) -> StoreResult<Vec<ObjectId>> {
        objects.iter().map(|obj| self.write(obj)).collect()
    }
}
