use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use strata_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::object::StoredObject;
use crate::traits::ObjectStore;

const COMPRESSION_LEVEL: i32 = 3;

/// Loose-object store on the local filesystem.
///
/// Each object lives at `<root>/<2 hex>/<62 hex>` as a zstd-compressed
/// `[kind tag][payload]` blob. Writes go to `<root>/tmp/` first and are
/// renamed into place after an fsync, so a reader either sees a complete
/// object or none at all. Reads re-hash the content and fail with
/// [`StoreError::HashMismatch`] if the file does not match its name.
pub struct FileObjectStore {
    root: PathBuf,
}

impl FileObjectStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(root.join("tmp"))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, id: &ObjectId) -> PathBuf {
        let hex = id.to_hex();
        self.root.join(&hex[..2]).join(&hex[2..])
    }

    fn tmp_path(&self) -> PathBuf {
        self.root.join("tmp").join(uuid::Uuid::now_v7().to_string())
    }
}

impl ObjectStore for FileObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        if id.is_null() {
            return Ok(None);
        }
        let compressed = match fs::read(self.object_path(id)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let raw = zstd::decode_all(compressed.as_slice()).map_err(|e| StoreError::CorruptObject {
            id: *id,
            reason: format!("decompression failed: {e}"),
        })?;
        let object = StoredObject::from_bytes(id, &raw)?;
        object.verify(id)?;
        Ok(Some(object))
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        let id = object.compute_id();
        if id.is_null() {
            return Err(StoreError::NullObjectId);
        }
        let path = self.object_path(&id);
        if path.exists() {
            return Ok(id);
        }
        let dir = path.parent().ok_or_else(|| StoreError::CorruptObject {
            id,
            reason: "object path has no parent".into(),
        })?;
        fs::create_dir_all(dir)?;

        let compressed = zstd::encode_all(object.to_bytes().as_slice(), COMPRESSION_LEVEL)?;

        // temp -> fsync -> rename -> fsync dir
        let tmp = self.tmp_path();
        {
            let mut file = File::create(&tmp)?;
            file.write_all(&compressed)?;
            file.sync_all()?;
        }
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        File::open(dir)?.sync_all()?;

        tracing::debug!(
            id = %id.short_hex(),
            kind = %object.kind,
            bytes = compressed.len(),
            "wrote object"
        );
        Ok(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(!id.is_null() && self.object_path(id).exists())
    }
}

impl std::fmt::Debug for FileObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileObjectStore")
            .field("root", &self.root)
            .finish()
    }
}
