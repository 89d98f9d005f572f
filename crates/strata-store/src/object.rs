use serde::{Deserialize, Serialize};
use strata_crypto::ContentHasher;
use strata_types::ObjectId;

use crate::error::{StoreError, StoreResult};

/// The kind of revision object stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// Snapshot of a root tree with parents and metadata.
    Commit,
    /// Name-ordered listing of child nodes.
    Tree,
    /// One structured record: ordered attribute values.
    Feature,
    /// Schema describing a family of features.
    FeatureType,
}

impl ObjectKind {
    /// The single-byte tag written ahead of the payload on disk.
    pub fn tag(self) -> u8 {
        match self {
            Self::Commit => 1,
            Self::Tree => 2,
            Self::Feature => 3,
            Self::FeatureType => 4,
        }
    }

    /// Inverse of [`ObjectKind::tag`].
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Self::Commit),
            2 => Some(Self::Tree),
            3 => Some(Self::Feature),
            4 => Some(Self::FeatureType),
            _ => None,
        }
    }

    /// The domain-separated hasher for objects of this kind.
    pub fn hasher(self) -> &'static ContentHasher {
        match self {
            Self::Commit => &ContentHasher::COMMIT,
            Self::Tree => &ContentHasher::TREE,
            Self::Feature => &ContentHasher::FEATURE,
            Self::FeatureType => &ContentHasher::FEATURE_TYPE,
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Commit => write!(f, "commit"),
            Self::Tree => write!(f, "tree"),
            Self::Feature => write!(f, "feature"),
            Self::FeatureType => write!(f, "feature type"),
        }
    }
}

/// A stored object: kind tag plus canonical encoded payload.
///
/// `StoredObject` is the unit the backends persist. Backends never look
/// inside `data`; typed access goes through [`crate::ObjectDatabase`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    pub kind: ObjectKind,
    pub data: Vec<u8>,
}

impl StoredObject {
    pub fn new(kind: ObjectKind, data: Vec<u8>) -> Self {
        Self { kind, data }
    }

    /// Compute the content-addressed id of this object.
    pub fn compute_id(&self) -> ObjectId {
        self.kind.hasher().hash(&self.data)
    }

    /// Check that this object hashes to `expected`.
    pub fn verify(&self, expected: &ObjectId) -> StoreResult<()> {
        let computed = self.compute_id();
        if computed == *expected {
            Ok(())
        } else {
            Err(StoreError::HashMismatch {
                id: *expected,
                computed,
            })
        }
    }

    /// Flatten into `[tag][payload]` for persistence.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.data.len() + 1);
        out.push(self.kind.tag());
        out.extend_from_slice(&self.data);
        out
    }

    /// Parse bytes produced by [`StoredObject::to_bytes`]. `id` is only
    /// used for error reporting.
    pub fn from_bytes(id: &ObjectId, bytes: &[u8]) -> StoreResult<Self> {
        let (&tag, data) = bytes.split_first().ok_or_else(|| StoreError::CorruptObject {
            id: *id,
            reason: "empty object file".into(),
        })?;
        let kind = ObjectKind::from_tag(tag).ok_or_else(|| StoreError::CorruptObject {
            id: *id,
            reason: format!("unknown kind tag {tag}"),
        })?;
        Ok(Self::new(kind, data.to_vec()))
    }
}

/// Encode a value with the canonical bincode configuration.
pub(crate) fn encode<T: Serialize>(value: &T) -> StoreResult<Vec<u8>> {
    bincode::serialize(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Decode a payload, reporting failures against `id`.
pub(crate) fn decode<T: for<'de> Deserialize<'de>>(id: &ObjectId, data: &[u8]) -> StoreResult<T> {
    bincode::deserialize(data).map_err(|e| StoreError::CorruptObject {
        id: *id,
        reason: e.to_string(),
    })
}
