use serde::de::DeserializeOwned;
use serde::Serialize;
use strata_types::ObjectId;

use crate::commit::RevCommit;
use crate::error::{StoreError, StoreResult};
use crate::feature::{RevFeature, RevFeatureType};
use crate::object::{decode, encode, ObjectKind, StoredObject};
use crate::tree::RevTree;

/// A typed revision object with a fixed [`ObjectKind`].
///
/// The canonical encoding is bincode of the value; the id is the
/// kind-domain hash of that encoding.
pub trait Revision: Serialize + DeserializeOwned {
    const KIND: ObjectKind;

    fn to_stored_object(&self) -> StoreResult<StoredObject> {
        Ok(StoredObject::new(Self::KIND, encode(self)?))
    }

    /// Decode `obj`, failing with [`StoreError::TypeMismatch`] if it holds
    /// another kind.
    fn from_stored_object(id: &ObjectId, obj: &StoredObject) -> StoreResult<Self> {
        if obj.kind != Self::KIND {
            return Err(StoreError::TypeMismatch {
                id: *id,
                expected: Self::KIND,
                actual: obj.kind,
            });
        }
        decode(id, &obj.data)
    }

    /// The content id this object would be stored under.
    fn id(&self) -> StoreResult<ObjectId> {
        Ok(self.to_stored_object()?.compute_id())
    }
}

/// Any revision object, decoded according to its stored kind.
#[derive(Clone, Debug, PartialEq)]
pub enum RevObject {
    Commit(RevCommit),
    Tree(RevTree),
    Feature(RevFeature),
    FeatureType(RevFeatureType),
}

impl RevObject {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Commit(_) => ObjectKind::Commit,
            Self::Tree(_) => ObjectKind::Tree,
            Self::Feature(_) => ObjectKind::Feature,
            Self::FeatureType(_) => ObjectKind::FeatureType,
        }
    }

    pub fn decode(id: &ObjectId, obj: &StoredObject) -> StoreResult<Self> {
        Ok(match obj.kind {
            ObjectKind::Commit => Self::Commit(RevCommit::from_stored_object(id, obj)?),
            ObjectKind::Tree => Self::Tree(RevTree::from_stored_object(id, obj)?),
            ObjectKind::Feature => Self::Feature(RevFeature::from_stored_object(id, obj)?),
            ObjectKind::FeatureType => {
                Self::FeatureType(RevFeatureType::from_stored_object(id, obj)?)
            }
        })
    }

    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        match self {
            Self::Commit(c) => c.to_stored_object(),
            Self::Tree(t) => t.to_stored_object(),
            Self::Feature(f) => f.to_stored_object(),
            Self::FeatureType(t) => t.to_stored_object(),
        }
    }

    pub fn id(&self) -> StoreResult<ObjectId> {
        Ok(self.to_stored_object()?.compute_id())
    }
}

impl From<RevCommit> for RevObject {
    fn from(c: RevCommit) -> Self {
        Self::Commit(c)
    }
}

impl From<RevTree> for RevObject {
    fn from(t: RevTree) -> Self {
        Self::Tree(t)
    }
}

impl From<RevFeature> for RevObject {
    fn from(f: RevFeature) -> Self {
        Self::Feature(f)
    }
}

impl From<RevFeatureType> for RevObject {
    fn from(t: RevFeatureType) -> Self {
        Self::FeatureType(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::Value;

    #[test]
    fn decode_dispatches_on_kind() {
        let feature = RevFeature::new(ObjectId::NULL, vec![Value::Int(3)]);
        let stored = feature.to_stored_object().unwrap();
        let id = stored.compute_id();
        let decoded = RevObject::decode(&id, &stored).unwrap();
        assert_eq!(decoded.kind(), ObjectKind::Feature);
        assert_eq!(decoded, RevObject::Feature(feature));
        assert_eq!(decoded.id().unwrap(), id);
    }

    #[test]
    fn typed_decode_rejects_other_kind() {
        let stored = RevTree::empty().to_stored_object().unwrap();
        let id = stored.compute_id();
        let err = RevCommit::from_stored_object(&id, &stored).unwrap_err();
        assert!(matches!(
            err,
            StoreError::TypeMismatch {
                expected: ObjectKind::Commit,
                actual: ObjectKind::Tree,
                ..
            }
        ));
    }
}
