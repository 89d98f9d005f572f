use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Number of raw bytes in an [`ObjectId`].
pub const OBJECT_ID_LEN: usize = 32;

/// Content-addressed identifier for any revision object.
///
/// An `ObjectId` is the hash of an object's canonical encoding. Semantically
/// equal objects always produce the same id. Equality and ordering are by raw
/// byte value.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId([u8; OBJECT_ID_LEN]);

impl ObjectId {
    /// The null object id (all zeros). Means "absent object" and is never a
    /// valid store key.
    pub const NULL: ObjectId = ObjectId([0u8; OBJECT_ID_LEN]);

    /// Compute an `ObjectId` from raw bytes (no domain separation).
    pub fn from_bytes(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Create an `ObjectId` from a pre-computed hash.
    pub const fn from_hash(hash: [u8; OBJECT_ID_LEN]) -> Self {
        Self(hash)
    }

    /// The null object id.
    pub const fn null() -> Self {
        Self::NULL
    }

    /// Returns `true` if this is the null object id.
    pub fn is_null(&self) -> bool {
        self.0 == [0u8; OBJECT_ID_LEN]
    }

    /// The raw hash bytes.
    pub fn as_bytes(&self) -> &[u8; OBJECT_ID_LEN] {
        &self.0
    }

    /// The unsigned value of the `n`th byte, `None` past the end.
    pub fn byte_n(&self, n: usize) -> Option<u8> {
        self.0.get(n).copied()
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a full-length hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != OBJECT_ID_LEN {
            return Err(TypeError::InvalidLength {
                expected: OBJECT_ID_LEN,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; OBJECT_ID_LEN];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Returns `true` if `s` has the shape of a full hex object id.
    pub fn looks_like_hex(s: &str) -> bool {
        s.len() == OBJECT_ID_LEN * 2 && s.chars().all(|c| c.is_ascii_hexdigit())
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.short_hex())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; OBJECT_ID_LEN]> for ObjectId {
    fn from(bytes: [u8; OBJECT_ID_LEN]) -> Self {
        Self(bytes)
    }
}

impl From<ObjectId> for [u8; OBJECT_ID_LEN] {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn from_bytes_is_deterministic() {
        let id1 = ObjectId::from_bytes(b"some content");
        let id2 = ObjectId::from_bytes(b"some content");
        assert_eq!(id1, id2);
        assert_ne!(id1, ObjectId::from_bytes(b"some other content"));
    }

    #[test]
    fn null_is_all_zeros() {
        assert!(ObjectId::NULL.is_null());
        assert!(ObjectId::null().is_null());
        assert_eq!(ObjectId::default(), ObjectId::NULL);
        assert!(!ObjectId::from_bytes(b"x").is_null());
    }

    #[test]
    fn byte_n_reads_raw_bytes() {
        let mut raw = [0u8; OBJECT_ID_LEN];
        raw[1] = 1;
        raw[2] = 2;
        raw[4] = 0xff;
        let id = ObjectId::from_hash(raw);
        assert_eq!(id.byte_n(0), Some(0));
        assert_eq!(id.byte_n(1), Some(1));
        assert_eq!(id.byte_n(2), Some(2));
        assert_eq!(id.byte_n(4), Some(255));
        assert_eq!(id.byte_n(OBJECT_ID_LEN - 1), Some(0));
        assert_eq!(id.byte_n(OBJECT_ID_LEN), None);
    }

    #[test]
    fn display_and_parse_agree() {
        let id = ObjectId::from_bytes(b"test");
        let text = id.to_string();
        assert_eq!(text.len(), 64);
        assert!(ObjectId::looks_like_hex(&text));
        assert_eq!(text.parse::<ObjectId>().unwrap(), id);
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!(matches!(
            ObjectId::from_hex("zz"),
            Err(TypeError::InvalidHex(_))
        ));
        assert_eq!(
            ObjectId::from_hex("abcd"),
            Err(TypeError::InvalidLength {
                expected: 32,
                actual: 2
            })
        );
        assert!(!ObjectId::looks_like_hex("HEAD"));
    }

    #[test]
    fn short_hex_is_8_chars() {
        assert_eq!(ObjectId::from_bytes(b"test").short_hex().len(), 8);
    }

    #[test]
    fn serde_json_preserves_id() {
        let id = ObjectId::from_bytes(b"serde test");
        let json = serde_json::to_string(&id).unwrap();
        let parsed: ObjectId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    proptest! {
        #[test]
        fn hex_encoding_is_exact(raw in proptest::array::uniform32(any::<u8>())) {
            let id = ObjectId::from_hash(raw);
            prop_assert_eq!(ObjectId::from_hex(&id.to_hex()).unwrap(), id);
        }

        #[test]
        fn ordering_follows_raw_bytes(a in proptest::array::uniform32(any::<u8>()),
                                      b in proptest::array::uniform32(any::<u8>())) {
            prop_assert_eq!(ObjectId::from_hash(a).cmp(&ObjectId::from_hash(b)), a.cmp(&b));
        }
    }
}
