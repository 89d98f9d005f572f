use strata_types::ObjectId;

/// Domain-separated BLAKE3 content hasher.
///
/// The domain tag is fed to the hasher ahead of the data, followed by a `:`
/// separator.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for commit objects.
    pub const COMMIT: Self = Self::new("strata-commit-v1");
    /// Hasher for tree objects (including bucket trees).
    pub const TREE: Self = Self::new("strata-tree-v1");
    /// Hasher for feature objects.
    pub const FEATURE: Self = Self::new("strata-feature-v1");
    /// Hasher for feature type (schema) objects.
    pub const FEATURE_TYPE: Self = Self::new("strata-featuretype-v1");

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> ObjectId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        ObjectId::from_hash(*hasher.finalize().as_bytes())
    }

    /// Verify that data produces the expected object id.
    pub fn verify(&self, data: &[u8], expected: &ObjectId) -> bool {
        self.hash(data) == *expected
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}
