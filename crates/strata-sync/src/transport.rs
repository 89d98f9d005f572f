use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use strata_refs::types::HEADS_PREFIX;
use strata_refs::RefDatabase;
use strata_store::{ObjectDatabase, StoredObject};
use strata_types::ObjectId;

use crate::error::{SyncError, SyncResult};
use crate::types::RemoteConfig;

/// Transport interface for remote strata repositories.
#[async_trait]
pub trait RemoteTransport: Send + Sync {
    /// Branch refs of the remote with their tips. Unborn branches are
    /// omitted.
    async fn list_refs(&self) -> SyncResult<Vec<(String, ObjectId)>>;

    /// The objects for `wants`, each paired with the id it was sent as.
    async fn fetch_objects(&self, wants: &[ObjectId]) -> SyncResult<Vec<(ObjectId, StoredObject)>>;
}

/// Opens a transport for a configured remote.
pub trait TransportFactory: Send + Sync {
    fn connect(&self, remote: &RemoteConfig) -> SyncResult<Box<dyn RemoteTransport>>;
}

/// Serves another repository's stores in the same process.
#[derive(Clone)]
pub struct LocalTransport {
    db: ObjectDatabase,
    refs: Arc<dyn RefDatabase>,
}

impl LocalTransport {
    pub fn new(db: ObjectDatabase, refs: Arc<dyn RefDatabase>) -> Self {
        Self { db, refs }
    }
}

impl fmt::Debug for LocalTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalTransport").finish_non_exhaustive()
    }
}

#[async_trait]
impl RemoteTransport for LocalTransport {
    async fn list_refs(&self) -> SyncResult<Vec<(String, ObjectId)>> {
        Ok(self
            .refs
            .list_refs(HEADS_PREFIX)?
            .into_iter()
            .filter(|r| !r.object_id.is_null())
            .map(|r| (r.name, r.object_id))
            .collect())
    }

    async fn fetch_objects(&self, wants: &[ObjectId]) -> SyncResult<Vec<(ObjectId, StoredObject)>> {
        let found = self.db.store().read_batch(wants)?;
        wants
            .iter()
            .zip(found)
            .map(|(id, obj)| obj.map(|o| (*id, o)).ok_or(SyncError::MissingObject(*id)))
            .collect()
    }
}

/// A [`TransportFactory`] over registered in-process repositories, keyed by
/// URL.
#[derive(Default)]
pub struct LocalTransportRegistry {
    remotes: RwLock<HashMap<String, LocalTransport>>,
}

impl LocalTransportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, url: impl Into<String>, transport: LocalTransport) -> SyncResult<()> {
        let mut remotes = self
            .remotes
            .write()
            .map_err(|_| SyncError::TransportError("registry lock poisoned".into()))?;
        remotes.insert(url.into(), transport);
        Ok(())
    }
}

impl fmt::Debug for LocalTransportRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.remotes.read().map(|r| r.len()).unwrap_or(0);
        f.debug_struct("LocalTransportRegistry")
            .field("remotes", &count)
            .finish()
    }
}

impl TransportFactory for LocalTransportRegistry {
    fn connect(&self, remote: &RemoteConfig) -> SyncResult<Box<dyn RemoteTransport>> {
        let remotes = self
            .remotes
            .read()
            .map_err(|_| SyncError::TransportError("registry lock poisoned".into()))?;
        let transport = remotes
            .get(&remote.url)
            .cloned()
            .ok_or_else(|| SyncError::TransportError(format!("no repository at {}", remote.url)))?;
        Ok(Box::new(transport))
    }
}
