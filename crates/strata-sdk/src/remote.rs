//! Transport to repositories on the local filesystem.

use strata_sync::{RemoteConfig, RemoteTransport, SyncError, SyncResult, TransportFactory};
use tracing::debug;

use crate::repository::Repository;

/// Connects to remotes whose URL is a path or a `file://` URL naming another
/// repository's working directory.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileTransportFactory;

impl TransportFactory for FileTransportFactory {
    fn connect(&self, remote: &RemoteConfig) -> SyncResult<Box<dyn RemoteTransport>> {
        let path = remote.url.strip_prefix("file://").unwrap_or(&remote.url);
        debug!(remote = %remote.name, path = %path, "opening file remote");
        let repo = Repository::open(path)
            .map_err(|e| SyncError::TransportError(format!("{}: {e}", remote.url)))?;
        Ok(Box::new(repo.transport()))
    }
}
