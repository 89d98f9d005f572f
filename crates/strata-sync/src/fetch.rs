//! Fetching remote branches into local tracking refs.

use std::collections::BTreeSet;

use strata_refs::types::branch_name;
use strata_refs::{RefDatabase, UpdateRef};
use strata_store::ObjectDatabase;
use tracing::{debug, info};

use crate::error::{SyncError, SyncResult};
use crate::transport::TransportFactory;
use crate::types::{FetchResult, RemoteConfig, TrackingRefUpdate};
use crate::walker::MissingObjectWalker;

/// Remote name used when a fetch names no remote and no default is set.
pub const DEFAULT_REMOTE: &str = "origin";

/// The local side of a fetch.
pub struct FetchContext<'a> {
    pub db: &'a ObjectDatabase,
    pub refs: &'a dyn RefDatabase,
    /// Configured remotes.
    pub remotes: &'a [RemoteConfig],
    pub default_remote: Option<&'a str>,
    pub transports: &'a dyn TransportFactory,
}

/// Fetch branches from one or more remotes.
///
/// Each remote branch covered by the remote's refspec has its missing
/// objects transferred and its tracking ref moved with a compare-and-swap
/// against the value read before the transfer. Refs are updated one at a
/// time: a failure leaves earlier updates in place. With `prune`, tracking
/// refs whose branch the remote no longer has are deleted.
#[derive(Clone, Debug, Default)]
pub struct FetchOp {
    remotes: Vec<String>,
    all: bool,
    branches: Vec<String>,
    prune: bool,
}

impl FetchOp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_remote(mut self, name: impl Into<String>) -> Self {
        self.remotes.push(name.into());
        self
    }

    /// Fetch from every configured remote.
    pub fn all(mut self, all: bool) -> Self {
        self.all = all;
        self
    }

    /// Only fetch this branch (short name). May be given several times.
    pub fn branch(mut self, name: impl Into<String>) -> Self {
        self.branches.push(name.into());
        self
    }

    pub fn prune(mut self, prune: bool) -> Self {
        self.prune = prune;
        self
    }

    pub async fn call(&self, ctx: &FetchContext<'_>) -> SyncResult<FetchResult> {
        let mut result = FetchResult::default();
        for remote in self.selected_remotes(ctx)? {
            self.fetch_remote(ctx, remote, &mut result).await?;
        }
        info!(
            updated = result.updates.len(),
            pruned = result.pruned.len(),
            objects = result.objects_fetched,
            "fetch complete"
        );
        Ok(result)
    }

    fn selected_remotes<'c>(&self, ctx: &FetchContext<'c>) -> SyncResult<Vec<&'c RemoteConfig>> {
        let find = |name: &str| ctx.remotes.iter().find(|r| r.name == name);

        let mut selected: Vec<&RemoteConfig> = Vec::new();
        if self.all {
            selected.extend(ctx.remotes.iter());
        }
        for name in &self.remotes {
            let remote = find(name).ok_or_else(|| SyncError::UnknownRemote(name.clone()))?;
            if !selected.iter().any(|r| r.name == remote.name) {
                selected.push(remote);
            }
        }
        if selected.is_empty() && !self.all && self.remotes.is_empty() {
            let name = ctx.default_remote.unwrap_or(DEFAULT_REMOTE);
            selected.extend(find(name));
        }
        if selected.is_empty() {
            return Err(SyncError::NoRemotesConfigured);
        }
        Ok(selected)
    }

    async fn fetch_remote(
        &self,
        ctx: &FetchContext<'_>,
        remote: &RemoteConfig,
        result: &mut FetchResult,
    ) -> SyncResult<()> {
        let transport = ctx.transports.connect(remote)?;
        let advertised = transport.list_refs().await?;
        debug!(remote = %remote.name, refs = advertised.len(), "listed remote refs");

        let walker = MissingObjectWalker::new(ctx.db, transport.as_ref());
        let mut reported = BTreeSet::new();
        for (remote_name, tip) in advertised {
            let Some(tracking) = remote.fetch.map_src(&remote_name) else {
                continue;
            };
            reported.insert(tracking.clone());
            if !self.wants_branch(&remote_name) {
                continue;
            }

            let old = ctx.refs.resolve_id(&tracking)?;
            if old == tip {
                continue;
            }
            result.objects_fetched += walker.transfer(tip).await?;
            UpdateRef::new(ctx.refs, tracking.as_str())
                .new_value(tip)
                .old_value(old)
                .reason(format!("fetch {}", remote.name))
                .call()?;
            info!(
                remote = %remote.name,
                name = %tracking,
                old = %old.short_hex(),
                new = %tip.short_hex(),
                "tracking ref updated"
            );
            result.updates.push(TrackingRefUpdate {
                remote: remote.name.clone(),
                name: tracking,
                old,
                new: tip,
            });
        }

        if self.prune {
            for (name, value) in ctx.refs.list(remote.fetch.dst_prefix())? {
                if !remote.fetch.matches_dst(&name) || reported.contains(&name) {
                    continue;
                }
                let mut update = UpdateRef::new(ctx.refs, name.as_str())
                    .delete()
                    .reason(format!("prune {}", remote.name));
                if let Some(id) = value.as_direct() {
                    update = update.old_value(id);
                }
                update.call()?;
                info!(remote = %remote.name, name = %name, "pruned tracking ref");
                result.pruned.push(name);
            }
        }
        Ok(())
    }

    fn wants_branch(&self, remote_name: &str) -> bool {
        if self.branches.is_empty() {
            return true;
        }
        let short = branch_name(remote_name).unwrap_or(remote_name);
        self.branches.iter().any(|b| b == short || b == remote_name)
    }
}
