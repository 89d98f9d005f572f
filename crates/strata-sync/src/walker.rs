//! Finds and transfers the objects reachable from a remote tip that the
//! local store lacks.

use std::collections::{HashMap, HashSet};

use strata_store::{ObjectDatabase, RevObject, StoredObject};
use strata_types::ObjectId;
use tracing::{debug, trace};

use crate::error::{SyncError, SyncResult};
use crate::transport::RemoteTransport;

/// Walks commit parents, tree entries, buckets and feature types breadth
/// first, requesting one batch per level and stopping at objects the local
/// store already has.
///
/// A present object is taken to imply its whole closure is present, so
/// nothing is written until the full missing set has arrived and objects
/// are then written dependencies first.
pub struct MissingObjectWalker<'a> {
    local: &'a ObjectDatabase,
    transport: &'a dyn RemoteTransport,
}

impl<'a> MissingObjectWalker<'a> {
    pub fn new(local: &'a ObjectDatabase, transport: &'a dyn RemoteTransport) -> Self {
        Self { local, transport }
    }

    /// Fetch and store every object reachable from `tip` that is missing
    /// locally. Returns the number of objects written.
    pub async fn transfer(&self, tip: ObjectId) -> SyncResult<usize> {
        let mut received: HashMap<ObjectId, (StoredObject, Vec<ObjectId>)> = HashMap::new();
        let mut seen = HashSet::new();
        let mut level = Vec::new();
        if !tip.is_null() && !self.local.exists(&tip)? {
            seen.insert(tip);
            level.push(tip);
        }

        let mut depth = 0usize;
        while !level.is_empty() {
            trace!(depth, wants = level.len(), "requesting objects");
            let objects = self.transport.fetch_objects(&level).await?;
            let mut next = Vec::new();
            let mut pending: HashSet<ObjectId> = level.iter().copied().collect();

            for (id, object) in objects {
                if !pending.remove(&id) {
                    return Err(SyncError::UnexpectedObject(id));
                }
                object.verify(&id)?;
                let refs = references(&RevObject::decode(&id, &object)?);
                for child in &refs {
                    if seen.insert(*child) && !self.local.exists(child)? {
                        next.push(*child);
                    }
                }
                received.insert(id, (object, refs));
            }
            if let Some(id) = pending.into_iter().next() {
                return Err(SyncError::MissingObject(id));
            }
            level = next;
            depth += 1;
        }

        let order = write_order(tip, &received);
        let batch: Vec<StoredObject> = order
            .iter()
            .filter_map(|id| received.get(id).map(|(obj, _)| obj.clone()))
            .collect();
        self.local.store().write_batch(&batch)?;
        debug!(tip = %tip.short_hex(), objects = batch.len(), "transferred objects");
        Ok(batch.len())
    }
}

/// Ids an object points at. Null ids are left out.
fn references(object: &RevObject) -> Vec<ObjectId> {
    let mut out = Vec::new();
    match object {
        RevObject::Commit(commit) => {
            out.push(commit.tree_id);
            out.extend(commit.parent_ids.iter().copied());
        }
        RevObject::Tree(tree) => {
            for node in tree.entries() {
                out.push(node.object_id);
                out.push(node.metadata_id);
            }
            out.extend(tree.buckets().iter().map(|b| b.tree_id));
        }
        RevObject::Feature(feature) => out.push(feature.feature_type),
        RevObject::FeatureType(_) => {}
    }
    out.retain(|id| !id.is_null());
    out
}

/// Post-order over the received graph from `tip`: every object comes after
/// the received objects it references.
fn write_order(
    tip: ObjectId,
    received: &HashMap<ObjectId, (StoredObject, Vec<ObjectId>)>,
) -> Vec<ObjectId> {
    let mut order = Vec::with_capacity(received.len());
    let mut done = HashSet::new();
    // (id, children expanded)
    let mut stack = vec![(tip, false)];
    while let Some((id, expanded)) = stack.pop() {
        if expanded {
            order.push(id);
            continue;
        }
        let Some((_, children)) = received.get(&id) else {
            continue;
        };
        if !done.insert(id) {
            continue;
        }
        stack.push((id, true));
        for child in children.iter().rev() {
            if !done.contains(child) {
                stack.push((*child, false));
            }
        }
    }
    order
}
