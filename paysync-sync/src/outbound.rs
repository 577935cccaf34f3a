//! Outbound sync: pushes local writes to the remote API.

use crate::config::EngineConfig;
use crate::error::{SyncError, SyncResult};
use crate::registry::SyncRegistry;
use crate::remote::{self, RemoteApi, RemoteError};
use paysync_model::{to_remote, Document, DocumentPatch, SyncRule, SyncStatus};
use paysync_storage::DocumentStore;
use paysync_types::RemoteId;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Where a local write came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOrigin {
    /// A user or application write. Pushed outward.
    Local,
    /// A write the inbound handlers made from a webhook. Never pushed back.
    Webhook,
}

/// Result of dispatching one local write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundOutcome {
    /// Nothing was sent: webhook origin, unsynced collection, or nothing
    /// linked to delete.
    Skipped,
    /// A remote resource was created and linked.
    Created(RemoteId),
    /// The linked remote resource was updated.
    Updated(RemoteId),
    /// The linked remote resource was deleted.
    Deleted(RemoteId),
}

/// Turns local document writes into remote create/update/delete calls.
pub struct OutboundDispatcher {
    registry: Arc<SyncRegistry>,
    store: Arc<dyn DocumentStore>,
    remote: Arc<dyn RemoteApi>,
    config: EngineConfig,
}

impl OutboundDispatcher {
    pub fn new(
        registry: Arc<SyncRegistry>,
        store: Arc<dyn DocumentStore>,
        remote: Arc<dyn RemoteApi>,
        config: EngineConfig,
    ) -> Self {
        Self { registry, store, remote, config }
    }

    /// Called after a document was created or updated locally.
    ///
    /// On success the document is linked (first push) and marked synced. On
    /// a remote failure the local write stays as it is; the document is
    /// marked failed when `record_failures` is on.
    pub async fn after_write(&self, origin: WriteOrigin, doc: &Document) -> SyncResult<OutboundOutcome> {
        let Some(rule) = self.rule_for(origin, doc) else {
            return Ok(OutboundOutcome::Skipped);
        };

        let payload = to_remote(&doc.data, &rule.field_mappings);
        let resource_type = rule.remote_resource_type.as_str();
        let limit = self.config.remote_timeout;

        match &doc.remote_id {
            None => {
                let created = remote::with_timeout(limit, self.remote.create(resource_type, &payload))
                    .await;
                let resource = match created {
                    Ok(resource) => resource,
                    Err(e) => return Err(self.remote_failure(doc, e).await),
                };

                let patch = DocumentPatch::default()
                    .with_remote_id(resource.id.clone())
                    .with_status(SyncStatus::Synced);
                if let Err(e) = self.store.update(&doc.collection, doc.id, patch).await {
                    error!(
                        collection = %doc.collection,
                        document_id = %doc.id,
                        remote_id = %resource.id,
                        "remote resource created but local link failed, orphaned: {e}"
                    );
                    return Err(e.into());
                }

                info!(collection = %doc.collection, document_id = %doc.id, remote_id = %resource.id, "created remote resource");
                Ok(OutboundOutcome::Created(resource.id))
            }
            Some(remote_id) => {
                let updated = remote::with_timeout(
                    limit,
                    self.remote.update(resource_type, remote_id, &payload),
                )
                .await;
                if let Err(e) = updated {
                    return Err(self.remote_failure(doc, e).await);
                }

                self.store
                    .update(&doc.collection, doc.id, DocumentPatch::status(SyncStatus::Synced))
                    .await?;
                debug!(collection = %doc.collection, document_id = %doc.id, remote_id = %remote_id, "updated remote resource");
                Ok(OutboundOutcome::Updated(remote_id.clone()))
            }
        }
    }

    /// Called after a document was deleted locally. Deletes the linked
    /// remote resource; one that is already gone counts as deleted.
    pub async fn after_delete(&self, origin: WriteOrigin, doc: &Document) -> SyncResult<OutboundOutcome> {
        let Some(rule) = self.rule_for(origin, doc) else {
            return Ok(OutboundOutcome::Skipped);
        };
        let Some(remote_id) = &doc.remote_id else {
            debug!(collection = %doc.collection, document_id = %doc.id, "deleted document was never linked");
            return Ok(OutboundOutcome::Skipped);
        };

        let deleted = remote::with_timeout(
            self.config.remote_timeout,
            self.remote.delete(&rule.remote_resource_type, remote_id),
        )
        .await;
        match deleted {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                debug!(remote_id = %remote_id, "remote resource already deleted");
            }
            Err(source) => {
                warn!(collection = %doc.collection, document_id = %doc.id, remote_id = %remote_id, "remote delete failed: {source}");
                return Err(SyncError::RemoteSync {
                    collection: doc.collection.clone(),
                    document_id: doc.id,
                    source,
                });
            }
        }

        info!(collection = %doc.collection, document_id = %doc.id, remote_id = %remote_id, "deleted remote resource");
        Ok(OutboundOutcome::Deleted(remote_id.clone()))
    }

    fn rule_for(&self, origin: WriteOrigin, doc: &Document) -> Option<&SyncRule> {
        if origin == WriteOrigin::Webhook {
            debug!(collection = %doc.collection, document_id = %doc.id, "write came from a webhook, not pushing");
            return None;
        }
        let rule = self.registry.lookup(&doc.collection);
        if rule.is_none() {
            debug!(collection = %doc.collection, "collection has no sync rule");
        }
        rule
    }

    async fn remote_failure(&self, doc: &Document, source: RemoteError) -> SyncError {
        warn!(collection = %doc.collection, document_id = %doc.id, "remote sync failed: {source}");
        if self.config.record_failures {
            let status = SyncStatus::Failed { reason: source.to_string() };
            if let Err(e) = self
                .store
                .update(&doc.collection, doc.id, DocumentPatch::status(status))
                .await
            {
                warn!(collection = %doc.collection, document_id = %doc.id, "could not record sync failure: {e}");
            }
        }
        SyncError::RemoteSync { collection: doc.collection.clone(), document_id: doc.id, source }
    }
}
