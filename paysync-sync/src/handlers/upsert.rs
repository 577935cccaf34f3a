use crate::handler::{HandlerContext, WebhookHandler};
use anyhow::Context;
use async_trait::async_trait;
use paysync_model::{to_local, DocumentPatch, NewDocument, SyncStatus};
use paysync_types::SyncEvent;
use tracing::debug;

/// Maps the event payload through a collection's rule and upserts the
/// document linked to the event's remote id.
#[derive(Debug, Clone)]
pub struct UpsertFromRemote {
    collection: String,
}

impl UpsertFromRemote {
    pub fn new(collection: impl Into<String>) -> Self {
        Self { collection: collection.into() }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }
}

#[async_trait]
impl WebhookHandler for UpsertFromRemote {
    fn name(&self) -> &str {
        "upsert"
    }

    async fn handle(&self, event: &SyncEvent, ctx: &HandlerContext<'_>) -> anyhow::Result<()> {
        let rule = ctx
            .registry
            .lookup(&self.collection)
            .with_context(|| format!("no sync rule for collection `{}`", self.collection))?;
        let object = event.payload_object().context("event payload is not an object")?;
        let data = to_local(object, &rule.field_mappings);

        let existing = ctx.store.find_by_remote_id(&self.collection, &event.remote_id).await?;
        match existing {
            Some(doc) => {
                let patch = DocumentPatch::data(data).with_status(SyncStatus::Synced);
                ctx.store.update(&self.collection, doc.id, patch).await?;
                debug!(collection = %self.collection, document_id = %doc.id, "updated document from remote");
            }
            None => {
                let new = NewDocument::linked(data, event.remote_id.clone())
                    .with_status(SyncStatus::Synced);
                let doc = ctx.store.create(&self.collection, new).await?;
                debug!(collection = %self.collection, document_id = %doc.id, "created document from remote");
            }
        }
        Ok(())
    }
}
