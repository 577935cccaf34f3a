//! Webhook handler trait and the context handlers run in.

use crate::config::EngineConfig;
use crate::registry::SyncRegistry;
use crate::remote::{self, RemoteApi, RemoteResource};
use async_trait::async_trait;
use paysync_storage::DocumentStore;
use paysync_types::{RemoteId, SyncEvent};
use std::sync::Arc;

/// Collaborators available to a handler while it processes one event.
#[derive(Clone, Copy)]
pub struct HandlerContext<'a> {
    pub store: &'a dyn DocumentStore,
    pub remote: &'a dyn RemoteApi,
    pub registry: &'a SyncRegistry,
    pub config: &'a EngineConfig,
}

impl HandlerContext<'_> {
    /// Fetches a remote resource, bounded by the configured remote timeout.
    pub async fn retrieve(
        &self,
        resource_type: &str,
        id: &RemoteId,
    ) -> remote::RemoteResult<RemoteResource> {
        remote::with_timeout(self.config.remote_timeout, self.remote.retrieve(resource_type, id))
            .await
    }
}

/// Applies one kind of remote change to local state.
///
/// Handlers must be idempotent: the same event may arrive more than once and
/// the engine only filters replays it has already seen succeed.
#[async_trait]
pub trait WebhookHandler: Send + Sync {
    /// Short name used in logs and configuration.
    fn name(&self) -> &str;

    /// Remote resource whose lane the event runs on. Handlers that write a
    /// document owned by another resource must return that resource's id so
    /// every writer of the document shares one lane.
    fn lane_key(&self, event: &SyncEvent) -> RemoteId {
        event.remote_id.clone()
    }

    async fn handle(&self, event: &SyncEvent, ctx: &HandlerContext<'_>) -> anyhow::Result<()>;
}

/// Runs several handlers for one event type, in order, stopping at the
/// first failure. The chain runs on the lane of its first handler.
pub struct HandlerChain {
    name: String,
    handlers: Vec<Arc<dyn WebhookHandler>>,
}

impl HandlerChain {
    pub fn new(handlers: Vec<Arc<dyn WebhookHandler>>) -> Self {
        let name = handlers.iter().map(|h| h.name()).collect::<Vec<_>>().join("+");
        Self { name, handlers }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[async_trait]
impl WebhookHandler for HandlerChain {
    fn name(&self) -> &str {
        &self.name
    }

    fn lane_key(&self, event: &SyncEvent) -> RemoteId {
        self.handlers
            .first()
            .map_or_else(|| event.remote_id.clone(), |h| h.lane_key(event))
    }

    async fn handle(&self, event: &SyncEvent, ctx: &HandlerContext<'_>) -> anyhow::Result<()> {
        for handler in &self.handlers {
            handler.handle(event, ctx).await?;
        }
        Ok(())
    }
}
