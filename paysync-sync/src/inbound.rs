//! Inbound sync: runs the bound handler for each verified webhook event.
//!
//! Events for different remote resources run concurrently. Events for the
//! same remote resource take turns on a per-resource lane, in the order they
//! reached [`InboundSyncHandler::handle`]. The lane is chosen by the bound
//! handler ([`WebhookHandler::lane_key`]), so events that write a document
//! owned by another resource queue behind that resource's events. Inside its turn an event is checked
//! against the [`DeliveryLedger`] so replays and out-of-date events never
//! reach a handler.

use crate::config::EngineConfig;
use crate::error::{SyncError, SyncResult};
use crate::handler::{HandlerContext, WebhookHandler};
use crate::registry::SyncRegistry;
use crate::remote::RemoteApi;
use crate::state::{DeliveryLedger, LedgerCheck};
use paysync_storage::DocumentStore;
use paysync_types::{RemoteId, SyncEvent};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

/// What happened to an inbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InboundOutcome {
    /// The bound handler ran and succeeded.
    Handled,
    /// No handler is bound to the event type.
    Ignored,
    /// The event id was already applied.
    Duplicate,
    /// A newer event for the same resource was already applied.
    Stale,
}

impl InboundOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Handled => "handled",
            Self::Ignored => "ignored",
            Self::Duplicate => "duplicate",
            Self::Stale => "stale",
        }
    }
}

type Lane = Arc<Mutex<()>>;

/// Dispatches verified events to their bound handlers.
pub struct InboundSyncHandler {
    registry: Arc<SyncRegistry>,
    store: Arc<dyn DocumentStore>,
    remote: Arc<dyn RemoteApi>,
    config: EngineConfig,
    ledger: Mutex<DeliveryLedger>,
    lanes: Mutex<HashMap<RemoteId, Lane>>,
}

impl InboundSyncHandler {
    pub fn new(
        registry: Arc<SyncRegistry>,
        store: Arc<dyn DocumentStore>,
        remote: Arc<dyn RemoteApi>,
        config: EngineConfig,
    ) -> Self {
        let ledger =
            DeliveryLedger::new(config.ledger_capacity).with_max_resources(config.ledger_resources);
        Self {
            registry,
            store,
            remote,
            config,
            ledger: Mutex::new(ledger),
            lanes: Mutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &SyncRegistry {
        &self.registry
    }

    /// Handles one verified event.
    ///
    /// A handler failure is returned as [`SyncError::SyncHandler`] and leaves
    /// the ledger untouched, so a redelivery of the same event runs again.
    pub async fn handle(&self, event: &SyncEvent) -> SyncResult<InboundOutcome> {
        let Some(handler) = self.registry.binding(&event.event_type).cloned() else {
            debug!(
                event_type = %event.event_type,
                event_id = %event.id,
                known = event.event_type.is_known(),
                "no handler bound, ignoring event"
            );
            return Ok(InboundOutcome::Ignored);
        };

        let lane_key = handler.lane_key(event);
        let lane = self.lane(&lane_key).await;
        let result = {
            let _turn = lane.lock().await;
            self.run(event, handler.as_ref()).await
        };
        drop(lane);
        self.release_lane(&lane_key).await;
        result
    }

    /// Number of remote resources the delivery ledger currently remembers.
    pub async fn ledger_len(&self) -> usize {
        self.ledger.lock().await.len()
    }

    /// Number of lanes with an event in flight.
    pub async fn active_lanes(&self) -> usize {
        self.lanes.lock().await.len()
    }

    async fn run(&self, event: &SyncEvent, handler: &dyn WebhookHandler) -> SyncResult<InboundOutcome> {
        let check = self.ledger.lock().await.check(event);
        match check {
            LedgerCheck::Duplicate => {
                debug!(event_id = %event.id, remote_id = %event.remote_id, "event already applied");
                return Ok(InboundOutcome::Duplicate);
            }
            LedgerCheck::Stale { newest_applied } => {
                debug!(
                    event_id = %event.id,
                    remote_id = %event.remote_id,
                    created = event.created,
                    newest_applied,
                    "skipping event older than applied state"
                );
                return Ok(InboundOutcome::Stale);
            }
            LedgerCheck::Fresh => {}
        }

        let ctx = HandlerContext {
            store: self.store.as_ref(),
            remote: self.remote.as_ref(),
            registry: &self.registry,
            config: &self.config,
        };

        match handler.handle(event, &ctx).await {
            Ok(()) => {
                self.ledger.lock().await.record(event);
                info!(
                    resource = event.event_type.resource(),
                    action = ?event.event_type.action(),
                    remote_id = %event.remote_id,
                    handler = handler.name(),
                    "applied webhook event"
                );
                Ok(InboundOutcome::Handled)
            }
            Err(source) => {
                error!(
                    event_type = %event.event_type,
                    event_id = %event.id,
                    remote_id = %event.remote_id,
                    handler = handler.name(),
                    "webhook handler failed: {source:#}"
                );
                Err(SyncError::SyncHandler {
                    event_type: event.event_type.clone(),
                    remote_id: event.remote_id.clone(),
                    source,
                })
            }
        }
    }

    async fn lane(&self, remote_id: &RemoteId) -> Lane {
        let mut lanes = self.lanes.lock().await;
        Arc::clone(lanes.entry(remote_id.clone()).or_default())
    }

    /// Drops the lane once nobody else holds or waits on it. Clones are only
    /// taken under the map lock, so a count of one here is final.
    async fn release_lane(&self, remote_id: &RemoteId) {
        let mut lanes = self.lanes.lock().await;
        if lanes.get(remote_id).is_some_and(|lane| Arc::strong_count(lane) == 1) {
            lanes.remove(remote_id);
        }
    }
}
