//! Delivery ledger.
//!
//! Tracks, per remote resource, which provider events have already been
//! applied and the creation time of the newest one. Webhooks are delivered at
//! least once and in no particular order, so the inbound handler consults the
//! ledger before running a handler and records into it only afterwards.
//!
//! The number of resources is bounded. Past the bound, the resource whose last
//! applied event is oldest is forgotten; a later replay for it is treated as
//! fresh and relies on handler idempotence.

use paysync_types::{RemoteId, SyncEvent};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use tracing::debug;

/// Default number of event ids remembered per remote resource.
pub const DEFAULT_LEDGER_CAPACITY: usize = 64;

/// Default number of remote resources remembered at once.
pub const DEFAULT_LEDGER_RESOURCES: usize = 10_000;

/// What the ledger knows about an incoming event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerCheck {
    /// Never applied and not older than anything applied.
    Fresh,
    /// This exact event id was already applied.
    Duplicate,
    /// A newer event for the same resource was already applied.
    Stale { newest_applied: i64 },
}

/// Applied-event memory for all remote resources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryLedger {
    resources: HashMap<RemoteId, ResourceLedger>,
    capacity: usize,
    #[serde(default = "default_max_resources")]
    max_resources: usize,
    /// Monotonic counter stamped on a resource each time it records.
    #[serde(default)]
    clock: u64,
}

fn default_max_resources() -> usize {
    DEFAULT_LEDGER_RESOURCES
}

impl Default for DeliveryLedger {
    fn default() -> Self {
        Self::new(DEFAULT_LEDGER_CAPACITY)
    }
}

impl DeliveryLedger {
    /// Creates a ledger remembering up to `capacity` event ids per resource.
    pub fn new(capacity: usize) -> Self {
        Self {
            resources: HashMap::new(),
            capacity: capacity.max(1),
            max_resources: DEFAULT_LEDGER_RESOURCES,
            clock: 0,
        }
    }

    /// Bounds how many remote resources are remembered at once.
    pub fn with_max_resources(mut self, max_resources: usize) -> Self {
        self.max_resources = max_resources.max(1);
        self
    }

    /// Classifies an event without recording it.
    pub fn check(&self, event: &SyncEvent) -> LedgerCheck {
        let Some(resource) = self.resources.get(&event.remote_id) else {
            return LedgerCheck::Fresh;
        };
        if resource.seen_event_ids.iter().any(|id| id == &event.id) {
            return LedgerCheck::Duplicate;
        }
        match resource.newest_created {
            Some(newest) if event.created < newest => {
                LedgerCheck::Stale { newest_applied: newest }
            }
            _ => LedgerCheck::Fresh,
        }
    }

    /// Records that an event was applied.
    pub fn record(&mut self, event: &SyncEvent) {
        let capacity = self.capacity;
        self.clock += 1;
        let resource = self.resources.entry(event.remote_id.clone()).or_default();
        resource.record(event, capacity);
        resource.last_recorded = self.clock;

        if self.resources.len() > self.max_resources {
            self.evict_least_recent();
        }
    }

    fn evict_least_recent(&mut self) {
        let oldest = self
            .resources
            .iter()
            .min_by_key(|(_, resource)| resource.last_recorded)
            .map(|(id, _)| id.clone());
        if let Some(id) = oldest {
            debug!(remote_id = %id, "forgetting delivery history");
            self.resources.remove(&id);
        }
    }

    /// Returns the ledger entry for a remote resource.
    pub fn get(&self, remote_id: &RemoteId) -> Option<&ResourceLedger> {
        self.resources.get(remote_id)
    }

    /// Number of remote resources with at least one applied event.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Applied-event memory for one remote resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceLedger {
    /// Most recently applied event ids, oldest first.
    pub seen_event_ids: VecDeque<String>,
    /// `created` of the newest applied event.
    pub newest_created: Option<i64>,
    #[serde(default)]
    last_recorded: u64,
}

impl ResourceLedger {
    fn record(&mut self, event: &SyncEvent, capacity: usize) {
        if !self.seen_event_ids.contains(&event.id) {
            if self.seen_event_ids.len() == capacity {
                self.seen_event_ids.pop_front();
            }
            self.seen_event_ids.push_back(event.id.clone());
        }
        self.newest_created = Some(self.newest_created.map_or(event.created, |n| n.max(event.created)));
    }
}
