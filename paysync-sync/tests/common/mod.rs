//! Shared fixtures for sync tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use paysync_model::{Document, DocumentPatch, FieldMapping, NewDocument, SyncRule};
use paysync_storage::{DocumentStore, MemoryStore, StorageResult};
use paysync_sync::{
    EngineConfig, InboundSyncHandler, OutboundDispatcher, RemoteApi, RemoteError, RemoteResource,
    RemoteResult, SyncRegistry,
};
use paysync_types::{DocumentId, EventType, RemoteId, SyncEvent};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const SECRET: &str = "whsec_123";

pub fn object(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

pub fn remote(id: &str) -> RemoteId {
    RemoteId::new(id).unwrap()
}

pub fn customers_rule() -> SyncRule {
    SyncRule::new("customers", "customers", "customer")
        .with_mapping(FieldMapping::same("name").unwrap())
        .with_mapping(FieldMapping::same("email").unwrap())
}

pub fn products_rule() -> SyncRule {
    SyncRule::new("products", "products", "product")
        .with_mapping(FieldMapping::same("name").unwrap())
}

/// A verified event as the verifier would produce it.
pub fn event(id: &str, event_type: EventType, object: Value, created: i64) -> SyncEvent {
    let remote_id = object["id"].as_str().map(remote).unwrap();
    let resource_type = object["object"].as_str().unwrap_or_default().to_string();
    SyncEvent {
        id: id.to_string(),
        event_type,
        resource_type,
        remote_id,
        payload: object,
        created,
        received_at: Utc::now(),
    }
}

/// A webhook body in the provider's envelope format.
pub fn webhook_body(id: &str, event_type: &str, object: Value, created: i64) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "id": id,
        "object": "event",
        "type": event_type,
        "created": created,
        "data": { "object": object },
    }))
    .unwrap()
}

/// One call made against [`FakeRemote`].
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub op: &'static str,
    pub resource_type: String,
    pub id: Option<String>,
    pub payload: Map<String, Value>,
}

/// In-memory [`RemoteApi`] that records every call.
#[derive(Default)]
pub struct FakeRemote {
    resources: Mutex<HashMap<(String, String), Map<String, Value>>>,
    calls: Mutex<Vec<Call>>,
    failure: Mutex<Option<u16>>,
    delay: Mutex<Option<Duration>>,
    next_id: AtomicUsize,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following call fail with this HTTP status.
    pub fn fail_with(&self, status: u16) {
        *self.failure.lock().unwrap() = Some(status);
    }

    pub fn recover(&self) {
        *self.failure.lock().unwrap() = None;
    }

    /// Makes every following call take this long.
    pub fn delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    /// Seeds a resource that `retrieve` will return.
    pub fn insert(&self, resource_type: &str, object: Value) {
        let object = object.as_object().cloned().unwrap();
        let id = object["id"].as_str().unwrap().to_string();
        self.resources.lock().unwrap().insert((resource_type.to_string(), id), object);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn get(&self, resource_type: &str, id: &str) -> Option<Map<String, Value>> {
        self.resources
            .lock()
            .unwrap()
            .get(&(resource_type.to_string(), id.to_string()))
            .cloned()
    }

    async fn begin(
        &self,
        op: &'static str,
        resource_type: &str,
        id: Option<&RemoteId>,
        payload: &Map<String, Value>,
    ) -> RemoteResult<()> {
        self.calls.lock().unwrap().push(Call {
            op,
            resource_type: resource_type.to_string(),
            id: id.map(|i| i.to_string()),
            payload: payload.clone(),
        });
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let failure = *self.failure.lock().unwrap();
        match failure {
            Some(429) => Err(RemoteError::RateLimited),
            Some(status) => Err(RemoteError::Status { status, message: "fake failure".to_string() }),
            None => Ok(()),
        }
    }

    fn not_found(id: &RemoteId) -> RemoteError {
        RemoteError::Status { status: 404, message: format!("No such resource: '{id}'") }
    }
}

#[async_trait]
impl RemoteApi for FakeRemote {
    async fn create(
        &self,
        resource_type: &str,
        payload: &Map<String, Value>,
    ) -> RemoteResult<RemoteResource> {
        self.begin("create", resource_type, None, payload).await?;
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let prefix: String = resource_type.chars().take(3).collect();
        let mut object = payload.clone();
        object.insert("id".to_string(), json!(format!("{prefix}_{n}")));
        let resource = RemoteResource::from_object(object.clone())?;
        self.resources
            .lock()
            .unwrap()
            .insert((resource_type.to_string(), resource.id.to_string()), object);
        Ok(resource)
    }

    async fn update(
        &self,
        resource_type: &str,
        id: &RemoteId,
        payload: &Map<String, Value>,
    ) -> RemoteResult<RemoteResource> {
        self.begin("update", resource_type, Some(id), payload).await?;
        let mut resources = self.resources.lock().unwrap();
        let object = resources
            .get_mut(&(resource_type.to_string(), id.to_string()))
            .ok_or_else(|| Self::not_found(id))?;
        for (key, value) in payload {
            object.insert(key.clone(), value.clone());
        }
        RemoteResource::from_object(object.clone())
    }

    async fn retrieve(&self, resource_type: &str, id: &RemoteId) -> RemoteResult<RemoteResource> {
        self.begin("retrieve", resource_type, Some(id), &Map::new()).await?;
        let object = self.get(resource_type, id.as_str()).ok_or_else(|| Self::not_found(id))?;
        RemoteResource::from_object(object)
    }

    async fn delete(&self, resource_type: &str, id: &RemoteId) -> RemoteResult<()> {
        self.begin("delete", resource_type, Some(id), &Map::new()).await?;
        self.resources
            .lock()
            .unwrap()
            .remove(&(resource_type.to_string(), id.to_string()))
            .map(|_| ())
            .ok_or_else(|| Self::not_found(id))
    }
}

/// Store, remote, and both engine halves over one registry.
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub remote: Arc<FakeRemote>,
    pub inbound: InboundSyncHandler,
    pub outbound: OutboundDispatcher,
}

impl Harness {
    pub fn new(registry: SyncRegistry) -> Self {
        Self::with_config(registry, EngineConfig::default())
    }

    pub fn with_config(registry: SyncRegistry, config: EngineConfig) -> Self {
        let registry = Arc::new(registry);
        let store = Arc::new(MemoryStore::new());
        let remote = Arc::new(FakeRemote::new());
        let inbound = InboundSyncHandler::new(
            Arc::clone(&registry),
            store.clone(),
            remote.clone(),
            config.clone(),
        );
        let outbound = OutboundDispatcher::new(registry, store.clone(), remote.clone(), config);
        Self { store, remote, inbound, outbound }
    }
}

/// [`MemoryStore`] whose remote-id lookups take `lookup_delay`, widening the
/// gap between a handler's read and its write. Counts writes.
pub struct SlowStore {
    pub inner: MemoryStore,
    lookup_delay: Duration,
    creates: AtomicUsize,
    updates: AtomicUsize,
}

impl SlowStore {
    pub fn new(lookup_delay: Duration) -> Self {
        Self {
            inner: MemoryStore::new(),
            lookup_delay,
            creates: AtomicUsize::new(0),
            updates: AtomicUsize::new(0),
        }
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for SlowStore {
    async fn get(&self, collection: &str, id: DocumentId) -> StorageResult<Option<Document>> {
        self.inner.get(collection, id).await
    }

    async fn create(&self, collection: &str, doc: NewDocument) -> StorageResult<Document> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.inner.create(collection, doc).await
    }

    async fn update(
        &self,
        collection: &str,
        id: DocumentId,
        patch: DocumentPatch,
    ) -> StorageResult<Document> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.inner.update(collection, id, patch).await
    }

    async fn find_by_remote_id(
        &self,
        collection: &str,
        remote_id: &RemoteId,
    ) -> StorageResult<Option<Document>> {
        tokio::time::sleep(self.lookup_delay).await;
        self.inner.find_by_remote_id(collection, remote_id).await
    }
}

/// Inbound handler over a [`SlowStore`] and an empty [`FakeRemote`].
pub fn slow_inbound(registry: SyncRegistry, store: Arc<SlowStore>) -> InboundSyncHandler {
    InboundSyncHandler::new(
        Arc::new(registry),
        store,
        Arc::new(FakeRemote::new()),
        EngineConfig::default(),
    )
}
