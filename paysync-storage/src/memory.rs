//! In-memory document store.

use async_trait::async_trait;
use chrono::Utc;
use paysync_model::{Document, DocumentPatch, NewDocument};
use paysync_types::{DocumentId, RemoteId};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::{DocumentStore, StorageError, StorageResult};

#[derive(Default)]
struct Collections {
    docs: HashMap<String, HashMap<DocumentId, Document>>,
    /// (collection, remote id) -> document, kept in step with `docs`.
    links: HashMap<(String, RemoteId), DocumentId>,
}

impl Collections {
    fn check_link(
        &self,
        collection: &str,
        remote_id: &RemoteId,
        owner: Option<DocumentId>,
    ) -> StorageResult<()> {
        match self.links.get(&(collection.to_string(), remote_id.clone())) {
            Some(existing) if Some(*existing) != owner => Err(StorageError::RemoteIdConflict {
                collection: collection.to_string(),
                remote_id: remote_id.clone(),
            }),
            _ => Ok(()),
        }
    }
}

/// A [`DocumentStore`] kept entirely in memory.
///
/// A single lock guards all collections; it is held only for the duration of
/// one operation and never across an await on anything else.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every document in a collection, oldest first.
    pub async fn list(&self, collection: &str) -> Vec<Document> {
        let inner = self.inner.read().await;
        let mut docs: Vec<Document> = inner
            .docs
            .get(collection)
            .map(|c| c.values().cloned().collect())
            .unwrap_or_default();
        docs.sort_by_key(|d| d.id);
        docs
    }

    /// Number of documents in a collection.
    pub async fn count(&self, collection: &str) -> usize {
        self.inner.read().await.docs.get(collection).map_or(0, HashMap::len)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: DocumentId) -> StorageResult<Option<Document>> {
        let inner = self.inner.read().await;
        Ok(inner.docs.get(collection).and_then(|c| c.get(&id)).cloned())
    }

    async fn create(&self, collection: &str, doc: NewDocument) -> StorageResult<Document> {
        let mut inner = self.inner.write().await;
        if let Some(remote_id) = &doc.remote_id {
            inner.check_link(collection, remote_id, None)?;
        }

        let now = Utc::now();
        let document = Document {
            id: DocumentId::new(),
            collection: collection.to_string(),
            data: doc.data,
            remote_id: doc.remote_id,
            sync_status: doc.sync_status,
            created_at: now,
            updated_at: now,
        };

        if let Some(remote_id) = &document.remote_id {
            inner.links.insert((collection.to_string(), remote_id.clone()), document.id);
        }
        inner
            .docs
            .entry(collection.to_string())
            .or_default()
            .insert(document.id, document.clone());

        debug!(collection, document_id = %document.id, "created document");
        Ok(document)
    }

    async fn update(
        &self,
        collection: &str,
        id: DocumentId,
        patch: DocumentPatch,
    ) -> StorageResult<Document> {
        let mut inner = self.inner.write().await;
        if let Some(remote_id) = &patch.remote_id {
            inner.check_link(collection, remote_id, Some(id))?;
        }

        let not_found = || StorageError::NotFound { collection: collection.to_string(), id };
        let doc = inner
            .docs
            .get_mut(collection)
            .and_then(|c| c.get_mut(&id))
            .ok_or_else(not_found)?;

        let previous_link = doc.remote_id.clone();
        doc.apply_patch(patch, Utc::now());
        let updated = doc.clone();

        if previous_link != updated.remote_id {
            if let Some(old) = previous_link {
                inner.links.remove(&(collection.to_string(), old));
            }
            if let Some(new) = &updated.remote_id {
                inner.links.insert((collection.to_string(), new.clone()), id);
            }
        }

        debug!(collection, document_id = %id, "updated document");
        Ok(updated)
    }

    async fn find_by_remote_id(
        &self,
        collection: &str,
        remote_id: &RemoteId,
    ) -> StorageResult<Option<Document>> {
        let inner = self.inner.read().await;
        let Some(id) = inner.links.get(&(collection.to_string(), remote_id.clone())) else {
            return Ok(None);
        };
        Ok(inner.docs.get(collection).and_then(|c| c.get(id)).cloned())
    }
}
