use chrono::{DateTime, Utc};
use paysync_types::{DocumentId, RemoteId};
use serde::{Deserialize, Serialize};

use crate::FieldName;

/// Flat top-level fields of a local document.
pub type DocumentData = serde_json::Map<String, serde_json::Value>;

/// A record in a local collection.
///
/// `data` holds the collection's own fields. The remote link and the outcome
/// of the last outbound push are kept beside it rather than inside it, so a
/// field mapping can never read or overwrite them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub collection: String,
    pub data: DocumentData,
    /// Id of the linked remote resource. `None` until the first successful
    /// outbound create or inbound upsert.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<RemoteId>,
    #[serde(default)]
    pub sync_status: SyncStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Reads a top-level field.
    pub fn get(&self, field: &FieldName) -> Option<&serde_json::Value> {
        self.data.get(field.as_str())
    }

    /// Extract a top-level string value from `data`.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(|v| v.as_str())
    }

    /// Returns true once the document is linked to a remote resource.
    pub fn is_linked(&self) -> bool {
        self.remote_id.is_some()
    }

    /// Applies a patch in place: data fields are merged at the top level,
    /// link and status are replaced only when the patch carries them.
    pub fn apply_patch(&mut self, patch: DocumentPatch, now: DateTime<Utc>) {
        for (key, value) in patch.data {
            self.data.insert(key, value);
        }
        if let Some(remote_id) = patch.remote_id {
            self.remote_id = Some(remote_id);
        }
        if let Some(status) = patch.sync_status {
            self.sync_status = status;
        }
        self.updated_at = now;
    }
}

/// Outcome of the most recent outbound push for a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SyncStatus {
    /// Not pushed yet, or changed locally since the last push.
    #[default]
    Pending,
    /// The remote resource reflects the last pushed state.
    Synced,
    /// The last push failed; `reason` is the remote error.
    Failed { reason: String },
}

impl SyncStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Input for creating a document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewDocument {
    pub data: DocumentData,
    pub remote_id: Option<RemoteId>,
    /// Initial status, written together with the document.
    pub sync_status: SyncStatus,
}

impl NewDocument {
    pub fn new(data: DocumentData) -> Self {
        Self { data, ..Default::default() }
    }

    /// Creates a document that is already linked to a remote resource.
    pub fn linked(data: DocumentData, remote_id: RemoteId) -> Self {
        Self { data, remote_id: Some(remote_id), ..Default::default() }
    }

    pub fn with_status(mut self, status: SyncStatus) -> Self {
        self.sync_status = status;
        self
    }
}

/// A partial update. Data keys are merged; `None` leaves the field alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentPatch {
    pub data: DocumentData,
    pub remote_id: Option<RemoteId>,
    pub sync_status: Option<SyncStatus>,
}

impl DocumentPatch {
    /// A patch that only merges data fields.
    pub fn data(data: DocumentData) -> Self {
        Self { data, ..Default::default() }
    }

    /// A patch that only changes the sync status.
    pub fn status(status: SyncStatus) -> Self {
        Self { sync_status: Some(status), ..Default::default() }
    }

    pub fn with_remote_id(mut self, remote_id: RemoteId) -> Self {
        self.remote_id = Some(remote_id);
        self
    }

    pub fn with_status(mut self, status: SyncStatus) -> Self {
        self.sync_status = Some(status);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty() && self.remote_id.is_none() && self.sync_status.is_none()
    }
}
