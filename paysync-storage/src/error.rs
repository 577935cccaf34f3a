//! Error types for the storage layer.

use paysync_types::{DocumentId, RemoteId};
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Document not found.
    #[error("document not found: {collection}/{id}")]
    NotFound { collection: String, id: DocumentId },

    /// Another document in the collection is already linked to this remote id.
    #[error("remote id {remote_id} is already linked in `{collection}`")]
    RemoteIdConflict { collection: String, remote_id: RemoteId },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failure reported by the backing store.
    #[error("backend error: {0}")]
    Backend(String),
}
