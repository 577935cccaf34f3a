//! Error types for the sync layer.

use crate::remote::RemoteError;
use crate::verifier::VerificationError;
use paysync_model::RuleError;
use paysync_storage::StorageError;
use paysync_types::{DocumentId, EventType, RemoteId};
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in sync operations.
///
/// `Configuration` is only produced while building the registry and is fatal.
/// Every other variant is a per-request failure that callers report and move
/// past.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Invalid sync rule or webhook binding.
    #[error("configuration error: {0}")]
    Configuration(#[from] RuleError),

    /// Webhook signature missing, malformed, or wrong.
    #[error("webhook verification failed: {0}")]
    Verification(#[from] VerificationError),

    /// The signature was valid but the body is not a usable event.
    #[error("malformed webhook payload: {0}")]
    MalformedPayload(String),

    /// An outbound call to the remote API failed.
    #[error("remote sync failed for {collection}/{document_id}: {source}")]
    RemoteSync {
        collection: String,
        document_id: DocumentId,
        #[source]
        source: RemoteError,
    },

    /// A bound webhook handler failed.
    #[error("handler for {event_type} ({remote_id}) failed: {source:#}")]
    SyncHandler {
        event_type: EventType,
        remote_id: RemoteId,
        #[source]
        source: anyhow::Error,
    },

    /// The local document store failed outside of a handler.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl SyncError {
    /// Returns true for errors that mean the request itself must be rejected
    /// (as opposed to a downstream failure after the request was accepted).
    pub fn is_rejection(&self) -> bool {
        matches!(self, SyncError::Verification(_) | SyncError::MalformedPayload(_))
    }
}
