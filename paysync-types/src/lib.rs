//! Core type definitions for paysync.
//!
//! This crate defines the provider-agnostic types shared by every other
//! crate in the workspace:
//! - Local document identifiers (UUID v7) and remote resource identifiers
//! - Webhook event types as a typed enum with a string fallback
//! - The normalized inbound event envelope ([`SyncEvent`])
//!
//! Field mappings, sync rules, and documents live in `paysync-model`.

mod event;
mod ids;

pub use event::{EventAction, EventType, SyncEvent};
pub use ids::{DocumentId, RemoteId};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("invalid remote id: {0:?}")]
    InvalidRemoteId(String),
}
