//! Remote payment-provider API boundary.
//!
//! The engine treats the provider as a black box that accepts flat resource
//! payloads and returns resource objects. [`RemoteApi`] is that box;
//! [`StripeClient`] is the HTTP implementation.

pub mod stripe;

use async_trait::async_trait;
use paysync_types::RemoteId;
use serde_json::{Map, Value};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

pub use stripe::{StripeClient, StripeConfig};

/// Result type for remote API calls.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Errors returned by a remote API call.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// The provider answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The provider is throttling us.
    #[error("rate limited by provider")]
    RateLimited,

    /// The call did not finish within the configured timeout.
    #[error("remote call timed out after {0:?}")]
    Timeout(Duration),

    /// The response could not be understood.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// A payload value cannot be sent as a flat property.
    #[error("property `{property}` has a nested value; only scalar properties can be sent")]
    UnsupportedValue { property: String },
}

impl RemoteError {
    /// Returns true if this error represents a 429 rate-limit response.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            RemoteError::RateLimited => true,
            RemoteError::Status { status, .. } => *status == 429,
            _ => false,
        }
    }

    /// Returns true if the resource does not exist on the provider side.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::Status { status: 404, .. })
    }
}

/// A resource object returned by the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteResource {
    pub id: RemoteId,
    /// The full object as returned, including `id`.
    pub object: Map<String, Value>,
}

impl RemoteResource {
    /// Builds a resource from a provider JSON object, which must carry an `id`.
    pub fn from_object(object: Map<String, Value>) -> RemoteResult<Self> {
        let id = object
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| RemoteError::InvalidResponse("resource has no `id`".to_string()))?;
        let id = RemoteId::new(id).map_err(|e| RemoteError::InvalidResponse(e.to_string()))?;
        Ok(Self { id, object })
    }

    /// Reads a top-level string property.
    pub fn get_str(&self, property: &str) -> Option<&str> {
        self.object.get(property).and_then(Value::as_str)
    }
}

/// Create/update/retrieve/delete on provider resources, addressed by the
/// plural resource type (`customers`, `products`, `prices`).
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// Creates a resource and returns it.
    async fn create(
        &self,
        resource_type: &str,
        payload: &Map<String, Value>,
    ) -> RemoteResult<RemoteResource>;

    /// Updates the resource `id` with the given properties.
    async fn update(
        &self,
        resource_type: &str,
        id: &RemoteId,
        payload: &Map<String, Value>,
    ) -> RemoteResult<RemoteResource>;

    /// Fetches the resource `id`.
    async fn retrieve(&self, resource_type: &str, id: &RemoteId) -> RemoteResult<RemoteResource>;

    /// Deletes the resource `id`.
    async fn delete(&self, resource_type: &str, id: &RemoteId) -> RemoteResult<()>;
}

/// Runs a remote call, failing with [`RemoteError::Timeout`] once `limit` passes.
pub async fn with_timeout<T>(
    limit: Duration,
    call: impl Future<Output = RemoteResult<T>>,
) -> RemoteResult<T> {
    tokio::time::timeout(limit, call)
        .await
        .unwrap_or_else(|_| Err(RemoteError::Timeout(limit)))
}
