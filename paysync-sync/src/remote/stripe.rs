//! Stripe REST implementation of [`RemoteApi`].
//!
//! Uses the v1 resource endpoints with form-encoded bodies and bearer auth.

use super::{RemoteApi, RemoteError, RemoteResource, RemoteResult};
use async_trait::async_trait;
use paysync_types::RemoteId;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::debug;

/// Stripe client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeConfig {
    /// Secret API key (`sk_live_...` / `sk_test_...`).
    pub api_key: String,
    /// Base URL of the API (e.g. `https://api.stripe.com`).
    pub api_base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base_url: "https://api.stripe.com".to_string(),
            timeout_secs: 30,
        }
    }
}

impl StripeConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self { api_key: api_key.into(), ..Default::default() }
    }

    /// Returns true for test-mode keys.
    pub fn is_test_key(&self) -> bool {
        self.api_key.starts_with("sk_test_") || self.api_key.starts_with("rk_test_")
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

/// HTTP client for the Stripe API.
pub struct StripeClient {
    config: StripeConfig,
    client: Client,
}

impl StripeClient {
    /// Creates a new client.
    pub fn new(config: StripeConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("failed to create HTTP client");

        Self { config, client }
    }

    pub fn config(&self) -> &StripeConfig {
        &self.config
    }

    fn collection_url(&self, resource_type: &str) -> String {
        format!(
            "{}/v1/{}",
            self.config.api_base_url.trim_end_matches('/'),
            urlencoding::encode(resource_type)
        )
    }

    fn resource_url(&self, resource_type: &str, id: &RemoteId) -> String {
        format!("{}/{}", self.collection_url(resource_type), urlencoding::encode(id.as_str()))
    }

    async fn send_form(&self, url: String, payload: &Map<String, Value>) -> RemoteResult<RemoteResource> {
        let form = form_fields(payload)?;
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.config.api_key)
            .form(&form)
            .send()
            .await
            .map_err(network_error)?;
        read_resource(response).await
    }
}

#[async_trait]
impl RemoteApi for StripeClient {
    async fn create(
        &self,
        resource_type: &str,
        payload: &Map<String, Value>,
    ) -> RemoteResult<RemoteResource> {
        debug!(resource_type, "creating remote resource");
        self.send_form(self.collection_url(resource_type), payload).await
    }

    async fn update(
        &self,
        resource_type: &str,
        id: &RemoteId,
        payload: &Map<String, Value>,
    ) -> RemoteResult<RemoteResource> {
        debug!(resource_type, remote_id = %id, "updating remote resource");
        self.send_form(self.resource_url(resource_type, id), payload).await
    }

    async fn retrieve(&self, resource_type: &str, id: &RemoteId) -> RemoteResult<RemoteResource> {
        let response = self
            .client
            .get(self.resource_url(resource_type, id))
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map_err(network_error)?;
        read_resource(response).await
    }

    async fn delete(&self, resource_type: &str, id: &RemoteId) -> RemoteResult<()> {
        debug!(resource_type, remote_id = %id, "deleting remote resource");
        let response = self
            .client
            .delete(self.resource_url(resource_type, id))
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map_err(network_error)?;
        read_resource(response).await.map(|_| ())
    }
}

fn network_error(e: reqwest::Error) -> RemoteError {
    if e.is_timeout() {
        RemoteError::Network(format!("request timed out: {e}"))
    } else {
        RemoteError::Network(e.to_string())
    }
}

async fn read_resource(response: Response) -> RemoteResult<RemoteResource> {
    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(RemoteError::RateLimited);
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| match (b.error.message, b.error.kind) {
                (Some(message), _) => Some(message),
                (None, kind) => kind,
            })
            .unwrap_or(body);
        return Err(RemoteError::Status { status: status.as_u16(), message });
    }

    let object: Map<String, Value> = response
        .json()
        .await
        .map_err(|e| RemoteError::InvalidResponse(e.to_string()))?;
    RemoteResource::from_object(object)
}

/// Flattens a payload into form fields. `null` becomes an empty string,
/// which the API treats as "unset".
fn form_fields(payload: &Map<String, Value>) -> RemoteResult<Vec<(String, String)>> {
    payload
        .iter()
        .map(|(key, value)| {
            let encoded = match value {
                Value::Null => String::new(),
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                Value::String(s) => s.clone(),
                Value::Array(_) | Value::Object(_) => {
                    return Err(RemoteError::UnsupportedValue { property: key.clone() });
                }
            };
            Ok((key.clone(), encoded))
        })
        .collect()
}
