//! Webhook signature verification.
//!
//! The provider signs each delivery with the endpoint's shared secret and
//! sends the result in a header of the form
//!
//! ```text
//! t=1700000000,v1=5257a869e7ecebeda32affa62cdca3fa51cad7e77a0e56ff536d0ce8e108d8bd
//! ```
//!
//! where `v1` is `HMAC-SHA256(secret, "{t}.{raw body}")` in lowercase hex.
//! Several `v1` entries may be present while a secret is being rolled; any one
//! of them matching is enough. Comparison goes through [`Mac::verify_slice`],
//! which is constant-time.

use crate::error::{SyncError, SyncResult};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use paysync_types::{EventType, RemoteId, SyncEvent};
use serde::Deserialize;
use sha2::Sha256;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

type HmacSha256 = Hmac<Sha256>;

/// Default allowed distance between the signed timestamp and now.
pub const DEFAULT_TOLERANCE: Duration = Duration::from_secs(300);

/// Why a delivery failed authentication.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    #[error("signature header is missing or empty")]
    MissingHeader,

    #[error("signature header has no timestamp")]
    MissingTimestamp,

    #[error("signature header timestamp is not a number")]
    InvalidTimestamp,

    #[error("signature header has no v1 signature")]
    MissingSignature,

    #[error("no signature matches the payload")]
    SignatureMismatch,

    #[error("timestamp is {age_secs}s away from now, outside the {tolerance_secs}s tolerance")]
    TimestampOutsideTolerance { age_secs: i64, tolerance_secs: u64 },
}

/// Verifier configuration: the endpoint secret and replay tolerance.
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    /// Endpoint signing secret (`whsec_...`).
    pub secret: String,
    /// Maximum age of a signature. `None` disables the check.
    pub tolerance: Option<Duration>,
}

impl VerifierConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self { secret: secret.into(), tolerance: Some(DEFAULT_TOLERANCE) }
    }

    pub fn with_tolerance(mut self, tolerance: Option<Duration>) -> Self {
        self.tolerance = tolerance;
        self
    }
}

/// Checks signatures and turns verified bodies into [`SyncEvent`]s.
#[derive(Debug, Clone)]
pub struct WebhookVerifier {
    config: VerifierConfig,
}

impl WebhookVerifier {
    pub fn new(config: VerifierConfig) -> Self {
        Self { config }
    }

    /// Verifies a delivery against the current clock.
    pub fn verify(&self, raw_body: &[u8], signature_header: &str) -> SyncResult<SyncEvent> {
        self.verify_at(raw_body, signature_header, Utc::now())
    }

    /// Verifies a delivery as if received at `now`.
    pub fn verify_at(
        &self,
        raw_body: &[u8],
        signature_header: &str,
        now: DateTime<Utc>,
    ) -> SyncResult<SyncEvent> {
        let header = SignatureHeader::parse(signature_header)?;

        if let Some(tolerance) = self.config.tolerance {
            let age_secs = now.timestamp() - header.timestamp;
            if age_secs.unsigned_abs() > tolerance.as_secs() {
                warn!(age_secs, "webhook signature outside tolerance");
                return Err(VerificationError::TimestampOutsideTolerance {
                    age_secs,
                    tolerance_secs: tolerance.as_secs(),
                }
                .into());
            }
        }

        if !header.matches(raw_body, &self.config.secret) {
            warn!("webhook signature mismatch");
            return Err(VerificationError::SignatureMismatch.into());
        }

        parse_event(raw_body, now)
    }
}

/// Verifies `raw_body` with `secret` and no replay tolerance.
pub fn verify(raw_body: &[u8], signature_header: &str, secret: &str) -> SyncResult<SyncEvent> {
    WebhookVerifier::new(VerifierConfig::new(secret).with_tolerance(None))
        .verify(raw_body, signature_header)
}

/// Produces the signature header the provider would send for `raw_body`.
pub fn sign(raw_body: &[u8], secret: &str, timestamp: i64) -> String {
    format!("t={timestamp},v1={}", hex::encode(compute_signature(raw_body, secret, timestamp)))
}

fn mac_for(raw_body: &[u8], secret: &str, timestamp: i64) -> HmacSha256 {
    // HMAC accepts keys of any length, so this cannot fail.
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC key of any size is valid"));
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(raw_body);
    mac
}

fn compute_signature(raw_body: &[u8], secret: &str, timestamp: i64) -> Vec<u8> {
    mac_for(raw_body, secret, timestamp).finalize().into_bytes().to_vec()
}

#[derive(Debug)]
struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    fn parse(header: &str) -> Result<Self, VerificationError> {
        let header = header.trim();
        if header.is_empty() {
            return Err(VerificationError::MissingHeader);
        }

        let mut timestamp = None;
        let mut signatures = Vec::new();
        for part in header.split(',') {
            let Some((key, value)) = part.trim().split_once('=') else {
                continue;
            };
            match key {
                "t" => {
                    let t = value.parse::<i64>().map_err(|_| VerificationError::InvalidTimestamp)?;
                    timestamp = Some(t);
                }
                // Entries that are not hex can never match, so they are skipped.
                "v1" => {
                    if let Ok(sig) = hex::decode(value) {
                        signatures.push(sig);
                    }
                }
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or(VerificationError::MissingTimestamp)?;
        if signatures.is_empty() {
            return Err(VerificationError::MissingSignature);
        }
        Ok(Self { timestamp, signatures })
    }

    fn matches(&self, raw_body: &[u8], secret: &str) -> bool {
        let mac = mac_for(raw_body, secret, self.timestamp);
        self.signatures.iter().any(|sig| mac.clone().verify_slice(sig).is_ok())
    }
}

#[derive(Debug, Deserialize)]
struct WireEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    created: i64,
    data: WireData,
}

#[derive(Debug, Deserialize)]
struct WireData {
    object: serde_json::Value,
}

fn parse_event(raw_body: &[u8], received_at: DateTime<Utc>) -> SyncResult<SyncEvent> {
    let wire: WireEvent = serde_json::from_slice(raw_body)
        .map_err(|e| SyncError::MalformedPayload(e.to_string()))?;

    let object = wire
        .data
        .object
        .as_object()
        .ok_or_else(|| SyncError::MalformedPayload("data.object is not an object".to_string()))?;
    let remote_id = object
        .get("id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| SyncError::MalformedPayload("data.object.id is missing".to_string()))?;
    let remote_id =
        RemoteId::new(remote_id).map_err(|e| SyncError::MalformedPayload(e.to_string()))?;
    let resource_type = object
        .get("object")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    let event = SyncEvent {
        id: wire.id,
        event_type: EventType::from(wire.event_type),
        resource_type,
        remote_id,
        payload: wire.data.object,
        created: wire.created,
        received_at,
    };
    debug!(event_id = %event.id, event_type = %event.event_type, "verified webhook event");
    Ok(event)
}
