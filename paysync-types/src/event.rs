//! Inbound webhook event types.
//!
//! A [`SyncEvent`] is the normalized envelope of a provider notification. It is
//! only ever built after the webhook signature has been verified, so holding one
//! means the payload is authentic.
//!
//! Event types are a closed enum over the notifications the engine knows about,
//! with [`EventType::Other`] carrying anything else verbatim. Unknown types are
//! routine (the provider sends many more than any deployment binds) and are
//! never an error.

use crate::RemoteId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A provider event type such as `customer.subscription.updated`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventType {
    CustomerCreated,
    CustomerUpdated,
    CustomerDeleted,
    CustomerSubscriptionCreated,
    CustomerSubscriptionUpdated,
    CustomerSubscriptionDeleted,
    ProductCreated,
    ProductUpdated,
    ProductDeleted,
    PriceCreated,
    PriceUpdated,
    PriceDeleted,
    /// Any event type without a dedicated variant.
    Other(String),
}

/// The trailing verb of an event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventAction {
    Created,
    Updated,
    Deleted,
    Other,
}

impl EventType {
    /// Every variant except [`EventType::Other`].
    pub const KNOWN: [EventType; 12] = [
        EventType::CustomerCreated,
        EventType::CustomerUpdated,
        EventType::CustomerDeleted,
        EventType::CustomerSubscriptionCreated,
        EventType::CustomerSubscriptionUpdated,
        EventType::CustomerSubscriptionDeleted,
        EventType::ProductCreated,
        EventType::ProductUpdated,
        EventType::ProductDeleted,
        EventType::PriceCreated,
        EventType::PriceUpdated,
        EventType::PriceDeleted,
    ];

    /// Returns the provider's wire name for this event type.
    pub fn as_str(&self) -> &str {
        match self {
            Self::CustomerCreated => "customer.created",
            Self::CustomerUpdated => "customer.updated",
            Self::CustomerDeleted => "customer.deleted",
            Self::CustomerSubscriptionCreated => "customer.subscription.created",
            Self::CustomerSubscriptionUpdated => "customer.subscription.updated",
            Self::CustomerSubscriptionDeleted => "customer.subscription.deleted",
            Self::ProductCreated => "product.created",
            Self::ProductUpdated => "product.updated",
            Self::ProductDeleted => "product.deleted",
            Self::PriceCreated => "price.created",
            Self::PriceUpdated => "price.updated",
            Self::PriceDeleted => "price.deleted",
            Self::Other(s) => s,
        }
    }

    /// Returns true if this is one of the dedicated variants.
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    /// The resource part of the type (`customer.subscription` for
    /// `customer.subscription.updated`).
    pub fn resource(&self) -> &str {
        let s = self.as_str();
        s.rsplit_once('.').map_or(s, |(resource, _)| resource)
    }

    /// The action part of the type.
    pub fn action(&self) -> EventAction {
        let s = self.as_str();
        match s.rsplit_once('.').map(|(_, verb)| verb) {
            Some("created") => EventAction::Created,
            Some("updated") => EventAction::Updated,
            Some("deleted") => EventAction::Deleted,
            _ => EventAction::Other,
        }
    }
}

impl From<&str> for EventType {
    fn from(s: &str) -> Self {
        Self::KNOWN
            .iter()
            .find(|known| known.as_str() == s)
            .cloned()
            .unwrap_or_else(|| Self::Other(s.to_string()))
    }
}

impl From<String> for EventType {
    fn from(s: String) -> Self {
        let parsed = Self::from(s.as_str());
        match parsed {
            Self::Other(_) => Self::Other(s),
            known => known,
        }
    }
}

impl From<EventType> for String {
    fn from(t: EventType) -> Self {
        match t {
            EventType::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl FromStr for EventType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A verified, normalized webhook event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncEvent {
    /// Provider event id (`evt_...`). Stable across redeliveries.
    pub id: String,

    /// The event type.
    #[serde(rename = "type")]
    pub event_type: EventType,

    /// The provider object type of the payload (`customer`, `product`,
    /// `subscription`, ...).
    pub resource_type: String,

    /// Id of the remote resource the event is about.
    pub remote_id: RemoteId,

    /// The remote resource as it was when the event fired.
    pub payload: serde_json::Value,

    /// Provider-side creation time of the event (unix seconds).
    pub created: i64,

    /// When this process received the event.
    pub received_at: DateTime<Utc>,
}

impl SyncEvent {
    /// Returns the payload as a JSON object, if it is one.
    pub fn payload_object(&self) -> Option<&serde_json::Map<String, serde_json::Value>> {
        self.payload.as_object()
    }

    /// Reads a top-level string property of the payload.
    pub fn payload_str(&self, property: &str) -> Option<&str> {
        self.payload.get(property).and_then(|v| v.as_str())
    }
}
