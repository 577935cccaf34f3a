//! Engine settings and the JSON sync configuration file.
//!
//! The file declares the sync rules and binds event types to built-in
//! handlers:
//!
//! ```json
//! {
//!   "sync": [
//!     {
//!       "collection": "customers",
//!       "stripeResourceType": "customers",
//!       "stripeResourceTypeSingular": "customer",
//!       "fields": [{ "fieldPath": "name", "stripeProperty": "name" }]
//!     }
//!   ],
//!   "webhooks": {
//!     "customer.updated": "upsert:customers",
//!     "product.updated": ["upsert:products", "product_price_json"]
//!   }
//! }
//! ```

use crate::error::SyncResult;
use crate::handler::{HandlerChain, WebhookHandler};
use crate::handlers::{ProductPriceJson, SubscriptionDelete, SubscriptionUpsert, UpsertFromRemote};
use crate::registry::{SyncRegistry, SyncRegistryBuilder};
use crate::state::{DEFAULT_LEDGER_CAPACITY, DEFAULT_LEDGER_RESOURCES};
use paysync_model::{RuleError, SyncRule};
use paysync_types::EventType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Runtime settings shared by the inbound handler and outbound dispatcher.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upper bound on every remote API call.
    pub remote_timeout: Duration,
    /// Mark documents `failed` when an outbound push fails.
    pub record_failures: bool,
    /// Provider test mode; affects generated dashboard links.
    pub test_mode: bool,
    /// Event ids remembered per remote resource.
    pub ledger_capacity: usize,
    /// Remote resources remembered by the delivery ledger.
    pub ledger_resources: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            remote_timeout: Duration::from_secs(30),
            record_failures: true,
            test_mode: false,
            ledger_capacity: DEFAULT_LEDGER_CAPACITY,
            ledger_resources: DEFAULT_LEDGER_RESOURCES,
        }
    }
}

/// A built-in handler, as named in the configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerSpec {
    /// `upsert:<collection>`
    Upsert { collection: String },
    /// `subscription_upsert`
    SubscriptionUpsert,
    /// `subscription_delete`
    SubscriptionDelete,
    /// `product_price_json`
    ProductPriceJson,
}

impl HandlerSpec {
    pub fn into_handler(self) -> Arc<dyn WebhookHandler> {
        match self {
            Self::Upsert { collection } => Arc::new(UpsertFromRemote::new(collection)),
            Self::SubscriptionUpsert => Arc::new(SubscriptionUpsert),
            Self::SubscriptionDelete => Arc::new(SubscriptionDelete),
            Self::ProductPriceJson => Arc::new(ProductPriceJson),
        }
    }
}

impl FromStr for HandlerSpec {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "subscription_upsert" => Ok(Self::SubscriptionUpsert),
            "subscription_delete" => Ok(Self::SubscriptionDelete),
            "product_price_json" => Ok(Self::ProductPriceJson),
            other => match other.split_once(':') {
                Some(("upsert", collection)) if !collection.trim().is_empty() => {
                    Ok(Self::Upsert { collection: collection.trim().to_string() })
                }
                _ => Err(RuleError::InvalidHandler(s.to_string())),
            },
        }
    }
}

impl fmt::Display for HandlerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upsert { collection } => write!(f, "upsert:{collection}"),
            Self::SubscriptionUpsert => f.write_str("subscription_upsert"),
            Self::SubscriptionDelete => f.write_str("subscription_delete"),
            Self::ProductPriceJson => f.write_str("product_price_json"),
        }
    }
}

/// One handler name or a list run as a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HandlerSpecs {
    One(String),
    Chain(Vec<String>),
}

impl HandlerSpecs {
    fn names(&self) -> &[String] {
        match self {
            Self::One(name) => std::slice::from_ref(name),
            Self::Chain(names) => names,
        }
    }
}

/// The on-disk sync configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfigFile {
    #[serde(default)]
    pub sync: Vec<SyncRule>,
    #[serde(default)]
    pub webhooks: BTreeMap<String, HandlerSpecs>,
}

impl SyncConfigFile {
    /// Parses a configuration document. Invalid field names, including
    /// nested paths, are rejected here.
    pub fn from_json(json: &str) -> SyncResult<Self> {
        serde_json::from_str(json).map_err(|e| RuleError::InvalidConfig(e.to_string()).into())
    }

    /// Validates the rules and bindings and builds the registry.
    pub fn build_registry(&self) -> SyncResult<SyncRegistry> {
        let mut builder = SyncRegistryBuilder::new();
        for rule in &self.sync {
            builder = builder.register(rule.clone())?;
        }

        for (event_type, specs) in &self.webhooks {
            let specs = specs
                .names()
                .iter()
                .map(|name| name.parse::<HandlerSpec>())
                .collect::<Result<Vec<_>, _>>()?;
            for spec in &specs {
                if let HandlerSpec::Upsert { collection } = spec {
                    if !builder.has_collection(collection) {
                        return Err(RuleError::UnknownCollection(collection.clone()).into());
                    }
                }
            }

            let mut handlers: Vec<_> = specs.into_iter().map(HandlerSpec::into_handler).collect();
            let handler: Arc<dyn WebhookHandler> = match handlers.len() {
                0 => return Err(RuleError::InvalidHandler(format!("empty chain for {event_type}")).into()),
                1 => handlers.remove(0),
                _ => Arc::new(HandlerChain::new(handlers)),
            };
            builder = builder.bind_webhook(EventType::from(event_type.as_str()), handler)?;
        }

        Ok(builder.build())
    }
}
