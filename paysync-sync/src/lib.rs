//! Bidirectional field sync between local documents and payment-provider
//! resources.
//!
//! # Architecture
//!
//! The engine sits between a local [`DocumentStore`](paysync_storage::DocumentStore)
//! and a remote [`RemoteApi`]. Both are traits; the engine never sees a
//! concrete database or HTTP client.
//!
//! ## Components
//!
//! - **Registry**: the declared [`SyncRule`](paysync_model::SyncRule)s and the
//!   event-type to handler table, immutable once built
//! - **Verifier**: authenticates webhook deliveries and normalizes them into
//!   [`SyncEvent`](paysync_types::SyncEvent)s
//! - **Inbound**: runs the bound handler per event, serialized per remote
//!   resource and filtered through the delivery ledger
//! - **Outbound**: pushes local writes as remote create/update/delete calls
//!
//! ## Inbound flow
//!
//! 1. The transport hands the raw body and signature header to
//!    [`WebhookVerifier::verify`]
//! 2. [`InboundSyncHandler::handle`] looks up the binding for the event type
//! 3. The event waits for its resource's lane, then the ledger drops replays
//!    and events older than applied state
//! 4. The handler updates local documents; success is recorded in the ledger
//!
//! # Example
//!
//! ```
//! use paysync_model::{FieldMapping, SyncRule};
//! use paysync_sync::{handlers::UpsertFromRemote, SyncRegistry};
//! use paysync_types::EventType;
//! use std::sync::Arc;
//!
//! let rule = SyncRule::new("customers", "customers", "customer")
//!     .with_mapping(FieldMapping::same("name").unwrap());
//!
//! let registry = SyncRegistry::builder()
//!     .register(rule)
//!     .unwrap()
//!     .bind_webhook(EventType::CustomerUpdated, Arc::new(UpsertFromRemote::new("customers")))
//!     .unwrap()
//!     .build();
//!
//! assert!(registry.lookup("customers").is_some());
//! ```

mod config;
mod error;
mod handler;
pub mod handlers;
mod inbound;
mod outbound;
mod registry;
pub mod remote;
pub mod state;
pub mod verifier;

pub use config::{EngineConfig, HandlerSpec, HandlerSpecs, SyncConfigFile};
pub use error::{SyncError, SyncResult};
pub use handler::{HandlerChain, HandlerContext, WebhookHandler};
pub use inbound::{InboundOutcome, InboundSyncHandler};
pub use outbound::{OutboundDispatcher, OutboundOutcome, WriteOrigin};
pub use registry::{SyncRegistry, SyncRegistryBuilder};
pub use remote::{RemoteApi, RemoteError, RemoteResource, RemoteResult, StripeClient, StripeConfig};
pub use state::{DeliveryLedger, LedgerCheck};
pub use verifier::{sign, VerificationError, VerifierConfig, WebhookVerifier};
