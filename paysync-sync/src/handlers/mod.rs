//! Built-in webhook handlers.
//!
//! - [`UpsertFromRemote`]: mirrors a remote resource into a collection
//! - [`SubscriptionUpsert`] / [`SubscriptionDelete`]: keep a customer's
//!   `subscriptions` array in step with provider subscriptions
//! - [`ProductPriceJson`]: stores a product's default price as JSON

mod price;
mod subscription;
mod upsert;

pub use price::ProductPriceJson;
pub use subscription::{dashboard_link, SubscriptionDelete, SubscriptionUpsert};
pub use upsert::UpsertFromRemote;
