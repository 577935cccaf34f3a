use crate::handler::{HandlerContext, WebhookHandler};
use anyhow::Context;
use async_trait::async_trait;
use paysync_model::{DocumentData, DocumentPatch};
use paysync_types::{RemoteId, SyncEvent};
use serde_json::{json, Value};
use tracing::debug;

/// Fetches a product's default price and stores it, serialized, as
/// `price.stripeJSON` on the linked product document.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductPriceJson;

#[async_trait]
impl WebhookHandler for ProductPriceJson {
    fn name(&self) -> &str {
        "product_price_json"
    }

    async fn handle(&self, event: &SyncEvent, ctx: &HandlerContext<'_>) -> anyhow::Result<()> {
        let rule = ctx
            .registry
            .lookup_by_resource("product")
            .context("no sync rule for remote products")?;
        let Some(product) = ctx.store.find_by_remote_id(&rule.collection, &event.remote_id).await?
        else {
            debug!(product = %event.remote_id, "no local product for price sync");
            return Ok(());
        };

        // `default_price` is an id, or the price object when expanded.
        let price_id = match event.payload.get("default_price") {
            Some(Value::String(id)) => Some(id.as_str()),
            Some(Value::Object(price)) => price.get("id").and_then(Value::as_str),
            _ => None,
        };
        let Some(price_id) = price_id else {
            debug!(product = %event.remote_id, "product has no default price");
            return Ok(());
        };

        let price_id = RemoteId::new(price_id)?;
        let price = ctx
            .retrieve("prices", &price_id)
            .await
            .with_context(|| format!("retrieving price {price_id}"))?;

        let mut data = DocumentData::new();
        data.insert(
            "price".to_string(),
            json!({ "stripeJSON": serde_json::to_string(&price.object)? }),
        );
        ctx.store
            .update(&rule.collection, product.id, DocumentPatch::data(data))
            .await?;
        debug!(product = %event.remote_id, price = %price_id, "stored default price");
        Ok(())
    }
}
