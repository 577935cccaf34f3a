use crate::handler::{HandlerContext, WebhookHandler};
use anyhow::Context;
use async_trait::async_trait;
use paysync_model::{Document, DocumentData, DocumentPatch};
use paysync_types::{RemoteId, SyncEvent};
use serde_json::{json, Value};
use tracing::debug;

const SUBSCRIPTIONS: &str = "subscriptions";
const SUBSCRIPTION_ID: &str = "stripeSubscriptionID";

/// Provider dashboard URL for a customer.
pub fn dashboard_link(test_mode: bool, customer_id: &RemoteId) -> String {
    let mode = if test_mode { "test/" } else { "" };
    format!("https://dashboard.stripe.com/{mode}customers/{customer_id}")
}

/// Replaces or appends the event's subscription in the owning customer's
/// `subscriptions` array.
///
/// Both subscription handlers rewrite the customer document, so they run on
/// the customer's lane rather than the subscription's.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubscriptionUpsert;

/// Removes the event's subscription from the owning customer's
/// `subscriptions` array.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubscriptionDelete;

#[async_trait]
impl WebhookHandler for SubscriptionUpsert {
    fn name(&self) -> &str {
        "subscription_upsert"
    }

    fn lane_key(&self, event: &SyncEvent) -> RemoteId {
        customer_lane(event)
    }

    async fn handle(&self, event: &SyncEvent, ctx: &HandlerContext<'_>) -> anyhow::Result<()> {
        let customer_id = customer_of(event)?;
        let customer = find_customer(ctx, &customer_id)
            .await?
            .with_context(|| format!("no local customer linked to {customer_id}"))?;

        let product_remote = event
            .payload
            .pointer("/plan/product")
            .or_else(|| event.payload.pointer("/items/data/0/price/product"))
            .and_then(Value::as_str);
        let product_local = match (product_remote, ctx.registry.lookup_by_resource("product")) {
            (Some(product_id), Some(rule)) => {
                let product_id = RemoteId::new(product_id)?;
                ctx.store
                    .find_by_remote_id(&rule.collection, &product_id)
                    .await?
                    .map(|doc| doc.id.to_string())
            }
            _ => None,
        };

        let entry = json!({
            "stripeSubscriptionID": event.remote_id.as_str(),
            "stripeProductID": product_remote,
            "product": product_local,
            "status": event.payload_str("status"),
            "link": dashboard_link(ctx.config.test_mode, &customer_id),
        });

        let mut subscriptions = subscriptions_of(&customer);
        match subscriptions.iter().position(|s| is_subscription(s, &event.remote_id)) {
            Some(i) => subscriptions[i] = entry,
            None => subscriptions.push(entry),
        }

        write_subscriptions(ctx, &customer, subscriptions).await?;
        debug!(customer = %customer_id, subscription = %event.remote_id, "stored subscription");
        Ok(())
    }
}

#[async_trait]
impl WebhookHandler for SubscriptionDelete {
    fn name(&self) -> &str {
        "subscription_delete"
    }

    fn lane_key(&self, event: &SyncEvent) -> RemoteId {
        customer_lane(event)
    }

    async fn handle(&self, event: &SyncEvent, ctx: &HandlerContext<'_>) -> anyhow::Result<()> {
        let customer_id = customer_of(event)?;
        let Some(customer) = find_customer(ctx, &customer_id).await? else {
            debug!(customer = %customer_id, "no local customer for deleted subscription");
            return Ok(());
        };

        let mut subscriptions = subscriptions_of(&customer);
        let before = subscriptions.len();
        subscriptions.retain(|s| !is_subscription(s, &event.remote_id));
        if subscriptions.len() == before {
            return Ok(());
        }

        write_subscriptions(ctx, &customer, subscriptions).await?;
        debug!(customer = %customer_id, subscription = %event.remote_id, "removed subscription");
        Ok(())
    }
}

fn customer_lane(event: &SyncEvent) -> RemoteId {
    customer_of(event).unwrap_or_else(|_| event.remote_id.clone())
}

fn customer_of(event: &SyncEvent) -> anyhow::Result<RemoteId> {
    let id = event.payload_str("customer").context("subscription has no `customer`")?;
    Ok(RemoteId::new(id)?)
}

async fn find_customer(
    ctx: &HandlerContext<'_>,
    customer_id: &RemoteId,
) -> anyhow::Result<Option<Document>> {
    let rule = ctx
        .registry
        .lookup_by_resource("customer")
        .context("no sync rule for remote customers")?;
    Ok(ctx.store.find_by_remote_id(&rule.collection, customer_id).await?)
}

fn subscriptions_of(customer: &Document) -> Vec<Value> {
    customer
        .data
        .get(SUBSCRIPTIONS)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

fn is_subscription(entry: &Value, id: &RemoteId) -> bool {
    entry.get(SUBSCRIPTION_ID).and_then(Value::as_str) == Some(id.as_str())
}

async fn write_subscriptions(
    ctx: &HandlerContext<'_>,
    customer: &Document,
    subscriptions: Vec<Value>,
) -> anyhow::Result<()> {
    let mut data = DocumentData::new();
    data.insert(SUBSCRIPTIONS.to_string(), Value::Array(subscriptions));
    ctx.store
        .update(&customer.collection, customer.id, DocumentPatch::data(data))
        .await?;
    Ok(())
}
