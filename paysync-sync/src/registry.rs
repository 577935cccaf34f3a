//! Sync registry: the declared rules and webhook bindings.
//!
//! Built once through [`SyncRegistryBuilder`], validated as it goes, and then
//! shared read-only. Changing configuration means building a new registry.

use crate::error::SyncResult;
use crate::handler::WebhookHandler;
use paysync_model::{RuleError, SyncRule};
use paysync_types::EventType;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Accumulates rules and bindings, rejecting invalid ones immediately.
#[derive(Default)]
pub struct SyncRegistryBuilder {
    rules: Vec<SyncRule>,
    bindings: HashMap<EventType, Arc<dyn WebhookHandler>>,
}

impl SyncRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule. Fails if the rule is invalid or its collection already
    /// has one.
    pub fn register(mut self, rule: SyncRule) -> SyncResult<Self> {
        rule.validate()?;
        if self.rules.iter().any(|r| r.collection == rule.collection) {
            return Err(RuleError::DuplicateCollection(rule.collection).into());
        }
        debug!(collection = %rule.collection, resource = %rule.remote_resource_type, "registered sync rule");
        self.rules.push(rule);
        Ok(self)
    }

    /// Binds a handler to an event type. Only one handler per type; use a
    /// [`HandlerChain`](crate::HandlerChain) to run several.
    pub fn bind_webhook(
        mut self,
        event_type: impl Into<EventType>,
        handler: Arc<dyn WebhookHandler>,
    ) -> SyncResult<Self> {
        let event_type = event_type.into();
        if self.bindings.contains_key(&event_type) {
            return Err(RuleError::DuplicateBinding(event_type.to_string()).into());
        }
        debug!(event_type = %event_type, handler = handler.name(), "bound webhook handler");
        self.bindings.insert(event_type, handler);
        Ok(self)
    }

    /// Returns true if a rule for `collection` was registered.
    pub fn has_collection(&self, collection: &str) -> bool {
        self.rules.iter().any(|r| r.collection == collection)
    }

    pub fn build(self) -> SyncRegistry {
        let by_collection = self
            .rules
            .iter()
            .enumerate()
            .map(|(i, r)| (r.collection.clone(), i))
            .collect();
        SyncRegistry { rules: self.rules, by_collection, bindings: self.bindings }
    }
}

/// Immutable rule set and webhook dispatch table.
pub struct SyncRegistry {
    /// Rules in registration order.
    rules: Vec<SyncRule>,
    by_collection: HashMap<String, usize>,
    bindings: HashMap<EventType, Arc<dyn WebhookHandler>>,
}

impl SyncRegistry {
    pub fn builder() -> SyncRegistryBuilder {
        SyncRegistryBuilder::new()
    }

    /// Returns the rule for a local collection.
    pub fn lookup(&self, collection: &str) -> Option<&SyncRule> {
        self.by_collection.get(collection).map(|&i| &self.rules[i])
    }

    /// Returns the first registered rule for a provider object type
    /// (`customer`, `product`, ...).
    pub fn lookup_by_resource(&self, resource_type_singular: &str) -> Option<&SyncRule> {
        self.rules
            .iter()
            .find(|r| r.remote_resource_type_singular == resource_type_singular)
    }

    /// Returns the handler bound to an event type.
    pub fn binding(&self, event_type: &EventType) -> Option<&Arc<dyn WebhookHandler>> {
        self.bindings.get(event_type)
    }

    pub fn rules(&self) -> &[SyncRule] {
        &self.rules
    }

    /// Event types with a bound handler, sorted by name.
    pub fn bound_event_types(&self) -> Vec<&EventType> {
        let mut types: Vec<_> = self.bindings.keys().collect();
        types.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        types
    }
}

impl fmt::Debug for SyncRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bindings: Vec<(&str, &str)> = self
            .bound_event_types()
            .into_iter()
            .filter_map(|t| self.bindings.get(t).map(|h| (t.as_str(), h.name())))
            .collect();
        f.debug_struct("SyncRegistry")
            .field("rules", &self.rules)
            .field("bindings", &bindings)
            .finish()
    }
}
