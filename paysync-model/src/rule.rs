use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// Errors raised while validating sync configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("sync rule has an empty collection name")]
    EmptyCollection,

    #[error("sync rule for `{collection}` has an empty remote resource type")]
    EmptyResourceType { collection: String },

    #[error("sync rule for `{collection}` declares no field mappings")]
    NoFieldMappings { collection: String },

    #[error("field name must not be empty")]
    EmptyFieldName,

    #[error("nested field path `{path}` is not supported; only flat top-level fields can be mapped")]
    NestedFieldPath { path: String },

    #[error("sync rule for `{collection}` maps `{name}` more than once")]
    DuplicateMapping { collection: String, name: String },

    #[error("collection `{0}` already has a sync rule")]
    DuplicateCollection(String),

    #[error("event type `{0}` already has a webhook handler")]
    DuplicateBinding(String),

    #[error("no sync rule for collection `{0}`")]
    UnknownCollection(String),

    #[error("invalid webhook handler `{0}`")]
    InvalidHandler(String),

    #[error("invalid sync configuration: {0}")]
    InvalidConfig(String),
}

/// A flat, top-level property name on either side of a mapping.
///
/// Constructing one rejects path separators, so a nested path such as
/// `price.stripePriceID` fails when configuration is loaded rather than when
/// the first document is synced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldName(String);

impl FieldName {
    pub fn new(name: impl Into<String>) -> Result<Self, RuleError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(RuleError::EmptyFieldName);
        }
        if name.contains(['.', '[', ']', '/']) {
            return Err(RuleError::NestedFieldPath { path: name });
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for FieldName {
    type Error = RuleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for FieldName {
    type Error = RuleError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FieldName> for String {
    fn from(name: FieldName) -> Self {
        name.0
    }
}

/// One local field paired with one remote property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMapping {
    /// Field on the local document.
    pub field_path: FieldName,
    /// Property on the remote resource.
    #[serde(alias = "remoteProperty")]
    pub stripe_property: FieldName,
}

impl FieldMapping {
    /// Validates both names and builds the mapping.
    pub fn new(field_path: &str, stripe_property: &str) -> Result<Self, RuleError> {
        Ok(Self {
            field_path: FieldName::new(field_path)?,
            stripe_property: FieldName::new(stripe_property)?,
        })
    }

    /// Mapping where the local field and the remote property share a name.
    pub fn same(name: &str) -> Result<Self, RuleError> {
        Self::new(name, name)
    }
}

/// Declares how one local collection is synced with one remote resource type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRule {
    /// Local collection slug (e.g. `customers`).
    pub collection: String,
    /// Plural remote resource type used in API paths (e.g. `customers`).
    #[serde(alias = "stripeResourceType")]
    pub remote_resource_type: String,
    /// Singular remote object type as it appears in webhook payloads
    /// (e.g. `customer`).
    #[serde(alias = "stripeResourceTypeSingular")]
    pub remote_resource_type_singular: String,
    /// Ordered field mappings.
    #[serde(alias = "fields")]
    pub field_mappings: Vec<FieldMapping>,
}

impl SyncRule {
    pub fn new(
        collection: impl Into<String>,
        remote_resource_type: impl Into<String>,
        remote_resource_type_singular: impl Into<String>,
    ) -> Self {
        Self {
            collection: collection.into(),
            remote_resource_type: remote_resource_type.into(),
            remote_resource_type_singular: remote_resource_type_singular.into(),
            field_mappings: Vec::new(),
        }
    }

    /// Appends a mapping.
    pub fn with_mapping(mut self, mapping: FieldMapping) -> Self {
        self.field_mappings.push(mapping);
        self
    }

    /// Checks the rule on its own. Uniqueness across rules is the registry's job.
    pub fn validate(&self) -> Result<(), RuleError> {
        if self.collection.trim().is_empty() {
            return Err(RuleError::EmptyCollection);
        }
        if self.remote_resource_type.trim().is_empty()
            || self.remote_resource_type_singular.trim().is_empty()
        {
            return Err(RuleError::EmptyResourceType { collection: self.collection.clone() });
        }
        if self.field_mappings.is_empty() {
            return Err(RuleError::NoFieldMappings { collection: self.collection.clone() });
        }

        // Each side must be unique or the reverse direction becomes ambiguous.
        let mut local = HashSet::new();
        let mut remote = HashSet::new();
        for mapping in &self.field_mappings {
            if !local.insert(mapping.field_path.as_str()) {
                return Err(self.duplicate(&mapping.field_path));
            }
            if !remote.insert(mapping.stripe_property.as_str()) {
                return Err(self.duplicate(&mapping.stripe_property));
            }
        }
        Ok(())
    }

    fn duplicate(&self, name: &FieldName) -> RuleError {
        RuleError::DuplicateMapping {
            collection: self.collection.clone(),
            name: name.to_string(),
        }
    }
}
