//! Field mapper: translates between local document fields and remote
//! resource properties using a rule's mapping table.
//!
//! Both directions read only the declared names. A name missing from the
//! source is left out of the result rather than written as `null`, and values
//! are copied without coercion.

use crate::{DocumentData, FieldMapping};
use serde_json::{Map, Value};

/// Builds the remote payload for a local document.
pub fn to_remote(local: &DocumentData, mappings: &[FieldMapping]) -> Map<String, Value> {
    mappings
        .iter()
        .filter_map(|m| {
            local
                .get(m.field_path.as_str())
                .map(|v| (m.stripe_property.to_string(), v.clone()))
        })
        .collect()
}

/// Builds the local partial document for a remote payload.
pub fn to_local(remote: &Map<String, Value>, mappings: &[FieldMapping]) -> DocumentData {
    mappings
        .iter()
        .filter_map(|m| {
            remote
                .get(m.stripe_property.as_str())
                .map(|v| (m.field_path.to_string(), v.clone()))
        })
        .collect()
}
