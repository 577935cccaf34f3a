use paysync_model::{to_local, to_remote, DocumentData, FieldMapping};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;

fn object(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

// ── Examples ─────────────────────────────────────────────────────

#[test]
fn unmapped_fields_never_reach_remote() {
    let mappings = vec![FieldMapping::same("name").unwrap()];
    let doc = object(json!({"name": "Acme", "internalNotes": "secret"}));

    let payload = to_remote(&doc, &mappings);

    assert_eq!(payload, object(json!({"name": "Acme"})));
    assert!(!payload.contains_key("internalNotes"));
}

#[test]
fn absent_field_is_omitted_not_nulled() {
    let mappings = vec![FieldMapping::same("name").unwrap(), FieldMapping::same("email").unwrap()];
    let payload = to_remote(&object(json!({"name": "Acme"})), &mappings);
    assert_eq!(payload, object(json!({"name": "Acme"})));
}

#[test]
fn values_are_not_coerced() {
    let mappings = vec![
        FieldMapping::new("seats", "quantity").unwrap(),
        FieldMapping::new("active", "livemode").unwrap(),
    ];
    let payload = to_remote(&object(json!({"seats": "4", "active": 1})), &mappings);
    assert_eq!(payload["quantity"], json!("4"));
    assert_eq!(payload["livemode"], json!(1));
}

#[test]
fn to_local_ignores_undeclared_remote_properties() {
    let mappings = vec![FieldMapping::same("name").unwrap()];
    let remote = object(json!({"id": "cus_1", "object": "customer", "name": "Acme", "balance": 0}));
    assert_eq!(to_local(&remote, &mappings), object(json!({"name": "Acme"})));
}

#[test]
fn mapping_order_does_not_matter_for_content() {
    let a = vec![FieldMapping::same("name").unwrap(), FieldMapping::same("email").unwrap()];
    let b = vec![FieldMapping::same("email").unwrap(), FieldMapping::same("name").unwrap()];
    let doc = object(json!({"name": "Acme", "email": "a@acme.test"}));
    assert_eq!(to_remote(&doc, &a), to_remote(&doc, &b));
}

#[test]
fn empty_mapping_table_yields_empty_payload() {
    let doc = object(json!({"name": "Acme"}));
    assert!(to_remote(&doc, &[]).is_empty());
}

// ── Round-trip property ──────────────────────────────────────────

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[a-zA-Z0-9 @._-]{0,24}".prop_map(Value::from),
    ]
}

/// A document plus a mapping table whose local and remote names are each unique.
fn document_and_mappings() -> impl Strategy<Value = (DocumentData, Vec<FieldMapping>)> {
    (
        prop::collection::btree_map("[a-z][a-zA-Z0-9_]{0,10}", scalar(), 0..8),
        prop::collection::btree_set("[a-z][a-zA-Z0-9_]{0,10}", 0..8),
        prop::collection::btree_set("[a-z][a-z_]{0,10}", 0..8),
    )
        .prop_map(|(fields, extra_locals, remotes)| {
            let doc: DocumentData = fields.clone().into_iter().collect();
            let locals: BTreeSet<String> =
                fields.keys().cloned().chain(extra_locals).collect();
            let mappings = locals
                .into_iter()
                .zip(remotes)
                .map(|(local, remote)| FieldMapping::new(&local, &remote).unwrap())
                .collect();
            (doc, mappings)
        })
}

proptest! {
    #[test]
    fn round_trip_restores_exactly_the_mapped_subset((doc, mappings) in document_and_mappings()) {
        let restored = to_local(&to_remote(&doc, &mappings), &mappings);

        let expected: DocumentData = doc
            .iter()
            .filter(|(k, _)| mappings.iter().any(|m| m.field_path.as_str() == k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        prop_assert_eq!(restored, expected);
    }

    #[test]
    fn remote_payload_only_has_declared_properties((doc, mappings) in document_and_mappings()) {
        let payload = to_remote(&doc, &mappings);
        for key in payload.keys() {
            prop_assert!(mappings.iter().any(|m| m.stripe_property.as_str() == key.as_str()));
        }
    }
}
