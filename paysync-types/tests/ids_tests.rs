use paysync_types::{DocumentId, RemoteId};
use std::collections::HashSet;
use std::str::FromStr;

// ── DocumentId ────────────────────────────────────────────────────

#[test]
fn document_id_new_is_unique() {
    let a = DocumentId::new();
    let b = DocumentId::new();
    assert_ne!(a, b);
}

#[test]
fn document_id_from_uuid_roundtrip() {
    let uuid = uuid::Uuid::now_v7();
    let id = DocumentId::from_uuid(uuid);
    assert_eq!(id.as_uuid(), uuid);
}

#[test]
fn document_id_display_and_parse() {
    let id = DocumentId::new();
    let parsed = DocumentId::parse(&id.to_string()).unwrap();
    assert_eq!(id, parsed);
}

#[test]
fn document_id_from_str_invalid() {
    assert!(DocumentId::from_str("garbage").is_err());
}

#[test]
fn document_ids_are_time_ordered() {
    let a = DocumentId::new();
    let b = DocumentId::new();
    assert!(a < b);
}

#[test]
fn document_id_hash_set() {
    let mut set = HashSet::new();
    let id = DocumentId::new();
    set.insert(id);
    set.insert(id);
    assert_eq!(set.len(), 1);
}

#[test]
fn document_id_serde_is_transparent() {
    let id = DocumentId::new();
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, format!("\"{id}\""));
}

// ── RemoteId ──────────────────────────────────────────────────────

#[test]
fn remote_id_accepts_provider_ids() {
    let id = RemoteId::new("cus_N1a2b3").unwrap();
    assert_eq!(id.as_str(), "cus_N1a2b3");
    assert_eq!(id.to_string(), "cus_N1a2b3");
}

#[test]
fn remote_id_rejects_empty() {
    assert!(RemoteId::new("").is_err());
}

#[test]
fn remote_id_rejects_whitespace() {
    assert!(RemoteId::new("cus 123").is_err());
    assert!(RemoteId::new("cus_123\n").is_err());
}

#[test]
fn remote_id_serde_roundtrip() {
    let id = RemoteId::new("prod_abc").unwrap();
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"prod_abc\"");
    let parsed: RemoteId = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, id);
}

#[test]
fn remote_id_deserialize_rejects_empty() {
    let result: Result<RemoteId, _> = serde_json::from_str("\"\"");
    assert!(result.is_err());
}
