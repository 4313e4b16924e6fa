//! Store behaviour against a JSON document on disk

use std::path::Path;
use std::sync::Arc;
use std::thread;

use content_ledger::config::LedgerConfig;
use content_ledger::{ContentError, ContentStore, VerificationStatus};
use serde_json::{json, Value};
use tempfile::TempDir;

fn open(path: &Path) -> ContentStore {
    ContentStore::open_from_config(&LedgerConfig::new(path, "integration-secret"))
        .expect("open content store")
}

fn temp_store() -> (ContentStore, TempDir) {
    let dir = TempDir::new().expect("tmp dir");
    let store = open(&dir.path().join("content.json"));
    (store, dir)
}

#[test]
fn create_update_verify_scenario() {
    let (store, _dir) = temp_store();

    let created = store.create(json!({"title": "A", "type": "doc"})).unwrap();
    assert_eq!(created.id, 1);
    assert_eq!(created.version(), 1);

    let updated = store.update(1, &json!({"title": "B"})).unwrap();
    assert_eq!(updated.version(), 2);
    assert_eq!(updated.verification.trust_chain.len(), 2);
    assert_eq!(updated.payload.title.as_deref(), Some("B"));
    assert_eq!(updated.payload.kind.as_deref(), Some("doc"));
    assert_ne!(updated.verification.content_hash, created.verification.content_hash);
    assert!(store.verify(1).unwrap());
}

#[test]
fn get_on_empty_store_is_not_found() {
    let (store, _dir) = temp_store();
    assert!(matches!(store.get(999), Err(ContentError::NotFound { id: 999 })));
}

#[test]
fn round_trip_applies_defaults() {
    let (store, _dir) = temp_store();
    let created = store
        .create(json!({
            "title": "Launch copy",
            "usage": { "regions": ["NA", "EU"], "restrictions": { "embargo": "2026-03-01" } },
            "blocks": { "features": "Fast\nSecure" }
        }))
        .unwrap();

    let fetched = store.get(created.id).unwrap();
    assert_eq!(fetched, created);

    let r = &fetched.payload.usage.restrictions;
    assert_eq!(r.confidentiality, "public");
    assert_eq!(r.usage_rights, "unrestricted");
    assert_eq!(r.embargo.as_deref(), Some("2026-03-01"));
    assert_eq!(fetched.payload.usage.regions, vec!["NA", "EU"]);
    assert_eq!(fetched.payload.blocks.features, vec!["Fast", "Secure"]);
}

#[test]
fn verification_is_idempotent() {
    let (store, _dir) = temp_store();
    store.create(json!({"title": "A"})).unwrap();

    let first = store.verify(1).unwrap();
    let second = store.verify(1).unwrap();
    assert!(first);
    assert_eq!(first, second);
}

#[test]
fn deletion_is_terminal() {
    let (store, _dir) = temp_store();
    store.create(json!({"title": "A"})).unwrap();

    store.delete(1).unwrap();
    assert!(store.get(1).unwrap_err().is_not_found());
    assert!(store.delete(1).unwrap_err().is_not_found());
    assert!(store.verify(1).unwrap_err().is_not_found());
}

#[test]
fn tampering_with_the_file_is_detected() {
    let dir = TempDir::new().expect("tmp dir");
    let path = dir.path().join("content.json");

    let store = open(&path);
    store.create(json!({"title": "Original", "type": "doc"})).unwrap();
    store.update(1, &json!({"description": "reviewed"})).unwrap();
    store.close();

    let mut document: Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    document["content"][0]["payload"]["title"] = json!("Forged");
    std::fs::write(&path, serde_json::to_string_pretty(&document).unwrap()).unwrap();

    let reopened = open(&path);
    assert!(!reopened.verify(1).unwrap());
    assert!(!reopened.audit(1).unwrap().is_intact());
}

#[test]
fn state_and_counter_survive_reopen() {
    let dir = TempDir::new().expect("tmp dir");
    let path = dir.path().join("data").join("content.json");

    let store = open(&path);
    store.create(json!({"title": "A"})).unwrap();
    store.create(json!({"title": "B"})).unwrap();
    store.update(2, &json!({"title": "B2"})).unwrap();
    store.delete(2).unwrap();
    let before = store.list().unwrap();
    store.close();

    let reopened = open(&path);
    assert_eq!(reopened.list().unwrap(), before);
    assert!(reopened.verify(1).unwrap());
    assert_eq!(reopened.create(json!({"title": "C"})).unwrap().id, 3);
}

#[test]
fn reload_after_the_file_vanishes_keeps_ids_unique() {
    let dir = TempDir::new().expect("tmp dir");
    let path = dir.path().join("content.json");

    let store = open(&path);
    assert_eq!(store.create(json!({"title": "A"})).unwrap().id, 1);
    std::fs::remove_file(&path).unwrap();

    assert!(matches!(store.reload(), Err(ContentError::StoreIo { .. })));
    assert_eq!(store.create(json!({"title": "B"})).unwrap().id, 2);
}

#[test]
fn persisted_layout_matches_document_shape() {
    let dir = TempDir::new().expect("tmp dir");
    let path = dir.path().join("content.json");

    let store = open(&path);
    store.create(json!({"title": "A"})).unwrap();

    let document: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(document["metadata"]["lastId"], json!(1));
    assert_eq!(document["metadata"]["version"], json!("1.0.0"));
    let record = &document["content"][0];
    assert_eq!(record["verification"]["status"], json!("pending"));
    assert_eq!(record["audit"]["version_history"][0]["changes"], json!("Initial creation"));
    assert_eq!(record["verification"]["trust_chain"][0]["authority"], json!("system"));
}

#[test]
fn unreadable_document_fails_open() {
    let dir = TempDir::new().expect("tmp dir");
    let path = dir.path().join("content.json");
    std::fs::write(&path, "definitely not json").unwrap();

    let result = ContentStore::open_from_config(&LedgerConfig::new(&path, "integration-secret"));
    assert!(matches!(result, Err(ContentError::Encoding { .. })));
}

#[test]
fn concurrent_updates_never_interleave() {
    let (store, _dir) = temp_store();
    store.create(json!({"title": "shared"})).unwrap();
    let store = Arc::new(store);

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for n in 0..5 {
                    store
                        .update(1, &json!({ "description": format!("worker {worker} edit {n}") }))
                        .expect("update");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("worker panicked");
    }

    let record = store.get(1).unwrap();
    assert_eq!(record.version(), 41);
    assert_eq!(record.verification.trust_chain.len(), 41);
    assert_eq!(record.audit.version_history.len(), 41);
    let versions: Vec<u64> = record.audit.version_history.iter().map(|e| e.version).collect();
    assert_eq!(versions, (1..=41).collect::<Vec<u64>>());
    assert!(store.audit(1).unwrap().is_intact());
}

#[test]
fn status_changes_persist_without_new_links() {
    let dir = TempDir::new().expect("tmp dir");
    let path = dir.path().join("content.json");

    let store = open(&path);
    store.create(json!({"title": "A"})).unwrap();
    store.set_status(1, VerificationStatus::Rejected).unwrap();
    store.close();

    let reopened = open(&path);
    let record = reopened.get(1).unwrap();
    assert_eq!(record.verification.status, VerificationStatus::Rejected);
    assert_eq!(record.verification.trust_chain.len(), 1);
    assert!(reopened.verify(1).unwrap());
}

#[test]
fn a_different_secret_breaks_the_audit_but_not_the_hash() {
    let dir = TempDir::new().expect("tmp dir");
    let path = dir.path().join("content.json");

    open(&path).create(json!({"title": "A"})).unwrap();

    let other = ContentStore::open_from_config(&LedgerConfig::new(&path, "rotated-secret")).unwrap();
    assert!(other.verify(1).unwrap());
    assert!(!other.audit(1).unwrap().is_intact());
}
