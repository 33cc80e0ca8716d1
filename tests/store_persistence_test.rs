//! File-backed credential store tests: state must survive a process
//! restart, and the legacy-format migration must run exactly once.

use std::fs;

use promptforge::store::{CredentialStore, FileStore, KeyValueStore, ProviderCredential};
use serde_json::json;

fn open_at(path: &std::path::Path) -> CredentialStore {
    let file_store = FileStore::open(path).unwrap();
    CredentialStore::open(Box::new(file_store)).unwrap()
}

#[test]
fn credentials_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("credentials.json");

    {
        let store = open_at(&path);
        store
            .save_credential(ProviderCredential {
                provider_id: "openai".into(),
                api_key: "sk-persisted".into(),
                custom_model: "gpt-4o-mini".into(),
                is_active: true,
                ..Default::default()
            })
            .unwrap();
    }

    let reopened = open_at(&path);
    let credential = reopened.credential("openai").expect("persisted credential");
    assert_eq!(credential.api_key, "sk-persisted");
    assert_eq!(credential.custom_model, "gpt-4o-mini");
    assert!(credential.is_active);
    assert_eq!(reopened.active_provider_id(), "openai");
}

#[test]
fn active_pointer_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("credentials.json");

    {
        let store = open_at(&path);
        store
            .save_credential(ProviderCredential {
                provider_id: "cohere".into(),
                api_key: "co-1".into(),
                ..Default::default()
            })
            .unwrap();
        store.set_active_provider("cohere").unwrap();
    }

    let reopened = open_at(&path);
    assert_eq!(reopened.active_provider_id(), "cohere");
    assert!(reopened.credential("cohere").unwrap().is_active);
}

#[test]
fn removal_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("credentials.json");

    {
        let store = open_at(&path);
        store
            .save_credential(ProviderCredential {
                provider_id: "openai".into(),
                api_key: "sk-1".into(),
                ..Default::default()
            })
            .unwrap();
        store.remove_credential("openai").unwrap();
    }

    let reopened = open_at(&path);
    assert!(reopened.credential("openai").is_none());
}

#[test]
fn legacy_file_is_migrated_once_across_reopens() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("credentials.json");

    // A file as the single-slot format would have left it.
    fs::write(
        &path,
        serde_json::to_string_pretty(&json!({
            "provider": "Hugging Face (community)",
            "apikey": "hf-legacy",
            "endpoint": "https://custom.inference.test/models/foo"
        }))
        .unwrap(),
    )
    .unwrap();

    {
        let store = open_at(&path);
        let migrated = store.credential("huggingface").expect("migrated entry");
        assert_eq!(migrated.api_key, "hf-legacy");
        assert_eq!(
            migrated.custom_endpoint,
            "https://custom.inference.test/models/foo"
        );
        assert!(migrated.is_active);
    }

    // Legacy keys are gone from the persisted file.
    let raw_store = FileStore::open(&path).unwrap();
    assert_eq!(raw_store.get("provider"), None);
    assert_eq!(raw_store.get("apikey"), None);
    assert_eq!(raw_store.get("endpoint"), None);
    assert_eq!(raw_store.get("migration_v2_done"), Some("true".to_string()));
    drop(raw_store);

    // Reopening does not duplicate or overwrite the migrated entry.
    {
        let store = open_at(&path);
        store
            .save_credential(ProviderCredential {
                provider_id: "huggingface".into(),
                api_key: "hf-rotated".into(),
                ..Default::default()
            })
            .unwrap();
    }
    let store = open_at(&path);
    assert_eq!(store.all_credentials().len(), 1);
    assert_eq!(store.credential("huggingface").unwrap().api_key, "hf-rotated");
}

#[test]
fn legacy_provider_without_key_is_not_migrated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("credentials.json");

    fs::write(
        &path,
        serde_json::to_string_pretty(&json!({"provider": "OpenAI (preset)"})).unwrap(),
    )
    .unwrap();

    let store = open_at(&path);
    assert!(store.all_credentials().is_empty());

    // The flag still flips so the check never repeats.
    let raw_store = FileStore::open(&path).unwrap();
    assert_eq!(raw_store.get("migration_v2_done"), Some("true".to_string()));
}
