//! Credential store: per-provider keys, overrides, and the active pointer.
//!
//! The store owns the persisted credential set. The "at most one active"
//! invariant is enforced at the write boundary: `save_credential` and
//! `set_active_provider` rewrite the whole set so exactly one entry can
//! carry the flag. A one-time migration from the legacy single-provider
//! format runs inside `open`, under the same lock as every other
//! operation, and is guarded by a persisted completion flag so it runs at
//! most once no matter how often the store is constructed.

mod kv;

pub use kv::{FileStore, KeyValueStore, MemoryStore};

use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::registry::{DEFAULT_PROVIDER_ID, ProviderConfig, ProviderRegistry};
use crate::Result;

const KEY_PROVIDER_CONFIGS: &str = "provider_configurations";
const KEY_ACTIVE_PROVIDER: &str = "active_provider";
const KEY_MIGRATION_DONE: &str = "migration_v2_done";

const LEGACY_PROVIDER: &str = "provider";
const LEGACY_API_KEY: &str = "apikey";
const LEGACY_ENDPOINT: &str = "endpoint";

/// User-entered configuration for one provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCredential {
    pub provider_id: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub custom_endpoint: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub custom_model: String,
}

/// Persistent store for provider credentials and the active-provider pointer.
pub struct CredentialStore {
    kv: Mutex<Box<dyn KeyValueStore>>,
    registry: ProviderRegistry,
}

impl CredentialStore {
    /// Open the store over an injected backend, running the legacy
    /// migration if it has not completed yet.
    pub fn open(kv: Box<dyn KeyValueStore>) -> Result<Self> {
        let store = Self {
            kv: Mutex::new(kv),
            registry: ProviderRegistry::new(),
        };
        {
            let mut kv = store.lock();
            migrate_locked(kv.as_mut())?;
        }
        Ok(store)
    }

    /// The provider catalog this store resolves ids against.
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn KeyValueStore>> {
        self.kv.lock().expect("credential store lock poisoned")
    }

    /// Get the stored credential for a provider, if any.
    pub fn credential(&self, provider_id: &str) -> Option<ProviderCredential> {
        let kv = self.lock();
        load_credentials(kv.as_ref())
            .into_iter()
            .find(|c| c.provider_id == provider_id)
    }

    /// All stored credentials. Order is storage order, not meaningful.
    pub fn all_credentials(&self) -> Vec<ProviderCredential> {
        let kv = self.lock();
        load_credentials(kv.as_ref())
    }

    /// Upsert a credential by provider id.
    ///
    /// When the credential is marked active, every other stored entry has
    /// its flag cleared and the active pointer moves, in the same write.
    pub fn save_credential(&self, credential: ProviderCredential) -> Result<()> {
        let mut kv = self.lock();
        save_credential_locked(kv.as_mut(), credential)
    }

    /// Point the active-provider pointer at `provider_id` and update the
    /// stored set so exactly that entry (if present) is flagged active.
    pub fn set_active_provider(&self, provider_id: &str) -> Result<()> {
        let mut kv = self.lock();
        set_active_locked(kv.as_mut(), provider_id)
    }

    /// Delete a credential. If it was the active one and other entries
    /// remain, activity moves to the first remaining entry.
    pub fn remove_credential(&self, provider_id: &str) -> Result<()> {
        let mut kv = self.lock();
        let remaining: Vec<ProviderCredential> = load_credentials(kv.as_ref())
            .into_iter()
            .filter(|c| c.provider_id != provider_id)
            .collect();
        store_credentials(kv.as_mut(), &remaining)?;

        let was_active = active_id_locked(kv.as_ref()) == provider_id;
        if was_active && let Some(first) = remaining.first() {
            let next = first.provider_id.clone();
            set_active_locked(kv.as_mut(), &next)?;
        }
        Ok(())
    }

    /// True when the provider either needs no key, or has a non-blank key
    /// stored. Unknown ids are never configured.
    pub fn is_configured(&self, provider_id: &str) -> bool {
        let Some(config) = self.registry.get(provider_id) else {
            return false;
        };
        if !config.requires_api_key {
            return true;
        }
        self.credential(provider_id)
            .is_some_and(|c| !c.api_key.trim().is_empty())
    }

    /// The current active provider id (default when never set).
    pub fn active_provider_id(&self) -> String {
        let kv = self.lock();
        active_id_locked(kv.as_ref())
    }

    /// Resolve the active provider to a guaranteed-usable config plus its
    /// credential. An unknown pointer falls back to the default provider.
    pub fn active_provider_or_default(&self) -> (ProviderConfig, Option<ProviderCredential>) {
        let active_id = self.active_provider_id();
        let config = self
            .registry
            .get(&active_id)
            .or_else(|| self.registry.get(DEFAULT_PROVIDER_ID))
            .expect("default provider must exist in catalog")
            .clone();
        let credential = self.credential(&active_id);
        (config, credential)
    }
}

fn active_id_locked(kv: &dyn KeyValueStore) -> String {
    kv.get(KEY_ACTIVE_PROVIDER)
        .unwrap_or_else(|| DEFAULT_PROVIDER_ID.to_string())
}

fn load_credentials(kv: &dyn KeyValueStore) -> Vec<ProviderCredential> {
    let raw = kv
        .get(KEY_PROVIDER_CONFIGS)
        .unwrap_or_else(|| "[]".to_string());
    let entries: Vec<serde_json::Value> = serde_json::from_str(&raw).unwrap_or_default();
    // Malformed entries are skipped rather than poisoning the whole set.
    entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value(entry).ok())
        .collect()
}

fn store_credentials(kv: &mut dyn KeyValueStore, credentials: &[ProviderCredential]) -> Result<()> {
    let raw = serde_json::to_string(credentials)?;
    kv.set(KEY_PROVIDER_CONFIGS, &raw)
}

fn save_credential_locked(kv: &mut dyn KeyValueStore, credential: ProviderCredential) -> Result<()> {
    let mut credentials: Vec<ProviderCredential> = load_credentials(kv)
        .into_iter()
        .filter(|c| c.provider_id != credential.provider_id)
        .collect();

    if credential.is_active {
        for existing in &mut credentials {
            existing.is_active = false;
        }
        kv.set(KEY_ACTIVE_PROVIDER, &credential.provider_id)?;
    }

    credentials.push(credential);
    store_credentials(kv, &credentials)
}

fn set_active_locked(kv: &mut dyn KeyValueStore, provider_id: &str) -> Result<()> {
    kv.set(KEY_ACTIVE_PROVIDER, provider_id)?;
    let mut credentials = load_credentials(kv);
    for credential in &mut credentials {
        credential.is_active = credential.provider_id == provider_id;
    }
    store_credentials(kv, &credentials)
}

/// Display names used by the legacy single-provider storage format.
fn legacy_provider_id(legacy_name: &str) -> &'static str {
    match legacy_name {
        "Google Gemini (free)" => "gemini",
        "Cohere (free)" | "Cohere (preset)" => "cohere",
        "Hugging Face (community)" | "HuggingFace (preset)" => "huggingface",
        "OpenRouter (free/credits)" => "openrouter",
        "On-Device (local)" => "ollama",
        "OpenAI (preset)" => "openai",
        "Perplexity" => "perplexity",
        "Custom" => "custom",
        _ => DEFAULT_PROVIDER_ID,
    }
}

/// One-time migration from the legacy single-slot keys.
///
/// Goes through the normal save path so the active-exclusivity invariant
/// applies to the migrated credential too. Idempotent: guarded by a
/// persisted completion flag.
fn migrate_locked(kv: &mut dyn KeyValueStore) -> Result<()> {
    if kv.get(KEY_MIGRATION_DONE).as_deref() == Some("true") {
        return Ok(());
    }

    let legacy_provider = kv.get(LEGACY_PROVIDER);
    let legacy_api_key = kv.get(LEGACY_API_KEY);
    let legacy_endpoint = kv.get(LEGACY_ENDPOINT);

    if let (Some(name), Some(api_key)) = (legacy_provider, legacy_api_key) {
        let provider_id = legacy_provider_id(&name);
        info!(from = %name, to = provider_id, "migrating legacy provider credential");

        save_credential_locked(
            kv,
            ProviderCredential {
                provider_id: provider_id.to_string(),
                api_key,
                custom_endpoint: legacy_endpoint.unwrap_or_default(),
                is_active: true,
                custom_model: String::new(),
            },
        )?;

        kv.remove(LEGACY_PROVIDER)?;
        kv.remove(LEGACY_API_KEY)?;
        kv.remove(LEGACY_ENDPOINT)?;
    }

    kv.set(KEY_MIGRATION_DONE, "true")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_empty() -> CredentialStore {
        CredentialStore::open(Box::new(MemoryStore::new())).unwrap()
    }

    fn credential(id: &str, key: &str, active: bool) -> ProviderCredential {
        ProviderCredential {
            provider_id: id.to_string(),
            api_key: key.to_string(),
            is_active: active,
            ..Default::default()
        }
    }

    #[test]
    fn save_active_clears_all_other_flags() {
        let store = open_empty();
        store.save_credential(credential("openai", "sk-1", true)).unwrap();
        store.save_credential(credential("cohere", "co-1", true)).unwrap();
        store.save_credential(credential("ollama", "", true)).unwrap();

        let active: Vec<_> = store
            .all_credentials()
            .into_iter()
            .filter(|c| c.is_active)
            .collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].provider_id, "ollama");
        assert_eq!(store.active_provider_id(), "ollama");
    }

    #[test]
    fn save_is_an_upsert_by_provider_id() {
        let store = open_empty();
        store.save_credential(credential("openai", "old", false)).unwrap();
        store.save_credential(credential("openai", "new", false)).unwrap();

        let all = store.all_credentials();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].api_key, "new");
    }

    #[test]
    fn set_active_provider_flags_exactly_one() {
        let store = open_empty();
        store.save_credential(credential("openai", "sk-1", false)).unwrap();
        store.save_credential(credential("cohere", "co-1", false)).unwrap();

        store.set_active_provider("cohere").unwrap();

        assert_eq!(store.active_provider_id(), "cohere");
        assert!(store.credential("cohere").unwrap().is_active);
        assert!(!store.credential("openai").unwrap().is_active);
    }

    #[test]
    fn remove_active_moves_activity_to_first_remaining() {
        let store = open_empty();
        store.save_credential(credential("openai", "sk-1", false)).unwrap();
        store.save_credential(credential("cohere", "co-1", true)).unwrap();

        store.remove_credential("cohere").unwrap();

        assert!(store.credential("cohere").is_none());
        assert_eq!(store.active_provider_id(), "openai");
        assert!(store.credential("openai").unwrap().is_active);
    }

    #[test]
    fn remove_last_credential_keeps_default_fallback_usable() {
        let store = open_empty();
        store.save_credential(credential("openai", "sk-1", true)).unwrap();
        store.remove_credential("openai").unwrap();

        assert!(store.all_credentials().is_empty());
        let (config, credential) = store.active_provider_or_default();
        // Pointer still says "openai" but resolution stays in the catalog.
        assert!(config.id == "openai" || config.id == DEFAULT_PROVIDER_ID);
        assert!(credential.is_none());
    }

    #[test]
    fn is_configured_semantics() {
        let store = open_empty();
        assert!(store.is_configured("ollama"), "keyless provider");
        assert!(!store.is_configured("openai"), "key required, none stored");
        assert!(!store.is_configured("nonexistent"));

        store.save_credential(credential("openai", "  ", false)).unwrap();
        assert!(!store.is_configured("openai"), "blank key does not count");

        store.save_credential(credential("openai", "sk-1", false)).unwrap();
        assert!(store.is_configured("openai"));
    }

    #[test]
    fn default_active_provider_is_gemini() {
        let store = open_empty();
        assert_eq!(store.active_provider_id(), DEFAULT_PROVIDER_ID);
        let (config, credential) = store.active_provider_or_default();
        assert_eq!(config.id, DEFAULT_PROVIDER_ID);
        assert!(credential.is_none());
    }

    #[test]
    fn migration_converts_legacy_keys() {
        let mut kv = MemoryStore::new();
        kv.set(LEGACY_PROVIDER, "Cohere (free)").unwrap();
        kv.set(LEGACY_API_KEY, "legacy-key").unwrap();
        kv.set(LEGACY_ENDPOINT, "https://example.test/generate").unwrap();

        let store = CredentialStore::open(Box::new(kv)).unwrap();

        let migrated = store.credential("cohere").expect("migrated credential");
        assert_eq!(migrated.api_key, "legacy-key");
        assert_eq!(migrated.custom_endpoint, "https://example.test/generate");
        assert!(migrated.is_active);
        assert_eq!(store.active_provider_id(), "cohere");
    }

    #[test]
    fn migration_erases_legacy_keys_and_is_idempotent() {
        let mut kv = MemoryStore::new();
        kv.set(LEGACY_PROVIDER, "OpenAI (preset)").unwrap();
        kv.set(LEGACY_API_KEY, "legacy-key").unwrap();

        // Run migration twice through the kv-level entry point.
        migrate_locked(&mut kv).unwrap();
        let snapshot_first = kv.get(KEY_PROVIDER_CONFIGS);
        migrate_locked(&mut kv).unwrap();

        assert_eq!(kv.get(KEY_PROVIDER_CONFIGS), snapshot_first);
        assert_eq!(kv.get(LEGACY_PROVIDER), None);
        assert_eq!(kv.get(LEGACY_API_KEY), None);
        assert_eq!(kv.get(LEGACY_ENDPOINT), None);
        assert_eq!(kv.get(KEY_MIGRATION_DONE), Some("true".to_string()));
    }

    #[test]
    fn migration_without_legacy_data_only_sets_flag() {
        let store = open_empty();
        assert!(store.all_credentials().is_empty());
        // Flag is recorded so the block never runs again.
        let kv = store.lock();
        assert_eq!(kv.get(KEY_MIGRATION_DONE), Some("true".to_string()));
    }

    #[test]
    fn unrecognized_legacy_name_maps_to_default() {
        let mut kv = MemoryStore::new();
        kv.set(LEGACY_PROVIDER, "Some Forgotten Provider").unwrap();
        kv.set(LEGACY_API_KEY, "k").unwrap();

        let store = CredentialStore::open(Box::new(kv)).unwrap();
        assert!(store.credential(DEFAULT_PROVIDER_ID).is_some());
    }

    #[test]
    fn malformed_stored_entries_are_skipped() {
        let mut kv = MemoryStore::new();
        kv.set(
            KEY_PROVIDER_CONFIGS,
            r#"[{"providerId": "openai", "apiKey": "sk"}, {"apiKey": "no-id"}, 42]"#,
        )
        .unwrap();

        let store = CredentialStore::open(Box::new(kv)).unwrap();
        let all = store.all_credentials();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].provider_id, "openai");
    }
}
