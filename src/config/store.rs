//! Per-site config persistence over a key/value blob store
//!
//! Loading never fails: missing, unparsable or wrongly-typed data yields
//! the default config, and the legacy style name is migrated on the way in.

use serde_json::Value;
use std::collections::HashMap;

use super::{SiteConfig, DEFAULT_STORAGE_PREFIX};
use crate::error::StoreError;
use crate::highlight::style::StyleMode;

/// String blobs by key, in the shape of `window.localStorage`
pub trait ConfigStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;
}

/// In-process store
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ConfigStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// `window.localStorage`
#[cfg(target_arch = "wasm32")]
pub struct LocalStore {
    storage: web_sys::Storage,
}

#[cfg(target_arch = "wasm32")]
impl LocalStore {
    pub fn open() -> Result<Self, StoreError> {
        let storage = web_sys::window()
            .ok_or(StoreError::Unavailable)?
            .local_storage()
            .map_err(|e| StoreError::Backend(format!("{:?}", e)))?
            .ok_or(StoreError::Unavailable)?;
        Ok(Self { storage })
    }
}

#[cfg(target_arch = "wasm32")]
impl ConfigStore for LocalStore {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.get_item(key).ok().flatten()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.storage
            .set_item(key, &value)
            .map_err(|e| StoreError::Backend(format!("{:?}", e)))
    }
}

// =============================================================================
// SiteStore
// =============================================================================

/// Site configs under `prefix + site`
pub struct SiteStore<S> {
    store: S,
    prefix: String,
}

impl<S: ConfigStore> SiteStore<S> {
    pub fn new(store: S) -> Self {
        Self::with_prefix(store, DEFAULT_STORAGE_PREFIX)
    }

    pub fn with_prefix(store: S, prefix: &str) -> Self {
        Self {
            store,
            prefix: prefix.to_string(),
        }
    }

    pub fn key(&self, site: &str) -> String {
        format!("{}{}", self.prefix, site)
    }

    pub fn load(&self, site: &str) -> SiteConfig {
        match self.store.get(&self.key(site)) {
            Some(raw) => parse_site_config(&raw),
            None => SiteConfig::default(),
        }
    }

    pub fn save(&mut self, site: &str, config: &SiteConfig) -> Result<(), StoreError> {
        let json = serde_json::to_string(config)?;
        let key = self.key(site);
        self.store.set(&key, json)
    }

    pub fn inner(&self) -> &S {
        &self.store
    }

    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.store
    }
}

/// Lenient decode of a stored config blob.
pub fn parse_site_config(raw: &str) -> SiteConfig {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "Stored site config is not valid JSON, using defaults");
            return SiteConfig::default();
        }
    };

    let style = match value.get("style") {
        Some(Value::String(name)) => StyleMode::from_name(name).unwrap_or_else(|| {
            tracing::debug!(style = %name, "Unknown style, using default");
            StyleMode::default()
        }),
        _ => StyleMode::default(),
    };

    SiteConfig {
        highlight: string_list(value.get("highlight")),
        exclude: string_list(value.get("exclude")),
        style,
    }
}

/// Trimmed, non-empty string entries; anything else is dropped
fn string_list(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
