//! Configuration: engine settings and per-site word lists
//!
//! `EngineConfig` is fixed for the life of an engine. `SiteConfig` is what
//! the panel edits; it is reloaded from the store on every apply cycle.

pub mod store;

pub use store::*;

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::Error;
use crate::highlight::scan::ScanRules;
use crate::highlight::style::StyleMode;

/// Namespace prepended to the site identity to form the storage key
pub const DEFAULT_STORAGE_PREFIX: &str = "pkh:keyword-highlighter:";

/// Highlight and exclude lists plus the style selection for one site
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default)]
    pub highlight: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub style: StyleMode,
}

impl SiteConfig {
    pub fn is_empty(&self) -> bool {
        self.highlight.is_empty() && self.exclude.is_empty()
    }

    /// Same style, no words
    pub fn cleared(&self) -> Self {
        Self {
            highlight: Vec::new(),
            exclude: Vec::new(),
            style: self.style,
        }
    }
}

/// Engine settings
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Quiet period before a requested re-apply runs
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_storage_prefix")]
    pub storage_prefix: String,
    #[serde(default)]
    pub scan: ScanRules,
}

fn default_debounce_ms() -> u64 {
    250
}

fn default_storage_prefix() -> String {
    DEFAULT_STORAGE_PREFIX.to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            storage_prefix: default_storage_prefix(),
            scan: ScanRules::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json).map_err(Error::Config)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.debounce(), Duration::from_millis(250));
        assert_eq!(config.storage_prefix, DEFAULT_STORAGE_PREFIX);
    }

    #[test]
    fn test_engine_config_partial_json() {
        let config = EngineConfig::from_json(r#"{"debounce_ms": 40}"#).unwrap();
        assert_eq!(config.debounce_ms, 40);
        assert_eq!(config.scan, ScanRules::default());
        assert!(EngineConfig::from_json("{").is_err());
    }

    #[test]
    fn test_cleared_keeps_style() {
        let config = SiteConfig {
            highlight: vec!["a".into()],
            exclude: vec!["b".into()],
            style: StyleMode::Candy,
        };
        let cleared = config.cleared();
        assert!(cleared.is_empty());
        assert_eq!(cleared.style, StyleMode::Candy);
    }
}
