//! Client configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::gateway::DEFAULT_GATEWAY_URL;
use crate::mealdb::DEFAULT_MEALDB_URL;
use crate::vegan::ClassificationFallback;

/// Default search deadline, covering the fallback request too.
pub const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 10;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue { var: String, value: String },
}

/// Settings for an [`crate::App`] session.
#[derive(Debug, Clone)]
pub struct FridgeConfig {
    pub mealdb_url: String,
    /// Base URL of the inference gateway, including any path prefix.
    pub gateway_url: String,
    pub search_timeout: Duration,
    /// Directory holding persisted shopping lists.
    pub storage_dir: PathBuf,
    pub vegan_fallback: ClassificationFallback,
    pub user_agent: Option<String>,
}

impl Default for FridgeConfig {
    fn default() -> Self {
        Self {
            mealdb_url: DEFAULT_MEALDB_URL.to_string(),
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            search_timeout: Duration::from_secs(DEFAULT_SEARCH_TIMEOUT_SECS),
            storage_dir: Self::default_storage_dir(),
            vegan_fallback: ClassificationFallback::default(),
            user_agent: None,
        }
    }
}

impl FridgeConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional:
    /// - `FRIDGE_MEALDB_URL`: recipe database base URL
    /// - `FRIDGE_GATEWAY_URL`: inference gateway base URL (default: "http://localhost:3000/api")
    /// - `FRIDGE_SEARCH_TIMEOUT_SECS`: search deadline in seconds (default: 10)
    /// - `FRIDGE_STORAGE_DIR`: shopping list directory (default: "~/.fridge/storage")
    /// - `FRIDGE_VEGAN_FALLBACK`: "fail-closed" or "heuristic" (default: "fail-closed")
    /// - `FRIDGE_USER_AGENT`: user agent for outgoing requests
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Same as [`Self::from_env`] with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let search_timeout = match lookup("FRIDGE_SEARCH_TIMEOUT_SECS") {
            Some(value) => match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidValue {
                        var: "FRIDGE_SEARCH_TIMEOUT_SECS".to_string(),
                        value,
                    })
                }
            },
            None => defaults.search_timeout,
        };

        let vegan_fallback = match lookup("FRIDGE_VEGAN_FALLBACK") {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
                var: "FRIDGE_VEGAN_FALLBACK".to_string(),
                value,
            })?,
            None => defaults.vegan_fallback,
        };

        Ok(Self {
            mealdb_url: lookup("FRIDGE_MEALDB_URL").unwrap_or(defaults.mealdb_url),
            gateway_url: lookup("FRIDGE_GATEWAY_URL").unwrap_or(defaults.gateway_url),
            search_timeout,
            storage_dir: lookup("FRIDGE_STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_dir),
            vegan_fallback,
            user_agent: lookup("FRIDGE_USER_AGENT"),
        })
    }

    /// Get the default storage directory: ~/.fridge/storage
    pub fn default_storage_dir() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".fridge").join("storage"))
            .unwrap_or_else(|| PathBuf::from("data/storage"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = FridgeConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.search_timeout, Duration::from_secs(10));
        assert_eq!(config.vegan_fallback, ClassificationFallback::FailClosed);
        assert_eq!(config.mealdb_url, DEFAULT_MEALDB_URL);
    }

    #[test]
    fn test_overrides() {
        let config = FridgeConfig::from_lookup(lookup(&[
            ("FRIDGE_SEARCH_TIMEOUT_SECS", "3"),
            ("FRIDGE_VEGAN_FALLBACK", "heuristic"),
            ("FRIDGE_STORAGE_DIR", "/tmp/fridge"),
        ]))
        .unwrap();
        assert_eq!(config.search_timeout, Duration::from_secs(3));
        assert_eq!(config.vegan_fallback, ClassificationFallback::KeywordHeuristic);
        assert_eq!(config.storage_dir, PathBuf::from("/tmp/fridge"));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(FridgeConfig::from_lookup(lookup(&[("FRIDGE_SEARCH_TIMEOUT_SECS", "0")])).is_err());
        assert!(FridgeConfig::from_lookup(lookup(&[("FRIDGE_VEGAN_FALLBACK", "maybe")])).is_err());
    }
}
