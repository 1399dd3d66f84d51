use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cache::CacheStore;
use crate::sync::feed::FeedClient;
use crate::sync::{keyring, SyncError};

/// Connection settings for the shared list backend. Absence means the list
/// runs cache-only for the whole session.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct BackendConfig {
    pub base_url: String,
    pub list: String,
    pub username: String,
    /// Optional in the file; normally resolved from the system keyring.
    #[serde(default)]
    pub password: Option<String>,
}

impl BackendConfig {
    /// Build the list-service client for these settings.
    pub fn client(&self) -> Result<FeedClient, SyncError> {
        FeedClient::new(
            &self.base_url,
            &self.list,
            &self.username,
            self.password.as_deref().unwrap_or_default(),
        )
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct SearchConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub location: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://serpapi.com/search.json".into(),
            api_key: None,
            location: "Araguaina, State of Tocantins, Brazil".into(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct Config {
    pub backend: Option<BackendConfig>,
    pub cache_path: PathBuf,
    pub search: SearchConfig,
    pub debug_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: None,
            cache_path: CacheStore::default_path(),
            search: SearchConfig::default(),
            debug_logging: false,
        }
    }
}

impl Config {
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("cesto")
            .join("config.json")
    }

    /// Load the config file, falling back to defaults when it is missing
    /// or unreadable.
    pub fn load() -> Self {
        Self::load_from(&Self::path())
    }

    pub fn load_from(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&raw) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Ignoring invalid config at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// The cache store at the configured path.
    pub fn cache_store(&self) -> CacheStore {
        CacheStore::new(self.cache_path.clone())
    }

    /// The search API key: environment first, then the config file (or
    /// whatever `resolve_secrets` pulled from the keyring).
    pub fn search_api_key(&self) -> Option<String> {
        std::env::var("SERPAPI_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .or_else(|| self.search.api_key.clone())
    }

    /// Fill secret fields from the system keyring where the file left them
    /// empty. Keyring failures are logged and ignored — a missing secret
    /// just means the corresponding feature stays off.
    pub async fn resolve_secrets(&mut self) {
        if let Some(backend) = &mut self.backend {
            if backend.password.is_none() {
                match keyring::load_secret(keyring::BACKEND_PASSWORD).await {
                    Ok(found) => backend.password = found,
                    Err(e) => log::warn!("Keyring unavailable: {}", e),
                }
            }
        }
        if self.search.api_key.is_none() {
            match keyring::load_secret(keyring::SEARCH_API_KEY).await {
                Ok(found) => self.search.api_key = found,
                Err(e) => log::debug!("Keyring unavailable for search key: {}", e),
            }
        }
    }
}
