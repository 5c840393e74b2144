//! Application-level configuration loading: persistence timeout, SSE sizing and
//! which game store backs the scoring sessions.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "LIVE_SCORING_CONFIG_PATH";
/// Environment variable that forces the league API store regardless of the file.
const LEAGUE_API_ENV: &str = "LEAGUE_API_BASE_URL";

const DEFAULT_PERSIST_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_SSE_CAPACITY: usize = 32;

/// Which [`GameStore`](crate::dao::game_store::GameStore) the server installs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreConfig {
    /// Process-local store, optionally seeded with scheduled games.
    Memory {
        /// Game ids to create as fresh scheduled rows at startup.
        #[serde(default)]
        games: Vec<Uuid>,
    },
    /// League application REST API.
    Http {
        /// Base URL, e.g. `https://league.example/api`.
        base_url: String,
        /// Optional bearer token.
        #[serde(default)]
        token: Option<String>,
    },
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::Memory { games: Vec::new() }
    }
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    persist_timeout: Option<Duration>,
    sse_capacity: usize,
    store: StoreConfig,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let config = match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(config) => {
                    info!(
                        path = %path.display(),
                        persist_timeout = ?config.persist_timeout,
                        "loaded configuration"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };

        config.with_env_overrides()
    }

    /// Parse a configuration document.
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }

    /// Upper bound on each load/persist call; `None` waits forever.
    pub fn persist_timeout(&self) -> Option<Duration> {
        self.persist_timeout
    }

    /// Capacity of each per-game SSE broadcast channel.
    pub fn sse_capacity(&self) -> usize {
        self.sse_capacity
    }

    /// Selected store backend.
    pub fn store(&self) -> &StoreConfig {
        &self.store
    }

    fn with_env_overrides(mut self) -> Self {
        if let Some(base_url) = env::var(LEAGUE_API_ENV)
            .ok()
            .filter(|value| !value.is_empty())
        {
            info!(%base_url, "league API base URL taken from environment");
            self.store = StoreConfig::Http {
                base_url,
                token: env::var("LEAGUE_API_TOKEN").ok(),
            };
        }
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            persist_timeout: Some(Duration::from_millis(DEFAULT_PERSIST_TIMEOUT_MS)),
            sse_capacity: DEFAULT_SSE_CAPACITY,
            store: StoreConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default = "default_persist_timeout_ms")]
    persist_timeout_ms: u64,
    #[serde(default = "default_sse_capacity")]
    sse_capacity: usize,
    #[serde(default)]
    store: StoreConfig,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            // 0 disables the timeout.
            persist_timeout: (value.persist_timeout_ms > 0)
                .then(|| Duration::from_millis(value.persist_timeout_ms)),
            sse_capacity: value.sse_capacity.max(1),
            store: value.store,
        }
    }
}

fn default_persist_timeout_ms() -> u64 {
    DEFAULT_PERSIST_TIMEOUT_MS
}

fn default_sse_capacity() -> usize {
    DEFAULT_SSE_CAPACITY
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = AppConfig::from_json("{}").unwrap();
        assert_eq!(config.persist_timeout(), Some(Duration::from_millis(5_000)));
        assert_eq!(config.sse_capacity(), 32);
        assert_eq!(config.store(), &StoreConfig::Memory { games: vec![] });
    }

    #[test]
    fn parses_http_store() {
        let config = AppConfig::from_json(
            r#"{
                "persist_timeout_ms": 0,
                "sse_capacity": 0,
                "store": { "kind": "http", "base_url": "http://league.local/api", "token": "s3cret" }
            }"#,
        )
        .unwrap();

        assert_eq!(config.persist_timeout(), None);
        assert_eq!(config.sse_capacity(), 1);
        assert_eq!(
            config.store(),
            &StoreConfig::Http {
                base_url: "http://league.local/api".into(),
                token: Some("s3cret".into()),
            }
        );
    }

    #[test]
    fn parses_seeded_memory_store() {
        let id = Uuid::new_v4();
        let config =
            AppConfig::from_json(&format!(r#"{{ "store": {{ "kind": "memory", "games": ["{id}"] }} }}"#))
                .unwrap();
        assert_eq!(config.store(), &StoreConfig::Memory { games: vec![id] });
    }

    #[test]
    fn rejects_unknown_store_kind() {
        assert!(AppConfig::from_json(r#"{ "store": { "kind": "mongo" } }"#).is_err());
    }
}
