use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Top-level runtime configuration. Every component receives the slice it needs
/// at construction time; nothing reads these values from ambient globals.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub aggregation: SourceCaps,
    pub cache: CacheConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: "0.0.0.0".to_string(), port: 3000 }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

/// Provider base URLs, outbound timeout and how client-side calls reach them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UpstreamConfig {
    pub freetogame: String,
    pub gamerpower: String,
    pub github: String,
    pub fdroid_repo: String,
    pub fdroid_site: String,
    pub fdroid_category: String,
    pub timeout_ms: u64,
    pub client_access: AccessMode,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            freetogame: "https://www.freetogame.com/api".to_string(),
            gamerpower: "https://www.gamerpower.com/api".to_string(),
            github: "https://api.github.com".to_string(),
            fdroid_repo: "https://f-droid.org/repo".to_string(),
            fdroid_site: "https://f-droid.org".to_string(),
            fdroid_category: "Games".to_string(),
            timeout_ms: 10_000,
            client_access: AccessMode::Direct,
        }
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Whether client-originated calls go straight to the provider or through a `/proxy` relay.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AccessMode {
    #[default]
    Direct,
    ViaProxy { proxy_url: String },
}

/// Per-source caps applied before merging. `None` leaves a source unbounded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SourceCaps {
    pub freetogame: Option<usize>,
    pub fdroid: Option<usize>,
    pub github: Option<usize>,
}

impl Default for SourceCaps {
    fn default() -> Self {
        Self { freetogame: Some(20), fdroid: Some(20), github: Some(10) }
    }
}

/// Shared-cache directive emitted as `Cache-Control`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CachePolicy {
    pub s_maxage: u64,
    pub stale_while_revalidate: u64,
}

impl CachePolicy {
    pub const fn new(s_maxage: u64, stale_while_revalidate: u64) -> Self {
        Self { s_maxage, stale_while_revalidate }
    }

    pub fn header_value(&self) -> String {
        format!("s-maxage={}, stale-while-revalidate={}", self.s_maxage, self.stale_while_revalidate)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CacheConfig {
    pub proxy: CachePolicy,
    pub games: CachePolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            proxy: CachePolicy::new(60, 300),
            games: CachePolicy::new(3600, 86_400),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SearchConfig {
    pub debounce_ms: u64,
    pub min_query_len: usize,
    pub catalog_limit: usize,
    pub repository_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { debounce_ms: 300, min_query_len: 2, catalog_limit: 5, repository_limit: 5 }
    }
}

impl SearchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Config {
    /// Load configuration: explicit file (must exist), else the per-user config file if
    /// present, else defaults. `FREEPLAY_*` environment variables are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => match default_config_path() {
                Some(p) if p.exists() => Self::from_file(&p)?,
                _ => {
                    debug!("No config file found, using defaults");
                    Self::default()
                }
            },
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config = toml::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Apply overrides from a key lookup (the process environment in production).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup("FREEPLAY_BIND") {
            self.server.bind = bind;
        }
        if let Some(port) = parse_var(&lookup, "FREEPLAY_PORT") {
            self.server.port = port;
        }
        if let Some(timeout) = parse_var(&lookup, "FREEPLAY_TIMEOUT_MS") {
            self.upstream.timeout_ms = timeout;
        }
        if let Some(proxy_url) = lookup("FREEPLAY_PROXY_URL").filter(|s| !s.trim().is_empty()) {
            self.upstream.client_access = AccessMode::ViaProxy { proxy_url };
        }
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("Invalid {key} value {raw:?}: {e}, keeping configured value");
            None
        }
    }
}

/// `config.toml` inside the platform config directory.
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "freeplay").map(|dirs| dirs.config_dir().join("config.toml"))
}
