//! Configuration for courtlive.
//!
//! TOML file at the platform config directory, merged over built-in
//! defaults and `COURTLIVE_` environment variables (nested keys use `__`,
//! e.g. `COURTLIVE_ENGINE__SYNC_INTERVAL_MS`). Resolves the feed API key
//! from env, keyring, or plaintext, and translates everything into the
//! types `courtlive-core` and `courtlive-api` consume.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use courtlive_api::{TlsMode, TransportConfig};
use courtlive_core::{BackoffPolicy, DisplayInstance, EngineConfig};

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "COURTLIVE_CONFIG";

const KEYRING_SERVICE: &str = "courtlive";
const KEYRING_FEED_USER: &str = "feed/api-key";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub engine: EngineSection,

    #[serde(default)]
    pub feed: FeedSection,

    #[serde(default)]
    pub storage: StorageSection,

    /// Display windows and the court each one shows.
    #[serde(default)]
    pub displays: Vec<DisplayEntry>,
}

/// CLI presentation defaults.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

/// How pollers react to repeated failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffMode {
    #[default]
    None,
    Exponential,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EngineSection {
    #[serde(default = "default_sync_interval_ms")]
    pub sync_interval_ms: u64,

    #[serde(default = "default_persist_debounce_ms")]
    pub persist_debounce_ms: u64,

    /// Court entries older than this are dropped on sync. `0` disables.
    #[serde(default = "default_court_max_age_secs")]
    pub court_max_age_secs: u64,

    /// Threshold used when reporting whether the cache is stale.
    #[serde(default = "default_stale_after_minutes")]
    pub stale_after_minutes: u32,

    #[serde(default)]
    pub backoff: BackoffMode,

    #[serde(default = "default_backoff_base_secs")]
    pub backoff_base_secs: u64,

    #[serde(default = "default_backoff_max_secs")]
    pub backoff_max_secs: u64,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            sync_interval_ms: default_sync_interval_ms(),
            persist_debounce_ms: default_persist_debounce_ms(),
            court_max_age_secs: default_court_max_age_secs(),
            stale_after_minutes: default_stale_after_minutes(),
            backoff: BackoffMode::None,
            backoff_base_secs: default_backoff_base_secs(),
            backoff_max_secs: default_backoff_max_secs(),
        }
    }
}

fn default_sync_interval_ms() -> u64 {
    2000
}
fn default_persist_debounce_ms() -> u64 {
    500
}
fn default_court_max_age_secs() -> u64 {
    300
}
fn default_stale_after_minutes() -> u32 {
    5
}
fn default_backoff_base_secs() -> u64 {
    1
}
fn default_backoff_max_secs() -> u64 {
    60
}

/// The multi-court live feed.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FeedSection {
    /// Feed base URL (e.g., "https://live.example.com/api").
    pub url: Option<String>,

    /// API key (plaintext; prefer keyring or env var).
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    pub api_key_env: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Window used when no display is scoped to a court.
    #[serde(default = "default_recent_window_minutes")]
    pub recent_window_minutes: u32,

    /// Path to a custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    #[serde(default)]
    pub insecure: bool,
}

impl Default for FeedSection {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            api_key_env: None,
            timeout_secs: default_timeout_secs(),
            recent_window_minutes: default_recent_window_minutes(),
            ca_cert: None,
            insecure: false,
        }
    }
}

fn default_timeout_secs() -> u64 {
    10
}
fn default_recent_window_minutes() -> u32 {
    5
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct StorageSection {
    /// Where connections and bindings are saved.
    /// Defaults to `state.json` in the platform data directory.
    pub state_file: Option<PathBuf>,
}

/// A display window entry.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DisplayEntry {
    pub id: String,
    pub court: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "courtlive", "courtlive")
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("courtlive");
    p
}

/// Resolve the config file path: `COURTLIVE_CONFIG`, else the platform
/// config directory.
pub fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }
    project_dirs().map_or_else(
        || dirs_fallback().join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Default location of the saved engine state.
pub fn default_state_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback().join("state.json"),
        |dirs| dirs.data_dir().join("state.json"),
    )
}

// ── Loading & saving ────────────────────────────────────────────────

/// Load the full config from the canonical path and the environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from `path` merged over defaults and `COURTLIVE_` vars.
/// A missing file is not an error.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("COURTLIVE_").split("__"));

    let config: Config = figment.extract()?;
    config.validate()?;
    Ok(config)
}

/// Load config, returning defaults when it cannot be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credentials ─────────────────────────────────────────────────────

/// Resolve the feed API key.
///
/// Order: the env var named by `api_key_env`, the system keyring, then
/// the plaintext `api_key`. `None` means the feed is used without a key.
pub fn resolve_feed_key(feed: &FeedSection) -> Option<SecretString> {
    // 1. Named env var
    if let Some(ref env_name) = feed.api_key_env {
        if let Ok(val) = std::env::var(env_name) {
            return Some(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, KEYRING_FEED_USER) {
        if let Ok(secret) = entry.get_password() {
            return Some(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    feed.api_key.clone().map(SecretString::from)
}

/// Store the feed API key in the system keyring.
pub fn store_feed_key(secret: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, KEYRING_FEED_USER)?;
    entry.set_password(secret)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

impl Config {
    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.sync_interval_ms == 0 {
            return Err(invalid("engine.sync_interval_ms", "must be greater than zero"));
        }
        if self.feed.timeout_secs == 0 {
            return Err(invalid("feed.timeout_secs", "must be greater than zero"));
        }
        if self.engine.backoff == BackoffMode::Exponential
            && self.engine.backoff_base_secs > self.engine.backoff_max_secs
        {
            return Err(invalid(
                "engine.backoff_base_secs",
                "must not exceed backoff_max_secs",
            ));
        }
        self.feed_url()?;
        Ok(())
    }

    pub fn engine_config(&self) -> EngineConfig {
        let engine = &self.engine;
        EngineConfig {
            sync_interval: Duration::from_millis(engine.sync_interval_ms),
            persist_debounce: Duration::from_millis(engine.persist_debounce_ms),
            court_max_age: (engine.court_max_age_secs > 0)
                .then(|| Duration::from_secs(engine.court_max_age_secs)),
            backoff: match engine.backoff {
                BackoffMode::None => BackoffPolicy::None,
                BackoffMode::Exponential => BackoffPolicy::Exponential {
                    base: Duration::from_secs(engine.backoff_base_secs),
                    max: Duration::from_secs(engine.backoff_max_secs),
                },
            },
        }
    }

    /// Parsed feed URL, if one is configured.
    pub fn feed_url(&self) -> Result<Option<url::Url>, ConfigError> {
        self.feed
            .url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .map(|u| {
                url::Url::parse(u).map_err(|e| invalid("feed.url", format!("'{u}': {e}")))
            })
            .transpose()
    }

    pub fn transport(&self) -> TransportConfig {
        let tls = if self.feed.insecure {
            TlsMode::DangerAcceptInvalid
        } else if let Some(ref ca) = self.feed.ca_cert {
            TlsMode::CustomCa(ca.clone())
        } else {
            TlsMode::System
        };
        TransportConfig {
            tls,
            timeout: Duration::from_secs(self.feed.timeout_secs),
        }
    }

    pub fn state_file(&self) -> PathBuf {
        self.storage
            .state_file
            .clone()
            .unwrap_or_else(default_state_path)
    }

    pub fn display_instances(&self) -> Vec<DisplayInstance> {
        self.displays
            .iter()
            .map(|d| DisplayInstance {
                id: d.id.clone(),
                is_active: d.active,
                court_filter: d.court.clone(),
            })
            .collect()
    }
}
