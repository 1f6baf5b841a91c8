//! Configuration loading.
//!
//! Layers, later ones winning:
//! 1. Built-in defaults (cache-only, 3000 ms store timeout, `info` logging)
//! 2. TOML file: `--config`, else `$QUIZBOT_CONFIG`, else `~/.config/quizbot/config.toml`
//! 3. Environment: `QUIZBOT_DB_URL`, `QUIZBOT_STORE_TIMEOUT_MS`
//! 4. Command-line flags

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_ENV: &str = "QUIZBOT_CONFIG";
pub const DB_URL_ENV: &str = "QUIZBOT_DB_URL";
pub const STORE_TIMEOUT_ENV: &str = "QUIZBOT_STORE_TIMEOUT_MS";

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid value for {var}: {raw:?}")]
    InvalidEnv { var: &'static str, raw: String },
    #[error("store timeout must be greater than zero")]
    ZeroTimeout,
    #[error("invalid database url: {raw:?}")]
    InvalidDbUrl { raw: String },
}

/// Top-level file configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub log: LogConfig,
}

/// Progress store settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite URL or path. Unset means progress lives in memory only.
    pub url: Option<String>,
    pub timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directives, used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_ms: 3000,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".into(),
        }
    }
}

/// Values given on the command line.
#[derive(Debug, Default)]
pub struct Overrides {
    pub db: Option<String>,
    pub cache_only: bool,
    pub store_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreTarget {
    CacheOnly,
    Sqlite(String),
}

/// Fully resolved runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub store: StoreTarget,
    pub store_timeout: Duration,
    pub log_filter: String,
}

impl Settings {
    /// Store timeout in whole milliseconds, saturating at `u64::MAX`.
    #[must_use]
    pub fn store_timeout_ms(&self) -> u64 {
        u64::try_from(self.store_timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

impl Config {
    /// Read the config file, if one is found. An explicitly named file must exist.
    pub fn load(
        explicit: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => match config_path(&env) {
                Some(p) if p.exists() => p,
                _ => return Ok(Self::default()),
            },
        };

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse { path, source })
    }

    /// Apply `QUIZBOT_*` environment overrides.
    pub fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(url) = env(DB_URL_ENV) {
            self.store.url = Some(url);
        }
        if let Some(raw) = env(STORE_TIMEOUT_ENV) {
            self.store.timeout_ms = raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                var: STORE_TIMEOUT_ENV,
                raw,
            })?;
        }
        Ok(())
    }

    /// Apply command-line overrides and validate.
    pub fn resolve(self, overrides: &Overrides) -> Result<Settings, ConfigError> {
        let timeout_ms = overrides.store_timeout_ms.unwrap_or(self.store.timeout_ms);
        if timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        let url = overrides.db.clone().or(self.store.url);
        let store = match url {
            _ if overrides.cache_only => StoreTarget::CacheOnly,
            Some(raw) => StoreTarget::Sqlite(normalize_sqlite_url(&raw)?),
            None => StoreTarget::CacheOnly,
        };

        Ok(Settings {
            store,
            store_timeout: Duration::from_millis(timeout_ms),
            log_filter: self.log.filter,
        })
    }
}

/// Run every layer against the given environment.
pub fn load_settings(
    explicit: Option<&Path>,
    overrides: &Overrides,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Settings, ConfigError> {
    let mut config = Config::load(explicit, &env)?;
    config.apply_env(&env)?;
    config.resolve(overrides)
}

fn config_path(env: impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
    if let Some(p) = env(CONFIG_ENV) {
        return Some(PathBuf::from(p));
    }
    env("HOME").map(|home| {
        PathBuf::from(home)
            .join(".config")
            .join("quizbot")
            .join("config.toml")
    })
}

/// Turn a path or partial URL into an absolute `sqlite://` URL.
///
/// In-memory URLs and URLs that already carry `sqlite://` pass through.
pub fn normalize_sqlite_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    let invalid = || ConfigError::InvalidDbUrl {
        raw: raw.to_string(),
    };
    if trimmed.is_empty() {
        return Err(invalid());
    }
    if trimmed.starts_with("sqlite::memory:")
        || trimmed.starts_with("sqlite://")
        || (trimmed.starts_with("sqlite:") && trimmed.contains("mode=memory"))
    {
        return Ok(trimmed.to_string());
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    if path_str.is_empty() || path_str.contains("://") {
        return Err(invalid());
    }

    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    Ok(format!("sqlite://{}", absolute.display()))
}
