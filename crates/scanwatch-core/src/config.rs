//! Configuration loading and typed config structures for scanwatch.
//!
//! Configuration lives in a YAML file (`scanwatch-config.yaml` by
//! convention). Every field has a default, so an empty file or no file at all
//! yields a working setup backed by the in-memory store.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::expiry::{DEFAULT_FALLBACK_LIFETIME_SECS, DEFAULT_MAX_HIDDEN_MS};

/// Environment variable naming the YAML config file.
pub const CONFIG_PATH_ENV: &str = "SCANWATCH_CONFIG";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// An environment override holds an unusable value.
    #[error("invalid value for {name}: {value}")]
    InvalidEnv {
        /// The environment variable.
        name: &'static str,
        /// The rejected value.
        value: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ScanwatchConfig {
    /// Store backend selection.
    #[serde(default)]
    pub store: StoreConfig,

    /// Species range and name table.
    #[serde(default)]
    pub species: SpeciesConfig,

    /// Creature lifetime thresholds.
    #[serde(default)]
    pub expiry: ExpiryConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ScanwatchConfig {
    /// Load from the file named by `SCANWATCH_CONFIG`, or defaults when the
    /// variable is unset. Environment overrides are applied either way.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed, or an
    /// override is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(Path::new(&path)),
            Err(_) => {
                let mut config = Self::default();
                config.apply_env_overrides()?;
                Ok(config)
            }
        }
    }

    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `SCANWATCH_STORE` overrides `store.backend` (`dragonfly` or `memory`)
    /// - `DRAGONFLY_URL` overrides `store.dragonfly_url`
    /// - `SPECIES_NAMES_PATH` overrides `species.names_path`
    /// - `LOG_LEVEL` overrides `logging.level`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string. No environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Apply environment variable overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] if `SCANWATCH_STORE` names an
    /// unknown backend.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("SCANWATCH_STORE") {
            self.store.backend = StoreBackend::parse(&val).ok_or(ConfigError::InvalidEnv {
                name: "SCANWATCH_STORE",
                value: val,
            })?;
        }
        if let Ok(val) = std::env::var("DRAGONFLY_URL") {
            self.store.dragonfly_url = val;
        }
        if let Ok(val) = std::env::var("SPECIES_NAMES_PATH") {
            self.species.names_path = Some(PathBuf::from(val));
        }
        if let Ok(val) = std::env::var("LOG_LEVEL") {
            self.logging.level = val;
        }
        Ok(())
    }
}

/// Which store backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// `Dragonfly`/Redis at `store.dragonfly_url`.
    Dragonfly,
    /// In-process store; contents are lost on exit.
    #[default]
    Memory,
}

impl StoreBackend {
    /// Parse a backend name, case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "dragonfly" | "redis" => Some(Self::Dragonfly),
            "memory" => Some(Self::Memory),
            _ => None,
        }
    }
}

/// Store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoreConfig {
    /// Backend selection.
    #[serde(default)]
    pub backend: StoreBackend,

    /// Dragonfly (Redis-compatible) URL.
    #[serde(default = "default_dragonfly_url")]
    pub dragonfly_url: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            dragonfly_url: default_dragonfly_url(),
        }
    }
}

/// Species configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SpeciesConfig {
    /// Size of the known species range `1..=count`.
    #[serde(default = "default_species_count")]
    pub count: u32,

    /// JSON file mapping species ids to names.
    #[serde(default)]
    pub names_path: Option<PathBuf>,
}

impl Default for SpeciesConfig {
    fn default() -> Self {
        Self {
            count: default_species_count(),
            names_path: None,
        }
    }
}

/// Creature lifetime thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExpiryConfig {
    /// Reported lifetimes above this many milliseconds are implausible.
    #[serde(default = "default_max_hidden_ms")]
    pub max_hidden_ms: i64,

    /// Lifetime assumed for implausible reports, in seconds.
    #[serde(default = "default_fallback_lifetime_secs")]
    pub fallback_lifetime_secs: u64,
}

impl Default for ExpiryConfig {
    fn default() -> Self {
        Self {
            max_hidden_ms: default_max_hidden_ms(),
            fallback_lifetime_secs: default_fallback_lifetime_secs(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error), used when `RUST_LOG`
    /// is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

fn default_dragonfly_url() -> String {
    "redis://localhost:6379".to_owned()
}

const fn default_species_count() -> u32 {
    151
}

const fn default_max_hidden_ms() -> i64 {
    DEFAULT_MAX_HIDDEN_MS
}

const fn default_fallback_lifetime_secs() -> u64 {
    DEFAULT_FALLBACK_LIFETIME_SECS
}

fn default_log_level() -> String {
    "info".to_owned()
}
