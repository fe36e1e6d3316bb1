//! Configuration System
//!
//! Provides hierarchical configuration loading from:
//! - sqlrt.toml (default configuration)
//! - sqlrt.local.toml (git-ignored local overrides)
//! - Environment variables (SQLRT_* prefix)
//!
//! ## Example
//!
//! ```toml
//! # sqlrt.toml
//! [runtime]
//! default_timeout_ms = 5000
//! slow_query_ms = 250
//!
//! [harness]
//! storage = "file"
//! data_dir = "./target/test-dbs"
//! ```
//!
//! Environment variable overrides:
//! ```bash
//! SQLRT_RUNTIME__DEFAULT_TIMEOUT_MS=100
//! SQLRT_HARNESS__STORAGE=memory
//! ```

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub harness: HarnessConfig,
}

/// Statement execution settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Timeout applied to every invocation built by an `Executor` (0 = none)
    #[serde(default)]
    pub default_timeout_ms: u64,

    /// Invocations running at least this long are logged (0 = disabled)
    #[serde(default = "default_slow_query_ms")]
    pub slow_query_ms: u64,
}

impl RuntimeConfig {
    pub fn default_timeout(&self) -> Option<Duration> {
        (self.default_timeout_ms > 0).then(|| Duration::from_millis(self.default_timeout_ms))
    }

    pub fn slow_query_threshold(&self) -> Option<Duration> {
        (self.slow_query_ms > 0).then(|| Duration::from_millis(self.slow_query_ms))
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Write logs to this file instead of stderr
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// Where the test harness keeps its databases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    /// Private in-memory database per harness instance
    Memory,
    /// Uniquely named file under `data_dir`, removed on drop
    File,
}

/// Ephemeral test database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    #[serde(default = "default_storage_mode")]
    pub storage: StorageMode,

    /// Directory for file-backed databases
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Enforce foreign key constraints
    #[serde(default = "default_true")]
    pub foreign_keys: bool,
}

fn default_slow_query_ms() -> u64 {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_storage_mode() -> StorageMode {
    StorageMode::Memory
}

fn default_data_dir() -> PathBuf {
    std::env::temp_dir().join("sqlrt")
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Merges in order:
    /// 1. sqlrt.toml (base configuration)
    /// 2. sqlrt.local.toml (local overrides, git-ignored)
    /// 3. Environment variables (SQLRT_* prefix)
    pub fn load() -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file("sqlrt.toml"))
            .merge(Toml::file("sqlrt.local.toml"))
            .merge(Env::prefixed("SQLRT_").split("__"))
            .extract()
    }

    /// Load configuration from specific file path
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("SQLRT_").split("__"))
            .extract()
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            default_timeout_ms: 0,
            slow_query_ms: default_slow_query_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        HarnessConfig {
            storage: default_storage_mode(),
            data_dir: default_data_dir(),
            foreign_keys: true,
        }
    }
}
