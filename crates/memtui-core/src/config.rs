//! Configuration module for memtui
//!
//! This module handles loading and parsing configuration from TOML files,
//! with sensible defaults for all optional values.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{MemtuiError, Result};

/// Default memcached address
pub const DEFAULT_ADDR: &str = "127.0.0.1:11211";

/// Default decompression cap (16 MiB)
pub const DEFAULT_MAX_DECOMPRESSED_BYTES: usize = 16 * 1024 * 1024;

/// Main configuration structure for memtui
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server connection configuration
    pub server: ServerConfig,

    /// Interface configuration
    pub ui: UiConfig,

    /// Value formatting configuration
    pub format: FormatConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            MemtuiError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        Self::parse_str(&contents)
    }

    /// Parse configuration from a TOML string
    pub fn parse_str(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| MemtuiError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Resolve and load the effective configuration.
    ///
    /// An explicit path must exist and parse. Without one, the per-user
    /// file is used when present and defaults otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// `<config_dir>/memtui/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("memtui").join("config.toml"))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.addr.trim().is_empty() {
            return Err(MemtuiError::Config(
                "server.addr cannot be empty".to_string(),
            ));
        }
        if self.server.connect_timeout_secs == 0 {
            return Err(MemtuiError::Config(
                "server.connect_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.server.op_timeout_secs == 0 {
            return Err(MemtuiError::Config(
                "server.op_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.server.enumerate_timeout_secs == 0 {
            return Err(MemtuiError::Config(
                "server.enumerate_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.format.max_decompressed_bytes == 0 {
            return Err(MemtuiError::Config(
                "format.max_decompressed_bytes must be greater than 0".to_string(),
            ));
        }
        if self.ui.palette_max_results == 0 {
            return Err(MemtuiError::Config(
                "ui.palette_max_results must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Server connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// `host:port` of the memcached server
    pub addr: String,

    /// Connect / capability probe timeout in seconds
    pub connect_timeout_secs: u64,

    /// Per-operation timeout in seconds
    pub op_timeout_secs: u64,

    /// Key enumeration deadline in seconds
    pub enumerate_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            connect_timeout_secs: 10,
            op_timeout_secs: 10,
            enumerate_timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    /// Connect timeout as a `Duration`
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Per-operation timeout as a `Duration`
    pub fn op_timeout(&self) -> Duration {
        Duration::from_secs(self.op_timeout_secs)
    }

    /// Enumeration deadline as a `Duration`
    pub fn enumerate_timeout(&self) -> Duration {
        Duration::from_secs(self.enumerate_timeout_secs)
    }
}

/// Interface configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Separator used to build the key tree (empty for a flat list)
    pub key_delimiter: String,

    /// Theme name
    pub theme: String,

    /// Number of ranked entries shown by the command palette
    pub palette_max_results: usize,

    /// Input poll interval in milliseconds
    pub tick_rate_ms: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            key_delimiter: ":".to_string(),
            theme: "default".to_string(),
            palette_max_results: 10,
            tick_rate_ms: 100,
        }
    }
}

/// Value formatting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    /// Largest decompressed payload the viewer will produce
    pub max_decompressed_bytes: usize,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            max_decompressed_bytes: DEFAULT_MAX_DECOMPRESSED_BYTES,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (pretty, json)
    pub format: LogFormat,

    /// Log file path (None for the per-user cache directory)
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Configured file, falling back to `<cache_dir>/memtui/memtui.log`
    pub fn resolved_file(&self) -> Option<PathBuf> {
        self.file
            .clone()
            .or_else(|| dirs::cache_dir().map(|dir| dir.join("memtui").join("memtui.log")))
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable format
    #[default]
    Pretty,

    /// JSON format
    Json,
}
