//! Configuration types for coursegate
//!
//! This module defines the configuration structure that can be loaded from
//! TOML files and/or environment variables.

use crate::util::SecretString;
use serde::Deserialize;

/// Default bound on how many categories the inheritance walk visits
pub const DEFAULT_MAX_CATEGORY_DEPTH: usize = 64;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where access-control records come from
    pub directory: DirectoryConfig,

    /// Resolver settings
    pub access: AccessConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Directory backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectoryBackend {
    /// Snapshot file loaded into memory
    #[default]
    Memory,
    /// JSON record service over HTTP
    Rest,
}

/// Directory connection configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    pub backend: DirectoryBackend,

    /// Snapshot file path (memory backend)
    pub snapshot: Option<String>,

    /// Record service base URL (rest backend)
    pub url: String,

    /// Bearer token for the record service (prefer env var COURSEGATE_DIRECTORY_TOKEN)
    pub token: Option<SecretString>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum retries for failed requests
    pub max_retries: u32,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            backend: DirectoryBackend::Memory,
            snapshot: None,
            url: "http://127.0.0.1:8080".to_string(),
            token: None,
            timeout_secs: 10,
            max_retries: 2,
        }
    }
}

/// Access resolver configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Maximum number of categories visited when inheriting roles
    pub max_category_depth: usize,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            max_category_depth: DEFAULT_MAX_CATEGORY_DEPTH,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Output format (pretty, json)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output
    #[default]
    Pretty,
    /// JSON structured output
    Json,
}
