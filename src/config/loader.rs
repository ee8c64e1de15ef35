//! Layered configuration loading
//!
//! Later layers win:
//! 1. serde defaults on [`AppConfig`]
//! 2. one TOML file, either given explicitly or the first of
//!    [`SEARCH_PATHS`] that exists
//! 3. `COURSEGATE__*` environment variables, `__` between nesting levels
//! 4. [`TOKEN_ENV_VAR`] for the record service token

use crate::config::types::{AppConfig, DirectoryBackend};
use crate::error::ConfigError;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use std::path::Path;

/// Candidate config files, first hit wins. `~` is expanded.
pub const SEARCH_PATHS: &[&str] = &[
    "coursegate.toml",
    ".coursegate.toml",
    "~/.config/coursegate/config.toml",
    "/etc/coursegate/config.toml",
];

/// Environment variable carrying the record service token
pub const TOKEN_ENV_VAR: &str = "COURSEGATE_DIRECTORY_TOKEN";

/// Upper bound for `directory.max_retries`
pub const MAX_RETRIES_LIMIT: u32 = 10;

type Builder = ConfigBuilder<DefaultState>;

/// Parse and validate a TOML document, ignoring files and environment
pub fn load_config_from_str(toml_str: &str) -> Result<AppConfig, ConfigError> {
    finish(Config::builder().add_source(File::from_str(toml_str, FileFormat::Toml)))
}

/// Load configuration from the file layer and the process environment
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    if let Some(file) = config_file_source(config_path)? {
        builder = builder.add_source(file);
    }

    // e.g. COURSEGATE__DIRECTORY__URL, COURSEGATE__ACCESS__MAX_CATEGORY_DEPTH
    builder = builder.add_source(
        Environment::with_prefix("COURSEGATE")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    if let Ok(token) = std::env::var(TOKEN_ENV_VAR)
        && !token.is_empty()
    {
        builder = builder
            .set_override("directory.token", token)
            .map_err(|e| ConfigError::Load(e.to_string()))?;
    }

    finish(builder)
}

/// An explicit path must exist; otherwise search quietly.
fn config_file_source(
    explicit: Option<&str>,
) -> Result<Option<File<config::FileSourceFile, FileFormat>>, ConfigError> {
    if let Some(path) = explicit {
        if !Path::new(path).exists() {
            return Err(ConfigError::Load(format!(
                "Configuration file not found: {}",
                path
            )));
        }
        return Ok(Some(File::new(path, FileFormat::Toml)));
    }

    Ok(SEARCH_PATHS
        .iter()
        .map(|candidate| shellexpand::tilde(candidate).into_owned())
        .find(|candidate| Path::new(candidate).exists())
        .map(|found| File::new(&found, FileFormat::Toml)))
}

fn finish(builder: Builder) -> Result<AppConfig, ConfigError> {
    let app_config: AppConfig = builder
        .build()
        .and_then(|config| config.try_deserialize())
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    validate_config(&app_config)?;
    Ok(app_config)
}

/// Validate configuration values
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    let directory = &config.directory;

    match directory.backend {
        DirectoryBackend::Memory => {
            if directory.snapshot.as_deref().is_none_or(str::is_empty) {
                return Err(ConfigError::Missing {
                    field: "directory.snapshot".to_string(),
                });
            }
        }
        DirectoryBackend::Rest => {
            if directory.url.is_empty() {
                return Err(ConfigError::Missing {
                    field: "directory.url".to_string(),
                });
            }

            if !directory.url.starts_with("http://") && !directory.url.starts_with("https://") {
                return Err(ConfigError::Invalid {
                    message: format!(
                        "directory.url must start with http:// or https://, got: {}",
                        directory.url
                    ),
                });
            }
        }
    }

    if directory.timeout_secs == 0 {
        return Err(ConfigError::Invalid {
            message: "directory.timeout_secs must be greater than 0".to_string(),
        });
    }

    if directory.max_retries > MAX_RETRIES_LIMIT {
        return Err(ConfigError::Invalid {
            message: format!(
                "directory.max_retries must be at most {}, got: {}",
                MAX_RETRIES_LIMIT, directory.max_retries
            ),
        });
    }

    if config.access.max_category_depth == 0 {
        return Err(ConfigError::Invalid {
            message: "access.max_category_depth must be greater than 0".to_string(),
        });
    }

    Ok(())
}
