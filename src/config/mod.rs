//! Configuration module
//!
//! Handles loading and validating configuration from TOML files and environment variables.

pub mod loader;
pub mod types;

pub use loader::{
    MAX_RETRIES_LIMIT, SEARCH_PATHS, TOKEN_ENV_VAR, load_config, load_config_from_str,
};
pub use types::*;
