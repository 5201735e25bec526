//! Command implementations.

pub mod config;
pub mod models;
pub mod serve;

use std::path::Path;

use zeroshot_core::{Config, ConfigError};

/// Load the config from `path`, or from the default location when `None`.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}
