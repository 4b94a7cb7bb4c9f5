//! Subcommand implementations.

pub mod approve;
pub mod brief;
pub mod chat;
pub mod route;
pub mod rules;
pub mod status;

use foreman_config::{AppConfig, ConfigError};
use std::path::Path;

/// Load configuration from `path` if given, otherwise from the default
/// location. Environment overrides apply either way.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    match path {
        None => AppConfig::load(),
        Some(path) => {
            let mut config = AppConfig::load_from(path)?;
            config.apply_env(|name| std::env::var(name).ok());
            config.validate()?;
            Ok(config)
        }
    }
}

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
