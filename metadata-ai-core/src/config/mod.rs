//! Client configuration
//!
//! A [`ClientConfig`] can be built in code, read from `AI_SDK_*` environment
//! variables, or loaded from a YAML/JSON file with `${VAR}` interpolation.

mod env;
mod error;
mod schema;
mod secrets;

pub use env::{interpolate_env_vars, DEFAULT_ENV_PREFIX};
pub use error::{ConfigError, ConfigResult, ValidationError, ValidationErrorKind};
pub use schema::{ClientConfig, DEFAULT_USER_AGENT};
pub use secrets::SecretString;

use std::fs;
use std::path::Path;

fn read_config_file(path: &Path) -> Result<String, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;

    // Interpolate environment variables before parsing
    env::interpolate_env_vars(&content)
}

fn finish(mut config: ClientConfig) -> Result<ClientConfig, ConfigError> {
    config.host = config.base_host().to_string();
    config.validate()?;
    Ok(config)
}

/// Load a configuration from a YAML file
pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> Result<ClientConfig, ConfigError> {
    let path = path.as_ref();
    let interpolated = read_config_file(path)?;

    let config: ClientConfig =
        serde_yaml::from_str(&interpolated).map_err(|e| ConfigError::ParseError {
            path: path.to_string_lossy().to_string(),
            line: e.location().map(|l| l.line()),
            column: e.location().map(|l| l.column()),
            message: e.to_string(),
        })?;

    finish(config)
}

/// Load a configuration from a JSON file
pub fn load_from_json<P: AsRef<Path>>(path: P) -> Result<ClientConfig, ConfigError> {
    let path = path.as_ref();
    let interpolated = read_config_file(path)?;

    let config: ClientConfig =
        serde_json::from_str(&interpolated).map_err(|e| ConfigError::ParseError {
            path: path.to_string_lossy().to_string(),
            line: Some(e.line()),
            column: Some(e.column()),
            message: e.to_string(),
        })?;

    finish(config)
}
