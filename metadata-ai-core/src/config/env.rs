//! Environment variable handling for configuration
//!
//! Two jobs live here: `${VAR}` interpolation for config files, and building
//! a [`ClientConfig`] straight from `<PREFIX>_*` variables.

use super::error::{ConfigError, ValidationError};
use super::schema::ClientConfig;
use super::secrets::SecretString;
use regex::{Captures, Regex};
use std::env;

/// Prefix used by [`ClientConfig::from_env`]
pub const DEFAULT_ENV_PREFIX: &str = "AI_SDK";

fn env_var_pattern() -> Result<Regex, ConfigError> {
    Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").map_err(|e| ConfigError::Invalid {
        message: format!("bad interpolation pattern: {}", e),
    })
}

/// Interpolate environment variables in a configuration string
pub fn interpolate_env_vars(content: &str) -> Result<String, ConfigError> {
    let pattern = env_var_pattern()?;
    let mut missing: Option<String> = None;

    let result = pattern.replace_all(content, |cap: &Captures<'_>| {
        let var_name = &cap[1];
        match env::var(var_name) {
            Ok(value) => value,
            Err(_) => {
                missing.get_or_insert_with(|| var_name.to_string());
                String::new()
            }
        }
    });

    // Report the first missing variable
    if let Some(var) = missing {
        return Err(ConfigError::EnvVarNotFound { var });
    }

    Ok(result.into_owned())
}

fn var_name(prefix: &str, key: &str) -> String {
    format!("{}_{}", prefix.trim_end_matches('_'), key)
}

fn read_var(prefix: &str, key: &str) -> Option<(String, String)> {
    let name = var_name(prefix, key);
    env::var(&name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(|v| (name, v))
}

fn require_var(prefix: &str, key: &str) -> Result<String, ConfigError> {
    read_var(prefix, key)
        .map(|(_, v)| v)
        .ok_or_else(|| ConfigError::EnvVarNotFound {
            var: var_name(prefix, key),
        })
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes"
    )
}

/// Build a client configuration from `<prefix>_HOST`, `<prefix>_TOKEN` and
/// the optional tuning variables.
pub fn config_from_env(prefix: &str) -> Result<ClientConfig, ConfigError> {
    let host = require_var(prefix, "HOST")?;
    let token = require_var(prefix, "TOKEN")?;
    let mut config = ClientConfig::new(host, SecretString::new(token));

    if let Some((name, raw)) = read_var(prefix, "TIMEOUT") {
        config.timeout_secs = raw
            .trim()
            .parse()
            .map_err(|_| ValidationError::invalid_value(name, "integer seconds", raw.clone()))?;
    }

    if let Some((_, raw)) = read_var(prefix, "VERIFY_SSL") {
        config.verify_ssl = parse_bool(&raw);
    }

    if let Some((name, raw)) = read_var(prefix, "MAX_RETRIES") {
        config.retry.max_retries = raw
            .trim()
            .parse()
            .map_err(|_| ValidationError::invalid_value(name, "non-negative integer", raw.clone()))?;
    }

    if let Some((name, raw)) = read_var(prefix, "RETRY_DELAY") {
        let secs: f64 = raw
            .trim()
            .parse()
            .map_err(|_| ValidationError::invalid_value(name.clone(), "seconds", raw.clone()))?;
        if !secs.is_finite() || secs < 0.0 {
            return Err(ValidationError::out_of_range(name, "Must be a non-negative number").into());
        }
        config.retry.initial_delay_ms = (secs * 1000.0).round() as u64;
    }

    if let Some((_, raw)) = read_var(prefix, "USER_AGENT") {
        config.user_agent = raw;
    }

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolate_env_vars() {
        env::set_var("CFG_ENV_TEST_VAR", "test_value");

        let content = "token: ${CFG_ENV_TEST_VAR}";
        let result = interpolate_env_vars(content).unwrap();
        assert_eq!(result, "token: test_value");

        env::remove_var("CFG_ENV_TEST_VAR");
    }

    #[test]
    fn test_missing_env_var() {
        let content = "token: ${CFG_ENV_MISSING_VAR}";
        let result = interpolate_env_vars(content);

        if let Err(ConfigError::EnvVarNotFound { var }) = result {
            assert_eq!(var, "CFG_ENV_MISSING_VAR");
        } else {
            panic!("Expected EnvVarNotFound error");
        }
    }

    #[test]
    fn test_repeated_reference() {
        env::set_var("CFG_ENV_REPEAT", "v");
        let result = interpolate_env_vars("${CFG_ENV_REPEAT}-${CFG_ENV_REPEAT}").unwrap();
        assert_eq!(result, "v-v");
        env::remove_var("CFG_ENV_REPEAT");
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("TRUE"));
        assert!(parse_bool("1"));
        assert!(parse_bool("Yes"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool("off"));
    }

    #[test]
    fn test_config_from_env_with_prefix() {
        env::set_var("CFG_UNIT_HOST", "https://metadata.example.com/");
        env::set_var("CFG_UNIT_TOKEN", "secret-token");
        env::set_var("CFG_UNIT_TIMEOUT", "30");
        env::set_var("CFG_UNIT_VERIFY_SSL", "no");
        env::set_var("CFG_UNIT_RETRY_DELAY", "0.5");

        let config = config_from_env("CFG_UNIT").unwrap();
        assert_eq!(config.host, "https://metadata.example.com");
        assert_eq!(config.token.expose_secret(), "secret-token");
        assert_eq!(config.timeout_secs, 30);
        assert!(!config.verify_ssl);
        assert_eq!(config.retry.initial_delay_ms, 500);
        assert_eq!(config.retry.max_retries, 3);

        for key in ["HOST", "TOKEN", "TIMEOUT", "VERIFY_SSL", "RETRY_DELAY"] {
            env::remove_var(format!("CFG_UNIT_{}", key));
        }
    }

    #[test]
    fn test_config_from_env_missing_host() {
        let result = config_from_env("CFG_UNIT_ABSENT");
        match result {
            Err(ConfigError::EnvVarNotFound { var }) => assert_eq!(var, "CFG_UNIT_ABSENT_HOST"),
            other => panic!("Expected EnvVarNotFound, got {:?}", other),
        }
    }
}
