//! Configuration schema structures with serde support

use super::error::ValidationError;
use super::secrets::SecretString;
use crate::agent::ContinuationPolicy;
use crate::http::RetryPolicy;
use serde::{Deserialize, Serialize};

/// Default `User-Agent` header value
pub const DEFAULT_USER_AGENT: &str = concat!("metadata-ai-sdk/", env!("CARGO_PKG_VERSION"));

/// Client configuration
///
/// Shared read-only by every request issued through one client.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Server URL, e.g. `https://metadata.example.com`
    pub host: String,

    /// Bearer credential (supports environment variable interpolation)
    pub token: SecretString,

    /// Per-attempt request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// TCP connect timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Verify TLS certificates
    #[serde(default = "default_true")]
    pub verify_ssl: bool,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Transport retry policy
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Continuation orchestrator thresholds
    #[serde(default)]
    pub continuation: ContinuationPolicy,
}

// Default value functions for serde
fn default_true() -> bool { true }
fn default_timeout_secs() -> u64 { 120 }
fn default_connect_timeout_secs() -> u64 { 10 }
fn default_user_agent() -> String { DEFAULT_USER_AGENT.to_string() }

impl ClientConfig {
    /// Create a configuration with default settings for the given server
    pub fn new(host: impl Into<String>, token: impl Into<SecretString>) -> Self {
        let host: String = host.into();
        Self {
            host: host.trim_end_matches('/').to_string(),
            token: token.into(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            verify_ssl: true,
            user_agent: default_user_agent(),
            retry: RetryPolicy::default(),
            continuation: ContinuationPolicy::default(),
        }
    }

    /// Load from `AI_SDK_*` environment variables
    pub fn from_env() -> Result<Self, super::ConfigError> {
        super::env::config_from_env(super::env::DEFAULT_ENV_PREFIX)
    }

    /// Load from `<prefix>_*` environment variables
    pub fn from_env_with_prefix(prefix: &str) -> Result<Self, super::ConfigError> {
        super::env::config_from_env(prefix)
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_connect_timeout_secs(mut self, connect_timeout_secs: u64) -> Self {
        self.connect_timeout_secs = connect_timeout_secs;
        self
    }

    pub fn with_verify_ssl(mut self, verify_ssl: bool) -> Self {
        self.verify_ssl = verify_ssl;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_continuation(mut self, continuation: ContinuationPolicy) -> Self {
        self.continuation = continuation;
        self
    }

    /// Host with any trailing slash removed
    pub fn base_host(&self) -> &str {
        self.host.trim_end_matches('/')
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.host.trim().is_empty() {
            return Err(ValidationError::required("host"));
        }

        match url::Url::parse(self.base_host()) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    return Err(ValidationError::invalid_url(
                        "host",
                        format!("URL scheme must be http or https, got: {}", url.scheme()),
                    ));
                }
                if url.cannot_be_a_base() {
                    return Err(ValidationError::invalid_url("host", "URL cannot be a base"));
                }
            }
            Err(e) => {
                return Err(ValidationError::invalid_url("host", e.to_string()));
            }
        }

        if self.token.is_empty() {
            return Err(ValidationError::required("token"));
        }

        if self.timeout_secs == 0 {
            return Err(ValidationError::out_of_range(
                "timeout_secs",
                "Must be greater than 0",
            ));
        }

        if self.connect_timeout_secs == 0 {
            return Err(ValidationError::out_of_range(
                "connect_timeout_secs",
                "Must be greater than 0",
            ));
        }

        self.retry.validate("retry")?;
        self.continuation.validate("continuation")?;

        Ok(())
    }
}
