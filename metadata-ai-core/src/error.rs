//! Error taxonomy shared by every component of the SDK
//!
//! Errors are keyed by cause rather than by the component that raised them.
//! The transport produces most of them; the stream decoder, the continuation
//! orchestrator and the MCP adapter only ever pass them through or add
//! `Stream`/`ToolExecution` failures of their own.

use crate::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result type for SDK operations
pub type AiSdkResult<T> = Result<T, AiSdkError>;

/// Status codes the transport retries automatically
pub const RETRYABLE_STATUS_CODES: [u16; 5] = [429, 500, 502, 503, 504];

/// The kind of remote entity a request was addressed to.
///
/// Used to turn a bare 403/404 into a meaningful error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Agent,
    Bot,
    Persona,
    Ability,
    Tool,
    /// No entity context was attached to the request
    Resource,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Agent => "Agent",
            Self::Bot => "Bot",
            Self::Persona => "Persona",
            Self::Ability => "Ability",
            Self::Tool => "Tool",
            Self::Resource => "Resource",
        };
        f.write_str(label)
    }
}

/// Flat discriminant of [`AiSdkError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Authentication,
    NotFound,
    NotEnabled,
    RateLimited,
    ExecutionFailure,
    Timeout,
    Network,
    ToolExecution,
    Parse,
    Configuration,
    Stream,
}

/// Errors that can occur while talking to the agent service
#[derive(Debug, Error)]
pub enum AiSdkError {
    /// Credential rejected (HTTP 401)
    #[error("Invalid or expired authentication token")]
    Authentication,

    /// The named entity does not exist (HTTP 404)
    #[error("{entity} not found: {name}")]
    NotFound { entity: EntityKind, name: String },

    /// The entity exists but is not enabled for API access (HTTP 403)
    #[error("{entity} '{name}' is not enabled for API access")]
    NotEnabled { entity: EntityKind, name: String },

    /// Rate limit exceeded (HTTP 429)
    #[error("Rate limit exceeded{}", format_retry_after(.retry_after))]
    RateLimited { retry_after: Option<Duration> },

    /// Remote execution error (any other HTTP error status)
    #[error("API error ({}): {message}", format_status(.status))]
    ExecutionFailure {
        status: Option<u16>,
        message: String,
        agent: Option<String>,
        retry_after: Option<Duration>,
    },

    /// A single attempt exceeded its timeout
    #[error("Request timed out")]
    Timeout,

    /// Connection-level failure
    #[error("Network error: {0}")]
    Network(String),

    /// An MCP tool reported a failure
    #[error("Tool '{tool}' failed: {message}")]
    ToolExecution { tool: String, message: String },

    /// The service answered with something we could not decode
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Invalid client configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The service sent an `error` event in the middle of a stream
    #[error("Stream error: {0}")]
    Stream(String),
}

fn format_retry_after(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(delay) => format!(", retry after {}s", delay.as_secs_f64()),
        None => String::new(),
    }
}

fn format_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "no status".to_string(),
    }
}

impl AiSdkError {
    /// Flat discriminant of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Authentication => ErrorKind::Authentication,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::NotEnabled { .. } => ErrorKind::NotEnabled,
            Self::RateLimited { .. } => ErrorKind::RateLimited,
            Self::ExecutionFailure { .. } => ErrorKind::ExecutionFailure,
            Self::Timeout => ErrorKind::Timeout,
            Self::Network(_) => ErrorKind::Network,
            Self::ToolExecution { .. } => ErrorKind::ToolExecution,
            Self::Parse(_) => ErrorKind::Parse,
            Self::Config(_) => ErrorKind::Configuration,
            Self::Stream(_) => ErrorKind::Stream,
        }
    }

    /// HTTP status that produced this error, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Authentication => Some(401),
            Self::NotFound { .. } => Some(404),
            Self::NotEnabled { .. } => Some(403),
            Self::RateLimited { .. } => Some(429),
            Self::ExecutionFailure { status, .. } => *status,
            _ => None,
        }
    }

    /// Whether the transport may retry the request that produced this error
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Timeout | Self::Network(_) => true,
            Self::ExecutionFailure {
                status: Some(code), ..
            } => RETRYABLE_STATUS_CODES.contains(code),
            _ => false,
        }
    }

    /// Server-supplied delay before the next attempt
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            Self::ExecutionFailure { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Network(format!("Connection failed: {}", err))
        } else if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AiSdkError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
