//! HTTP transport for the agent service
//!
//! This module implements the request layer, handling:
//! - Connection pooling and client management
//! - Auth, accept and correlation headers
//! - Error mapping and retry hints
//! - Retries with exponential backoff for unary calls

pub mod client;
pub mod error;
pub mod retry;

pub use client::HttpClient;
pub use retry::{RetryExecutor, RetryPolicy, RetryState};

use crate::error::{AiSdkError, AiSdkResult, EntityKind};
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use reqwest::Method;
use serde_json::Value;
use std::pin::Pin;
use std::time::Duration;

/// Raw response body of a streaming call
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, AiSdkError>> + Send>>;

/// Which entity a request targets
///
/// Attached to every request so a 403/404 can name what was missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub entity: EntityKind,
    pub name: Option<String>,
}

impl RequestContext {
    pub fn new(entity: EntityKind, name: impl Into<String>) -> Self {
        Self {
            entity,
            name: Some(name.into()),
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self {
            entity: EntityKind::Resource,
            name: None,
        }
    }
}

/// Options for an HTTP request
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,

    /// Path segments appended to the base URL, percent-encoded individually
    pub path: Vec<String>,

    /// Optional JSON body
    pub body: Option<Value>,

    /// Query parameters in insertion order
    pub query: Vec<(String, String)>,

    /// Entity context for error disambiguation
    pub context: RequestContext,

    /// Per-attempt timeout override
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    /// Create request options for the given method and path segments
    pub fn new<I, S>(method: Method, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            method,
            path: path.into_iter().map(Into::into).collect(),
            body: None,
            query: Vec::new(),
            context: RequestContext::default(),
            timeout: None,
        }
    }

    pub fn get<I, S>(path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Method::GET, path)
    }

    pub fn post<I, S>(path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Method::POST, path)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Add a query parameter; numbers and strings both render via `Display`
    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = context;
        self
    }

    /// Set the timeout for this request
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Path as it appears in logs, e.g. `/api/v1/bots/name/x`
    pub fn display_path(&self) -> String {
        format!("/{}", self.path.join("/"))
    }
}

/// The transport seam
///
/// Agent handles, the continuation orchestrator and the MCP client only talk
/// to the service through this trait.
#[async_trait]
pub trait HttpExecutor: Send + Sync {
    /// Execute a unary JSON request, retrying transient failures
    async fn execute_json(&self, options: RequestOptions) -> AiSdkResult<Value>;

    /// Open an event stream; never retried
    async fn execute_stream(&self, options: RequestOptions) -> AiSdkResult<ByteStream>;
}
