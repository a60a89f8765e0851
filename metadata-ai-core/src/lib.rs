//! Metadata AI SDK core library
//!
//! Invokes remotely hosted AI agents over HTTP: unary calls, SSE streaming,
//! multi-turn continuation of incomplete answers, and MCP tool adapters.

pub mod agent;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod mcp;
pub mod protocol;
pub mod streaming;

pub use agent::{
    AgentHandle, ChatSession, Completeness, ContinuationOrchestrator, ContinuationPolicy,
    OrchestratedResponse,
};
pub use client::MetadataAI;
pub use config::{ClientConfig, ConfigError, SecretString};
pub use error::{AiSdkError, AiSdkResult, EntityKind, ErrorKind};
pub use http::{HttpClient, HttpExecutor, RequestContext, RequestOptions, RetryPolicy};
pub use mcp::{McpClient, ToolCallResult, ToolDescriptor, ToolFilter};
pub use protocol::{CreateAgentRequest, CreatePersonaRequest, InvokeRequest, InvokeResponse, StreamEvent};
pub use streaming::{EventStream, SseDecoder};

/// Returns the version of the SDK.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
