//! Tool/Capability adapter over the service's MCP endpoint
//!
//! Lists the remotely declared tools, calls them, and translates them for
//! external agent frameworks.

pub mod client;
pub mod openai;
pub mod protocol;
pub mod tools;

pub use client::McpClient;
pub use openai::{build_openai_tools, to_openai_tool, ToolExecutor};
pub use protocol::{
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, ParamType, ToolCallResult, ToolDescriptor,
    ToolFilter, ToolParameter,
};
pub use tools::{build_agent_tools, AgentTool, McpToolWrapper, ToolError};
