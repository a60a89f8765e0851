//! Framework-native tool wrappers
//!
//! Agent frameworks want objects they can call with arguments and get text
//! back from. [`McpToolWrapper`] does that for every tool the service lists.

use super::client::McpClient;
use super::openai::to_openai_tool;
use super::protocol::ToolDescriptor;
use crate::error::AiSdkError;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Failure surfaced to the agent framework
#[derive(Debug, Error)]
pub enum ToolError {
    /// The tool ran and reported a failure
    #[error("Tool '{tool}' failed: {message}")]
    Execution { tool: String, message: String },

    /// The call never reached the tool
    #[error("Tool '{tool}' could not be called: {source}")]
    Transport {
        tool: String,
        #[source]
        source: AiSdkError,
    },
}

impl ToolError {
    pub fn tool(&self) -> &str {
        match self {
            Self::Execution { tool, .. } | Self::Transport { tool, .. } => tool,
        }
    }
}

impl From<ToolError> for AiSdkError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::Execution { tool, message } => AiSdkError::ToolExecution { tool, message },
            ToolError::Transport { source, .. } => source,
        }
    }
}

/// A tool an agent framework can call
#[async_trait]
pub trait AgentTool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON-Schema of the arguments object
    fn args_schema(&self) -> Value;

    /// Run the tool and render its result as text
    async fn run(&self, arguments: Map<String, Value>) -> Result<String, ToolError>;
}

/// [`AgentTool`] backed by an MCP tool
#[derive(Debug, Clone)]
pub struct McpToolWrapper {
    descriptor: ToolDescriptor,
    client: Arc<McpClient>,
}

impl McpToolWrapper {
    pub fn new(client: Arc<McpClient>, descriptor: ToolDescriptor) -> Self {
        Self { descriptor, client }
    }

    pub fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }
}

#[async_trait]
impl AgentTool for McpToolWrapper {
    fn name(&self) -> &str {
        &self.descriptor.name
    }

    fn description(&self) -> &str {
        &self.descriptor.description
    }

    fn args_schema(&self) -> Value {
        to_openai_tool(&self.descriptor)["function"]["parameters"].clone()
    }

    async fn run(&self, arguments: Map<String, Value>) -> Result<String, ToolError> {
        let arguments: Map<String, Value> = arguments
            .into_iter()
            .filter(|(_, value)| !value.is_null())
            .collect();
        debug!("Running tool '{}'", self.descriptor.name);

        let result = self
            .client
            .call_tool(&self.descriptor.name, arguments)
            .await
            .map_err(|source| ToolError::Transport {
                tool: self.descriptor.name.clone(),
                source,
            })?;

        if !result.success {
            return Err(ToolError::Execution {
                tool: self.descriptor.name.clone(),
                message: result.error.unwrap_or_else(|| "Unknown error".to_string()),
            });
        }

        let data = result.data.unwrap_or_else(|| json!({}));
        serde_json::to_string(&data).map_err(|err| ToolError::Execution {
            tool: self.descriptor.name.clone(),
            message: err.to_string(),
        })
    }
}

/// Wrap every descriptor for use by an agent framework
pub fn build_agent_tools(
    client: Arc<McpClient>,
    tools: Vec<ToolDescriptor>,
) -> Vec<Box<dyn AgentTool>> {
    tools
        .into_iter()
        .map(|descriptor| {
            Box::new(McpToolWrapper::new(Arc::clone(&client), descriptor)) as Box<dyn AgentTool>
        })
        .collect()
}
