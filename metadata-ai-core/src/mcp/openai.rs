//! OpenAI function-calling adapter

use super::client::McpClient;
use super::protocol::ToolDescriptor;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::debug;

/// Render one descriptor as an OpenAI `function` tool
pub fn to_openai_tool(tool: &ToolDescriptor) -> Value {
    let properties: Map<String, Value> = tool
        .parameters
        .iter()
        .map(|p| {
            (
                p.name.clone(),
                json!({ "type": p.param_type.as_str(), "description": p.description }),
            )
        })
        .collect();
    let required: Vec<&str> = tool.required_parameters().map(|p| p.name.as_str()).collect();

    json!({
        "type": "function",
        "function": {
            "name": tool.name,
            "description": tool.description,
            "parameters": {
                "type": "object",
                "properties": properties,
                "required": required,
            }
        }
    })
}

/// Render a tool listing for the `tools` field of a chat completion request
pub fn build_openai_tools(tools: &[ToolDescriptor]) -> Vec<Value> {
    tools.iter().map(to_openai_tool).collect()
}

/// Runs the tool calls an OpenAI model asks for
///
/// Failures are reported to the model as `{"error": ...}` instead of
/// aborting the conversation.
#[derive(Debug, Clone)]
pub struct ToolExecutor {
    client: Arc<McpClient>,
}

impl ToolExecutor {
    pub fn new(client: Arc<McpClient>) -> Self {
        Self { client }
    }

    pub async fn execute(&self, name: &str, arguments: Map<String, Value>) -> Value {
        let arguments: Map<String, Value> = arguments
            .into_iter()
            .filter(|(_, value)| !value.is_null())
            .collect();
        debug!("Executing tool '{}' with {} argument(s)", name, arguments.len());

        match self.client.call_tool(name, arguments).await {
            Ok(result) if result.success => result.data.unwrap_or_else(|| json!({})),
            Ok(result) => json!({ "error": result.error.unwrap_or_default() }),
            Err(err) => json!({ "error": err.to_string() }),
        }
    }

    /// Execute a call whose arguments are still the model's JSON string
    pub async fn execute_raw(&self, name: &str, arguments: &str) -> Value {
        let parsed = if arguments.trim().is_empty() {
            Ok(Map::new())
        } else {
            serde_json::from_str::<Map<String, Value>>(arguments)
        };
        match parsed {
            Ok(arguments) => self.execute(name, arguments).await,
            Err(err) => json!({ "error": format!("Invalid tool arguments: {err}") }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::protocol::{ParamType, ToolParameter};

    #[test]
    fn test_openai_schema() {
        let tool = ToolDescriptor {
            name: "search_metadata".to_string(),
            description: "Search the catalog".to_string(),
            parameters: vec![
                ToolParameter {
                    name: "query".to_string(),
                    param_type: ParamType::String,
                    description: "Search text".to_string(),
                    required: true,
                },
                ToolParameter {
                    name: "size".to_string(),
                    param_type: ParamType::Integer,
                    description: String::new(),
                    required: false,
                },
            ],
        };

        let schema = to_openai_tool(&tool);
        assert_eq!(
            schema,
            json!({
                "type": "function",
                "function": {
                    "name": "search_metadata",
                    "description": "Search the catalog",
                    "parameters": {
                        "type": "object",
                        "properties": {
                            "query": {"type": "string", "description": "Search text"},
                            "size": {"type": "integer", "description": ""}
                        },
                        "required": ["query"]
                    }
                }
            })
        );
        let keys: Vec<&String> = schema["function"]["parameters"]["properties"]
            .as_object()
            .unwrap()
            .keys()
            .collect();
        assert_eq!(keys, vec!["query", "size"]);
    }

    #[test]
    fn test_no_parameters() {
        let tool = ToolDescriptor {
            name: "ping".to_string(),
            description: String::new(),
            parameters: Vec::new(),
        };
        let tools = build_openai_tools(&[tool]);
        assert_eq!(tools[0]["function"]["parameters"]["required"], json!([]));
        assert_eq!(tools[0]["function"]["parameters"]["properties"], json!({}));
    }
}
