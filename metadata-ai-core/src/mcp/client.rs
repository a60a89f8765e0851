//! JSON-RPC client for the service's MCP endpoint

use super::protocol::{
    JsonRpcRequest, JsonRpcResponse, ToolCallResult, ToolDescriptor, ToolFilter,
    METHOD_TOOLS_CALL, METHOD_TOOLS_LIST,
};
use crate::error::{AiSdkError, AiSdkResult, EntityKind};
use crate::http::{HttpExecutor, RequestContext, RequestOptions};
use serde_json::{json, Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

const MCP_PATH: [&str; 1] = ["mcp"];

/// Lists and calls the tools the service exposes over MCP
#[derive(Clone)]
pub struct McpClient {
    http: Arc<dyn HttpExecutor>,
}

impl fmt::Debug for McpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("McpClient").finish_non_exhaustive()
    }
}

impl McpClient {
    pub fn new(http: Arc<dyn HttpExecutor>) -> Self {
        Self { http }
    }

    async fn rpc(&self, request: JsonRpcRequest, context: RequestContext) -> AiSdkResult<JsonRpcResponse> {
        debug!("MCP {} (id {})", request.method, request.id);
        let options = RequestOptions::post(MCP_PATH)
            .with_body(serde_json::to_value(&request)?)
            .with_context(context);
        let value = self.http.execute_json(options).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Fetch every tool the service declares
    pub async fn list_tools(&self) -> AiSdkResult<Vec<ToolDescriptor>> {
        let request = JsonRpcRequest::new(METHOD_TOOLS_LIST, json!({}));
        let result = self
            .rpc(request, RequestContext::default())
            .await?
            .into_result()
            .map_err(|error| AiSdkError::ExecutionFailure {
                status: None,
                message: format!("MCP error {}: {}", error.code, error.message),
                agent: None,
                retry_after: None,
            })?;

        let tools = result
            .get("tools")
            .and_then(Value::as_array)
            .map(|tools| tools.iter().filter_map(ToolDescriptor::from_value).collect())
            .unwrap_or_default();
        Ok(tools)
    }

    /// Fetch the tools and keep those the filter allows
    pub async fn list_tools_filtered(&self, filter: &ToolFilter) -> AiSdkResult<Vec<ToolDescriptor>> {
        Ok(filter.apply(self.list_tools().await?))
    }

    /// Call a tool by name
    ///
    /// JSON-RPC errors come back as an unsuccessful [`ToolCallResult`];
    /// transport failures are still returned as `Err`.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> AiSdkResult<ToolCallResult> {
        let request = JsonRpcRequest::new(
            METHOD_TOOLS_CALL,
            json!({ "name": name, "arguments": arguments }),
        );
        let context = RequestContext::new(EntityKind::Tool, name);

        match self.rpc(request, context).await?.into_result() {
            Ok(result) => {
                let outcome = ToolCallResult::from_call_result(&result);
                if let Some(error) = &outcome.error {
                    warn!("Tool '{}' reported an error: {}", name, error);
                }
                Ok(outcome)
            }
            Err(error) => {
                warn!("Tool '{}' failed with JSON-RPC error {}", name, error.code);
                Ok(ToolCallResult::err(error.message))
            }
        }
    }
}
