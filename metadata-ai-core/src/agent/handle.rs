//! Per-agent façade over the transport and the stream decoder

use crate::error::{AiSdkResult, EntityKind};
use crate::http::{HttpExecutor, RequestContext, RequestOptions};
use crate::protocol::{AgentInfo, InvokeRequest, InvokeResponse};
use crate::streaming::{decode_stream_with, EventStream, SseDecoder};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Path prefix of the dynamic agent API
pub(crate) const AGENTS_PATH: [&str; 4] = ["api", "v1", "agents", "dynamic"];

/// Handle to one named agent
///
/// Cheap to clone; every clone shares the same transport.
#[derive(Clone)]
pub struct AgentHandle {
    name: String,
    http: Arc<dyn HttpExecutor>,
    include_thinking: bool,
}

impl fmt::Debug for AgentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentHandle")
            .field("name", &self.name)
            .field("include_thinking", &self.include_thinking)
            .finish()
    }
}

impl AgentHandle {
    pub fn new(http: Arc<dyn HttpExecutor>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            http,
            include_thinking: false,
        }
    }

    /// Stream "thinking" messages as content too
    pub fn with_thinking(mut self, include_thinking: bool) -> Self {
        self.include_thinking = include_thinking;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn path(&self, action: Option<&str>) -> Vec<String> {
        let mut path: Vec<String> = AGENTS_PATH.iter().map(|s| s.to_string()).collect();
        path.push("name".to_string());
        path.push(self.name.clone());
        if let Some(action) = action {
            path.push(action.to_string());
        }
        path
    }

    fn context(&self) -> RequestContext {
        RequestContext::new(EntityKind::Agent, self.name.clone())
    }

    fn request_options(&self, action: &str, request: &InvokeRequest) -> AiSdkResult<RequestOptions> {
        Ok(RequestOptions::post(self.path(Some(action)))
            .with_body(serde_json::to_value(request)?)
            .with_context(self.context()))
    }

    /// Invoke the agent once and wait for the full response
    pub async fn invoke(&self, request: InvokeRequest) -> AiSdkResult<InvokeResponse> {
        debug!("Invoking agent '{}'", self.name);
        let options = self.request_options("invoke", &request)?;
        let value = self.http.execute_json(options).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Send a single message in a new conversation
    pub async fn call(&self, message: impl Into<String>) -> AiSdkResult<InvokeResponse> {
        self.invoke(InvokeRequest::new().with_message(message)).await
    }

    /// Invoke the agent and stream its events as they arrive
    ///
    /// Non-success statuses fail here, before any event is produced.
    pub async fn stream(&self, request: InvokeRequest) -> AiSdkResult<EventStream> {
        debug!("Streaming agent '{}'", self.name);
        let options = self.request_options("stream", &request)?;
        let bytes = self.http.execute_stream(options).await?;
        let decoder = SseDecoder::new().with_thinking(self.include_thinking);
        Ok(decode_stream_with(bytes, decoder))
    }

    /// Fetch the agent's metadata
    pub async fn get_info(&self) -> AiSdkResult<AgentInfo> {
        let options = RequestOptions::get(self.path(None)).with_context(self.context());
        let value = self.http.execute_json(options).await?;
        Ok(serde_json::from_value(value)?)
    }
}
