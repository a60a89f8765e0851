//! Simple multi-turn conversation on top of an [`AgentHandle`]

use super::AgentHandle;
use crate::error::AiSdkResult;
use crate::protocol::{InvokeRequest, InvokeResponse};
use crate::streaming::EventStream;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Keeps the conversation id between turns so callers don't have to
///
/// Unlike [`ContinuationOrchestrator`](super::ContinuationOrchestrator) it
/// never sends anything on its own.
#[derive(Debug, Clone)]
pub struct ChatSession {
    agent: AgentHandle,
    conversation_id: Option<String>,
    history: Vec<(String, String)>,
    responses: Vec<InvokeResponse>,
}

impl ChatSession {
    pub fn new(agent: AgentHandle) -> Self {
        Self {
            agent,
            conversation_id: None,
            history: Vec::new(),
            responses: Vec::new(),
        }
    }

    pub fn agent(&self) -> &AgentHandle {
        &self.agent
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    /// `(user, assistant)` pairs for turns that carried a message
    pub fn history(&self) -> &[(String, String)] {
        &self.history
    }

    pub fn responses(&self) -> &[InvokeResponse] {
        &self.responses
    }

    /// Unique tool names across all turns, sorted
    pub fn tools_used(&self) -> Vec<String> {
        self.responses
            .iter()
            .flat_map(|r| r.tools_used.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn request(&self, message: Option<&str>, parameters: Map<String, Value>) -> InvokeRequest {
        let mut request = InvokeRequest::new().with_parameters(parameters);
        if let Some(message) = message {
            request = request.with_message(message);
        }
        if let Some(id) = &self.conversation_id {
            request = request.with_conversation_id(id.clone());
        }
        request
    }

    /// Send a message (or nothing, to use the agent's default prompt)
    pub async fn send(
        &mut self,
        message: Option<&str>,
        parameters: Map<String, Value>,
    ) -> AiSdkResult<String> {
        let response = self.agent.invoke(self.request(message, parameters)).await?;

        if !response.conversation_id.is_empty() {
            self.conversation_id = Some(response.conversation_id.clone());
        }
        if let Some(message) = message {
            self.history
                .push((message.to_string(), response.response.clone()));
        }
        let text = response.response.clone();
        self.responses.push(response);
        Ok(text)
    }

    /// Stream a turn of this conversation
    ///
    /// Streamed turns are not recorded in the history.
    pub async fn stream(
        &self,
        message: Option<&str>,
        parameters: Map<String, Value>,
    ) -> AiSdkResult<EventStream> {
        self.agent.stream(self.request(message, parameters)).await
    }

    /// Forget the conversation and start fresh
    pub fn reset(&mut self) {
        self.conversation_id = None;
        self.history.clear();
        self.responses.clear();
    }

    /// Number of recorded turns
    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }
}
