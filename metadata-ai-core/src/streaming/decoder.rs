//! Event projection for agent streams
//!
//! Framing is done by `eventsource-stream`; [`SseDecoder`] turns each framed
//! event (name plus data) into typed [`StreamEvent`]s and carries the
//! conversation id forward across events of one stream.

use crate::protocol::{EventType, StreamEvent};
use serde_json::{json, Value};
use tracing::{debug, trace};

const UNKNOWN_STREAM_ERROR: &str = "Unknown stream error";

/// Stateful projection for one SSE stream
#[derive(Debug, Default, Clone)]
pub struct SseDecoder {
    /// Last conversation id seen on this stream
    conversation_id: Option<String>,
    include_thinking: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also emit `system` ("thinking") messages as content
    pub fn with_thinking(mut self, include_thinking: bool) -> Self {
        self.include_thinking = include_thinking;
        self
    }

    /// Last conversation id seen so far
    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    /// Project one framed event
    ///
    /// An empty `name` is treated like the default `message` type.
    pub fn decode_event(&mut self, name: &str, data: &str) -> Vec<StreamEvent> {
        let explicit = Some(name.trim())
            .filter(|n| !n.is_empty())
            .map(EventType::from_sse_name);
        let kind = explicit.unwrap_or(EventType::Content);

        if data.trim().is_empty() {
            return match explicit {
                Some(EventType::Start | EventType::End | EventType::Error) => {
                    vec![self.bare_event(kind)]
                }
                _ => {
                    trace!("Dropping SSE event '{}' without data", name);
                    Vec::new()
                }
            };
        }

        let payload = match serde_json::from_str::<Value>(data) {
            Ok(value @ Value::Object(_)) => value,
            Ok(Value::String(text)) => json!({ "content": text }),
            Ok(_) | Err(_) => {
                debug!("SSE data is not a JSON object, treating it as text");
                json!({ "content": data })
            }
        };

        self.project(kind, &payload)
    }

    fn bare_event(&self, kind: EventType) -> StreamEvent {
        let conversation_id = self.conversation_id.clone();
        match kind {
            EventType::Start => StreamEvent::Start { conversation_id },
            EventType::End => StreamEvent::End { conversation_id },
            _ => StreamEvent::Error {
                message: UNKNOWN_STREAM_ERROR.to_string(),
                conversation_id,
            },
        }
    }

    /// Project a generic JSON payload onto typed events
    fn project(&mut self, kind: EventType, payload: &Value) -> Vec<StreamEvent> {
        let message = payload
            .get("data")
            .and_then(|d| d.get("message"))
            .filter(|m| m.is_object());

        let conversation_id = non_empty_str(payload.get("conversationId"))
            .or_else(|| message.and_then(|m| non_empty_str(m.get("conversationId"))));
        if let Some(id) = conversation_id {
            self.conversation_id = Some(id.to_string());
        }
        let conversation_id = self.conversation_id.clone();

        let mut text: Option<String> = None;
        let mut tool: Option<String> = None;

        if let Some(message) = message {
            let sender = message.get("sender").and_then(Value::as_str);
            if matches!(kind, EventType::Content | EventType::ToolUse) {
                match sender {
                    Some("human") => {
                        trace!("Skipping echoed human message");
                        return Vec::new();
                    }
                    Some("system") if !self.include_thinking => {
                        trace!("Skipping thinking message");
                        return Vec::new();
                    }
                    _ => {}
                }
            }

            let mut parts: Vec<&str> = Vec::new();
            if let Some(blocks) = message.get("content").and_then(Value::as_array) {
                for block in blocks.iter().filter(|b| b.is_object()) {
                    match block.get("textMessage") {
                        Some(Value::String(s)) => parts.push(s),
                        Some(obj @ Value::Object(_)) => {
                            if let Some(s) = obj.get("message").and_then(Value::as_str) {
                                parts.push(s);
                            }
                        }
                        _ => {}
                    }
                    if let Some(tools) = block.get("tools").and_then(Value::as_array) {
                        for t in tools {
                            if let Some(name) = t.get("name").and_then(Value::as_str) {
                                tool = Some(name.to_string());
                            }
                        }
                    }
                }
            }
            if !parts.is_empty() {
                text = Some(parts.concat());
            }
        } else if let Some(content) = payload.get("content").and_then(Value::as_str) {
            text = Some(content.to_string());
        }

        if tool.is_none() {
            tool = non_empty_str(payload.get("toolName")).map(str::to_string);
        }

        match kind {
            EventType::Start => vec![StreamEvent::Start { conversation_id }],
            EventType::End => vec![StreamEvent::End { conversation_id }],
            EventType::Error => vec![StreamEvent::Error {
                message: error_message(payload),
                conversation_id,
            }],
            EventType::ToolUse => vec![StreamEvent::ToolUse {
                tool_name: tool.unwrap_or_default(),
                conversation_id,
            }],
            EventType::Content => {
                let mut events = Vec::with_capacity(2);
                if let Some(text) = text.filter(|t| !t.is_empty()) {
                    events.push(StreamEvent::Content {
                        text,
                        conversation_id: conversation_id.clone(),
                    });
                }
                if let Some(tool_name) = tool {
                    events.push(StreamEvent::ToolUse {
                        tool_name,
                        conversation_id,
                    });
                }
                events
            }
        }
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn error_message(payload: &Value) -> String {
    match payload.get("error") {
        Some(Value::String(s)) if !s.is_empty() => return s.clone(),
        Some(obj @ Value::Object(_)) => {
            if let Some(s) = non_empty_str(obj.get("message")) {
                return s.to_string();
            }
        }
        _ => {}
    }
    non_empty_str(payload.get("message"))
        .or_else(|| non_empty_str(payload.get("content")))
        .unwrap_or(UNKNOWN_STREAM_ERROR)
        .to_string()
}
