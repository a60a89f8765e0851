//! Wire types for the agent service
//!
//! Request types serialize to the camelCase JSON the service expects;
//! response types are lenient and default every optional field.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Request to invoke an agent
///
/// An entirely empty request is valid and relies on the agent's default prompt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvokeRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub parameters: Map<String, Value>,
}

impl InvokeRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Continue an existing conversation; empty ids are ignored
    pub fn with_conversation_id(mut self, conversation_id: impl Into<String>) -> Self {
        let id = conversation_id.into();
        self.conversation_id = if id.is_empty() { None } else { Some(id) };
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn with_parameters(mut self, parameters: Map<String, Value>) -> Self {
        self.parameters.extend(parameters);
        self
    }
}

/// Token usage statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

/// Response from a unary agent invocation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvokeResponse {
    /// Opaque id, stable across the turns of one conversation
    #[serde(default)]
    pub conversation_id: String,

    #[serde(default)]
    pub response: String,

    /// Tool names in usage order; duplicates are kept
    #[serde(default, deserialize_with = "null_as_default")]
    pub tools_used: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// The five stream event variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Start,
    Content,
    ToolUse,
    End,
    Error,
}

impl EventType {
    /// Map a service-side SSE event name
    ///
    /// Unknown names fall back to `Content`.
    pub fn from_sse_name(name: &str) -> Self {
        match name.trim() {
            "stream-start" => Self::Start,
            "message" => Self::Content,
            "tool-use" => Self::ToolUse,
            "stream-completed" => Self::End,
            "error" | "fatal-error" => Self::Error,
            _ => Self::Content,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::End | Self::Error)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::Content => "content",
            Self::ToolUse => "tool_use",
            Self::End => "end",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// One decoded event of an agent stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Start {
        conversation_id: Option<String>,
    },
    Content {
        text: String,
        conversation_id: Option<String>,
    },
    ToolUse {
        tool_name: String,
        conversation_id: Option<String>,
    },
    End {
        conversation_id: Option<String>,
    },
    Error {
        message: String,
        conversation_id: Option<String>,
    },
}

impl StreamEvent {
    pub fn event_type(&self) -> EventType {
        match self {
            Self::Start { .. } => EventType::Start,
            Self::Content { .. } => EventType::Content,
            Self::ToolUse { .. } => EventType::ToolUse,
            Self::End { .. } => EventType::End,
            Self::Error { .. } => EventType::Error,
        }
    }

    pub fn conversation_id(&self) -> Option<&str> {
        match self {
            Self::Start { conversation_id }
            | Self::Content { conversation_id, .. }
            | Self::ToolUse { conversation_id, .. }
            | Self::End { conversation_id }
            | Self::Error { conversation_id, .. } => conversation_id.as_deref(),
        }
    }

    /// Text of a `content` event
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Content { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Tool name of a `tool_use` event
    pub fn tool_name(&self) -> Option<&str> {
        match self {
            Self::ToolUse { tool_name, .. } => Some(tool_name),
            _ => None,
        }
    }

    /// Message of an `error` event
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Error { message, .. } => Some(message),
            _ => None,
        }
    }

    /// `end` and `error` close a stream
    pub fn is_terminal(&self) -> bool {
        self.event_type().is_terminal()
    }
}

/// Agent metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentInfo {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Ability names; entity references are flattened to their name (or id)
    #[serde(default, deserialize_with = "ability_names")]
    pub abilities: Vec<String>,

    #[serde(default)]
    pub api_enabled: bool,
}

/// Bot metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotInfo {
    pub id: String,
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Reference to the user this bot acts as
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_user: Option<Value>,
}

/// Persona metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaInfo {
    pub id: String,
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// System prompt that defines the persona's behavior
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,

    #[serde(default = "default_persona_provider")]
    pub provider: String,
}

fn default_persona_provider() -> String {
    "system".to_string()
}

/// Ability metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbilityInfo {
    pub id: String,
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fully_qualified_name: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub tools: Vec<String>,
}

/// Reference to another entity by id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityReference {
    pub id: String,

    #[serde(rename = "type")]
    pub entity_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl EntityReference {
    pub fn new(id: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entity_type: entity_type.into(),
            name: None,
            display_name: None,
        }
    }
}

/// What data a new agent may access
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeScope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_types: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub services: Option<Vec<EntityReference>>,
}

/// How an agent can be used
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentMode {
    #[default]
    Chat,
    Agent,
    Both,
}

/// Request to create a dynamic agent
///
/// `persona` and `abilities` hold names; the client resolves them to entity
/// references before sending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAgentRequest {
    pub name: String,
    pub description: String,
    pub persona: String,
    pub mode: AgentMode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    /// Bot that executes the agent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_name: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub abilities: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge: Option<KnowledgeScope>,

    /// Workflow definition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,

    /// Cron expression for scheduled runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,

    #[serde(default)]
    pub api_enabled: bool,

    #[serde(default = "default_user_provider")]
    pub provider: String,
}

impl CreateAgentRequest {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        persona: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            persona: persona.into(),
            mode: AgentMode::default(),
            display_name: None,
            icon: None,
            bot_name: None,
            abilities: Vec::new(),
            knowledge: None,
            prompt: None,
            schedule: None,
            api_enabled: false,
            provider: default_user_provider(),
        }
    }

    pub fn with_mode(mut self, mode: AgentMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_bot(mut self, bot_name: impl Into<String>) -> Self {
        self.bot_name = Some(bot_name.into());
        self
    }

    pub fn with_ability(mut self, ability: impl Into<String>) -> Self {
        self.abilities.push(ability.into());
        self
    }

    pub fn with_knowledge(mut self, knowledge: KnowledgeScope) -> Self {
        self.knowledge = Some(knowledge);
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn with_schedule(mut self, schedule: impl Into<String>) -> Self {
        self.schedule = Some(schedule.into());
        self
    }

    pub fn with_api_enabled(mut self, api_enabled: bool) -> Self {
        self.api_enabled = api_enabled;
        self
    }
}

/// Request to create a persona
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePersonaRequest {
    pub name: String,
    pub description: String,
    pub prompt: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default = "default_user_provider")]
    pub provider: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owners: Option<Vec<EntityReference>>,
}

impl CreatePersonaRequest {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            prompt: prompt.into(),
            display_name: None,
            provider: default_user_provider(),
            owners: None,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_owner(mut self, owner: EntityReference) -> Self {
        self.owners.get_or_insert_with(Vec::new).push(owner);
        self
    }
}

fn default_user_provider() -> String {
    "user".to_string()
}

/// Cursor paging metadata of a list response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paging {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

/// `{data, paging}` envelope of list endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,

    #[serde(default)]
    pub paging: Paging,
}

impl<T> Page<T> {
    /// Cursor for the next page, if there is one
    pub fn next_cursor(&self) -> Option<&str> {
        self.paging.after.as_deref().filter(|c| !c.is_empty())
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AbilityRef {
    Name(String),
    Reference {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        id: Option<String>,
    },
}

fn ability_names<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let refs: Option<Vec<AbilityRef>> = Option::deserialize(deserializer)?;
    Ok(refs
        .unwrap_or_default()
        .into_iter()
        .map(|r| match r {
            AbilityRef::Name(name) => name,
            AbilityRef::Reference { name, id } => name.or(id).unwrap_or_default(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_invoke_request_omits_empty_fields() {
        let request = InvokeRequest::new().with_message("Analyze the orders table");
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"message": "Analyze the orders table"})
        );

        let request = InvokeRequest::new()
            .with_conversation_id("conv-1")
            .with_parameter("table", "orders");
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"conversationId": "conv-1", "parameters": {"table": "orders"}})
        );

        assert_eq!(serde_json::to_value(InvokeRequest::new()).unwrap(), json!({}));
        assert_eq!(InvokeRequest::new().with_conversation_id("").conversation_id, None);
    }

    #[test]
    fn test_create_persona_request_wire_format() {
        let request = CreatePersonaRequest::new("analyst", "Answers data questions", "You are a data analyst.")
            .with_owner(EntityReference::new("u1", "user"));
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "name": "analyst",
                "description": "Answers data questions",
                "prompt": "You are a data analyst.",
                "provider": "user",
                "owners": [{"id": "u1", "type": "user"}]
            })
        );
    }

    #[test]
    fn test_invoke_response_defaults() {
        let response: InvokeResponse = serde_json::from_value(json!({
            "conversationId": "c1",
            "response": "done",
            "toolsUsed": null
        }))
        .unwrap();
        assert_eq!(response.conversation_id, "c1");
        assert!(response.tools_used.is_empty());
        assert!(response.usage.is_none());

        let response: InvokeResponse = serde_json::from_value(json!({
            "conversationId": "c1",
            "response": "done",
            "toolsUsed": ["search", "search"],
            "usage": {"promptTokens": 10, "completionTokens": 5, "totalTokens": 15}
        }))
        .unwrap();
        assert_eq!(response.tools_used, vec!["search", "search"]);
        assert_eq!(response.usage.unwrap().total_tokens, 15);
    }

    #[test]
    fn test_event_type_mapping() {
        assert_eq!(EventType::from_sse_name("stream-start"), EventType::Start);
        assert_eq!(EventType::from_sse_name("message"), EventType::Content);
        assert_eq!(EventType::from_sse_name("tool-use"), EventType::ToolUse);
        assert_eq!(EventType::from_sse_name("stream-completed"), EventType::End);
        assert_eq!(EventType::from_sse_name("fatal-error"), EventType::Error);
        assert_eq!(EventType::from_sse_name("heartbeat"), EventType::Content);
        assert_eq!(EventType::ToolUse.to_string(), "tool_use");
    }

    #[test]
    fn test_stream_event_accessors() {
        let event = StreamEvent::Content {
            text: "Hello".into(),
            conversation_id: Some("c1".into()),
        };
        assert_eq!(event.text(), Some("Hello"));
        assert_eq!(event.conversation_id(), Some("c1"));
        assert!(!event.is_terminal());

        let event = StreamEvent::Error {
            message: "boom".into(),
            conversation_id: None,
        };
        assert!(event.is_terminal());
        assert_eq!(event.error(), Some("boom"));
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"type": "error", "message": "boom", "conversation_id": null})
        );
    }

    #[test]
    fn test_agent_info_abilities_accept_strings_and_references() {
        let info: AgentInfo = serde_json::from_value(json!({
            "name": "Planner",
            "displayName": "Planner Agent",
            "abilities": [{"id": "a1", "name": "search"}, {"id": "a2"}],
            "apiEnabled": true
        }))
        .unwrap();
        assert_eq!(info.abilities, vec!["search", "a2"]);
        assert!(info.api_enabled);

        let info: AgentInfo = serde_json::from_value(json!({
            "name": "Planner",
            "abilities": ["search", "lineage"]
        }))
        .unwrap();
        assert_eq!(info.abilities, vec!["search", "lineage"]);
        assert!(!info.api_enabled);
    }

    #[test]
    fn test_page_cursor() {
        let page: Page<AgentInfo> = serde_json::from_value(json!({
            "data": [{"name": "a"}],
            "paging": {"after": "next", "total": 3}
        }))
        .unwrap();
        assert_eq!(page.next_cursor(), Some("next"));

        let page: Page<AgentInfo> = serde_json::from_value(json!({"data": []})).unwrap();
        assert_eq!(page.next_cursor(), None);
    }
}
