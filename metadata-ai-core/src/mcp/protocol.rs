//! JSON-RPC envelopes and tool descriptors for the MCP endpoint

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;

pub const JSONRPC_VERSION: &str = "2.0";
pub const METHOD_TOOLS_LIST: &str = "tools/list";
pub const METHOD_TOOLS_CALL: &str = "tools/call";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: String,
    pub method: String,
    pub params: Value,
}

impl JsonRpcRequest {
    /// Build a request with a short random id
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        let mut id = uuid::Uuid::new_v4().simple().to_string();
        id.truncate(8);
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            method: method.into(),
            params,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    #[serde(default)]
    pub code: i64,
    #[serde(default = "unknown_error")]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

fn unknown_error() -> String {
    "Unknown error".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    #[serde(default)]
    pub id: Option<Value>,
}

impl JsonRpcResponse {
    /// Split into the result or the error; a missing result is `{}`
    pub fn into_result(self) -> Result<Value, JsonRpcError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self
                .result
                .filter(|r| !r.is_null())
                .unwrap_or_else(|| Value::Object(Map::new()))),
        }
    }
}

/// JSON-Schema primitive of a tool parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl ParamType {
    /// Parse a JSON-Schema `type`; anything unrecognised is a string
    pub fn from_schema(value: Option<&Value>) -> Self {
        match value.and_then(Value::as_str) {
            Some("integer") => Self::Integer,
            Some("number") => Self::Number,
            Some("boolean") => Self::Boolean,
            Some("array") => Self::Array,
            Some("object") => Self::Object,
            _ => Self::String,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    pub param_type: ParamType,
    pub description: String,
    pub required: bool,
}

/// A callable tool as declared by the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    /// In schema declaration order
    pub parameters: Vec<ToolParameter>,
}

impl ToolDescriptor {
    /// Project one entry of a `tools/list` result
    ///
    /// Returns `None` when the entry has no name.
    pub fn from_value(value: &Value) -> Option<Self> {
        let name = value.get("name").and_then(Value::as_str)?.to_string();
        let description = value
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let parameters = value
            .get("inputSchema")
            .map(parse_parameters)
            .unwrap_or_default();

        Some(Self {
            name,
            description,
            parameters,
        })
    }

    pub fn required_parameters(&self) -> impl Iterator<Item = &ToolParameter> {
        self.parameters.iter().filter(|p| p.required)
    }
}

/// Translate an object schema into a parameter list
///
/// Non-object schemas have no parameters.
pub fn parse_parameters(schema: &Value) -> Vec<ToolParameter> {
    if schema.get("type").and_then(Value::as_str) != Some("object") {
        return Vec::new();
    }

    let required: HashSet<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Vec::new();
    };

    properties
        .iter()
        .map(|(name, prop)| ToolParameter {
            name: name.clone(),
            param_type: ParamType::from_schema(prop.get("type")),
            description: prop
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            required: required.contains(name.as_str()),
        })
        .collect()
}

/// Outcome of a `tools/call`
///
/// `data` is set on success, `error` on failure; never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolCallResult {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    /// Project a `tools/call` result
    ///
    /// The first `text` content item is parsed as JSON when it looks like an
    /// object and wrapped as `{"text": ...}` otherwise. No content yields `{}`.
    pub fn from_call_result(result: &Value) -> Self {
        let first_text = result
            .get("content")
            .and_then(Value::as_array)
            .and_then(|items| {
                items
                    .iter()
                    .find(|item| item.get("type").and_then(Value::as_str) == Some("text"))
            })
            .map(|item| item.get("text").and_then(Value::as_str).unwrap_or("{}"));

        if result.get("isError").and_then(Value::as_bool) == Some(true) {
            return Self::err(first_text.unwrap_or("Tool reported an error"));
        }

        let data = match first_text {
            Some(text) if text.trim_start().starts_with('{') => serde_json::from_str(text)
                .unwrap_or_else(|_| serde_json::json!({ "text": text })),
            Some(text) => serde_json::json!({ "text": text }),
            None => Value::Object(Map::new()),
        };

        Self::ok(data)
    }
}

/// Allow/deny lists applied to a tool listing
///
/// `include` narrows first, then `exclude` removes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Vec<String>>,
}

impl ToolFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn exclude<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn allows(&self, name: &str) -> bool {
        let included = self
            .include
            .as_ref()
            .is_none_or(|names| names.iter().any(|n| n == name));
        let excluded = self
            .exclude
            .as_ref()
            .is_some_and(|names| names.iter().any(|n| n == name));
        included && !excluded
    }

    pub fn apply(&self, tools: Vec<ToolDescriptor>) -> Vec<ToolDescriptor> {
        tools.into_iter().filter(|t| self.allows(&t.name)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn universe() -> Vec<ToolDescriptor> {
        ["A", "B", "C"]
            .into_iter()
            .map(|name| ToolDescriptor {
                name: name.to_string(),
                description: String::new(),
                parameters: Vec::new(),
            })
            .collect()
    }

    fn names(tools: &[ToolDescriptor]) -> Vec<&str> {
        tools.iter().map(|t| t.name.as_str()).collect()
    }

    #[test]
    fn test_filter_include_exclude() {
        let include = ToolFilter::new().include(["A"]);
        assert_eq!(names(&include.apply(universe())), vec!["A"]);

        let exclude = ToolFilter::new().exclude(["B"]);
        assert_eq!(names(&exclude.apply(universe())), vec!["A", "C"]);

        let both = ToolFilter::new().include(["A", "B"]).exclude(["B"]);
        assert_eq!(names(&both.apply(universe())), vec!["A"]);

        assert_eq!(ToolFilter::new().apply(universe()).len(), 3);
    }

    #[test]
    fn test_request_id_is_short() {
        let request = JsonRpcRequest::new(METHOD_TOOLS_LIST, json!({}));
        assert_eq!(request.id.len(), 8);
        assert_eq!(request.jsonrpc, "2.0");
    }

    #[test]
    fn test_parse_parameters() {
        let schema = json!({
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "Search text"},
                "size": {"type": "integer"},
                "filters": {"type": "weird"}
            },
            "required": ["query"]
        });
        let params = parse_parameters(&schema);
        assert_eq!(params.len(), 3);
        assert_eq!(params[0].name, "query");
        assert!(params[0].required);
        assert_eq!(params[0].description, "Search text");
        assert_eq!(params[1].param_type, ParamType::Integer);
        assert!(!params[1].required);
        assert_eq!(params[2].param_type, ParamType::String);

        assert!(parse_parameters(&json!({"type": "array"})).is_empty());
        assert!(parse_parameters(&json!({})).is_empty());
    }

    #[test]
    fn test_call_result_projection() {
        let result = json!({"content": [{"type": "text", "text": "{\"count\": 2}"}]});
        assert_eq!(ToolCallResult::from_call_result(&result).data, Some(json!({"count": 2})));

        let result = json!({"content": [{"type": "text", "text": "plain answer"}]});
        assert_eq!(
            ToolCallResult::from_call_result(&result).data,
            Some(json!({"text": "plain answer"}))
        );

        let result = json!({"content": [{"type": "text", "text": "{not json"}]});
        assert_eq!(
            ToolCallResult::from_call_result(&result).data,
            Some(json!({"text": "{not json"}))
        );

        assert_eq!(ToolCallResult::from_call_result(&json!({})).data, Some(json!({})));

        let result = json!({"isError": true, "content": [{"type": "text", "text": "entity not found"}]});
        let failed = ToolCallResult::from_call_result(&result);
        assert!(!failed.success);
        assert_eq!(failed.error.as_deref(), Some("entity not found"));
        assert_eq!(failed.data, None);
    }

    #[test]
    fn test_response_into_result() {
        let response: JsonRpcResponse =
            serde_json::from_value(json!({"jsonrpc": "2.0", "id": "1", "error": {"code": -32601, "message": "nope"}}))
                .unwrap();
        assert_eq!(response.into_result().unwrap_err().message, "nope");

        let response: JsonRpcResponse =
            serde_json::from_value(json!({"jsonrpc": "2.0", "id": "1"})).unwrap();
        assert_eq!(response.into_result().unwrap(), json!({}));
    }
}
