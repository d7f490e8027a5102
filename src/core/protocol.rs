//! MCP Protocol Message Types
//!
//! JSON-RPC 2.0 request/response structures and the MCP payloads carried
//! inside them (tool definitions and tool call results).

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// MCP protocol revision advertised in initialize responses
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// JSON-RPC version every request must declare
pub const JSONRPC_VERSION: &str = "2.0";

/// Standard JSON-RPC 2.0 error codes
pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;

/// JSON-RPC 2.0 request structure for MCP protocol.
///
/// `id` is None only when the key is absent (a notification). An explicit
/// `"id": null` deserializes to `Some(Value::Null)` and is answered.
#[derive(Deserialize, Debug)]
pub struct MCPRequest {
    /// JSON-RPC version identifier; anything but "2.0" is an invalid request
    pub jsonrpc: String,
    /// Request ID for correlating responses. None indicates a notification.
    #[serde(default, deserialize_with = "present_id")]
    pub id: Option<Value>,
    /// MCP method name (e.g., "initialize", "tools/list", "tools/call")
    pub method: String,
    /// Method-specific parameters as JSON value
    #[serde(default)]
    pub params: Option<Value>,
}

/// Keep a present `id` even when its value is null.
///
/// Only runs when the key exists; `#[serde(default)]` covers absence.
fn present_id<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl MCPRequest {
    /// True for messages sent without an `id`, which must not be answered.
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// True if the request declares JSON-RPC 2.0.
    pub fn has_valid_version(&self) -> bool {
        self.jsonrpc == JSONRPC_VERSION
    }
}

/// JSON-RPC 2.0 response structure for MCP protocol.
///
/// Exactly one of `result` and `error` is present.
#[derive(Serialize, Debug)]
pub struct MCPResponse {
    /// JSON-RPC version identifier, always "2.0"
    pub jsonrpc: String,
    /// Request ID from the original request
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<MCPError>,
}

impl MCPResponse {
    /// Successful response carrying `result`.
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Error response with a code and message.
    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self::error_with_data(id, code, message, None)
    }

    /// Error response that also carries structured detail in `error.data`.
    ///
    /// # Arguments
    /// * `id` - Request ID being answered
    /// * `code` - JSON-RPC error code
    /// * `message` - Short human-readable summary
    /// * `data` - Extra detail for the client, omitted from the JSON when None
    pub fn error_with_data(
        id: Option<Value>,
        code: i32,
        message: impl Into<String>,
        data: Option<Value>,
    ) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(MCPError {
                code,
                message: message.into(),
                data,
            }),
        }
    }
}

/// JSON-RPC 2.0 error structure.
#[derive(Serialize, Debug)]
pub struct MCPError {
    /// JSON-RPC error code (e.g., -32601 for method not found)
    pub code: i32,
    /// Human-readable error message
    pub message: String,
    /// Structured detail, e.g. the parser's position for parse errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// MCP tool definition structure.
///
/// Serialized as-is in `tools/list` responses, with the schema field in
/// camelCase as MCP requires.
#[derive(Serialize, Debug, Clone)]
pub struct MCPTool {
    /// Unique tool identifier (e.g., "roll_dice")
    pub name: String,
    /// Human-readable description of what the tool does
    pub description: String,
    /// JSON Schema defining the tool's input parameters
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Parameters of a `tools/call` request.
#[derive(Deserialize, Debug)]
pub struct ToolCallParams {
    /// Registered tool name
    pub name: String,
    /// Tool arguments, an empty object when omitted
    #[serde(default = "empty_object")]
    pub arguments: Value,
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

/// Build the MCP content result for a successful tool call.
pub fn tool_success(result: &Value) -> Value {
    serde_json::json!({
        "content": [
            {
                "type": "text",
                "text": result.to_string()
            }
        ],
        "isError": false
    })
}

/// Build the MCP content result for a failed tool call.
pub fn tool_failure(message: &str) -> Value {
    serde_json::json!({
        "content": [
            {
                "type": "text",
                "text": format!("Error: {}", message)
            }
        ],
        "isError": true
    })
}
