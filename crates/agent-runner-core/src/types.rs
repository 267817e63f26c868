//! Wire types for the Agent Runner protocol.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Session status as reported by Agent Runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Session exists but has not received a message yet.
    Created,
    /// The agent loop is running.
    Running,
    /// Session finished successfully.
    Completed,
    /// Session failed.
    Failed,
    /// Session was cancelled.
    Cancelled,
}

impl SessionStatus {
    /// Whether this status ends the session.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// Session data returned by the get and delete operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub status: SessionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

/// Response to `POST /v1/sessions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
    pub status: SessionStatus,
}

/// Response to `POST /v1/sessions/{id}/messages`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageResponse {
    pub session_id: String,
    pub status: SessionStatus,
    /// Remote tool names the service registered for this session.
    #[serde(default)]
    pub tools_registered: Vec<String>,
}

/// Agent definition sent when creating a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDefinition {
    pub name: String,
    pub model: String,
    pub system_prompt: String,
    pub max_turns: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    pub tools: ToolsDefinition,
}

/// Tool selection advertised with an agent definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsDefinition {
    /// Built-in tool names, deduplicated, in the order first requested.
    pub builtin: Vec<String>,
    /// Remote tool definitions the service may call back for.
    pub remote: Vec<ToolDefinition>,
}

/// A remote tool advertised to Agent Runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema for the tool's arguments.
    pub parameters: Value,
}

/// Callback target for remote tool execution and status notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackConfig {
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_sec: Option<u64>,
}

impl CallbackConfig {
    /// Create a callback config for a base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_sec: None,
        }
    }
}

/// A single event from the session stream.
///
/// Recognized types: `text`, `tool_call`, `tool_result`, `thinking`,
/// `error`, `done`. Unknown types pass through and are ignored by
/// dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamEvent {
    pub event_type: String,
    pub data: Map<String, Value>,
}

impl StreamEvent {
    /// Create an event from a type and decoded payload.
    #[must_use]
    pub fn new(event_type: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            event_type: event_type.into(),
            data,
        }
    }

    /// Whether this is the terminal `done` event.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.event_type == "done"
    }

    /// Text content for `text` and `thinking` events.
    #[must_use]
    pub fn text_content(&self) -> Option<&str> {
        self.data.get("content").and_then(Value::as_str)
    }

    /// Tool name for `tool_call` and `tool_result` events.
    #[must_use]
    pub fn tool_name(&self) -> Option<&str> {
        self.data.get("tool").and_then(Value::as_str)
    }

    /// Tool arguments for `tool_call` events.
    #[must_use]
    pub fn tool_args(&self) -> Option<&Map<String, Value>> {
        self.data.get("args").and_then(Value::as_object)
    }

    /// Message for `error` events.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.data.get("message").and_then(Value::as_str)
    }

    /// Final session status carried by a `done` event.
    #[must_use]
    pub fn done_status(&self) -> Option<&str> {
        self.data.get("status").and_then(Value::as_str)
    }

    /// Final output carried by a `done` event.
    #[must_use]
    pub fn done_output(&self) -> Option<&str> {
        self.data.get("output").and_then(Value::as_str)
    }

    /// Turn count carried by a `done` event.
    #[must_use]
    pub fn done_turns(&self) -> Option<u64> {
        self.data.get("turns").and_then(Value::as_u64)
    }

    /// Wall-clock duration carried by a `done` event.
    #[must_use]
    pub fn done_duration_ms(&self) -> Option<u64> {
        self.data.get("duration_ms").and_then(Value::as_u64)
    }
}

/// Status notification pushed by Agent Runner to the host application.
///
/// `status` stays a raw string: the service may introduce values this
/// client does not recognize, and those must be representable (they are
/// accepted and ignored).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusPayload {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub client_id: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turns: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl StatusPayload {
    /// The typed status, if the raw value is one of the recognized five.
    #[must_use]
    pub fn session_status(&self) -> Option<SessionStatus> {
        match self.status.as_str() {
            "created" => Some(SessionStatus::Created),
            "running" => Some(SessionStatus::Running),
            "completed" => Some(SessionStatus::Completed),
            "failed" => Some(SessionStatus::Failed),
            "cancelled" => Some(SessionStatus::Cancelled),
            _ => None,
        }
    }

    /// Whether the notification reports a terminal status.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.session_status()
            .is_some_and(SessionStatus::is_terminal)
    }
}

/// Tool invocation pushed by Agent Runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolRequest {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub tool_name: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl ToolRequest {
    /// Look up a single argument by key.
    #[must_use]
    pub fn argument(&self, key: &str) -> Option<&Value> {
        self.arguments.get(key)
    }
}

/// Result of executing a remote tool, returned to Agent Runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResponse {
    /// Successful execution with content.
    #[must_use]
    pub fn ok(content: impl Into<String>) -> Self {
        Self {
            success: true,
            content: Some(content.into()),
            error: None,
        }
    }

    /// Failed execution with an error description.
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            content: None,
            error: Some(error.into()),
        }
    }
}
