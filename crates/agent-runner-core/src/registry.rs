//! In-memory registry for remote tools.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::types::{ToolDefinition, ToolRequest, ToolResponse};

/// A tool the remote agent can call back into the host application.
///
/// Register implementations explicitly via [`ToolRegistry::register`];
/// lifetime and sharing are the caller's concern.
#[async_trait]
pub trait RemoteTool: Send + Sync {
    /// Unique tool name. Must match `[a-zA-Z][a-zA-Z0-9_]*`.
    fn name(&self) -> &str;

    /// Human-readable description of what the tool does.
    fn description(&self) -> &str;

    /// JSON Schema for the tool's arguments.
    fn parameters(&self) -> Value;

    /// Execute the tool.
    ///
    /// # Errors
    /// Implementations may fail; the callback surface reports the failure
    /// to Agent Runner as a structured response rather than propagating it.
    async fn call(&self, request: &ToolRequest) -> anyhow::Result<ToolResponse>;
}

/// Registry of remote tools, kept in registration order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn RemoteTool>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Re-registering a name replaces the earlier entry
    /// in place, preserving its position.
    pub fn register(&mut self, tool: Arc<dyn RemoteTool>) {
        if let Some(existing) = self.tools.iter_mut().find(|t| t.name() == tool.name()) {
            *existing = tool;
        } else {
            self.tools.push(tool);
        }
    }

    /// Look up a tool by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn RemoteTool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    /// Whether a tool is registered under this name.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Registered tool names, in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Build tool definitions for the session payload.
    ///
    /// `None` selects every registered tool; an empty slice selects none;
    /// otherwise only the named tools that are actually registered. Order
    /// always follows registration order.
    #[must_use]
    pub fn definitions(&self, names: Option<&[String]>) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .filter(|tool| names.is_none_or(|names| names.iter().any(|n| n == tool.name())))
            .map(|tool| ToolDefinition {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters(),
            })
            .collect()
    }
}
