//! Shared building blocks for the Agent Runner integration.
//!
//! This crate holds what both directions of the protocol need:
//! - Wire types (`AgentDefinition`, `StreamEvent`, `StatusPayload`, ...)
//! - `ToolRegistry` and the `RemoteTool` trait for host-side tools
//! - `RunnerConfig` for client configuration

pub mod config;
pub mod registry;
pub mod types;

pub use config::{AgentDefaults, HttpConfig, RunnerConfig};
pub use registry::{RemoteTool, ToolRegistry};
pub use types::{
    AgentDefinition, CallbackConfig, CreateSessionResponse, SendMessageResponse, Session,
    SessionStatus, StatusPayload, StreamEvent, ToolDefinition, ToolRequest, ToolResponse,
    ToolsDefinition,
};
