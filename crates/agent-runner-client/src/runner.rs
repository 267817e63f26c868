//! Entry point tying client, registry, and configuration together.

use std::sync::Arc;

use agent_runner_core::{RunnerConfig, ToolRegistry};

use crate::builder::AgentBuilder;
use crate::client::RunnerClient;
use crate::error::ClientError;

/// Owning handle for the Agent Runner integration.
///
/// Built explicitly by the caller from configuration and a tool registry;
/// there is no global state. Cheap to share: builders take clones of the
/// client and configuration.
pub struct AgentRunner {
    client: RunnerClient,
    registry: Arc<ToolRegistry>,
    config: RunnerConfig,
}

impl AgentRunner {
    /// Create the runner handle.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be constructed.
    pub fn new(config: RunnerConfig, registry: Arc<ToolRegistry>) -> Result<Self, ClientError> {
        Ok(Self {
            client: RunnerClient::new(&config)?,
            registry,
            config,
        })
    }

    /// Start configuring a session for the named agent.
    #[must_use]
    pub fn agent(&self, name: impl Into<String>) -> AgentBuilder {
        AgentBuilder::new(
            self.client.clone(),
            Arc::clone(&self.registry),
            self.config.clone(),
            name.into(),
        )
    }

    /// The underlying HTTP client, for low-level session calls.
    #[must_use]
    pub const fn client(&self) -> &RunnerClient {
        &self.client
    }

    /// The remote tool registry this runner advertises from.
    #[must_use]
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }
}
