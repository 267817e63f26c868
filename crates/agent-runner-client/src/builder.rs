//! Fluent builder for configuring and executing agent sessions.

use std::{
    collections::HashSet,
    path::PathBuf,
    sync::Arc,
};

use agent_runner_core::{
    RunnerConfig, ToolRegistry,
    types::{AgentDefinition, CallbackConfig, StreamEvent, ToolsDefinition},
};
use futures::StreamExt;
use serde_json::{Map, Value};

use crate::client::RunnerClient;
use crate::error::ClientError;
use crate::sse::EventStream;

/// Per-event-type handler slots.
///
/// Unset slots make dispatch a no-op for that type, and unrecognized event
/// types are ignored.
#[derive(Default)]
struct EventHandlers {
    text: Option<Box<dyn FnMut(&str) + Send>>,
    tool_call: Option<Box<dyn FnMut(&str, &Map<String, Value>) + Send>>,
    tool_result: Option<Box<dyn FnMut(&str, bool, &str) + Send>>,
    thinking: Option<Box<dyn FnMut(&str) + Send>>,
    error: Option<Box<dyn FnMut(&str) + Send>>,
    done: Option<Box<dyn FnMut(&Map<String, Value>) + Send>>,
}

impl EventHandlers {
    fn dispatch(&mut self, event: &StreamEvent) {
        match event.event_type.as_str() {
            "text" => {
                if let Some(handler) = &mut self.text {
                    handler(event.text_content().unwrap_or_default());
                }
            }
            "tool_call" => {
                if let Some(handler) = &mut self.tool_call {
                    let empty = Map::new();
                    handler(
                        event.tool_name().unwrap_or_default(),
                        event.tool_args().unwrap_or(&empty),
                    );
                }
            }
            "tool_result" => {
                if let Some(handler) = &mut self.tool_result {
                    handler(
                        event.tool_name().unwrap_or_default(),
                        event
                            .data
                            .get("success")
                            .and_then(Value::as_bool)
                            .unwrap_or(false),
                        event
                            .data
                            .get("content")
                            .and_then(Value::as_str)
                            .unwrap_or_default(),
                    );
                }
            }
            "thinking" => {
                if let Some(handler) = &mut self.thinking {
                    handler(event.text_content().unwrap_or_default());
                }
            }
            "error" => {
                if let Some(handler) = &mut self.error {
                    handler(event.error_message().unwrap_or_default());
                }
            }
            "done" => {
                if let Some(handler) = &mut self.done {
                    handler(&event.data);
                }
            }
            _ => {}
        }
    }
}

/// A session started in manual mode.
///
/// The caller owns the stream and is responsible for consuming or dropping
/// it; dropping releases the connection.
pub struct StartedSession {
    pub session_id: String,
    pub stream: EventStream,
}

/// Builds and executes one agent session.
///
/// Obtained from [`crate::AgentRunner::agent`]; configure fluently, then
/// commit with [`run`](Self::run), [`start`](Self::start), or
/// [`dispatch`](Self::dispatch). Every mode creates the session and sends
/// the message; they differ only in how the outcome is consumed.
pub struct AgentBuilder {
    client: RunnerClient,
    registry: Arc<ToolRegistry>,
    config: RunnerConfig,
    name: String,
    model: Option<String>,
    system_prompt: Option<String>,
    max_turns: Option<u32>,
    max_tokens: Option<u32>,
    temperature: Option<f64>,
    builtin_tools: Vec<String>,
    remote_tool_names: Vec<String>,
    all_remote_tools: bool,
    session_id: Option<String>,
    work_dir: Option<PathBuf>,
    callback_override: Option<CallbackConfig>,
    handlers: EventHandlers,
}

impl AgentBuilder {
    pub(crate) fn new(
        client: RunnerClient,
        registry: Arc<ToolRegistry>,
        config: RunnerConfig,
        name: String,
    ) -> Self {
        Self {
            client,
            registry,
            config,
            name,
            model: None,
            system_prompt: None,
            max_turns: None,
            max_tokens: None,
            temperature: None,
            builtin_tools: Vec::new(),
            remote_tool_names: Vec::new(),
            all_remote_tools: false,
            session_id: None,
            work_dir: None,
            callback_override: None,
            handlers: EventHandlers::default(),
        }
    }

    /// Set the LLM model.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the system prompt.
    #[must_use]
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Set the maximum number of agent-loop turns.
    #[must_use]
    pub fn max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = Some(max_turns);
        self
    }

    /// Set the maximum tokens per LLM response.
    #[must_use]
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the sampling temperature.
    #[must_use]
    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Add built-in tools (read_file, write_file, bash, ...).
    #[must_use]
    pub fn tools<I>(mut self, tools: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.builtin_tools.extend(tools.into_iter().map(Into::into));
        self
    }

    /// Select remote tools by name.
    #[must_use]
    pub fn remote_tools<I>(mut self, names: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.remote_tool_names
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Advertise every registered remote tool.
    #[must_use]
    pub fn with_all_remote_tools(mut self) -> Self {
        self.all_remote_tools = true;
        self
    }

    /// Use a caller-chosen session id instead of a server-generated one.
    #[must_use]
    pub fn session_id(mut self, id: impl Into<String>) -> Self {
        self.session_id = Some(id.into());
        self
    }

    /// Set the working directory for built-in tools.
    #[must_use]
    pub fn work_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(path.into());
        self
    }

    /// Override the configured callback target for this session.
    #[must_use]
    pub fn callback(mut self, base_url: impl Into<String>, timeout_sec: Option<u64>) -> Self {
        self.callback_override = Some(CallbackConfig {
            base_url: base_url.into(),
            timeout_sec,
        });
        self
    }

    /// Handle `text` events.
    #[must_use]
    pub fn on_text<F: FnMut(&str) + Send + 'static>(mut self, handler: F) -> Self {
        self.handlers.text = Some(Box::new(handler));
        self
    }

    /// Handle `tool_call` events with (tool name, arguments).
    #[must_use]
    pub fn on_tool_call<F: FnMut(&str, &Map<String, Value>) + Send + 'static>(
        mut self,
        handler: F,
    ) -> Self {
        self.handlers.tool_call = Some(Box::new(handler));
        self
    }

    /// Handle `tool_result` events with (tool name, success, content).
    #[must_use]
    pub fn on_tool_result<F: FnMut(&str, bool, &str) + Send + 'static>(
        mut self,
        handler: F,
    ) -> Self {
        self.handlers.tool_result = Some(Box::new(handler));
        self
    }

    /// Handle `thinking` events.
    #[must_use]
    pub fn on_thinking<F: FnMut(&str) + Send + 'static>(mut self, handler: F) -> Self {
        self.handlers.thinking = Some(Box::new(handler));
        self
    }

    /// Handle `error` events.
    #[must_use]
    pub fn on_error<F: FnMut(&str) + Send + 'static>(mut self, handler: F) -> Self {
        self.handlers.error = Some(Box::new(handler));
        self
    }

    /// Handle the terminal `done` event.
    #[must_use]
    pub fn on_done<F: FnMut(&Map<String, Value>) + Send + 'static>(mut self, handler: F) -> Self {
        self.handlers.done = Some(Box::new(handler));
        self
    }

    /// Synchronous mode: create the session, send the message, consume the
    /// stream dispatching registered handlers, and return the last terminal
    /// event observed (`None` if the stream ended without one).
    ///
    /// # Errors
    /// Returns error on any transport or API failure, including stream
    /// failures before a terminal event.
    pub async fn run(mut self, message: &str) -> Result<Option<StreamEvent>, ClientError> {
        let session_id = self.commit(message).await?;
        let mut stream = self.client.open_stream(&session_id).await?;

        let mut last_done = None;
        while let Some(event) = stream.next().await {
            let event = event?;
            self.handlers.dispatch(&event);
            if event.is_done() {
                last_done = Some(event);
            }
        }

        Ok(last_done)
    }

    /// Manual mode: create the session, send the message, and hand the
    /// unconsumed stream to the caller.
    ///
    /// # Errors
    /// Returns error on any transport or API failure, including a stream
    /// that cannot be opened.
    pub async fn start(mut self, message: &str) -> Result<StartedSession, ClientError> {
        let session_id = self.commit(message).await?;
        let stream = self.client.open_stream(&session_id).await?;
        Ok(StartedSession { session_id, stream })
    }

    /// Fire-and-forget mode: create the session, send the message, and
    /// return the session id. The outcome arrives on the status-callback
    /// channel.
    ///
    /// # Errors
    /// Returns error on transport or API failure.
    pub async fn dispatch(mut self, message: &str) -> Result<String, ClientError> {
        self.commit(message).await
    }

    async fn commit(&mut self, message: &str) -> Result<String, ClientError> {
        let agent = self.agent_definition();
        let callback = self
            .callback_override
            .as_ref()
            .or(self.config.callback.as_ref());

        let created = self
            .client
            .create_session(
                &agent,
                callback,
                self.session_id.as_deref(),
                self.work_dir.as_deref(),
            )
            .await?;

        tracing::debug!("created session {}", created.session_id);
        self.client.send_message(&created.session_id, message).await?;

        Ok(created.session_id)
    }

    fn agent_definition(&self) -> AgentDefinition {
        let defaults = &self.config.defaults;
        AgentDefinition {
            name: self.name.clone(),
            model: self
                .model
                .clone()
                .unwrap_or_else(|| defaults.model.clone()),
            system_prompt: self.system_prompt.clone().unwrap_or_default(),
            max_turns: self.max_turns.unwrap_or(defaults.max_turns),
            max_tokens: self.max_tokens.or(defaults.max_tokens),
            temperature: self.temperature.or(defaults.temperature),
            tools: self.tools_definition(),
        }
    }

    /// Remote selection has three wire representations that must stay
    /// distinct: the all-tools wildcard, an explicitly empty list, and a
    /// named subset.
    fn tools_definition(&self) -> ToolsDefinition {
        let remote = if self.all_remote_tools {
            self.registry.definitions(None)
        } else {
            self.registry.definitions(Some(&self.remote_tool_names))
        };

        ToolsDefinition {
            builtin: dedup_ordered(&self.builtin_tools),
            remote,
        }
    }
}

fn dedup_ordered(names: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .iter()
        .filter(|name| seen.insert(name.as_str()))
        .cloned()
        .collect()
}
