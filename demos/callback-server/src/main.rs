//! Demo host application for the Agent Runner client.
//!
//! Serves the callback endpoints (tool execution + status) and, when
//! `AGENT_RUNNER_DEMO_PROMPT` is set, drives one streamed agent session
//! against the configured service.
//!
//! Run with: cargo run -p callback-server-demo

use std::{net::SocketAddr, sync::Arc};

use agent_runner_callbacks::{CallbackState, StatusListener, router};
use agent_runner_client::AgentRunner;
use agent_runner_core::{
    RemoteTool, RunnerConfig, ToolRegistry,
    types::{StatusPayload, ToolRequest, ToolResponse},
};
use async_trait::async_trait;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Counts words in a block of text. A deliberately small remote tool so
/// the callback round trip is easy to observe.
struct WordCountTool;

#[async_trait]
impl RemoteTool for WordCountTool {
    fn name(&self) -> &str {
        "word_count"
    }

    fn description(&self) -> &str {
        "Counts the words in the given text"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "text": {"type": "string", "description": "Text to count"}
            },
            "required": ["text"]
        })
    }

    async fn call(&self, request: &ToolRequest) -> anyhow::Result<ToolResponse> {
        let text = request
            .argument("text")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow::anyhow!("missing 'text' argument"))?;
        Ok(ToolResponse::ok(text.split_whitespace().count().to_string()))
    }
}

struct LoggingListener;

#[async_trait]
impl StatusListener for LoggingListener {
    async fn on_status(&self, payload: StatusPayload) {
        tracing::info!(
            "session {} is now '{}' (turns: {:?})",
            payload.session_id,
            payload.status,
            payload.turns
        );
        if let Some(error) = payload.error {
            tracing::warn!("session {} error: {error}", payload.session_id);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = RunnerConfig::from_env();

    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(WordCountTool));
    let registry = Arc::new(registry);

    let state = CallbackState::new(&config.hmac_secret, Arc::clone(&registry))
        .with_listener(Arc::new(LoggingListener));

    let app = axum::Router::new()
        .nest("/api/agent-runner", router(state))
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([127, 0, 0, 1], 8080));
    tracing::info!("callback server listening on http://{addr}");

    if let Ok(prompt) = std::env::var("AGENT_RUNNER_DEMO_PROMPT") {
        let runner = AgentRunner::new(config, registry)?;
        tokio::spawn(async move {
            if let Err(e) = run_demo_session(&runner, &prompt).await {
                tracing::error!("demo session failed: {e}");
            }
        });
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Drive one synchronous session, printing events as they stream in.
async fn run_demo_session(
    runner: &AgentRunner,
    prompt: &str,
) -> Result<(), agent_runner_client::ClientError> {
    let session_id = format!("demo-{}", Uuid::new_v4());

    let done = runner
        .agent("demo")
        .system_prompt("You are a terse assistant.")
        .with_all_remote_tools()
        .session_id(&session_id)
        .on_text(|content| println!("{content}"))
        .on_tool_call(|tool, args| tracing::info!("agent called {tool}({args:?})"))
        .on_error(|message| tracing::warn!("agent error: {message}"))
        .run(prompt)
        .await?;

    match done {
        Some(event) => tracing::info!(
            "session {session_id} finished: {:?} in {:?} turns",
            event.done_status(),
            event.done_turns()
        ),
        None => tracing::warn!("session {session_id} stream ended without a terminal event"),
    }

    Ok(())
}
