//! The two inbound callback endpoints.

use agent_runner_core::types::{StatusPayload, ToolRequest, ToolResponse};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::post,
};
use serde_json::{Value, json};

use crate::state::CallbackState;
use crate::verify::verify_signature;

/// Build the callback router.
///
/// Mount it under the prefix Agent Runner is configured to call back to:
///
/// ```ignore
/// let app = Router::new().nest("/api/agent-runner", router(state));
/// ```
#[must_use]
pub fn router(state: CallbackState) -> Router {
    Router::new()
        .route("/tools/{tool_name}", post(handle_tool))
        .route("/sessions/{session_id}/status", post(handle_status))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            verify_signature,
        ))
        .with_state(state)
}

/// Execute a registered remote tool.
///
/// An unknown tool name and a failing handler are both structured
/// responses the service understands, never a propagated fault.
async fn handle_tool(
    State(state): State<CallbackState>,
    Path(tool_name): Path<String>,
    Json(request): Json<ToolRequest>,
) -> (StatusCode, Json<ToolResponse>) {
    let Some(tool) = state.registry.get(&tool_name) else {
        return (
            StatusCode::NOT_FOUND,
            Json(ToolResponse::failed(format!("Unknown tool: {tool_name}"))),
        );
    };

    match tool.call(&request).await {
        Ok(response) => (StatusCode::OK, Json(response)),
        Err(e) => {
            tracing::error!("tool '{tool_name}' failed for session {}: {e}", request.session_id);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ToolResponse::failed(format!(
                    "Tool '{tool_name}' execution failed: {e}"
                ))),
            )
        }
    }
}

/// Record a session status notification.
///
/// The session id from the path wins over anything in the body.
/// Unrecognized status values are acknowledged but trigger no action.
async fn handle_status(
    State(state): State<CallbackState>,
    Path(session_id): Path<String>,
    Json(mut payload): Json<StatusPayload>,
) -> Json<Value> {
    payload.session_id = session_id;

    if let Some(status) = payload.session_status() {
        tracing::debug!("session {} reported {status:?}", payload.session_id);
        if let Some(listener) = &state.listener {
            listener.on_status(payload).await;
        }
    } else {
        tracing::warn!(
            "session {} reported unrecognized status '{}'",
            payload.session_id,
            payload.status
        );
    }

    Json(json!({ "ok": true }))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use agent_runner_auth::HmacSigner;
    use agent_runner_core::{RemoteTool, ToolRegistry};
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::state::StatusListener;

    struct EchoTool;

    #[async_trait]
    impl RemoteTool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echoes its input back"
        }

        fn parameters(&self) -> Value {
            json!({"type": "object", "properties": {"input": {"type": "string"}}})
        }

        async fn call(&self, request: &ToolRequest) -> anyhow::Result<ToolResponse> {
            let input = request
                .argument("input")
                .and_then(Value::as_str)
                .unwrap_or_default();
            Ok(ToolResponse::ok(input.to_uppercase()))
        }
    }

    struct FailingTool;

    #[async_trait]
    impl RemoteTool for FailingTool {
        fn name(&self) -> &str {
            "flaky"
        }

        fn description(&self) -> &str {
            "Always fails"
        }

        fn parameters(&self) -> Value {
            json!({"type": "object"})
        }

        async fn call(&self, _request: &ToolRequest) -> anyhow::Result<ToolResponse> {
            anyhow::bail!("database unavailable")
        }
    }

    #[derive(Default)]
    struct RecordingListener {
        payloads: Mutex<Vec<StatusPayload>>,
    }

    #[async_trait]
    impl StatusListener for RecordingListener {
        async fn on_status(&self, payload: StatusPayload) {
            self.payloads.lock().unwrap().push(payload);
        }
    }

    fn registry() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        registry.register(Arc::new(FailingTool));
        Arc::new(registry)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn signed_post_json(uri: &str, body: Value, signer: &HmacSigner) -> Request<Body> {
        let bytes = body.to_string();
        let envelope = signer.sign(bytes.as_bytes());
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .header("X-Signature", envelope.signature)
            .header("X-Timestamp", envelope.timestamp)
            .header("X-Nonce", envelope.nonce)
            .body(Body::from(bytes))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn tool_body() -> Value {
        json!({"session_id": "s-1", "tool_name": "echo", "arguments": {"input": "hi"}})
    }

    #[tokio::test]
    async fn test_known_tool_executes() {
        let app = router(CallbackState::new("", registry()));

        let response = app
            .oneshot(post_json("/tools/echo", tool_body()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body, json!({"success": true, "content": "HI"}));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_a_structured_404() {
        let app = router(CallbackState::new("", registry()));

        let response = app
            .oneshot(post_json(
                "/tools/nope",
                json!({"session_id": "s-1", "tool_name": "nope", "arguments": {}}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Unknown tool: nope");
    }

    #[tokio::test]
    async fn test_failing_tool_reports_instead_of_propagating() {
        let app = router(CallbackState::new("", registry()));

        let response = app
            .oneshot(post_json(
                "/tools/flaky",
                json!({"session_id": "s-1", "tool_name": "flaky", "arguments": {}}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(
            body["error"],
            "Tool 'flaky' execution failed: database unavailable"
        );
    }

    #[tokio::test]
    async fn test_status_notification_reaches_the_listener() {
        let listener = Arc::new(RecordingListener::default());
        let state = CallbackState::new("", registry()).with_listener(Arc::clone(&listener) as Arc<dyn StatusListener>);
        let app = router(state);

        let response = app
            .oneshot(post_json(
                "/sessions/s-42/status",
                json!({"client_id": "app", "status": "completed", "turns": 3}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"ok": true}));

        let payloads = listener.payloads.lock().unwrap();
        assert_eq!(payloads.len(), 1);
        // The path segment wins over the body.
        assert_eq!(payloads[0].session_id, "s-42");
        assert!(payloads[0].is_terminal());
    }

    #[tokio::test]
    async fn test_unrecognized_status_is_acknowledged_without_action() {
        let listener = Arc::new(RecordingListener::default());
        let state = CallbackState::new("", registry()).with_listener(Arc::clone(&listener) as Arc<dyn StatusListener>);
        let app = router(state);

        let response = app
            .oneshot(post_json(
                "/sessions/s-42/status",
                json!({"client_id": "app", "status": "paused"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(listener.payloads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_signed_request_passes_verification() {
        let signer = HmacSigner::new("shared-secret");
        let app = router(CallbackState::new("shared-secret", registry()));

        let response = app
            .oneshot(signed_post_json("/tools/echo", tool_body(), &signer))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unsigned_request_is_rejected_when_secret_is_configured() {
        let app = router(CallbackState::new("shared-secret", registry()));

        let response = app
            .oneshot(post_json("/tools/echo", tool_body()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_tampered_body_is_rejected() {
        let signer = HmacSigner::new("shared-secret");
        let app = router(CallbackState::new("shared-secret", registry()));

        let bytes = tool_body().to_string();
        let envelope = signer.sign(bytes.as_bytes());
        let request = Request::builder()
            .method("POST")
            .uri("/tools/echo")
            .header("content-type", "application/json")
            .header("X-Signature", envelope.signature)
            .header("X-Timestamp", envelope.timestamp)
            .header("X-Nonce", envelope.nonce)
            .body(Body::from(bytes.replace("hi", "ho")))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_replayed_envelope_is_rejected_on_the_second_use() {
        let signer = HmacSigner::new("shared-secret");
        let app = router(CallbackState::new("shared-secret", registry()));

        let bytes = tool_body().to_string();
        let envelope = signer.sign(bytes.as_bytes());
        let build = || {
            Request::builder()
                .method("POST")
                .uri("/tools/echo")
                .header("content-type", "application/json")
                .header("X-Signature", envelope.signature.clone())
                .header("X-Timestamp", envelope.timestamp.clone())
                .header("X-Nonce", envelope.nonce.clone())
                .body(Body::from(bytes.clone()))
                .unwrap()
        };

        let first = app.clone().oneshot(build()).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app.oneshot(build()).await.unwrap();
        assert_eq!(second.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_malformed_nonce_is_rejected_before_verification() {
        let app = router(CallbackState::new("shared-secret", registry()));

        let request = Request::builder()
            .method("POST")
            .uri("/tools/echo")
            .header("content-type", "application/json")
            .header("X-Signature", "sha256=deadbeef")
            .header("X-Timestamp", "1700000000")
            .header("X-Nonce", "bad!")
            .body(Body::from(tool_body().to_string()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_no_secret_disables_verification() {
        let app = router(CallbackState::new("", registry()));

        let response = app
            .oneshot(post_json("/tools/echo", tool_body()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
