//! HTTP client for the five Agent Runner operations.

use std::{path::Path, time::Duration};

use agent_runner_auth::{
    CLIENT_ID_HEADER, HmacSigner, NONCE_HEADER, SIGNATURE_HEADER, TIMESTAMP_HEADER,
};
use agent_runner_core::{
    RunnerConfig,
    types::{AgentDefinition, CallbackConfig, CreateSessionResponse, SendMessageResponse, Session},
};
use futures::TryStreamExt;
use reqwest::{StatusCode, header};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::{ClientError, StreamError};
use crate::sse::EventStream;

/// HTTP client for Agent Runner.
///
/// Every request carries `X-Client-ID`. When a shared secret is configured,
/// the body bytes to be transmitted are finalized first, signed, then sent
/// verbatim (body-then-sign), with the envelope in `X-Signature`,
/// `X-Timestamp`, and `X-Nonce`. Bodyless requests sign the empty string.
#[derive(Clone)]
pub struct RunnerClient {
    http: reqwest::Client,
    base_url: String,
    client_id: String,
    signer: Option<HmacSigner>,
    stream_timeout: Duration,
}

#[derive(Serialize)]
struct CreateSessionRequest<'a> {
    agent: &'a AgentDefinition,
    #[serde(skip_serializing_if = "Option::is_none")]
    callback: Option<&'a CallbackConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    work_dir: Option<&'a Path>,
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    message: &'a str,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
}

impl RunnerClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    /// Returns error if the underlying HTTP client cannot be constructed.
    pub fn new(config: &RunnerConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.http.timeout)
            .connect_timeout(config.http.connect_timeout)
            .build()?;

        let signer = (!config.hmac_secret.is_empty())
            .then(|| HmacSigner::new(config.hmac_secret.clone()));

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client_id: config.client_id.clone(),
            signer,
            stream_timeout: config.http.stream_timeout,
        })
    }

    /// `POST /v1/sessions` - create a new session.
    ///
    /// # Errors
    /// Returns error on transport failure or a non-success response.
    pub async fn create_session(
        &self,
        agent: &AgentDefinition,
        callback: Option<&CallbackConfig>,
        session_id: Option<&str>,
        work_dir: Option<&Path>,
    ) -> Result<CreateSessionResponse, ClientError> {
        self.post_json(
            "/v1/sessions",
            &CreateSessionRequest {
                agent,
                callback,
                session_id,
                work_dir,
            },
        )
        .await
    }

    /// `GET /v1/sessions/{id}` - fetch session info.
    ///
    /// # Errors
    /// `ClientError::SessionNotFound` when the service reports 404;
    /// otherwise transport or API failures.
    pub async fn get_session(&self, session_id: &str) -> Result<Session, ClientError> {
        let request = self.http.get(self.url(&format!("/v1/sessions/{session_id}")));
        let response = self.signed(request, b"").send().await?;
        Self::session_response(session_id, response).await
    }

    /// `DELETE /v1/sessions/{id}` - cancel and delete a session.
    ///
    /// # Errors
    /// `ClientError::SessionNotFound` when the service reports 404;
    /// otherwise transport or API failures.
    pub async fn delete_session(&self, session_id: &str) -> Result<Session, ClientError> {
        let request = self
            .http
            .delete(self.url(&format!("/v1/sessions/{session_id}")));
        let response = self.signed(request, b"").send().await?;
        Self::session_response(session_id, response).await
    }

    /// `POST /v1/sessions/{id}/messages` - send a message, starting the
    /// agent.
    ///
    /// # Errors
    /// Returns error on transport failure or a non-success response.
    pub async fn send_message(
        &self,
        session_id: &str,
        message: &str,
    ) -> Result<SendMessageResponse, ClientError> {
        self.post_json(
            &format!("/v1/sessions/{session_id}/messages"),
            &SendMessageRequest { message },
        )
        .await
    }

    /// `GET /v1/sessions/{id}/stream` - open the live event stream.
    ///
    /// The stream uses a much longer timeout than the other operations
    /// since the agent run may take minutes.
    ///
    /// # Errors
    /// `StreamError::Status` if the service answers with a non-success
    /// status before streaming begins; `StreamError::Transport` on connect
    /// failure.
    pub async fn open_stream(&self, session_id: &str) -> Result<EventStream, StreamError> {
        let request = self
            .http
            .get(self.url(&format!("/v1/sessions/{session_id}/stream")))
            .header(header::ACCEPT, "text/event-stream")
            .header(header::CACHE_CONTROL, "no-cache")
            .timeout(self.stream_timeout);

        let response = self.signed(request, b"").send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StreamError::Status {
                status: status.as_u16(),
            });
        }

        Ok(EventStream::new(
            response.bytes_stream().map_err(StreamError::from),
        ))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Attach `X-Client-ID` and, when signing is enabled, the envelope
    /// computed over `body`.
    fn signed(&self, request: reqwest::RequestBuilder, body: &[u8]) -> reqwest::RequestBuilder {
        let mut request = request.header(CLIENT_ID_HEADER, self.client_id.as_str());
        if let Some(signer) = &self.signer {
            let envelope = signer.sign(body);
            request = request
                .header(SIGNATURE_HEADER, envelope.signature)
                .header(TIMESTAMP_HEADER, envelope.timestamp)
                .header(NONCE_HEADER, envelope.nonce);
        }
        request
    }

    /// Send a JSON body with the body-then-sign discipline: the bytes
    /// signed are the bytes transmitted, never re-encoded.
    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, ClientError>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let bytes = serde_json::to_vec(body)?;
        let response = self
            .signed(self.http.post(self.url(path)), &bytes)
            .header(header::CONTENT_TYPE, "application/json")
            .body(bytes)
            .send()
            .await?;
        Self::into_result(response).await
    }

    async fn session_response(
        session_id: &str,
        response: reqwest::Response,
    ) -> Result<Session, ClientError> {
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ClientError::SessionNotFound {
                session_id: session_id.to_string(),
            });
        }
        Self::into_result(response).await
    }

    async fn into_result<R: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<R, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let message = response
            .json::<ApiErrorBody>()
            .await
            .ok()
            .and_then(|body| body.error)
            .unwrap_or_else(|| "Unknown error".to_string());

        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }
}
