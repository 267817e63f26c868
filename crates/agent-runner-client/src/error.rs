//! Error types for the client side of the protocol.

use thiserror::Error;

/// Failure of a request/response call to Agent Runner.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection or protocol-level failure.
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response from the service, with its reported message.
    #[error("Agent Runner API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The requested session does not exist.
    #[error("Session not found: {session_id}")]
    SessionNotFound { session_id: String },

    /// A request body could not be encoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The event stream failed.
    #[error(transparent)]
    Stream(#[from] StreamError),
}

/// Failure of the event stream.
///
/// Raised only while no terminal event has been observed; a transport error
/// arriving after `done` is suppressed by the reader.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Connect failure or mid-stream reset.
    #[error("stream transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success status observed before any event.
    #[error("stream returned HTTP {status}")]
    Status { status: u16 },
}
