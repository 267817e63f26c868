//! Error types for the callback surface.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Rejection reasons at the authentication boundary.
///
/// Everything here fails closed before any business logic runs. Response
/// bodies stay generic so nothing about the secret, the clock window, or
/// the nonce store leaks to a caller probing the endpoint.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// One or more of the signature headers is absent.
    #[error("missing signature, timestamp, or nonce header")]
    MissingHeaders,

    /// The timestamp is malformed or outside the freshness window.
    #[error("invalid or expired timestamp")]
    InvalidTimestamp,

    /// The nonce violates the length or charset rules.
    #[error("invalid nonce format")]
    InvalidNonce,

    /// The recomputed digest does not match.
    #[error("invalid signature")]
    InvalidSignature,

    /// The nonce was already accepted within the replay window.
    #[error("replayed nonce")]
    ReplayedNonce,
}

impl AuthError {
    /// Every authentication failure is 401.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = match self {
            Self::MissingHeaders => "Missing signature headers",
            // A replay is indistinguishable from a bad signature to the
            // caller.
            Self::InvalidTimestamp
            | Self::InvalidNonce
            | Self::InvalidSignature
            | Self::ReplayedNonce => "Invalid signature",
        };
        (self.status_code(), body).into_response()
    }
}
