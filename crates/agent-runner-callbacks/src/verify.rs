//! Signature verification middleware for incoming callbacks.

use agent_runner_auth::{NONCE_HEADER, SIGNATURE_HEADER, TIMESTAMP_HEADER, signer};
use axum::{
    body::{Body, to_bytes},
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::error::AuthError;
use crate::state::CallbackState;

/// Cap when buffering a body for verification.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Verify the signature envelope before any handler runs.
///
/// When no secret is configured, requests pass through unchanged. The body
/// is buffered so the digest covers the exact received bytes, then handed
/// to the inner handler untouched.
pub async fn verify_signature(
    State(state): State<CallbackState>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let Some(hmac_signer) = &state.signer else {
        return Ok(next.run(request).await);
    };

    let (signature, timestamp, nonce) = {
        let header = |name: &str| {
            request
                .headers()
                .get(name)
                .and_then(|value| value.to_str().ok())
                .unwrap_or_default()
                .to_string()
        };

        (
            header(SIGNATURE_HEADER),
            header(TIMESTAMP_HEADER),
            header(NONCE_HEADER),
        )
    };

    if signature.is_empty() || timestamp.is_empty() || nonce.is_empty() {
        return Err(AuthError::MissingHeaders);
    }
    if !signer::is_valid_nonce(&nonce) {
        return Err(AuthError::InvalidNonce);
    }
    if !signer::is_fresh_timestamp(&timestamp) {
        return Err(AuthError::InvalidTimestamp);
    }

    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|_| AuthError::InvalidSignature)?;

    if !hmac_signer.verify(&signature, &timestamp, &nonce, &bytes) {
        tracing::warn!("rejected callback with invalid signature");
        return Err(AuthError::InvalidSignature);
    }

    if !state.nonces.try_accept(&nonce) {
        tracing::warn!("rejected callback with replayed nonce");
        return Err(AuthError::ReplayedNonce);
    }

    let request = Request::from_parts(parts, Body::from(bytes));
    Ok(next.run(request).await)
}
