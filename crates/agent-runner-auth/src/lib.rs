//! Request authentication for the Agent Runner protocol.
//!
//! Every authenticated request, in either direction, carries a signature
//! envelope over its exact body bytes:
//!
//! - `X-Signature: sha256={hex(HMAC-SHA256(secret, "{ts}.{nonce}.{body}"))}`
//! - `X-Timestamp: {unix seconds}`
//! - `X-Nonce: {8-128 chars of [A-Za-z0-9_-]}`
//!
//! This crate provides:
//! - [`HmacSigner`] - signing and verification of request bodies
//! - [`NonceStore`] - replay protection for accepted nonces

pub mod nonce;
pub mod signer;

pub use nonce::NonceStore;
pub use signer::{HmacSigner, SignatureEnvelope};

/// Header carrying the caller's client identifier.
pub const CLIENT_ID_HEADER: &str = "X-Client-ID";
/// Header carrying the request signature.
pub const SIGNATURE_HEADER: &str = "X-Signature";
/// Header carrying the signing timestamp.
pub const TIMESTAMP_HEADER: &str = "X-Timestamp";
/// Header carrying the signing nonce.
pub const NONCE_HEADER: &str = "X-Nonce";
