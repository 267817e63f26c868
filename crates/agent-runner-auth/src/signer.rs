//! HMAC-SHA256 request signing and verification.

use std::time::{SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Maximum allowed clock skew when verifying a timestamp (2 minutes).
const MAX_TIMESTAMP_AGE_SECS: u64 = 120;

/// The (signature, timestamp, nonce) triple attached to a signed request.
///
/// Created fresh per request, never persisted.
#[derive(Debug, Clone)]
pub struct SignatureEnvelope {
    /// `sha256={hex digest}` over the signing payload.
    pub signature: String,
    /// Unix timestamp in whole seconds, decimal-encoded.
    pub timestamp: String,
    /// 16 random bytes, hex-encoded (32 characters).
    pub nonce: String,
}

/// Signs and verifies request bodies against a shared secret.
///
/// Signing payload: `{timestamp}.{nonce}.{body}`. An empty body leaves the
/// payload ending with the trailing separator; both sides must agree on
/// that for bodyless requests.
#[derive(Clone)]
pub struct HmacSigner {
    secret: String,
}

impl HmacSigner {
    /// Create a signer for a shared secret.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Sign a request body, producing a fresh envelope.
    #[must_use]
    pub fn sign(&self, body: &[u8]) -> SignatureEnvelope {
        let timestamp = now_secs().to_string();

        let mut nonce_bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = hex::encode(nonce_bytes);

        let signature = self.compute(&timestamp, &nonce, body);

        SignatureEnvelope {
            signature,
            timestamp,
            nonce,
        }
    }

    /// Verify an envelope against a request body.
    ///
    /// Fail-closed: every failure mode (empty fields, malformed nonce or
    /// timestamp, stale timestamp, digest mismatch) returns `false` with no
    /// further distinction. The digest comparison is constant-time.
    #[must_use]
    pub fn verify(&self, signature: &str, timestamp: &str, nonce: &str, body: &[u8]) -> bool {
        self.verify_at(now_secs(), signature, timestamp, nonce, body)
    }

    /// Verification against an explicit clock. `verify` delegates here with
    /// the current time.
    #[must_use]
    pub fn verify_at(
        &self,
        now: u64,
        signature: &str,
        timestamp: &str,
        nonce: &str,
        body: &[u8],
    ) -> bool {
        if signature.is_empty() || timestamp.is_empty() || nonce.is_empty() {
            return false;
        }

        if !is_valid_nonce(nonce) {
            return false;
        }

        let Some(ts) = parse_timestamp(timestamp) else {
            return false;
        };
        if now.abs_diff(ts) > MAX_TIMESTAMP_AGE_SECS {
            return false;
        }

        let expected = self.compute(timestamp, nonce, body);
        expected.as_bytes().ct_eq(signature.as_bytes()).into()
    }

    fn compute(&self, timestamp: &str, nonce: &str, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(nonce.as_bytes());
        mac.update(b".");
        mac.update(body);
        format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
    }
}

/// Nonce format check: 8-128 characters of `[A-Za-z0-9_-]`.
#[must_use]
pub fn is_valid_nonce(nonce: &str) -> bool {
    (8..=128).contains(&nonce.len())
        && nonce
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// Timestamp freshness check: all-digits and within the +-2 minute window.
#[must_use]
pub fn is_fresh_timestamp(timestamp: &str) -> bool {
    parse_timestamp(timestamp).is_some_and(|ts| now_secs().abs_diff(ts) <= MAX_TIMESTAMP_AGE_SECS)
}

fn parse_timestamp(timestamp: &str) -> Option<u64> {
    if timestamp.is_empty() || !timestamp.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    timestamp.parse().ok()
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> HmacSigner {
        HmacSigner::new("test-secret")
    }

    #[test]
    fn test_sign_and_verify_roundtrip() {
        let signer = signer();
        let body = br#"{"message":"hello"}"#;

        let env = signer.sign(body);
        assert!(signer.verify(&env.signature, &env.timestamp, &env.nonce, body));
    }

    #[test]
    fn test_sign_and_verify_empty_body() {
        let signer = signer();
        let env = signer.sign(b"");
        assert!(signer.verify(&env.signature, &env.timestamp, &env.nonce, b""));
    }

    #[test]
    fn test_signature_and_nonce_formats() {
        let env = signer().sign(b"body");
        assert!(env.signature.starts_with("sha256="));
        assert_eq!(env.signature.len(), "sha256=".len() + 64);
        assert_eq!(env.nonce.len(), 32);
        assert!(env.nonce.bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn test_flipping_any_body_byte_fails_verification() {
        let signer = signer();
        let body = b"a modest payload";
        let env = signer.sign(body);

        for i in 0..body.len() {
            let mut tampered = body.to_vec();
            tampered[i] ^= 0x01;
            assert!(
                !signer.verify(&env.signature, &env.timestamp, &env.nonce, &tampered),
                "flip at offset {i} was accepted"
            );
        }
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let env = HmacSigner::new("secret-a").sign(b"body");
        assert!(!HmacSigner::new("secret-b").verify(&env.signature, &env.timestamp, &env.nonce, b"body"));
    }

    #[test]
    fn test_verify_rejects_empty_fields() {
        let signer = signer();
        let env = signer.sign(b"body");

        assert!(!signer.verify("", &env.timestamp, &env.nonce, b"body"));
        assert!(!signer.verify(&env.signature, "", &env.nonce, b"body"));
        assert!(!signer.verify(&env.signature, &env.timestamp, "", b"body"));
    }

    #[test]
    fn test_timestamp_window_boundary_is_exact() {
        let signer = signer();
        let now = 1_700_000_000_u64;

        for (offset_secs, accepted) in [(0_i64, true), (120, true), (-120, true), (121, false), (-121, false)] {
            let ts = now.checked_add_signed(offset_secs).unwrap().to_string();
            let nonce = "0123456789abcdef0123456789abcdef";
            let signature = signer.compute(&ts, nonce, b"body");
            assert_eq!(
                signer.verify_at(now, &signature, &ts, nonce, b"body"),
                accepted,
                "offset {offset_secs}s"
            );
        }
    }

    #[test]
    fn test_verify_rejects_non_numeric_timestamp() {
        let signer = signer();
        let nonce = "0123456789abcdef0123456789abcdef";
        for ts in ["17e8", "-1700000000", "1700000000.5", "now"] {
            let signature = signer.compute(ts, nonce, b"body");
            assert!(!signer.verify_at(1_700_000_000, &signature, ts, nonce, b"body"));
        }
    }

    #[test]
    fn test_nonce_format_boundaries() {
        assert!(!is_valid_nonce("abcdefg")); // 7 chars
        assert!(is_valid_nonce("abcdefgh")); // 8 chars
        assert!(is_valid_nonce(&"a".repeat(128)));
        assert!(!is_valid_nonce(&"a".repeat(129)));
        assert!(!is_valid_nonce("abcdefg!"));
        assert!(is_valid_nonce("abc-def_123"));
        assert!(!is_valid_nonce(""));
    }

    #[test]
    fn test_verify_rejects_malformed_nonce_even_with_valid_digest() {
        let signer = signer();
        let now = 1_700_000_000_u64;
        let ts = now.to_string();
        let nonce = "short";

        let signature = signer.compute(&ts, nonce, b"body");
        assert!(!signer.verify_at(now, &signature, &ts, nonce, b"body"));
    }

    #[test]
    fn test_nonces_are_unique_per_signature() {
        let signer = signer();
        let a = signer.sign(b"body");
        let b = signer.sign(b"body");
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.signature, b.signature);
    }
}
