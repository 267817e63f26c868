//! Shared state for the callback router.

use std::sync::Arc;

use agent_runner_auth::{HmacSigner, NonceStore};
use agent_runner_core::{ToolRegistry, types::StatusPayload};
use async_trait::async_trait;

/// Listener for session status notifications.
///
/// Invoked once per recognized notification; unrecognized status values
/// are acknowledged without reaching the listener.
#[async_trait]
pub trait StatusListener: Send + Sync {
    async fn on_status(&self, payload: StatusPayload);
}

/// State shared by the callback handlers and the verification middleware.
#[derive(Clone)]
pub struct CallbackState {
    pub(crate) signer: Option<HmacSigner>,
    pub(crate) nonces: Arc<NonceStore>,
    pub(crate) registry: Arc<ToolRegistry>,
    pub(crate) listener: Option<Arc<dyn StatusListener>>,
}

impl CallbackState {
    /// Create callback state.
    ///
    /// An empty secret disables signature verification, matching the
    /// client side (which then omits the envelope headers).
    #[must_use]
    pub fn new(hmac_secret: &str, registry: Arc<ToolRegistry>) -> Self {
        let signer = (!hmac_secret.is_empty()).then(|| HmacSigner::new(hmac_secret));
        Self {
            signer,
            nonces: Arc::new(NonceStore::new()),
            registry,
            listener: None,
        }
    }

    /// Attach a status listener.
    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn StatusListener>) -> Self {
        self.listener = Some(listener);
        self
    }
}
