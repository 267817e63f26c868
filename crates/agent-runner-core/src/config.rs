//! Configuration for the Agent Runner client.

use std::time::Duration;

use crate::types::CallbackConfig;

/// Configuration for the Agent Runner integration.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Base URL of the Agent Runner service.
    pub base_url: String,
    /// Identifies this application; sent as `X-Client-ID` on every request.
    pub client_id: String,
    /// Shared HMAC secret. Empty disables request signing on both sides.
    pub hmac_secret: String,
    /// Callback target advertised when creating sessions.
    pub callback: Option<CallbackConfig>,
    /// Defaults applied to agents unless overridden by the builder.
    pub defaults: AgentDefaults,
    /// Outgoing HTTP settings.
    pub http: HttpConfig,
}

/// Default agent settings.
#[derive(Debug, Clone)]
pub struct AgentDefaults {
    pub model: String,
    pub max_turns: u32,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
}

impl Default for AgentDefaults {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_turns: 30,
            max_tokens: None,
            temperature: None,
        }
    }
}

/// Timeouts for the outgoing HTTP client.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Bound for short request/response calls.
    pub timeout: Duration,
    /// Bound for connection establishment.
    pub connect_timeout: Duration,
    /// Bound for the event stream; agent runs may take minutes.
    pub stream_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
            stream_timeout: Duration::from_secs(600),
        }
    }
}

impl RunnerConfig {
    /// Create a configuration with defaults for everything but the address
    /// and client identity.
    #[must_use]
    pub fn new(base_url: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client_id: client_id.into(),
            hmac_secret: String::new(),
            callback: None,
            defaults: AgentDefaults::default(),
            http: HttpConfig::default(),
        }
    }

    /// Load configuration from `AGENT_RUNNER_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::new(
            env_or("AGENT_RUNNER_URL", "http://localhost:8090"),
            env_or("AGENT_RUNNER_CLIENT_ID", "host-app"),
        );

        config.hmac_secret = env_or("AGENT_RUNNER_HMAC_SECRET", "");

        let callback_url = env_or("AGENT_RUNNER_CALLBACK_URL", "");
        if !callback_url.is_empty() {
            config.callback = Some(CallbackConfig {
                base_url: callback_url,
                timeout_sec: env_parsed("AGENT_RUNNER_CALLBACK_TIMEOUT"),
            });
        }

        config.defaults.model = env_or("AGENT_RUNNER_DEFAULT_MODEL", &config.defaults.model);
        if let Some(max_turns) = env_parsed("AGENT_RUNNER_DEFAULT_MAX_TURNS") {
            config.defaults.max_turns = max_turns;
        }
        config.defaults.max_tokens = env_parsed::<u32>("AGENT_RUNNER_DEFAULT_MAX_TOKENS")
            .filter(|tokens| *tokens > 0);

        if let Some(secs) = env_parsed("AGENT_RUNNER_HTTP_TIMEOUT") {
            config.http.timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = env_parsed("AGENT_RUNNER_HTTP_CONNECT_TIMEOUT") {
            config.http.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = env_parsed("AGENT_RUNNER_SSE_TIMEOUT") {
            config.http.stream_timeout = Duration::from_secs(secs);
        }

        config
    }

    /// Set the shared HMAC secret.
    #[must_use]
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.hmac_secret = secret.into();
        self
    }

    /// Set the callback target.
    #[must_use]
    pub fn with_callback(mut self, callback: CallbackConfig) -> Self {
        self.callback = Some(callback);
        self
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
