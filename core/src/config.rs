//! Client configuration.
//!
//! # Design
//! Everything a `Client` needs besides the transport itself: credentials,
//! endpoint, and the limits the default `UreqTransport` is built with. The
//! token is never printed by `Debug`.

use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::logger::{Logger, NopLogger};

pub const DEFAULT_BASE_URL: &str = "https://api.telegram.org";

/// Overall per-call limit: connect, send and receive.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
/// Limit for establishing a connection, TLS handshake included.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_IDLE_CONNECTIONS: usize = 10;
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

pub const TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";
pub const BASE_URL_ENV: &str = "TELEGRAM_API_URL";

#[derive(Clone)]
pub struct ClientConfig {
    pub token: String,
    pub base_url: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub max_idle_connections: usize,
    pub idle_timeout: Duration,
    pub logger: Arc<dyn Logger>,
}

impl ClientConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_idle_connections: DEFAULT_MAX_IDLE_CONNECTIONS,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            logger: Arc::new(NopLogger),
        }
    }

    /// Read the token from `TELEGRAM_BOT_TOKEN` and an optional endpoint
    /// override from `TELEGRAM_API_URL`.
    pub fn from_env() -> Result<Self, env::VarError> {
        let config = Self::new(env::var(TOKEN_ENV)?);
        Ok(match env::var(BASE_URL_ENV) {
            Ok(url) if !url.is_empty() => config.with_base_url(url),
            _ => config,
        })
    }

    /// Use another endpoint. A trailing slash is dropped; an empty string
    /// keeps the default.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let trimmed = base_url.trim_end_matches('/');
        if !trimmed.is_empty() {
            self.base_url = trimmed.to_string();
        }
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_max_idle_connections(mut self, max: usize) -> Self {
        self.max_idle_connections = max;
        self
    }

    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// `{base_url}/bot{token}/{method}`
    pub fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.base_url,
            self.token,
            method.trim_start_matches('/')
        )
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("token", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("max_idle_connections", &self.max_idle_connections)
            .field("idle_timeout", &self.idle_timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_remote_service() {
        let config = ClientConfig::new("123:abc");
        assert_eq!(config.base_url, "https://api.telegram.org");
        assert_eq!(config.timeout, Duration::from_secs(120));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.max_idle_connections, 10);
        assert_eq!(config.idle_timeout, Duration::from_secs(30));
    }

    #[test]
    fn method_url_joins_token_and_method() {
        let config = ClientConfig::new("123:abc");
        assert_eq!(
            config.method_url("getMe"),
            "https://api.telegram.org/bot123:abc/getMe"
        );
        assert_eq!(
            config.method_url("/sendMessage"),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let config = ClientConfig::new("t").with_base_url("http://localhost:8081/");
        assert_eq!(config.method_url("getMe"), "http://localhost:8081/bott/getMe");
    }

    #[test]
    fn empty_base_url_keeps_default() {
        let config = ClientConfig::new("t").with_base_url("");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn debug_hides_token() {
        let rendered = format!("{:?}", ClientConfig::new("secret-token"));
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("<redacted>"));
    }
}
