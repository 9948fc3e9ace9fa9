//! URL Request Context - shared configuration for session requests.
//!
//! Based on Chromium's net::URLRequestContext: the transport plus the
//! header and limit settings every hop uses. Cookie jars are not part of
//! the context; each request names its own.

use crate::http::streamfactory::HttpStreamFactory;
use crate::http::transport::Transport;
use std::sync::Arc;
use std::time::Duration;

/// Configuration options for session requests.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// User-Agent string to use for requests.
    pub user_agent: String,

    /// Accept header value.
    pub accept: String,

    /// Accept-Language header value.
    pub accept_language: Option<String>,

    /// Maximum redirects followed for one request (Chromium default is 20).
    pub redirect_limit: usize,

    /// Upper bound for one exchange on the transport.
    pub exchange_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            accept: "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"
                .to_string(),
            accept_language: Some("en-US,en;q=0.9".to_string()),
            redirect_limit: 20,
            exchange_timeout: Duration::from_secs(30),
        }
    }
}

/// Transport and settings shared by every request of a client.
pub struct URLRequestContext {
    transport: Arc<dyn Transport>,
    config: SessionConfig,
}

impl URLRequestContext {
    /// Default configuration over the real network.
    pub fn new() -> Self {
        Self::with_config(Arc::new(HttpStreamFactory::new()), SessionConfig::default())
    }

    pub fn with_config(transport: Arc<dyn Transport>, config: SessionConfig) -> Self {
        Self { transport, config }
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

impl Default for URLRequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for URLRequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("URLRequestContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
