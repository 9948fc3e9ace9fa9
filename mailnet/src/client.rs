//! Session client with builder pattern.
//!
//! Sends [`SessionRequest`]s through their redirect chains, keeping each
//! request's cookie jar current on every hop.
//!
//! # Example
//!
//! ```rust,no_run
//! use mailnet::client::SessionClient;
//! use mailnet::cookies::CookieStore;
//! use mailnet::urlrequest::SessionRequest;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), mailnet::base::neterror::NetError> {
//! let client = SessionClient::builder()
//!     .redirect_limit(10)
//!     .build();
//!
//! let jar = Arc::new(CookieStore::new());
//! let url = url::Url::parse("https://mail.google.com/mail/").unwrap();
//! let doc = client.send(SessionRequest::get(url, jar)).await?;
//! println!("landed on {}", doc.url());
//! # Ok(())
//! # }
//! ```

use crate::base::neterror::NetError;
use crate::dom::Document;
use crate::http::response::HttpResponse;
use crate::http::streamfactory::HttpStreamFactory;
use crate::http::transport::Transport;
use crate::urlrequest::context::{SessionConfig, URLRequestContext};
use crate::urlrequest::job::URLRequestHttpJob;
use crate::urlrequest::request::SessionRequest;
use std::sync::Arc;
use std::time::Duration;

/// Issues session requests.
///
/// Cheap to clone; clones share the transport and configuration.
#[derive(Clone, Debug)]
pub struct SessionClient {
    context: Arc<URLRequestContext>,
}

impl Default for SessionClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionClient {
    /// Create a new client with default settings over the real network.
    pub fn new() -> Self {
        Self {
            context: Arc::new(URLRequestContext::new()),
        }
    }

    /// Create a new client builder.
    pub fn builder() -> SessionClientBuilder {
        SessionClientBuilder::default()
    }

    pub fn config(&self) -> &SessionConfig {
        self.context.config()
    }

    /// Follow `request` to its final response.
    pub async fn execute(&self, request: SessionRequest) -> Result<HttpResponse, NetError> {
        let mut job = URLRequestHttpJob::new(self.context.clone(), request);
        let response = job.start().await?;
        tracing::debug!(
            url = %response.url(),
            status = %response.status(),
            hops = job.url_chain().len(),
            restarts = job.restarts(),
            "request finished"
        );
        Ok(response)
    }

    /// Follow `request` and hand back the final page.
    pub async fn send(&self, request: SessionRequest) -> Result<Document, NetError> {
        let response = self.execute(request).await?;
        Ok(Document::new(response.url().clone(), response.text()))
    }
}

/// Builder for creating a [`SessionClient`].
#[derive(Default)]
pub struct SessionClientBuilder {
    transport: Option<Arc<dyn Transport>>,
    config: SessionConfig,
}

impl SessionClientBuilder {
    /// Replace the network transport.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Set the Accept-Language header (`None` omits it).
    pub fn accept_language(mut self, lang: Option<String>) -> Self {
        self.config.accept_language = lang;
        self
    }

    /// Set the maximum number of redirects.
    pub fn redirect_limit(mut self, limit: usize) -> Self {
        self.config.redirect_limit = limit;
        self
    }

    /// Set the per-exchange timeout.
    pub fn exchange_timeout(mut self, timeout: Duration) -> Self {
        self.config.exchange_timeout = timeout;
        self
    }

    /// Build the client.
    pub fn build(self) -> SessionClient {
        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(HttpStreamFactory::new()));
        SessionClient {
            context: Arc::new(URLRequestContext::with_config(transport, self.config)),
        }
    }
}

impl std::fmt::Debug for SessionClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionClientBuilder")
            .field("custom_transport", &self.transport.is_some())
            .field("config", &self.config)
            .finish()
    }
}
