//! The network seam: one request in, one response out.
//!
//! A [`Transport`] performs exactly one exchange. It never follows
//! redirects and never touches cookies; the transaction layer above it owns
//! both. Tests plug in scripted transports here.

use crate::base::neterror::NetError;
use crate::http::requestbody::RequestBody;
use crate::http::response::HttpResponse;
use http::{HeaderMap, Method};
use std::future::Future;
use std::pin::Pin;
use url::Url;

/// A fully prepared request for a single hop.
#[derive(Debug, Clone)]
pub struct OutgoingRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: RequestBody,
}

impl OutgoingRequest {
    /// Header value as text, if present and valid.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Alias for the `Future` type returned by a transport.
pub type Exchanging = Pin<Box<dyn Future<Output = Result<HttpResponse, NetError>> + Send>>;

/// Performs single HTTP exchanges.
///
/// Implementations must be thread-safe; one transport serves every account.
pub trait Transport: Send + Sync {
    /// Sends `request` and reads the whole response.
    ///
    /// The returned response's URL must be `request.url`.
    fn exchange(&self, request: OutgoingRequest) -> Exchanging;
}
