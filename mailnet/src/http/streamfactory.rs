use crate::base::neterror::NetError;
use crate::http::response::HttpResponse;
use crate::http::transport::{Exchanging, OutgoingRequest, Transport};
use crate::socket::connectjob::ConnectJob;
use bytes::Bytes;
use http::{header, HeaderValue, Request, Response};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use tokio::spawn;
use url::Url;

/// Wraps an HTTP/1.1 connection.
/// Equivalent to net::HttpStream.
pub struct HttpStream {
    sender: http1::SendRequest<Full<Bytes>>,
}

impl HttpStream {
    pub async fn send_request(
        &mut self,
        req: Request<Full<Bytes>>,
    ) -> Result<Response<Incoming>, NetError> {
        self.sender.send_request(req).await.map_err(|e| {
            tracing::debug!(error = %e, "request failed");
            if e.is_timeout() {
                NetError::ConnectionTimedOut
            } else if e.is_incomplete_message() {
                NetError::EmptyResponse
            } else {
                NetError::ConnectionClosed
            }
        })
    }
}

/// Production [`Transport`]: a fresh connection per exchange.
///
/// No pooling and no HTTP/2; each hop resolves, connects, negotiates TLS
/// for `https` and reads the whole body.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpStreamFactory;

impl HttpStreamFactory {
    pub fn new() -> Self {
        Self
    }

    pub async fn request_stream(&self, url: &Url) -> Result<HttpStream, NetError> {
        // 1. Get raw socket
        let socket = ConnectJob::connect(url).await?;
        if socket.is_secure() && !speaks_http11(socket.alpn_protocol()) {
            tracing::debug!(
                url = %url,
                alpn = ?socket.alpn_protocol().map(String::from_utf8_lossy),
                "server negotiated a protocol other than http/1.1"
            );
            return Err(NetError::SslProtocolError);
        }

        // 2. Handshake
        let io = TokioIo::new(socket);
        let (sender, conn) = http1::handshake(io).await.map_err(|e| {
            tracing::debug!(url = %url, error = %e, "HTTP/1.1 handshake failed");
            NetError::ConnectionFailed
        })?;

        // 3. Spawn the connection driver
        spawn(async move {
            if let Err(e) = conn.await {
                tracing::debug!(error = %e, "connection closed with error");
            }
        });

        Ok(HttpStream { sender })
    }

    async fn send(self, request: OutgoingRequest) -> Result<HttpResponse, NetError> {
        let OutgoingRequest {
            method,
            url,
            mut headers,
            body,
        } = request;

        if !headers.contains_key(header::HOST) {
            headers.insert(header::HOST, host_header(&url)?);
        }
        let body = body.into_bytes();
        if !body.is_empty() {
            headers.insert(header::CONTENT_LENGTH, HeaderValue::from(body.len()));
        }

        // origin-form target
        let target = match url.query() {
            Some(q) => format!("{}?{}", url.path(), q),
            None => url.path().to_string(),
        };
        let mut req = Request::builder()
            .method(method)
            .uri(target)
            .body(Full::new(body))
            .map_err(|_| NetError::InvalidUrl)?;
        *req.headers_mut() = headers;

        let mut stream = self.request_stream(&url).await?;
        let resp = stream.send_request(req).await?;

        let (parts, incoming) = resp.into_parts();
        let bytes = incoming
            .collect()
            .await
            .map_err(|_| NetError::HttpBodyError)?
            .to_bytes();

        Ok(HttpResponse::new(url, parts.status, parts.headers, bytes))
    }
}

impl Transport for HttpStreamFactory {
    fn exchange(&self, request: OutgoingRequest) -> Exchanging {
        Box::pin(self.send(request))
    }
}

/// A TLS peer that skipped ALPN is assumed to speak HTTP/1.1.
fn speaks_http11(alpn: Option<&[u8]>) -> bool {
    alpn.map_or(true, |protocol| protocol == b"http/1.1")
}

fn host_header(url: &Url) -> Result<HeaderValue, NetError> {
    let host = url.host_str().ok_or(NetError::InvalidUrl)?;
    let value = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    HeaderValue::from_str(&value).map_err(|_| NetError::InvalidUrl)
}
