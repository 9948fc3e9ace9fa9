use crate::base::neterror::NetError;
use crate::socket::client::SocketType;
use boring::ssl::{SslConnector, SslMethod};
use std::io::ErrorKind;
use tokio::net::TcpStream;
use url::Url;

/// ALPN list offered on TLS connections. The session engine only speaks
/// HTTP/1.1.
const ALPN_HTTP11: &[u8] = b"\x08http/1.1";

/// Manages the connection process: DNS -> TCP -> SSL.
/// Roughly equivalent to net::ConnectJob.
pub struct ConnectJob;

impl ConnectJob {
    pub async fn connect(url: &Url) -> Result<SocketType, NetError> {
        let host = url.host_str().ok_or(NetError::InvalidUrl)?;
        let port = url.port_or_known_default().ok_or(NetError::InvalidUrl)?;
        let secure = match url.scheme() {
            "https" => true,
            "http" => false,
            _ => return Err(NetError::DisallowedUrlScheme),
        };

        // 1. DNS Resolution
        let addrs = tokio::net::lookup_host((host.trim_matches(['[', ']']), port))
            .await
            .map_err(|e| {
                tracing::debug!(host = %host, error = %e, "DNS lookup failed");
                NetError::NameNotResolved
            })?;

        // 2. TCP Connect, first address that answers
        let mut last_error = NetError::NameNotResolved;
        let mut stream = None;
        for addr in addrs {
            match TcpStream::connect(addr).await {
                Ok(s) => {
                    stream = Some(s);
                    break;
                }
                Err(e) => {
                    tracing::debug!(addr = %addr, error = %e, "TCP connect failed");
                    last_error = map_connect_error(e.kind());
                }
            }
        }
        let stream = stream.ok_or(last_error)?;
        stream.set_nodelay(true).ok();

        if !secure {
            return Ok(SocketType::Tcp(stream));
        }

        // 3. SSL Handshake
        let mut builder =
            SslConnector::builder(SslMethod::tls()).map_err(|_| NetError::SslProtocolError)?;
        builder
            .set_alpn_protos(ALPN_HTTP11)
            .map_err(|_| NetError::SslProtocolError)?;
        let connector = builder.build();
        let config = connector
            .configure()
            .map_err(|_| NetError::SslProtocolError)?;

        let tls_stream = tokio_boring::connect(config, host, stream)
            .await
            .map_err(|e| {
                tracing::debug!(host = %host, error = ?e, "SSL handshake failed");
                NetError::SslProtocolError
            })?;

        Ok(SocketType::Ssl(tls_stream))
    }
}

fn map_connect_error(kind: ErrorKind) -> NetError {
    match kind {
        ErrorKind::ConnectionRefused => NetError::ConnectionRefused,
        ErrorKind::ConnectionReset => NetError::ConnectionReset,
        ErrorKind::ConnectionAborted => NetError::ConnectionAborted,
        ErrorKind::TimedOut => NetError::ConnectionTimedOut,
        _ => NetError::ConnectionFailed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rejects_unknown_scheme() {
        let url = Url::parse("ftp://example.com/").unwrap();
        assert_eq!(
            ConnectJob::connect(&url).await.unwrap_err(),
            NetError::DisallowedUrlScheme
        );
    }

    #[tokio::test]
    async fn test_plain_connect() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let _ = listener.accept().await;
        });

        let url = Url::parse(&format!("http://127.0.0.1:{port}/")).unwrap();
        let socket = ConnectJob::connect(&url).await.unwrap();
        assert!(!socket.is_secure());
        assert!(socket.alpn_protocol().is_none());
    }

    #[test]
    fn test_connect_error_mapping() {
        assert_eq!(
            map_connect_error(ErrorKind::ConnectionRefused),
            NetError::ConnectionRefused
        );
        assert_eq!(map_connect_error(ErrorKind::Other), NetError::ConnectionFailed);
    }
}
