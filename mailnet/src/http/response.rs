//! HTTP response with a fully read body.

use bytes::Bytes;
use http::{header, HeaderMap, StatusCode};
use url::Url;

/// One hop's response. The body is always read to the end.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    url: Url,
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl HttpResponse {
    pub fn new(url: Url, status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            url,
            status,
            headers,
            body,
        }
    }

    /// The URL this response was served from.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub(crate) fn set_url(&mut self, url: Url) {
        self.url = url;
    }

    /// Get the status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get a reference to the headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Every `Set-Cookie` value that is valid header text.
    pub fn set_cookie_lines(&self) -> impl Iterator<Item = &str> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
    }

    /// `Location` for redirect statuses this engine follows.
    pub fn redirect_location(&self) -> Option<&str> {
        if !matches!(self.status.as_u16(), 301 | 302 | 303 | 307 | 308) {
            return None;
        }
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn response(status: u16, headers: &[(&'static str, &'static str)]) -> HttpResponse {
        let mut map = HeaderMap::new();
        for (k, v) in headers {
            map.append(*k, HeaderValue::from_static(*v));
        }
        HttpResponse::new(
            Url::parse("https://mail.google.com/").unwrap(),
            StatusCode::from_u16(status).unwrap(),
            map,
            Bytes::from_static(b"<html></html>"),
        )
    }

    #[test]
    fn test_redirect_location() {
        assert_eq!(
            response(302, &[("location", "/next")]).redirect_location(),
            Some("/next")
        );
        assert_eq!(response(302, &[]).redirect_location(), None);
        assert_eq!(response(304, &[("location", "/x")]).redirect_location(), None);
        assert_eq!(response(200, &[("location", "/x")]).redirect_location(), None);
    }

    #[test]
    fn test_set_cookie_lines() {
        let resp = response(200, &[("set-cookie", "a=1"), ("set-cookie", "b=2")]);
        let lines: Vec<_> = resp.set_cookie_lines().collect();
        assert_eq!(lines, vec!["a=1", "b=2"]);
        assert_eq!(resp.text(), "<html></html>");
    }
}
