//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use mailnet::http::{Exchanging, HttpResponse, OutgoingRequest, Transport};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

/// A canned response.
#[derive(Debug, Clone)]
pub struct Reply {
    status: u16,
    headers: Vec<(String, String)>,
    body: String,
}

impl Reply {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn redirect(status: u16, location: &str) -> Self {
        Self {
            status,
            headers: vec![("location".to_string(), location.to_string())],
            body: String::new(),
        }
    }

    pub fn set_cookie(self, line: &str) -> Self {
        self.header("set-cookie", line)
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    fn into_response(self, url: Url) -> HttpResponse {
        let mut headers = HeaderMap::new();
        for (name, value) in self.headers {
            headers.append(
                HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(&value).unwrap(),
            );
        }
        HttpResponse::new(
            url,
            StatusCode::from_u16(self.status).unwrap(),
            headers,
            Bytes::from(self.body),
        )
    }
}

type Route = dyn Fn(&OutgoingRequest) -> Reply + Send + Sync;

/// In-memory transport answering from a routing closure and recording every
/// request it sees.
pub struct ScriptedTransport {
    route: Box<Route>,
    log: Mutex<Vec<OutgoingRequest>>,
}

impl ScriptedTransport {
    pub fn new<F>(route: F) -> Arc<Self>
    where
        F: Fn(&OutgoingRequest) -> Reply + Send + Sync + 'static,
    {
        Arc::new(Self {
            route: Box::new(route),
            log: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<OutgoingRequest> {
        self.log.lock().unwrap().clone()
    }

    pub fn posts(&self) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == http::Method::POST)
            .count()
    }
}

impl Transport for ScriptedTransport {
    fn exchange(&self, request: OutgoingRequest) -> Exchanging {
        let reply = (self.route)(&request);
        let url = request.url.clone();
        self.log.lock().unwrap().push(request);
        Box::pin(async move { Ok(reply.into_response(url)) })
    }
}

/// Answers through `inner` after `delay`.
pub struct Delayed {
    pub inner: Arc<ScriptedTransport>,
    pub delay: Duration,
}

impl Transport for Delayed {
    fn exchange(&self, request: OutgoingRequest) -> Exchanging {
        let reply = self.inner.exchange(request);
        let delay = self.delay;
        Box::pin(async move {
            tokio::time::sleep(delay).await;
            reply.await
        })
    }
}

pub const LOGIN_URL: &str = "https://accounts.example.com/ServiceLoginAuth";
pub const CHECK_URL: &str = "https://mail.example.com/mail/";

pub fn login_page() -> String {
    format!(
        r#"<html><body>
        <form id="gaia_loginform" action="{LOGIN_URL}" method="post">
          <input type="hidden" name="GALX" value="token-1">
          <input type="text" name="Email" value="">
          <input type="password" name="Passwd">
          <input type="checkbox" name="PersistentCookie" value="yes">
          <input type="submit" name="signIn" value="Sign in">
        </form></body></html>"#
    )
}

pub fn mailbox_page(globals: &str, view_data: &str) -> String {
    format!(
        "<html><head><script>var GLOBALS={globals};</script>\
         <script>var VIEW_DATA={view_data};</script></head><body></body></html>"
    )
}

/// Form-decoded request body.
pub fn form_fields(request: &OutgoingRequest) -> Vec<(String, String)> {
    let bytes = request.body.clone().into_bytes();
    url::form_urlencoded::parse(&bytes).into_owned().collect()
}
