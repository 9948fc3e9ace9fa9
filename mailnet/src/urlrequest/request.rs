use crate::base::neterror::NetError;
use crate::cookies::store::CookieStore;
use crate::http::requestbody::FormData;
use std::fmt;
use std::sync::Arc;
use url::Url;

/// The only methods a session request may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMethod {
    #[default]
    Get,
    Post,
}

impl RequestMethod {
    pub fn as_http(self) -> http::Method {
        match self {
            RequestMethod::Get => http::Method::GET,
            RequestMethod::Post => http::Method::POST,
        }
    }
}

impl TryFrom<&str> for RequestMethod {
    type Error = NetError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if value.eq_ignore_ascii_case("get") {
            Ok(RequestMethod::Get)
        } else if value.eq_ignore_ascii_case("post") {
            Ok(RequestMethod::Post)
        } else {
            Err(NetError::MethodNotSupported)
        }
    }
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_http().as_str())
    }
}

/// One logical request: a URL plus everything needed to drive it through
/// redirects against a specific cookie jar.
#[derive(Debug, Clone)]
pub struct SessionRequest {
    pub url: Url,
    pub method: RequestMethod,
    pub payload: Option<FormData>,
    pub referrer: Option<Url>,
    pub jar: Arc<CookieStore>,
    /// Whether a viewer should receive this session in its private
    /// partition.
    pub private: bool,
}

impl SessionRequest {
    pub fn new(url: Url, jar: Arc<CookieStore>) -> Self {
        Self {
            url,
            method: RequestMethod::Get,
            payload: None,
            referrer: None,
            jar,
            private: true,
        }
    }

    pub fn get(url: Url, jar: Arc<CookieStore>) -> Self {
        Self::new(url, jar)
    }

    pub fn post(url: Url, form: FormData, jar: Arc<CookieStore>) -> Self {
        Self::new(url, jar)
            .with_method(RequestMethod::Post)
            .with_payload(form)
    }

    pub fn with_method(mut self, method: RequestMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_payload(mut self, form: FormData) -> Self {
        self.payload = Some(form);
        self
    }

    pub fn with_referrer(mut self, referrer: Url) -> Self {
        self.referrer = Some(referrer);
        self
    }

    pub fn with_private(mut self, private: bool) -> Self {
        self.private = private;
        self
    }
}
