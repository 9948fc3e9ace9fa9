use crate::base::neterror::NetError;
use std::fmt;
use time::{Duration, OffsetDateTime, PrimitiveDateTime};
use url::Url;

/// Represents a cookie.
/// Modeled after Chromium's `net::CanonicalCookie`.
///
/// `domain` is `None` for host-only cookies. Domain cookies always carry
/// the leading dot (`.example.com`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalCookie {
    pub name: String,
    pub value: String,
    pub domain: Option<String>,
    pub path: String,
    pub secure: bool,
    pub http_only: bool,
    pub expiration_time: Option<OffsetDateTime>,
    pub creation_time: OffsetDateTime,
}

impl CanonicalCookie {
    /// A host-only session cookie on `/`.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: "/".to_string(),
            secure: false,
            http_only: false,
            expiration_time: None,
            creation_time: OffsetDateTime::now_utc(),
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_expiration(mut self, expires: OffsetDateTime) -> Self {
        self.expiration_time = Some(expires);
        self
    }

    /// Parse one `Set-Cookie` header value received from `url`.
    pub fn parse_set_cookie(line: &str, url: &Url) -> Result<Self, NetError> {
        let parsed = cookie::Cookie::parse(line).map_err(|e| {
            tracing::debug!(line = %line, error = %e, "unparseable Set-Cookie");
            NetError::CookieParseFailed
        })?;
        let host = url
            .host_str()
            .ok_or(NetError::InvalidUrl)?
            .to_ascii_lowercase();
        let now = OffsetDateTime::now_utc();

        // `cookie` strips the leading dot; a domain naming the host itself
        // stays host-only.
        let domain = parsed
            .domain()
            .map(|d| d.trim_start_matches('.').to_ascii_lowercase())
            .filter(|d| !d.is_empty() && *d != host)
            .map(|d| format!(".{d}"));

        let path = match parsed.path() {
            Some(p) if p.starts_with('/') => p.to_string(),
            _ => default_path(url),
        };

        let expiration_time = match parsed.max_age() {
            Some(max_age) => Some(expiry_after(now, max_age)),
            None => parsed.expires_datetime(),
        };

        Ok(Self {
            name: parsed.name().to_string(),
            value: parsed.value().to_string(),
            domain,
            path,
            secure: parsed.secure().unwrap_or(false),
            http_only: parsed.http_only().unwrap_or(false),
            expiration_time,
            creation_time: now,
        })
    }

    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.expiration_time.is_some_and(|expiry| expiry <= now)
    }

    pub fn is_host_only(&self) -> bool {
        self.domain.is_none()
    }

    /// The `name=value` pair sent in a `Cookie` request header.
    pub fn request_string(&self) -> String {
        format!("{}={}", self.name, self.value)
    }

    /// Serialize back into a `Set-Cookie` value that re-parses to an
    /// equivalent cookie for the same request URL.
    pub fn to_set_cookie_header(&self) -> String {
        let mut builder = cookie::Cookie::build((self.name.clone(), self.value.clone()))
            .path(self.path.clone())
            .secure(self.secure)
            .http_only(self.http_only);
        if let Some(domain) = &self.domain {
            builder = builder.domain(domain.clone());
        }
        if let Some(expires) = self.expiration_time {
            builder = builder.expires(expires);
        }
        builder.build().to_string()
    }
}

impl fmt::Display for CanonicalCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// `now + max_age`, clamped to the latest representable time.
fn expiry_after(now: OffsetDateTime, max_age: Duration) -> OffsetDateTime {
    now.checked_add(max_age).unwrap_or(if max_age.is_negative() {
        now
    } else {
        PrimitiveDateTime::MAX.assume_utc()
    })
}

/// RFC 6265 section 5.1.4 default-path of a request URL.
pub fn default_path(url: &Url) -> String {
    let path = url.path();
    if !path.starts_with('/') {
        return "/".to_string();
    }
    match path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => path[..idx].to_string(),
    }
}

/// RFC 6265 section 5.1.4 path-match.
pub fn path_matches(cookie_path: &str, request_path: &str) -> bool {
    if request_path == cookie_path {
        return true;
    }
    if let Some(rest) = request_path.strip_prefix(cookie_path) {
        return cookie_path.ends_with('/') || rest.starts_with('/');
    }
    false
}
