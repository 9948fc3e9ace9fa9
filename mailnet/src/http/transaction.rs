use crate::base::neterror::NetError;
use crate::cookies::canonicalcookie::CanonicalCookie;
use crate::cookies::store::{CookieAddOutcome, CookieStore};
use crate::http::requestbody::{FormData, RequestBody};
use crate::http::response::HttpResponse;
use crate::http::transport::OutgoingRequest;
use crate::urlrequest::context::URLRequestContext;
use crate::urlrequest::request::RequestMethod;
use http::{header, HeaderMap, HeaderValue};
use std::sync::Arc;
use url::Url;

/// Internal state machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    AttachCookies,
    SendRequest,
    StoreCookies,
    Done,
}

/// What one hop produced.
#[derive(Debug)]
pub struct HopOutcome {
    pub response: HttpResponse,
    /// Number of parseable `Set-Cookie` lines the hop carried, whether or
    /// not the jar accepted them.
    pub cookies_received: usize,
    /// Number of those lines committed to the jar.
    pub cookies_set: usize,
}

/// Exactly one request/response exchange against a jar.
///
/// Reads the jar before sending and writes every `Set-Cookie` back keyed
/// by this hop's URL. Redirects are the job's business.
pub struct HttpNetworkTransaction {
    context: Arc<URLRequestContext>,
    jar: Arc<CookieStore>,
    method: RequestMethod,
    url: Url,
    referrer: Option<Url>,
    payload: Option<FormData>,
    state: State,
    request: Option<OutgoingRequest>,
    response: Option<HttpResponse>,
}

impl HttpNetworkTransaction {
    pub fn new(
        context: Arc<URLRequestContext>,
        jar: Arc<CookieStore>,
        method: RequestMethod,
        url: Url,
    ) -> Self {
        Self {
            context,
            jar,
            method,
            url,
            referrer: None,
            payload: None,
            state: State::Idle,
            request: None,
            response: None,
        }
    }

    pub fn set_referrer(&mut self, referrer: Option<Url>) {
        self.referrer = referrer;
    }

    /// Form fields sent as the request body. Only used for POST.
    pub fn set_payload(&mut self, payload: Option<FormData>) {
        self.payload = payload;
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub async fn start(mut self) -> Result<HopOutcome, NetError> {
        self.state = State::AttachCookies;
        let mut cookies = (0, 0);

        loop {
            match self.state {
                State::Idle => return Err(NetError::InvalidResponse),
                State::AttachCookies => {
                    self.request = Some(self.build_request()?);
                    self.state = State::SendRequest;
                }
                State::SendRequest => {
                    let request = self.request.take().ok_or(NetError::ConnectionClosed)?;
                    let exchange = self.context.transport().exchange(request);
                    let timeout = self.context.config().exchange_timeout;
                    let mut response = tokio::time::timeout(timeout, exchange)
                        .await
                        .map_err(|_| {
                            tracing::debug!(url = %self.url, ?timeout, "exchange timed out");
                            NetError::ConnectionTimedOut
                        })??;
                    response.set_url(self.url.clone());
                    self.response = Some(response);
                    self.state = State::StoreCookies;
                }
                State::StoreCookies => {
                    if let Some(response) = &self.response {
                        cookies = self.store_cookies(response)?;
                    }
                    self.state = State::Done;
                }
                State::Done => {
                    let response = self.response.take().ok_or(NetError::EmptyResponse)?;
                    let (cookies_received, cookies_set) = cookies;
                    return Ok(HopOutcome {
                        response,
                        cookies_received,
                        cookies_set,
                    });
                }
            }
        }
    }

    fn build_request(&self) -> Result<OutgoingRequest, NetError> {
        let config = self.context.config();
        let mut headers = HeaderMap::new();

        headers.insert(header::USER_AGENT, header_value(&config.user_agent)?);
        headers.insert(header::ACCEPT, header_value(&config.accept)?);
        if let Some(lang) = &config.accept_language {
            headers.insert(header::ACCEPT_LANGUAGE, header_value(lang)?);
        }
        if let Some(referrer) = &self.referrer {
            headers.insert(header::REFERER, header_value(referrer.as_str())?);
        }
        if let Some(cookie) = self.jar.cookie_header(&self.url)? {
            headers.insert(header::COOKIE, header_value(&cookie)?);
        }

        let body = match (self.method, &self.payload) {
            (RequestMethod::Post, Some(form)) => {
                headers.insert(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("application/x-www-form-urlencoded"),
                );
                RequestBody::from(form)
            }
            _ => RequestBody::Empty,
        };

        Ok(OutgoingRequest {
            method: self.method.as_http(),
            url: self.url.clone(),
            headers,
            body,
        })
    }

    /// Returns `(received, stored)`.
    fn store_cookies(&self, response: &HttpResponse) -> Result<(usize, usize), NetError> {
        let mut received = 0;
        let mut stored = 0;
        for line in response.set_cookie_lines() {
            let cookie = match CanonicalCookie::parse_set_cookie(line, &self.url) {
                Ok(cookie) => cookie,
                Err(NetError::CookieParseFailed) => continue,
                Err(e) => return Err(e),
            };
            received += 1;
            match self.jar.add(cookie, &self.url)? {
                CookieAddOutcome::Stored | CookieAddOutcome::Expired => stored += 1,
                CookieAddOutcome::Rejected(_) => {}
            }
        }
        if stored > 0 {
            tracing::debug!(url = %self.url, count = stored, "stored cookies from hop");
        }
        Ok((received, stored))
    }
}

fn header_value(value: &str) -> Result<HeaderValue, NetError> {
    HeaderValue::from_str(value).map_err(|_| NetError::InvalidUrl)
}
