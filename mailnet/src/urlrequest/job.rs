use crate::base::neterror::NetError;
use crate::cookies::store::CookieStore;
use crate::http::requestbody::FormData;
use crate::http::response::HttpResponse;
use crate::http::transaction::HttpNetworkTransaction;
use crate::urlrequest::context::URLRequestContext;
use crate::urlrequest::request::{RequestMethod, SessionRequest};
use std::sync::Arc;
use url::Url;

/// Drives a [`SessionRequest`] through its redirect chain.
///
/// Every hop is its own transaction, so the `Cookie` header of hop N+1 is
/// computed after hop N's `Set-Cookie` lines were stored. A hop that carried
/// cookies counts as a restart, even when the jar refused them: the next hop
/// is sent with that hop's URL as referrer.
pub struct URLRequestHttpJob {
    context: Arc<URLRequestContext>,
    jar: Arc<CookieStore>,
    method: RequestMethod,
    url: Url,
    referrer: Option<Url>,
    payload: Option<FormData>,
    url_chain: Vec<Url>,
    restarts: usize,
}

impl URLRequestHttpJob {
    pub fn new(context: Arc<URLRequestContext>, request: SessionRequest) -> Self {
        let SessionRequest {
            mut url,
            method,
            payload,
            referrer,
            jar,
            ..
        } = request;

        let payload = match (method, payload) {
            (RequestMethod::Get, Some(form)) => {
                merge_query(&mut url, &form);
                None
            }
            (_, payload) => payload,
        };

        Self {
            context,
            jar,
            method,
            url,
            referrer,
            payload,
            url_chain: Vec::new(),
            restarts: 0,
        }
    }

    /// Every URL dispatched so far, in order.
    pub fn url_chain(&self) -> &[Url] {
        &self.url_chain
    }

    /// How many hops carried cookies and restarted the exchange.
    pub fn restarts(&self) -> usize {
        self.restarts
    }

    pub async fn start(&mut self) -> Result<HttpResponse, NetError> {
        let redirect_limit = self.context.config().redirect_limit;
        let mut redirects = 0;

        loop {
            self.url_chain.push(self.url.clone());

            let mut transaction = HttpNetworkTransaction::new(
                self.context.clone(),
                self.jar.clone(),
                self.method,
                self.url.clone(),
            );
            transaction.set_referrer(self.referrer.clone());
            transaction.set_payload(self.payload.clone());
            let hop = transaction.start().await?;

            // Check for redirect
            let Some(location) = hop.response.redirect_location() else {
                return Ok(hop.response);
            };
            let next = self.url.join(location).map_err(|_| NetError::InvalidRedirect)?;
            if !matches!(next.scheme(), "http" | "https") {
                return Err(NetError::InvalidRedirect);
            }

            if redirects >= redirect_limit {
                tracing::debug!(url = %self.url, limit = redirect_limit, "redirect limit reached");
                return Err(NetError::TooManyRedirects);
            }
            redirects += 1;

            if hop.cookies_received > 0 {
                self.restarts += 1;
                self.referrer = Some(self.url.clone());
                tracing::debug!(
                    from = %self.url,
                    to = %next,
                    received = hop.cookies_received,
                    stored = hop.cookies_set,
                    "redirect hop carried cookies, restarting"
                );
            }

            if matches!(hop.response.status().as_u16(), 301 | 302 | 303) {
                self.method = RequestMethod::Get;
                self.payload = None;
            }

            self.url = next;
        }
    }
}

/// Merge form fields into the URL's query. Existing parameters are kept
/// unless the form names them.
fn merge_query(url: &mut Url, form: &FormData) {
    let mut merged: FormData = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    for (k, v) in form.iter() {
        merged.set(k, v);
    }
    if merged.is_empty() {
        url.set_query(None);
    } else {
        url.set_query(Some(&merged.encode()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_query_overwrites() {
        let mut url = Url::parse("https://mail.google.com/mail/?ui=1&view=tl").unwrap();
        merge_query(&mut url, &FormData::new().with("view", "cv").with("th", "abc"));
        assert_eq!(url.query(), Some("ui=1&view=cv&th=abc"));
    }

    #[test]
    fn test_get_payload_moves_into_query() {
        let jar = Arc::new(CookieStore::new());
        let request = SessionRequest::new(Url::parse("https://mail.google.com/mail/").unwrap(), jar)
            .with_payload(FormData::new().with("search", "inbox"));
        let job = URLRequestHttpJob::new(Arc::new(URLRequestContext::new()), request);
        assert_eq!(job.url.as_str(), "https://mail.google.com/mail/?search=inbox");
        assert!(job.payload.is_none());
    }
}
