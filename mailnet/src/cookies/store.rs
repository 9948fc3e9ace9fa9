use crate::base::neterror::NetError;
use crate::cookies::canonicalcookie::{path_matches, CanonicalCookie};
use crate::cookies::psl::{check_cookie_domain, CookieRejection};
use dashmap::DashMap;
use std::collections::HashMap;
use time::OffsetDateTime;
use url::Url;

/// Which cookies a bucket holds for its domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Scope {
    /// Domain cookies: the domain and every subdomain.
    Wildcard,
    /// Host-only cookies for exactly this host.
    Host,
}

/// Reversed-label domain key, e.g. `com.google.mail`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct BucketKey {
    reversed: String,
    scope: Scope,
}

impl BucketKey {
    fn new(domain: &str, scope: Scope) -> Self {
        Self {
            reversed: reverse_labels(domain),
            scope,
        }
    }

    /// Forward domain as written in a cookie file.
    fn domain(&self) -> String {
        reverse_labels(&self.reversed)
    }
}

/// name -> path -> cookie
type Bucket = HashMap<String, HashMap<String, CanonicalCookie>>;

/// Result of [`CookieStore::add`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieAddOutcome {
    Stored,
    /// The cookie was already expired; its slot was cleared.
    Expired,
    Rejected(CookieRejection),
}

/// Per-account cookie jar.
///
/// Cookies live in buckets keyed by the reversed domain labels. Lookups walk
/// from the least specific wildcard bucket to the host bucket, so a more
/// specific bucket overrides a less specific one for the same name.
#[derive(Debug, Default)]
pub struct CookieStore {
    buckets: DashMap<BucketKey, Bucket>,
}

impl CookieStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `cookie` as received from `url`.
    pub fn add(&self, cookie: CanonicalCookie, url: &Url) -> Result<CookieAddOutcome, NetError> {
        let host = request_host(url)?;

        let key = match cookie.domain.as_deref() {
            None => BucketKey::new(&host, Scope::Host),
            Some(domain) if domain.eq_ignore_ascii_case(&host) => BucketKey::new(&host, Scope::Host),
            Some(domain) => {
                if let Err(reason) = check_cookie_domain(domain, &host) {
                    tracing::warn!(
                        name = %cookie.name,
                        domain = %domain,
                        host = %host,
                        reason = %reason,
                        "rejecting cookie"
                    );
                    return Ok(CookieAddOutcome::Rejected(reason));
                }
                BucketKey::new(domain.trim_start_matches('.'), Scope::Wildcard)
            }
        };

        if cookie.is_expired_at(OffsetDateTime::now_utc()) {
            self.remove_slot(&key, &cookie.name, &cookie.path);
            return Ok(CookieAddOutcome::Expired);
        }

        self.buckets
            .entry(key)
            .or_default()
            .entry(cookie.name.clone())
            .or_default()
            .insert(cookie.path.clone(), cookie);
        Ok(CookieAddOutcome::Stored)
    }

    /// Cookies to send to `url`, one per name.
    pub fn get(&self, url: &Url) -> Result<Vec<CanonicalCookie>, NetError> {
        let host = request_host(url)?;
        let secure_scheme = matches!(url.scheme(), "https" | "wss");
        let request_path = url.path();
        let now = OffsetDateTime::now_utc();

        let mut selected: HashMap<String, CanonicalCookie> = HashMap::new();
        let mut expired: Vec<(BucketKey, String, String)> = Vec::new();

        for key in lookup_keys(&host) {
            let Some(bucket) = self.buckets.get(&key) else {
                continue;
            };
            for (name, by_path) in bucket.iter() {
                let mut best: Option<&CanonicalCookie> = None;
                for (path, cookie) in by_path {
                    if cookie.is_expired_at(now) {
                        expired.push((key.clone(), name.clone(), path.clone()));
                        continue;
                    }
                    if !path_matches(path, request_path) || (cookie.secure && !secure_scheme) {
                        continue;
                    }
                    if best.map_or(true, |b| path.len() > b.path.len()) {
                        best = Some(cookie);
                    }
                }
                if let Some(cookie) = best {
                    selected.insert(name.clone(), cookie.clone());
                }
            }
        }

        for (key, name, path) in expired {
            self.remove_slot(&key, &name, &path);
        }

        let mut result: Vec<CanonicalCookie> = selected.into_values().collect();
        result.sort_by(|a, b| {
            b.path
                .len()
                .cmp(&a.path.len())
                .then_with(|| a.creation_time.cmp(&b.creation_time))
        });
        Ok(result)
    }

    /// `Cookie` header value for `url`, or `None` when nothing applies.
    pub fn cookie_header(&self, url: &Url) -> Result<Option<String>, NetError> {
        let cookies = self.get(url)?;
        if cookies.is_empty() {
            return Ok(None);
        }
        Ok(Some(
            cookies
                .iter()
                .map(CanonicalCookie::request_string)
                .collect::<Vec<_>>()
                .join("; "),
        ))
    }

    pub fn len(&self) -> usize {
        self.buckets
            .iter()
            .map(|entry| entry.value().values().map(|by_path| by_path.len()).sum::<usize>())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.buckets.clear();
    }

    /// Snapshot of every stored cookie, expired ones included.
    pub fn all_cookies(&self) -> Vec<CanonicalCookie> {
        self.buckets
            .iter()
            .flat_map(|entry| {
                entry
                    .value()
                    .values()
                    .flat_map(|by_path| by_path.values().cloned())
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Drop every expired cookie. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = OffsetDateTime::now_utc();
        let mut removed = 0;
        for mut entry in self.buckets.iter_mut() {
            for by_path in entry.value_mut().values_mut() {
                let before = by_path.len();
                by_path.retain(|_, cookie| !cookie.is_expired_at(now));
                removed += before - by_path.len();
            }
            entry.value_mut().retain(|_, by_path| !by_path.is_empty());
        }
        self.buckets.retain(|_, bucket| !bucket.is_empty());
        removed
    }

    /// Export cookies in the Netscape cookie file format used by curl and
    /// wget:
    /// `domain\tinclude_subdomains\tpath\tsecure\texpiry\tname\tvalue`
    ///
    /// HttpOnly cookies get curl's `#HttpOnly_` domain prefix. Session
    /// cookies carry expiry `0`.
    pub fn export_netscape(&self, domain_filter: Option<&str>) -> String {
        let mut lines = vec![
            "# Netscape HTTP Cookie File".to_string(),
            "# https://curl.se/docs/http-cookies.html".to_string(),
            "# This file was generated by mailnet".to_string(),
            String::new(),
        ];

        let now = OffsetDateTime::now_utc();
        let mut rows = Vec::new();
        for entry in self.buckets.iter() {
            let key = entry.key();
            let bare = key.domain();
            if let Some(filter) = domain_filter {
                if !bare.contains(filter) && !filter.contains(&bare) {
                    continue;
                }
            }
            let (domain, include_subdomains) = match key.scope {
                Scope::Wildcard => (format!(".{bare}"), "TRUE"),
                Scope::Host => (bare, "FALSE"),
            };
            for cookie in entry.value().values().flat_map(|by_path| by_path.values()) {
                if cookie.is_expired_at(now) {
                    continue;
                }
                let prefix = if cookie.http_only { "#HttpOnly_" } else { "" };
                let secure = if cookie.secure { "TRUE" } else { "FALSE" };
                let expiry = cookie
                    .expiration_time
                    .map(|t| t.unix_timestamp())
                    .unwrap_or(0);
                rows.push(format!(
                    "{prefix}{domain}\t{include_subdomains}\t{}\t{secure}\t{expiry}\t{}\t{}",
                    cookie.path, cookie.name, cookie.value
                ));
            }
        }
        rows.sort();
        lines.extend(rows);

        lines.join("\n")
    }

    fn remove_slot(&self, key: &BucketKey, name: &str, path: &str) {
        let now_empty = match self.buckets.get_mut(key) {
            Some(mut bucket) => {
                if let Some(by_path) = bucket.get_mut(name) {
                    by_path.remove(path);
                    if by_path.is_empty() {
                        bucket.remove(name);
                    }
                }
                bucket.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.buckets.remove_if(key, |_, bucket| bucket.is_empty());
        }
    }
}

fn request_host(url: &Url) -> Result<String, NetError> {
    url.host_str()
        .filter(|h| !h.is_empty())
        .map(|h| h.to_ascii_lowercase())
        .ok_or(NetError::InvalidUrl)
}

fn reverse_labels(domain: &str) -> String {
    domain.rsplit('.').collect::<Vec<_>>().join(".")
}

/// Buckets consulted for `host`, least specific first.
fn lookup_keys(host: &str) -> Vec<BucketKey> {
    let labels: Vec<&str> = host.rsplit('.').collect();
    let mut keys: Vec<BucketKey> = (1..=labels.len())
        .map(|n| BucketKey {
            reversed: labels[..n].join("."),
            scope: Scope::Wildcard,
        })
        .collect();
    keys.push(BucketKey::new(host, Scope::Host));
    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn set(store: &CookieStore, line: &str, at: &str) -> CookieAddOutcome {
        let u = url(at);
        let cookie = CanonicalCookie::parse_set_cookie(line, &u).unwrap();
        store.add(cookie, &u).unwrap()
    }

    #[test]
    fn test_lookup_keys_order() {
        let keys = lookup_keys("mail.google.com");
        let names: Vec<_> = keys.iter().map(|k| (k.reversed.as_str(), k.scope)).collect();
        assert_eq!(
            names,
            vec![
                ("com", Scope::Wildcard),
                ("com.google", Scope::Wildcard),
                ("com.google.mail", Scope::Wildcard),
                ("com.google.mail", Scope::Host),
            ]
        );
    }

    #[test]
    fn test_host_bucket_overrides_wildcard() {
        let store = CookieStore::new();
        assert_eq!(
            set(&store, "ID=wide; Domain=.google.com", "https://mail.google.com/"),
            CookieAddOutcome::Stored
        );
        assert_eq!(
            set(&store, "ID=narrow", "https://mail.google.com/"),
            CookieAddOutcome::Stored
        );

        let got = store.get(&url("https://mail.google.com/")).unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].value, "narrow");

        // the sibling host only sees the wildcard cookie
        let got = store.get(&url("https://accounts.google.com/")).unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].value, "wide");
    }

    #[test]
    fn test_host_only_not_sent_to_subdomain() {
        let store = CookieStore::new();
        set(&store, "A=1", "https://google.com/");
        assert!(store.get(&url("https://mail.google.com/")).unwrap().is_empty());
        assert_eq!(store.get(&url("https://google.com/")).unwrap().len(), 1);
    }

    #[test]
    fn test_secure_falls_back_to_shorter_path() {
        let store = CookieStore::new();
        set(&store, "S=root; Path=/", "http://mail.google.com/");
        set(&store, "S=deep; Path=/mail; Secure", "https://mail.google.com/mail/");

        let plain = store.get(&url("http://mail.google.com/mail/x")).unwrap();
        assert_eq!(plain.len(), 1);
        assert_eq!(plain[0].value, "root");

        let tls = store.get(&url("https://mail.google.com/mail/x")).unwrap();
        assert_eq!(tls[0].value, "deep");
    }

    #[test]
    fn test_expired_insert_clears_slot() {
        let store = CookieStore::new();
        set(&store, "A=1; Path=/", "https://mail.google.com/");
        assert_eq!(store.len(), 1);
        assert_eq!(
            set(&store, "A=gone; Path=/; Max-Age=0", "https://mail.google.com/"),
            CookieAddOutcome::Expired
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_get_prunes_expired() {
        let store = CookieStore::new();
        let u = url("https://mail.google.com/");
        let mut stale = CanonicalCookie::new("old", "x");
        stale.expiration_time = Some(OffsetDateTime::now_utc() + time::Duration::milliseconds(1));
        store.add(stale, &u).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));

        assert!(store.get(&u).unwrap().is_empty());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_rejections() {
        let store = CookieStore::new();
        assert_eq!(
            set(&store, "A=1; Domain=.com", "https://mail.google.com/"),
            CookieAddOutcome::Rejected(CookieRejection::PublicSuffix)
        );
        assert_eq!(
            set(&store, "A=1; Domain=example.org", "https://mail.google.com/"),
            CookieAddOutcome::Rejected(CookieRejection::NotHostSuffix)
        );
        let explicit = CanonicalCookie::new("A", "1").with_domain("google.com");
        assert_eq!(
            store.add(explicit, &url("https://mail.google.com/")).unwrap(),
            CookieAddOutcome::Rejected(CookieRejection::MissingDotPrefix)
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_hostless_url_fails_fast() {
        let store = CookieStore::new();
        let u = url("data:text/plain,hi");
        assert_eq!(
            store.add(CanonicalCookie::new("A", "1"), &u),
            Err(NetError::InvalidUrl)
        );
        assert_eq!(store.get(&u), Err(NetError::InvalidUrl));
    }

    #[test]
    fn test_cookie_header_ordering() {
        let store = CookieStore::new();
        set(&store, "short=1; Path=/", "https://mail.google.com/");
        set(&store, "long=2; Path=/mail/u", "https://mail.google.com/");

        let header = store
            .cookie_header(&url("https://mail.google.com/mail/u/0"))
            .unwrap();
        assert_eq!(header.as_deref(), Some("long=2; short=1"));
        assert_eq!(store.cookie_header(&url("https://example.org/")).unwrap(), None);
    }

    #[test]
    fn test_purge_and_clear() {
        let store = CookieStore::new();
        let u = url("https://mail.google.com/");
        store.add(CanonicalCookie::new("keep", "1"), &u).unwrap();
        let mut stale = CanonicalCookie::new("stale", "1");
        stale.expiration_time = Some(OffsetDateTime::now_utc() + time::Duration::milliseconds(1));
        store.add(stale, &u).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));

        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.all_cookies().len(), 1);
        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_export_netscape() {
        let store = CookieStore::new();
        set(&store, "SID=abc; Domain=.google.com; Secure", "https://mail.google.com/");
        set(&store, "GX=def; Path=/mail; HttpOnly", "https://mail.google.com/");
        set(&store, "other=1", "https://example.org/");

        let out = store.export_netscape(Some("google"));
        assert!(out.starts_with("# Netscape HTTP Cookie File"));
        assert!(out.contains(".google.com\tTRUE\t/\tTRUE\t0\tSID\tabc"));
        assert!(out.contains("#HttpOnly_mail.google.com\tFALSE\t/mail\tFALSE\t0\tGX\tdef"));
        assert!(!out.contains("example.org"));
    }
}
