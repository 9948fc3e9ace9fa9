use mailnet::cookies::{CanonicalCookie, CookieAddOutcome, CookieStore};
use time::{Duration, OffsetDateTime};
use url::Url;

fn save(store: &CookieStore, url: &Url, line: &str) -> CookieAddOutcome {
    let cookie = CanonicalCookie::parse_set_cookie(line, url).unwrap();
    store.add(cookie, url).unwrap()
}

fn names(store: &CookieStore, url: &str) -> Vec<String> {
    store
        .get(&Url::parse(url).unwrap())
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect()
}

#[test]
fn test_domain_acceptance() {
    let store = CookieStore::new();
    let url = Url::parse("https://a.example.com/").unwrap();

    assert_eq!(save(&store, &url, "host=1"), CookieAddOutcome::Stored);
    assert_eq!(save(&store, &url, "same=1; Domain=a.example.com"), CookieAddOutcome::Stored);
    assert_eq!(save(&store, &url, "parent=1; Domain=example.com"), CookieAddOutcome::Stored);
    assert_eq!(save(&store, &url, "dotted=1; Domain=.example.com"), CookieAddOutcome::Stored);

    assert!(matches!(
        save(&store, &url, "tld=1; Domain=com"),
        CookieAddOutcome::Rejected(_)
    ));
    assert!(matches!(
        save(&store, &url, "other=1; Domain=other.com"),
        CookieAddOutcome::Rejected(_)
    ));
    assert!(matches!(
        save(&store, &url, "child=1; Domain=b.a.example.com"),
        CookieAddOutcome::Rejected(_)
    ));
    assert_eq!(store.len(), 4);
}

#[test]
fn test_public_suffix_rejected() {
    let store = CookieStore::new();
    let url = Url::parse("https://shop.example.co.uk/").unwrap();
    assert!(matches!(
        save(&store, &url, "super=1; Domain=co.uk"),
        CookieAddOutcome::Rejected(_)
    ));
    assert_eq!(save(&store, &url, "ok=1; Domain=example.co.uk"), CookieAddOutcome::Stored);
}

#[test]
fn test_host_only_scope() {
    let store = CookieStore::new();
    let url = Url::parse("https://example.com/").unwrap();
    save(&store, &url, "host=1");
    save(&store, &url, "wide=1; Domain=example.com; Path=/");

    // Domain equal to the host is host-only too.
    assert_eq!(names(&store, "https://www.example.com/"), Vec::<String>::new());
    let mut on_host = names(&store, "https://example.com/");
    on_host.sort();
    assert_eq!(on_host, vec!["host", "wide"]);

    let parent = Url::parse("https://a.example.com/").unwrap();
    save(&store, &parent, "shared=1; Domain=example.com");
    assert_eq!(names(&store, "https://www.example.com/"), vec!["shared"]);
}

#[test]
fn test_secure_cookie_needs_secure_scheme() {
    let store = CookieStore::new();
    let url = Url::parse("https://example.com/").unwrap();
    save(&store, &url, "sid=1; Secure");
    save(&store, &url, "pref=1");

    assert_eq!(names(&store, "http://example.com/"), vec!["pref"]);
    assert_eq!(names(&store, "https://example.com/").len(), 2);
}

#[test]
fn test_expired_never_returned() {
    let store = CookieStore::new();
    let url = Url::parse("https://example.com/").unwrap();
    save(&store, &url, "sid=live");

    let gone = CanonicalCookie::new("old", "x").with_expiration(OffsetDateTime::now_utc() - Duration::hours(1));
    assert_eq!(store.add(gone, &url).unwrap(), CookieAddOutcome::Expired);
    assert_eq!(names(&store, "https://example.com/"), vec!["sid"]);

    // Max-Age=0 deletes the stored value.
    assert_eq!(save(&store, &url, "sid=; Max-Age=0"), CookieAddOutcome::Expired);
    assert!(store.get(&url).unwrap().is_empty());
    assert!(store.is_empty());
}

#[test]
fn test_store_then_lookup_returns_current_value() {
    let store = CookieStore::new();
    let url = Url::parse("https://mail.example.com/mail/").unwrap();
    save(&store, &url, "sid=one; Path=/");
    save(&store, &url, "sid=two; Path=/");

    let cookies = store.get(&url).unwrap();
    assert_eq!(cookies.len(), 1);
    assert_eq!(cookies[0].value, "two");
    assert_eq!(store.len(), 1);
}

#[test]
fn test_longest_path_wins() {
    let store = CookieStore::new();
    let url = Url::parse("https://example.com/a/b/c").unwrap();
    save(&store, &url, "k=short; Path=/a");
    save(&store, &url, "k=long; Path=/a/b");
    save(&store, &url, "k=other; Path=/x");

    let cookies = store.get(&url).unwrap();
    assert_eq!(cookies.len(), 1);
    assert_eq!(cookies[0].path, "/a/b");
    assert_eq!(cookies[0].value, "long");

    let header = store
        .cookie_header(&Url::parse("https://example.com/a/z").unwrap())
        .unwrap();
    assert_eq!(header.as_deref(), Some("k=short"));
    assert_eq!(
        store.cookie_header(&Url::parse("https://example.com/ab").unwrap()).unwrap(),
        None
    );
}

#[test]
fn test_netscape_export() {
    let store = CookieStore::new();
    let url = Url::parse("https://mail.example.com/mail/").unwrap();
    save(&store, &url, "sid=1; Domain=example.com; Path=/; HttpOnly; Secure");
    save(&store, &url, "lang=en; Path=/mail");

    let text = store.export_netscape(None);
    assert!(text.starts_with("# Netscape HTTP Cookie File"));
    assert!(text.contains("#HttpOnly_.example.com\tTRUE\t/\tTRUE\t0\tsid\t1"));
    assert!(text.contains("mail.example.com\tFALSE\t/mail\tFALSE\t0\tlang\ten"));
}
