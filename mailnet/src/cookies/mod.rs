//! Cookie management.
//!
//! This module provides the per-account cookie jar:
//!
//! - **Storage**: domain/path-indexed jar ([`CookieStore`](store::CookieStore))
//! - **Parsing**: `Set-Cookie` lines into [`CanonicalCookie`](canonicalcookie::CanonicalCookie)
//! - **Validation**: Public Suffix List checks ([`psl`])
//! - **Hand-off**: exporting a session to viewers ([`sink`])
//!
//! # Architecture
//!
//! | Chromium (C++) | mailnet (Rust) | Responsibility |
//! |----------------|----------------|----------------|
//! | `net::CookieMonster` | [`CookieStore`](store::CookieStore) | Cookie jar and lookup |
//! | `net::CanonicalCookie` | [`CanonicalCookie`](canonicalcookie::CanonicalCookie) | Single cookie representation |
//! | `net::registry_controlled_domains` | [`psl`] | Public suffix checks |
//!
//! # Export to Netscape Format (curl/wget compatible)
//!
//! ```rust,no_run
//! use mailnet::cookies::store::CookieStore;
//!
//! let jar = CookieStore::new();
//! // ... add cookies ...
//! let netscape = jar.export_netscape(None);
//! std::fs::write("cookies.txt", netscape)?;
//! # Ok::<(), std::io::Error>(())
//! ```
//!
//! # Chromium References
//!
//! - Cookie monster: `net/cookies/cookie_monster.cc`
//! - Cookie parsing: `net/cookies/parsed_cookie.cc`

pub mod canonicalcookie;
pub mod psl;
pub mod sink;
pub mod store;

pub use canonicalcookie::CanonicalCookie;
pub use sink::{CookieSink, NetscapeFileSink, PartitionedCookieSink};
pub use store::{CookieAddOutcome, CookieStore};
