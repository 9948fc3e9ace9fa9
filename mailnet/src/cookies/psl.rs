//! Public Suffix List (PSL) validation for cookie domain security.
//!
//! Prevents supercookie attacks by rejecting cookies set on public
//! suffixes like `.com`, `.co.uk`, etc.
//!
//! Uses Mozilla's Public Suffix List via the `psl` crate.

use psl::{List, Psl};
use std::fmt;
use std::net::IpAddr;

/// Why a cookie's `Domain` attribute was refused for a given host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookieRejection {
    /// Domain cookies must be written as `.example.com`.
    MissingDotPrefix,
    /// The domain does not cover the host that set it.
    NotHostSuffix,
    /// The domain is an effective TLD (or shorter).
    PublicSuffix,
}

impl fmt::Display for CookieRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            CookieRejection::MissingDotPrefix => "domain must start with a dot",
            CookieRejection::NotHostSuffix => "domain is not a suffix of the host",
            CookieRejection::PublicSuffix => "domain is a public suffix",
        };
        f.write_str(text)
    }
}

/// Check if a domain is a public suffix (e.g., "com", "co.uk").
/// Returns true if the domain itself is a public suffix.
pub fn is_public_suffix(domain: &str) -> bool {
    let domain_lower = domain.to_lowercase();
    let domain_bytes = domain_lower.as_bytes();

    match List.suffix(domain_bytes) {
        Some(suffix) => suffix.as_bytes() == domain_bytes,
        None => false,
    }
}

/// Get the registrable domain (eTLD+1) for a domain.
/// For "sub.example.com", returns "example.com".
/// For "com" (public suffix), returns None.
pub fn registrable_domain(domain: &str) -> Option<String> {
    let domain_lower = domain.to_lowercase();
    psl::domain(domain_lower.as_bytes())
        .and_then(|d| std::str::from_utf8(d.as_bytes()).ok())
        .map(|s| s.to_string())
}

/// Validate an explicit, dot-prefixed cookie domain against the host that
/// sent it.
///
/// The domain must be a proper suffix of the host (`.example.com` for
/// `mail.example.com`) and must sit at or below the registrable domain.
/// IP hosts never accept domain cookies.
pub fn check_cookie_domain(domain: &str, host: &str) -> Result<(), CookieRejection> {
    let domain = domain.to_lowercase();
    let host = host.to_lowercase();

    let Some(bare) = domain.strip_prefix('.') else {
        return Err(CookieRejection::MissingDotPrefix);
    };
    if bare.is_empty() || bare.starts_with('.') {
        return Err(CookieRejection::MissingDotPrefix);
    }

    if is_ip_literal(&host) || !host.ends_with(&domain) {
        return Err(CookieRejection::NotHostSuffix);
    }

    if is_public_suffix(bare) || registrable_domain(bare).is_none() {
        return Err(CookieRejection::PublicSuffix);
    }

    Ok(())
}

fn is_ip_literal(host: &str) -> bool {
    host.trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<IpAddr>()
        .is_ok()
}
