//! Handing a session over to something outside the engine.
//!
//! A viewer (a browser tab, curl, another process) needs the mailbox URL and
//! the cookies that authenticate it. [`CookieSink`] is that seam.

use crate::base::neterror::NetError;
use crate::cookies::canonicalcookie::CanonicalCookie;
use crate::cookies::store::{CookieAddOutcome, CookieStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;

/// Receives cookies for `url` into either a shared or a private partition.
pub trait CookieSink: Send + Sync {
    /// Returns the number of cookies accepted.
    fn inject(&self, url: &Url, cookies: &[CanonicalCookie], private: bool)
        -> Result<usize, NetError>;
}

/// Injects into one of two in-process jars.
///
/// Every cookie goes through its `Set-Cookie` form and is re-parsed against
/// `url`, so the target jar applies its own domain rules.
#[derive(Debug, Default)]
pub struct PartitionedCookieSink {
    shared: Arc<CookieStore>,
    private: Arc<CookieStore>,
}

impl PartitionedCookieSink {
    pub fn new(shared: Arc<CookieStore>, private: Arc<CookieStore>) -> Self {
        Self { shared, private }
    }

    pub fn shared(&self) -> &Arc<CookieStore> {
        &self.shared
    }

    pub fn private(&self) -> &Arc<CookieStore> {
        &self.private
    }
}

impl CookieSink for PartitionedCookieSink {
    fn inject(
        &self,
        url: &Url,
        cookies: &[CanonicalCookie],
        private: bool,
    ) -> Result<usize, NetError> {
        let target = if private { &self.private } else { &self.shared };
        replay_into(target, url, cookies)
    }
}

/// Writes curl/wget cookie files, one per partition.
///
/// Each call replaces the partition's file with the given cookies.
#[derive(Debug, Clone)]
pub struct NetscapeFileSink {
    shared_path: PathBuf,
    private_path: PathBuf,
}

impl NetscapeFileSink {
    pub fn new(shared_path: impl Into<PathBuf>, private_path: impl Into<PathBuf>) -> Self {
        Self {
            shared_path: shared_path.into(),
            private_path: private_path.into(),
        }
    }

    pub fn path_for(&self, private: bool) -> &Path {
        if private {
            &self.private_path
        } else {
            &self.shared_path
        }
    }
}

impl CookieSink for NetscapeFileSink {
    fn inject(
        &self,
        url: &Url,
        cookies: &[CanonicalCookie],
        private: bool,
    ) -> Result<usize, NetError> {
        let jar = CookieStore::new();
        let accepted = replay_into(&jar, url, cookies)?;

        let path = self.path_for(private);
        std::fs::write(path, jar.export_netscape(None)).map_err(|e| {
            NetError::CookieExportFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            }
        })?;
        tracing::debug!(path = %path.display(), count = accepted, "wrote cookie file");
        Ok(accepted)
    }
}

fn replay_into(
    jar: &CookieStore,
    url: &Url,
    cookies: &[CanonicalCookie],
) -> Result<usize, NetError> {
    let mut accepted = 0;
    for cookie in cookies {
        let reparsed = CanonicalCookie::parse_set_cookie(&cookie.to_set_cookie_header(), url)?;
        match jar.add(reparsed, url)? {
            CookieAddOutcome::Stored => accepted += 1,
            CookieAddOutcome::Expired => {}
            CookieAddOutcome::Rejected(reason) => {
                return Err(NetError::CookieDomainInvalid {
                    name: cookie.name.clone(),
                    reason,
                })
            }
        }
    }
    Ok(accepted)
}
