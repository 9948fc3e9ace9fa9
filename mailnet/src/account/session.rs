use crate::account::identity::{MailEndpoints, MailIdentity};
use crate::auth::flow::LoginTarget;
use crate::base::neterror::NetError;
use crate::cookies::sink::CookieSink;
use crate::cookies::store::CookieStore;
use crate::mailbox::{LabelSnapshot, MailboxSnapshot, Snippet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use time::OffsetDateTime;
use tokio::task::AbortHandle;
use url::Url;

/// Connection state of one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccountState {
    #[default]
    Offline,
    Connecting,
    /// Logged in, nothing unread in the inbox.
    Online,
    /// Logged in with unread inbox mail.
    Notify,
}

/// What the last check left behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountStatus {
    pub state: AccountState,
    /// Where the mailbox page was finally served from.
    pub mailbox_url: Option<Url>,
    pub labels: LabelSnapshot,
    pub snippets: Vec<Snippet>,
    pub last_error: Option<NetError>,
    pub last_checked: Option<OffsetDateTime>,
}

/// One mailbox and the session that reaches it.
///
/// The account owns its cookie jar. Checks are serialized by `check_lock`;
/// everything else is short critical sections, safe to touch from any task.
#[derive(Debug)]
pub struct Account {
    identity: MailIdentity,
    endpoints: MailEndpoints,
    jar: RwLock<Arc<CookieStore>>,
    status: Mutex<AccountStatus>,
    pub(crate) check_lock: tokio::sync::Mutex<()>,
    in_flight: Mutex<Option<AbortHandle>>,
}

impl Account {
    pub fn new(identity: MailIdentity) -> Result<Self, NetError> {
        let endpoints = MailEndpoints::for_identity(&identity)?;
        Ok(Self::with_endpoints(identity, endpoints))
    }

    pub fn with_endpoints(identity: MailIdentity, endpoints: MailEndpoints) -> Self {
        Self {
            identity,
            endpoints,
            jar: RwLock::new(Arc::new(CookieStore::new())),
            status: Mutex::new(AccountStatus::default()),
            check_lock: tokio::sync::Mutex::new(()),
            in_flight: Mutex::new(None),
        }
    }

    pub fn identity(&self) -> &MailIdentity {
        &self.identity
    }

    pub fn address(&self) -> &str {
        self.identity.address()
    }

    pub fn endpoints(&self) -> &MailEndpoints {
        &self.endpoints
    }

    pub fn state(&self) -> AccountState {
        lock(&self.status).state
    }

    pub fn status(&self) -> AccountStatus {
        lock(&self.status).clone()
    }

    /// The current jar. Replaced wholesale on logout.
    pub fn jar(&self) -> Arc<CookieStore> {
        self.jar
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_checking(&self) -> bool {
        self.check_lock.try_lock().is_err()
    }

    pub fn login_target(&self) -> LoginTarget {
        LoginTarget {
            identifier: self.identity.address().to_string(),
            form_identity: self.identity.form_identity().to_string(),
            login_url: self.endpoints.login_url.clone(),
            realm: self.endpoints.realm.clone(),
        }
    }

    /// Drop the session: `Offline`, with a fresh empty jar.
    pub fn logout(&self) {
        *self.jar.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(CookieStore::new());
        let mut status = lock(&self.status);
        status.state = AccountState::Offline;
        status.mailbox_url = None;
        tracing::debug!(account = %self.identity, "logged out");
    }

    /// Abort the in-flight check, if any. Returns whether one was aborted.
    pub fn cancel_check(&self) -> bool {
        let Some(handle) = lock(&self.in_flight).take() else {
            return false;
        };
        if handle.is_finished() {
            return false;
        }
        handle.abort();

        let mut status = lock(&self.status);
        if status.state == AccountState::Connecting {
            status.state = if status.mailbox_url.is_some() {
                AccountState::Online
            } else {
                AccountState::Offline
            };
        }
        status.last_error = Some(NetError::CheckCancelled);
        tracing::debug!(account = %self.identity, "check cancelled");
        true
    }

    /// Hand the mailbox URL and the cookies that authenticate it to a
    /// viewer. Returns the URL the viewer should open.
    pub fn open_in_viewer(&self, sink: &dyn CookieSink, private: bool) -> Result<Url, NetError> {
        let url = lock(&self.status)
            .mailbox_url
            .clone()
            .unwrap_or_else(|| self.endpoints.check_url.clone());
        let cookies = self.jar().get(&url)?;
        let injected = sink.inject(&url, &cookies, private)?;
        tracing::debug!(
            account = %self.identity,
            url = %url,
            injected,
            private,
            "handed session to viewer"
        );
        Ok(url)
    }

    pub(crate) fn set_state(&self, state: AccountState) {
        lock(&self.status).state = state;
    }

    pub(crate) fn record_success(&self, mailbox_url: Url, snapshot: &MailboxSnapshot) {
        let mut status = lock(&self.status);
        status.state = snapshot.derived_state();
        status.mailbox_url = Some(mailbox_url);
        status.labels = snapshot.labels.clone();
        status.snippets = snapshot.snippets.clone();
        status.last_error = None;
        status.last_checked = Some(OffsetDateTime::now_utc());
    }

    pub(crate) fn record_failure(&self, error: &NetError) {
        if error.is_logout_condition() {
            self.logout();
        } else {
            let mut status = lock(&self.status);
            status.state = match error {
                NetError::MalformedMailboxData { .. } => AccountState::Online,
                _ if status.mailbox_url.is_some() => AccountState::Online,
                _ => AccountState::Offline,
            };
        }
        let mut status = lock(&self.status);
        status.last_error = Some(error.clone());
        status.last_checked = Some(OffsetDateTime::now_utc());
    }

    pub(crate) fn in_flight(&self) -> MutexGuard<'_, Option<AbortHandle>> {
        lock(&self.in_flight)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookies::canonicalcookie::CanonicalCookie;
    use crate::cookies::sink::PartitionedCookieSink;

    fn account() -> Account {
        Account::new(MailIdentity::parse("someone@gmail.com").unwrap()).unwrap()
    }

    #[test]
    fn test_new_account_is_offline() {
        let account = account();
        assert_eq!(account.state(), AccountState::Offline);
        assert!(account.jar().is_empty());
        assert!(!account.is_checking());
        assert_eq!(account.login_target().form_identity, "someone@gmail.com");
    }

    #[test]
    fn test_logout_replaces_jar() {
        let account = account();
        let url = account.endpoints().check_url.clone();
        let old = account.jar();
        old.add(CanonicalCookie::new("SID", "1"), &url).unwrap();
        account.set_state(AccountState::Online);

        account.logout();
        assert_eq!(account.state(), AccountState::Offline);
        assert!(account.jar().is_empty());
        assert!(!Arc::ptr_eq(&old, &account.jar()));
    }

    #[test]
    fn test_malformed_keeps_session() {
        let account = account();
        let url = account.endpoints().check_url.clone();
        account.jar().add(CanonicalCookie::new("SID", "1"), &url).unwrap();
        account.set_state(AccountState::Connecting);

        account.record_failure(&NetError::malformed("no GLOBALS"));
        assert_eq!(account.state(), AccountState::Online);
        assert_eq!(account.jar().len(), 1);

        account.record_failure(&NetError::ConnectionTimedOut);
        assert_eq!(account.state(), AccountState::Offline);
        assert!(account.jar().is_empty());
        assert_eq!(account.status().last_error, Some(NetError::ConnectionTimedOut));
    }

    #[test]
    fn test_open_in_viewer() {
        let account = account();
        let url = account.endpoints().check_url.clone();
        account.jar().add(CanonicalCookie::new("SID", "abc"), &url).unwrap();

        let sink = PartitionedCookieSink::default();
        let opened = account.open_in_viewer(&sink, true).unwrap();
        assert_eq!(opened, url);
        assert_eq!(sink.private().len(), 1);
        assert!(sink.shared().is_empty());
    }

    #[test]
    fn test_cancel_without_check() {
        assert!(!account().cancel_check());
    }
}
