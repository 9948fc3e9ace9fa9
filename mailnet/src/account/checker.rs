use crate::account::session::{Account, AccountState};
use crate::auth::credentials::CredentialProvider;
use crate::auth::flow::AuthFlow;
use crate::base::neterror::NetError;
use crate::client::SessionClient;
use crate::mailbox::{MailboxParser, MailboxSnapshot};
use crate::urlrequest::request::SessionRequest;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use url::Url;

#[derive(Debug, Clone)]
pub struct CheckConfig {
    /// Upper bound on one whole check, login included.
    pub check_deadline: Duration,
    /// Ask for the private partition when the session is handed on.
    pub private: bool,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            check_deadline: Duration::from_secs(120),
            private: true,
        }
    }
}

/// Runs check cycles: fetch the mailbox page (logging in if bounced), parse
/// it, and record the outcome on the account.
#[derive(Clone)]
pub struct MailChecker {
    client: SessionClient,
    credentials: Arc<dyn CredentialProvider>,
    parser: MailboxParser,
    config: CheckConfig,
}

impl MailChecker {
    pub fn new(client: SessionClient, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            client,
            credentials,
            parser: MailboxParser::new(),
            config: CheckConfig::default(),
        }
    }

    pub fn with_config(mut self, config: CheckConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_parser(mut self, parser: MailboxParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn config(&self) -> &CheckConfig {
        &self.config
    }

    /// Check one account now. Fails with `CheckInProgress` instead of
    /// waiting when another check holds the account.
    pub async fn check(&self, account: &Arc<Account>) -> Result<MailboxSnapshot, NetError> {
        let Ok(_guard) = account.check_lock.try_lock() else {
            return Err(NetError::CheckInProgress {
                account: account.address().to_string(),
            });
        };
        self.run_locked(account).await
    }

    /// Start a check in the background, aborting the account's previous
    /// in-flight check first. The new check waits for the aborted one to
    /// release the account.
    pub fn spawn_check(&self, account: Arc<Account>) -> JoinHandle<Result<MailboxSnapshot, NetError>> {
        let mut in_flight = account.in_flight();
        if let Some(previous) = in_flight.take() {
            if !previous.is_finished() {
                tracing::debug!(account = %account.address(), "superseding in-flight check");
            }
            previous.abort();
        }

        let checker = self.clone();
        let task_account = account.clone();
        let handle = tokio::spawn(async move {
            let _guard = task_account.check_lock.lock().await;
            checker.run_locked(&task_account).await
        });
        *in_flight = Some(handle.abort_handle());
        handle
    }

    /// [`spawn_check`](Self::spawn_check) and wait for it. A check that gets
    /// superseded or cancelled meanwhile reports `CheckCancelled`.
    pub async fn recheck(&self, account: Arc<Account>) -> Result<MailboxSnapshot, NetError> {
        match self.spawn_check(account).await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(NetError::CheckCancelled),
            Err(e) => std::panic::resume_unwind(e.into_panic()),
        }
    }

    /// Check several accounts concurrently; results are in input order.
    pub async fn check_all(&self, accounts: &[Arc<Account>]) -> Vec<Result<MailboxSnapshot, NetError>> {
        join_all(accounts.iter().map(|account| self.check(account))).await
    }

    async fn run_locked(&self, account: &Arc<Account>) -> Result<MailboxSnapshot, NetError> {
        account.set_state(AccountState::Connecting);
        tracing::debug!(account = %account.address(), "checking mailbox");

        let outcome = tokio::time::timeout(self.config.check_deadline, self.fetch(account))
            .await
            .unwrap_or(Err(NetError::CheckDeadlineExceeded));

        match outcome {
            Ok((mailbox_url, snapshot)) => {
                account.record_success(mailbox_url, &snapshot);
                tracing::debug!(
                    account = %account.address(),
                    unread = snapshot.inbox_unread(),
                    state = ?account.state(),
                    "check complete"
                );
                Ok(snapshot)
            }
            Err(e) => {
                account.record_failure(&e);
                tracing::warn!(
                    account = %account.address(),
                    error = %e,
                    code = e.as_i32(),
                    logout = e.is_logout_condition(),
                    "check failed"
                );
                Err(e)
            }
        }
    }

    async fn fetch(&self, account: &Account) -> Result<(Url, MailboxSnapshot), NetError> {
        let mut flow = AuthFlow::new(
            self.client.clone(),
            self.credentials.clone(),
            account.login_target(),
        );
        let request = SessionRequest::get(account.endpoints().check_url.clone(), account.jar())
            .with_private(self.config.private);
        let doc = flow.fetch_with_login(request).await?;
        let snapshot = self.parser.parse(&doc)?;
        Ok((doc.url().clone(), snapshot))
    }
}

impl std::fmt::Debug for MailChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailChecker")
            .field("client", &self.client)
            .field("parser", &self.parser)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
