use crate::auth::credentials::CredentialProvider;
use crate::auth::form::LoginForm;
use crate::base::neterror::NetError;
use crate::client::SessionClient;
use crate::dom::document::{same_page, Document};
use crate::urlrequest::request::SessionRequest;
use std::sync::Arc;
use url::Url;

/// Where a fetch-with-login currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Fetching,
    NeedCredentials,
    Submitting,
    Done,
    Failed,
}

/// Who to log in as, and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginTarget {
    /// Credential store key (the full mailbox address).
    pub identifier: String,
    /// Value typed into the login form's identity field.
    pub form_identity: String,
    pub login_url: Url,
    /// Credential realm the secret is stored under.
    pub realm: String,
}

/// Fetches a page, logging in first when the service bounces the request to
/// its login page.
///
/// Exactly one credential submission is made per fetch. Landing on the
/// login page again afterwards is a login loop and is never retried.
pub struct AuthFlow {
    client: SessionClient,
    credentials: Arc<dyn CredentialProvider>,
    target: LoginTarget,
    state: AuthState,
    history: Vec<AuthState>,
}

impl AuthFlow {
    pub fn new(
        client: SessionClient,
        credentials: Arc<dyn CredentialProvider>,
        target: LoginTarget,
    ) -> Self {
        Self {
            client,
            credentials,
            target,
            state: AuthState::Fetching,
            history: Vec::new(),
        }
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    /// States entered during the last fetch, in order.
    pub fn history(&self) -> &[AuthState] {
        &self.history
    }

    pub fn target(&self) -> &LoginTarget {
        &self.target
    }

    pub async fn fetch_with_login(&mut self, request: SessionRequest) -> Result<Document, NetError> {
        self.history.clear();
        let result = self.run(request).await;
        match &result {
            Ok(doc) => {
                tracing::debug!(account = %self.target.identifier, url = %doc.url(), "fetch complete");
                self.enter(AuthState::Done);
            }
            Err(e) => {
                tracing::warn!(account = %self.target.identifier, error = %e, "fetch with login failed");
                self.enter(AuthState::Failed);
            }
        }
        result
    }

    async fn run(&mut self, request: SessionRequest) -> Result<Document, NetError> {
        self.enter(AuthState::Fetching);
        if same_page(&request.url, &self.target.login_url) {
            return Err(NetError::LoginUrlRequested {
                url: request.url.to_string(),
            });
        }

        let jar = request.jar.clone();
        let private = request.private;
        let doc = self.client.send(request).await?;
        if !doc.is_at(&self.target.login_url) {
            return Ok(doc);
        }

        self.enter(AuthState::NeedCredentials);
        let secret = self
            .credentials
            .lookup(&self.target.identifier, &self.target.realm)
            .await
            .map_err(|e| NetError::credential_lookup(self.target.identifier.as_str(), e))?;
        let form = LoginForm::extract(&doc, &self.target.form_identity, &secret)?;
        drop(secret);

        self.enter(AuthState::Submitting);
        let submit = SessionRequest::new(form.action, jar)
            .with_method(form.method)
            .with_payload(form.payload)
            .with_referrer(doc.url().clone())
            .with_private(private);
        let landed = self.client.send(submit).await?;

        if landed.is_at(&self.target.login_url) {
            return Err(NetError::login_loop(landed.url()));
        }
        Ok(landed)
    }

    fn enter(&mut self, next: AuthState) {
        tracing::debug!(
            account = %self.target.identifier,
            from = ?self.state,
            to = ?next,
            "auth state"
        );
        self.state = next;
        self.history.push(next);
    }
}
