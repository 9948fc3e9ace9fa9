use crate::account::identity::{MailEndpoints, MailIdentity, DEFAULT_REALM};
use crate::account::session::Account;
use crate::account::settings::{AccountSettings, SettingsStore};
use crate::auth::credentials::CredentialProvider;
use crate::base::neterror::NetError;
use dashmap::DashMap;
use std::sync::Arc;

type EndpointResolver = dyn Fn(&MailIdentity) -> Result<MailEndpoints, NetError> + Send + Sync;

/// The set of known accounts.
///
/// Accounts come from the credential store: whatever has a secret under the
/// realm is an account.
pub struct AccountRegistry {
    credentials: Arc<dyn CredentialProvider>,
    settings: Arc<dyn SettingsStore>,
    realm: String,
    endpoints: Arc<EndpointResolver>,
    accounts: DashMap<String, Arc<Account>>,
}

impl AccountRegistry {
    pub fn new(credentials: Arc<dyn CredentialProvider>, settings: Arc<dyn SettingsStore>) -> Self {
        Self {
            credentials,
            settings,
            realm: DEFAULT_REALM.to_string(),
            endpoints: Arc::new(MailEndpoints::for_identity),
            accounts: DashMap::new(),
        }
    }

    pub fn with_realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = realm.into();
        self
    }

    /// Override where discovered accounts log in and check.
    pub fn with_endpoints<F>(mut self, resolve: F) -> Self
    where
        F: Fn(&MailIdentity) -> Result<MailEndpoints, NetError> + Send + Sync + 'static,
    {
        self.endpoints = Arc::new(resolve);
        self
    }

    pub fn settings(&self) -> &Arc<dyn SettingsStore> {
        &self.settings
    }

    /// Load accounts from the credential store.
    ///
    /// Already known accounts are kept as they are. Identifiers that aren't
    /// mailbox addresses are skipped.
    pub async fn discover(&self) -> Result<Vec<Arc<Account>>, NetError> {
        let identifiers = self
            .credentials
            .accounts(&self.realm)
            .await
            .map_err(|e| NetError::credential_lookup(self.realm.as_str(), e))?;

        for identifier in identifiers {
            if self.accounts.contains_key(&identifier) {
                continue;
            }
            let identity = match MailIdentity::parse(&identifier) {
                Ok(identity) => identity,
                Err(e) => {
                    tracing::warn!(account = %identifier, error = %e, "skipping credential entry");
                    continue;
                }
            };
            if self.settings.get(&identifier)?.is_none() {
                self.settings.set(&identifier, &AccountSettings::default())?;
            }
            let endpoints = (self.endpoints)(&identity)?;
            tracing::debug!(account = %identifier, hosted = identity.is_hosted(), "discovered account");
            self.accounts
                .insert(identifier, Arc::new(Account::with_endpoints(identity, endpoints)));
        }
        Ok(self.accounts())
    }

    pub fn insert(&self, account: Account) -> Arc<Account> {
        let account = Arc::new(account);
        self.accounts
            .insert(account.address().to_string(), account.clone());
        account
    }

    pub fn get(&self, address: &str) -> Option<Arc<Account>> {
        self.accounts.get(address).map(|a| a.value().clone())
    }

    /// Drop an account, cancelling its in-flight check.
    pub fn remove(&self, address: &str) -> Option<Arc<Account>> {
        let (_, account) = self.accounts.remove(address)?;
        account.cancel_check();
        Some(account)
    }

    /// All accounts, ordered by address.
    pub fn accounts(&self) -> Vec<Arc<Account>> {
        let mut accounts: Vec<_> = self.accounts.iter().map(|a| a.value().clone()).collect();
        accounts.sort_by(|a, b| a.address().cmp(b.address()));
        accounts
    }

    /// Accounts whose settings ask for a check on startup. Missing settings
    /// count as `auto-login = true`.
    pub fn auto_login_accounts(&self) -> Result<Vec<Arc<Account>>, NetError> {
        let mut selected = Vec::new();
        for account in self.accounts() {
            let settings = self.settings.get(account.address())?.unwrap_or_default();
            if settings.auto_login {
                selected.push(account);
            }
        }
        Ok(selected)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl std::fmt::Debug for AccountRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountRegistry")
            .field("realm", &self.realm)
            .field("accounts", &self.accounts.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::settings::MemorySettings;
    use crate::auth::credentials::StaticCredentials;

    fn registry(settings: Arc<MemorySettings>) -> AccountRegistry {
        let credentials = StaticCredentials::new()
            .with(DEFAULT_REALM, "b@example.org", "pw-b")
            .with(DEFAULT_REALM, "a@gmail.com", "pw-a")
            .with(DEFAULT_REALM, "not-an-address", "pw")
            .with("https://elsewhere.example", "c@example.org", "pw-c");
        AccountRegistry::new(Arc::new(credentials), settings)
    }

    #[tokio::test]
    async fn test_discover() {
        let settings = Arc::new(MemorySettings::new());
        settings
            .set("b@example.org", &AccountSettings { auto_login: false })
            .unwrap();
        let registry = registry(settings.clone());

        let found = registry.discover().await.unwrap();
        let addresses: Vec<_> = found.iter().map(|a| a.address().to_string()).collect();
        assert_eq!(addresses, vec!["a@gmail.com", "b@example.org"]);

        assert_eq!(settings.get("a@gmail.com").unwrap(), Some(AccountSettings::default()));
        assert_eq!(
            settings.get("b@example.org").unwrap(),
            Some(AccountSettings { auto_login: false })
        );

        let auto: Vec<_> = registry
            .auto_login_accounts()
            .unwrap()
            .iter()
            .map(|a| a.address().to_string())
            .collect();
        assert_eq!(auto, vec!["a@gmail.com"]);
    }

    #[tokio::test]
    async fn test_discover_keeps_existing_accounts() {
        let registry = registry(Arc::new(MemorySettings::new()));
        registry.discover().await.unwrap();
        let first = registry.get("a@gmail.com").unwrap();
        registry.discover().await.unwrap();
        assert!(Arc::ptr_eq(&first, &registry.get("a@gmail.com").unwrap()));
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_endpoint_override_and_remove() {
        let registry = registry(Arc::new(MemorySettings::new())).with_endpoints(|_| {
            Ok(MailEndpoints::new(
                url::Url::parse("http://127.0.0.1:1/login").unwrap(),
                url::Url::parse("http://127.0.0.1:1/mail/").unwrap(),
                DEFAULT_REALM,
            ))
        });
        registry.discover().await.unwrap();
        let account = registry.get("b@example.org").unwrap();
        assert_eq!(account.endpoints().check_url.as_str(), "http://127.0.0.1:1/mail/");

        assert!(registry.remove("b@example.org").is_some());
        assert!(registry.get("b@example.org").is_none());
        assert!(registry.remove("b@example.org").is_none());
    }
}
