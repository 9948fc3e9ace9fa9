//! Credential storage behind a trait.
//!
//! The engine only ever asks "what is the secret for this account in this
//! realm" and "which accounts exist in this realm". Secrets travel as
//! [`Zeroizing`] strings so they are wiped on drop.

use dashmap::DashMap;
use keyring::Entry;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;
use zeroize::Zeroizing;

/// Keyring user name of the per-realm account index entry.
const ACCOUNT_INDEX_USER: &str = "mailnet:accounts";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("no stored credential for {account}")]
    NotFound { account: String },
    #[error("access to the credential store was denied for {account}")]
    AccessDenied { account: String },
    #[error("credential store failure: {0}")]
    Backend(String),
}

/// Alias for the `Future` type returned by a secret lookup.
pub type LookingUp = Pin<Box<dyn Future<Output = Result<Zeroizing<String>, CredentialError>> + Send>>;

/// Alias for the `Future` type returned by an account listing.
pub type Listing = Pin<Box<dyn Future<Output = Result<Vec<String>, CredentialError>> + Send>>;

/// Source of account secrets.
pub trait CredentialProvider: Send + Sync {
    /// Secret stored for `account` under `realm`.
    fn lookup(&self, account: &str, realm: &str) -> LookingUp;

    /// Every account identifier stored under `realm`, sorted.
    fn accounts(&self, realm: &str) -> Listing;
}

/// In-memory provider, for tests and embedders that manage secrets
/// themselves.
#[derive(Debug, Default)]
pub struct StaticCredentials {
    secrets: DashMap<(String, String), Zeroizing<String>>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, realm: &str, account: &str, secret: &str) {
        self.secrets.insert(
            (realm.to_string(), account.to_string()),
            Zeroizing::new(secret.to_string()),
        );
    }

    pub fn with(self, realm: &str, account: &str, secret: &str) -> Self {
        self.insert(realm, account, secret);
        self
    }

    pub fn remove(&self, realm: &str, account: &str) -> bool {
        self.secrets
            .remove(&(realm.to_string(), account.to_string()))
            .is_some()
    }
}

impl CredentialProvider for StaticCredentials {
    fn lookup(&self, account: &str, realm: &str) -> LookingUp {
        let result = self
            .secrets
            .get(&(realm.to_string(), account.to_string()))
            .map(|secret| secret.value().clone())
            .ok_or_else(|| CredentialError::NotFound {
                account: account.to_string(),
            });
        Box::pin(async move { result })
    }

    fn accounts(&self, realm: &str) -> Listing {
        let mut accounts: Vec<String> = self
            .secrets
            .iter()
            .filter(|entry| entry.key().0 == realm)
            .map(|entry| entry.key().1.clone())
            .collect();
        accounts.sort();
        Box::pin(async move { Ok(accounts) })
    }
}

/// OS keychain provider (`keyring` crate).
///
/// Each secret is an entry with service = realm and user = account. The
/// keychain cannot enumerate entries, so account identifiers are also kept
/// in an index entry per realm, maintained by [`KeyringCredentials::store`].
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyringCredentials;

impl KeyringCredentials {
    pub fn new() -> Self {
        Self
    }

    /// Save `secret` and record `account` in the realm's index.
    pub async fn store(
        &self,
        account: &str,
        realm: &str,
        secret: Zeroizing<String>,
    ) -> Result<(), CredentialError> {
        let account = account.to_string();
        let realm = realm.to_string();
        blocking(move || {
            let entry = Entry::new(&realm, &account).map_err(|e| map_keyring_error(&account, e))?;
            entry
                .set_password(&secret)
                .map_err(|e| map_keyring_error(&account, e))?;

            let mut index = read_index(&realm)?;
            if !index.contains(&account) {
                index.push(account);
                index.sort();
                write_index(&realm, &index)?;
            }
            Ok(())
        })
        .await
    }

    /// Delete the secret and drop `account` from the realm's index.
    pub async fn forget(&self, account: &str, realm: &str) -> Result<(), CredentialError> {
        let account = account.to_string();
        let realm = realm.to_string();
        blocking(move || {
            let entry = Entry::new(&realm, &account).map_err(|e| map_keyring_error(&account, e))?;
            match entry.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => {}
                Err(e) => return Err(map_keyring_error(&account, e)),
            }
            let mut index = read_index(&realm)?;
            index.retain(|a| *a != account);
            write_index(&realm, &index)
        })
        .await
    }
}

impl CredentialProvider for KeyringCredentials {
    fn lookup(&self, account: &str, realm: &str) -> LookingUp {
        let account = account.to_string();
        let realm = realm.to_string();
        Box::pin(blocking(move || {
            let entry = Entry::new(&realm, &account).map_err(|e| map_keyring_error(&account, e))?;
            entry
                .get_password()
                .map(Zeroizing::new)
                .map_err(|e| map_keyring_error(&account, e))
        }))
    }

    fn accounts(&self, realm: &str) -> Listing {
        let realm = realm.to_string();
        Box::pin(blocking(move || read_index(&realm)))
    }
}

async fn blocking<T, F>(f: F) -> Result<T, CredentialError>
where
    F: FnOnce() -> Result<T, CredentialError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| CredentialError::Backend(e.to_string()))?
}

fn read_index(realm: &str) -> Result<Vec<String>, CredentialError> {
    let entry = Entry::new(realm, ACCOUNT_INDEX_USER)
        .map_err(|e| map_keyring_error(ACCOUNT_INDEX_USER, e))?;
    match entry.get_password() {
        Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
            tracing::warn!(realm = %realm, error = %e, "corrupt keyring account index");
            CredentialError::Backend(e.to_string())
        }),
        Err(keyring::Error::NoEntry) => Ok(Vec::new()),
        Err(e) => Err(map_keyring_error(ACCOUNT_INDEX_USER, e)),
    }
}

fn write_index(realm: &str, accounts: &[String]) -> Result<(), CredentialError> {
    let entry = Entry::new(realm, ACCOUNT_INDEX_USER)
        .map_err(|e| map_keyring_error(ACCOUNT_INDEX_USER, e))?;
    let raw = serde_json::to_string(accounts).map_err(|e| CredentialError::Backend(e.to_string()))?;
    entry
        .set_password(&raw)
        .map_err(|e| map_keyring_error(ACCOUNT_INDEX_USER, e))
}

fn map_keyring_error(account: &str, err: keyring::Error) -> CredentialError {
    match err {
        keyring::Error::NoEntry => CredentialError::NotFound {
            account: account.to_string(),
        },
        keyring::Error::NoStorageAccess(_) => CredentialError::AccessDenied {
            account: account.to_string(),
        },
        other => CredentialError::Backend(other.to_string()),
    }
}
