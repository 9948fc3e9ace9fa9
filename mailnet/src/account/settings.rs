//! Per-account preferences.

use crate::base::neterror::NetError;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

fn default_auto_login() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSettings {
    /// Check this account on startup.
    #[serde(rename = "auto-login", default = "default_auto_login")]
    pub auto_login: bool,
}

impl Default for AccountSettings {
    fn default() -> Self {
        Self {
            auto_login: default_auto_login(),
        }
    }
}

/// Settings keyed by account identifier.
pub trait SettingsStore: Send + Sync {
    fn get(&self, account: &str) -> Result<Option<AccountSettings>, NetError>;
    fn set(&self, account: &str, settings: &AccountSettings) -> Result<(), NetError>;
    fn remove(&self, account: &str) -> Result<(), NetError>;
}

#[derive(Debug, Default)]
pub struct MemorySettings {
    entries: DashMap<String, AccountSettings>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, account: &str) -> Result<Option<AccountSettings>, NetError> {
        Ok(self.entries.get(account).map(|e| e.value().clone()))
    }

    fn set(&self, account: &str, settings: &AccountSettings) -> Result<(), NetError> {
        self.entries.insert(account.to_string(), settings.clone());
        Ok(())
    }

    fn remove(&self, account: &str) -> Result<(), NetError> {
        self.entries.remove(account);
        Ok(())
    }
}

/// A JSON object on disk: `{ "<account>": { "auto-login": true, ... } }`.
///
/// Keys this crate doesn't know are kept as they are. The file is rewritten
/// on every change.
#[derive(Debug)]
pub struct JsonFileSettings {
    path: PathBuf,
    root: RwLock<Map<String, Value>>,
}

impl JsonFileSettings {
    /// Load `path`, starting empty when it doesn't exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, NetError> {
        let path = path.into();
        let root = match fs::read(&path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Map::new(),
            Ok(bytes) => match serde_json::from_slice::<Value>(&bytes).map_err(NetError::settings)? {
                Value::Object(map) => map,
                _ => {
                    return Err(NetError::settings(format!(
                        "{} does not hold a JSON object",
                        path.display()
                    )))
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => Map::new(),
            Err(e) => return Err(NetError::settings(e)),
        };
        tracing::debug!(path = %path.display(), accounts = root.len(), "loaded settings");
        Ok(Self {
            path,
            root: RwLock::new(root),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, root: &Map<String, Value>) -> Result<(), NetError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(NetError::settings)?;
        }
        let json = serde_json::to_vec_pretty(root).map_err(NetError::settings)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json).map_err(NetError::settings)?;
        fs::rename(&tmp, &self.path).map_err(NetError::settings)
    }
}

impl SettingsStore for JsonFileSettings {
    fn get(&self, account: &str) -> Result<Option<AccountSettings>, NetError> {
        let root = self.root.read().unwrap_or_else(PoisonError::into_inner);
        root.get(account)
            .map(|v| serde_json::from_value(v.clone()).map_err(NetError::settings))
            .transpose()
    }

    fn set(&self, account: &str, settings: &AccountSettings) -> Result<(), NetError> {
        let mut root = self.root.write().unwrap_or_else(PoisonError::into_inner);
        let Value::Object(update) = serde_json::to_value(settings).map_err(NetError::settings)?
        else {
            return Err(NetError::settings("settings did not serialize to an object"));
        };
        let entry = root
            .entry(account.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        match entry {
            Value::Object(existing) => existing.extend(update),
            other => *other = Value::Object(update),
        }
        self.save(&root)
    }

    fn remove(&self, account: &str) -> Result<(), NetError> {
        let mut root = self.root.write().unwrap_or_else(PoisonError::into_inner);
        if root.remove(account).is_some() {
            self.save(&root)?;
        }
        Ok(())
    }
}
