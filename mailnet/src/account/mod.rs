//! Accounts and their check cycle.
//!
//! An [`Account`] is one mailbox plus the cookie jar that keeps it logged in.
//! [`MailChecker`] drives the fetch, login and parse steps and records the
//! outcome; [`AccountRegistry`] finds accounts in the credential store.

pub mod checker;
pub mod identity;
pub mod registry;
pub mod session;
pub mod settings;

pub use checker::{CheckConfig, MailChecker};
pub use identity::{MailEndpoints, MailIdentity};
pub use registry::AccountRegistry;
pub use session::{Account, AccountState, AccountStatus};
pub use settings::{AccountSettings, JsonFileSettings, MemorySettings, SettingsStore};
