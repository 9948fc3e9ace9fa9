//! Logging in.
//!
//! - [`credentials`]: where secrets come from (in-memory or OS keychain)
//! - [`form`]: reading and filling the login form
//! - [`flow`]: fetch, detect the login page, submit once, detect loops

pub mod credentials;
pub mod flow;
pub mod form;

pub use credentials::{CredentialError, CredentialProvider, KeyringCredentials, StaticCredentials};
pub use flow::{AuthFlow, AuthState, LoginTarget};
pub use form::LoginForm;
