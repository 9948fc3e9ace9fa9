//! # mailnet
//!
//! A webmail session engine: keeps a per-account cookie jar, follows
//! redirect chains while storing cookies on every hop, logs in through the
//! service's login form when bounced to it, and reads unread counts and
//! message snippets out of the mailbox page.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mailnet::account::{Account, MailChecker, MailIdentity};
//! use mailnet::auth::KeyringCredentials;
//! use mailnet::client::SessionClient;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), mailnet::base::neterror::NetError> {
//! let account = Arc::new(Account::new(MailIdentity::parse("someone@gmail.com")?)?);
//! let checker = MailChecker::new(SessionClient::new(), Arc::new(KeyringCredentials::new()));
//!
//! let snapshot = checker.check(&account).await?;
//! println!("{} unread, state {:?}", snapshot.inbox_unread(), account.state());
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error codes and load states
//! - [`cookies`] - Cookie jar with domain/path matching and PSL validation
//! - [`socket`] - TCP and TLS connection setup
//! - [`http`] - Single HTTP/1.1 exchanges and per-hop cookie handling
//! - [`urlrequest`] - Redirect-following requests
//! - [`client`] - The session client
//! - [`dom`] - Fetched pages
//! - [`auth`] - Credentials and the login flow
//! - [`mailbox`] - Mailbox page decoding
//! - [`account`] - Accounts, checks and settings
//!
//! ## Security
//!
//! - Cookie domains are checked against the Public Suffix List
//! - Page scripts are decoded as data, never run
//! - Secrets are zeroized after use and only ever sent once per fetch

pub mod account;
pub mod auth;
pub mod base;
pub mod client;
pub mod cookies;
pub mod dom;
pub mod http;
pub mod mailbox;
pub mod socket;
pub mod urlrequest;
