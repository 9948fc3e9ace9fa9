use crate::auth::credentials::CredentialError;
use crate::cookies::psl::CookieRejection;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum NetError {
    // Connection Errors
    #[error("Connection closed (TCP FIN)")]
    ConnectionClosed,
    #[error("Connection reset (TCP RST)")]
    ConnectionReset,
    #[error("Connection refused")]
    ConnectionRefused,
    #[error("Connection aborted")]
    ConnectionAborted,
    #[error("Connection failed")]
    ConnectionFailed,
    #[error("Name not resolved")]
    NameNotResolved,
    #[error("SSL protocol error")]
    SslProtocolError,
    #[error("Connection timed out")]
    ConnectionTimedOut,

    // HTTP Errors
    #[error("Invalid URL")]
    InvalidUrl,
    #[error("Disallowed URL scheme")]
    DisallowedUrlScheme,
    #[error("Invalid redirect")]
    InvalidRedirect,
    #[error("Too many redirects")]
    TooManyRedirects,
    #[error("Invalid response")]
    InvalidResponse,
    #[error("Empty response")]
    EmptyResponse,
    #[error("Method not supported")]
    MethodNotSupported,
    #[error("Failed to read HTTP body")]
    HttpBodyError,

    // Cookie Errors
    #[error("Malformed Set-Cookie line")]
    CookieParseFailed,
    #[error("Cookie {name} rejected: {reason}")]
    CookieDomainInvalid { name: String, reason: CookieRejection },
    #[error("Cookie export to {path} failed: {reason}")]
    CookieExportFailed { path: String, reason: String },

    // Login Errors
    #[error("Credential lookup failed for {account}: {source}")]
    CredentialLookupFailed {
        account: String,
        source: CredentialError,
    },
    #[error("No login form on {url}")]
    LoginFormMissing { url: String },
    #[error("Login loop detected: landed on {url} again after submitting credentials")]
    LoginLoopDetected { url: String },
    #[error("Refusing to fetch the login page itself: {url}")]
    LoginUrlRequested { url: String },

    // Mailbox Errors
    #[error("Malformed mailbox data: {reason}")]
    MalformedMailboxData { reason: String },

    // Account Errors
    #[error("Invalid account address: {address}")]
    InvalidAccount { address: String },
    #[error("A check is already running for {account}")]
    CheckInProgress { account: String },
    #[error("Check deadline exceeded")]
    CheckDeadlineExceeded,
    #[error("Check cancelled")]
    CheckCancelled,
    #[error("Settings storage failed: {reason}")]
    SettingsIo { reason: String },

    #[error("Unknown error: {0}")]
    Unknown(i32),
}

impl NetError {
    pub fn as_i32(&self) -> i32 {
        match self {
            NetError::ConnectionClosed => -100,
            NetError::ConnectionReset => -101,
            NetError::ConnectionRefused => -102,
            NetError::ConnectionAborted => -103,
            NetError::ConnectionFailed => -104,
            NetError::NameNotResolved => -105,
            NetError::SslProtocolError => -107,
            NetError::ConnectionTimedOut => -118,

            NetError::InvalidUrl => -300,
            NetError::DisallowedUrlScheme => -301,
            NetError::InvalidRedirect => -303,
            NetError::TooManyRedirects => -310,
            NetError::InvalidResponse => -320,
            NetError::MethodNotSupported => -322,
            NetError::EmptyResponse => -324,
            NetError::HttpBodyError => -10001,

            // Session errors (custom codes below the Chromium ranges)
            NetError::CookieParseFailed => -10100,
            NetError::CookieDomainInvalid { .. } => -10101,
            NetError::CookieExportFailed { .. } => -10102,
            NetError::CredentialLookupFailed { .. } => -10200,
            NetError::LoginFormMissing { .. } => -10201,
            NetError::LoginLoopDetected { .. } => -10202,
            NetError::LoginUrlRequested { .. } => -10203,
            NetError::MalformedMailboxData { .. } => -10300,
            NetError::InvalidAccount { .. } => -10400,
            NetError::CheckInProgress { .. } => -10401,
            NetError::CheckDeadlineExceeded => -10402,
            NetError::CheckCancelled => -10403,
            NetError::SettingsIo { .. } => -10404,
            NetError::Unknown(code) => *code,
        }
    }

    /// Whether this failure invalidates the session: the account goes
    /// offline and its cookie jar is discarded.
    pub fn is_logout_condition(&self) -> bool {
        !matches!(
            self,
            NetError::MalformedMailboxData { .. }
                | NetError::CheckInProgress { .. }
                | NetError::CheckCancelled
                | NetError::CookieDomainInvalid { .. }
                | NetError::CookieExportFailed { .. }
                | NetError::LoginUrlRequested { .. }
                | NetError::SettingsIo { .. }
        )
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        NetError::MalformedMailboxData {
            reason: reason.into(),
        }
    }

    pub fn login_loop(url: &url::Url) -> Self {
        NetError::LoginLoopDetected {
            url: url.to_string(),
        }
    }

    pub fn credential_lookup(account: impl Into<String>, source: CredentialError) -> Self {
        NetError::CredentialLookupFailed {
            account: account.into(),
            source,
        }
    }

    pub fn settings(err: impl std::fmt::Display) -> Self {
        NetError::SettingsIo {
            reason: err.to_string(),
        }
    }
}
