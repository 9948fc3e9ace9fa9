use crate::base::neterror::NetError;
use url::Url;

/// Consumer domains; anything else is a hosted (custom domain) mailbox.
const CONSUMER_DOMAINS: &[&str] = &["gmail.com", "googlemail.com"];

pub const DEFAULT_REALM: &str = "https://accounts.google.com";

/// A mailbox address split into its parts.
///
/// The address keeps the spelling it was given since it doubles as the
/// credential store key; only the domain is case-folded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MailIdentity {
    address: String,
    local_part: String,
    domain: String,
    hosted: bool,
}

impl MailIdentity {
    pub fn parse(address: &str) -> Result<Self, NetError> {
        let invalid = || NetError::InvalidAccount {
            address: address.to_string(),
        };
        let trimmed = address.trim();
        let (local, domain) = trimmed.rsplit_once('@').ok_or_else(invalid)?;
        let domain = domain.to_ascii_lowercase();
        if local.is_empty()
            || domain.is_empty()
            || local.contains(char::is_whitespace)
            || domain.contains(|c: char| c.is_whitespace() || c == '@' || c == '/')
            || domain.starts_with('.')
            || domain.ends_with('.')
        {
            return Err(invalid());
        }
        let hosted = !CONSUMER_DOMAINS.contains(&domain.as_str());
        Ok(Self {
            address: trimmed.to_string(),
            local_part: local.to_string(),
            domain,
            hosted,
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn local_part(&self) -> &str {
        &self.local_part
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn is_hosted(&self) -> bool {
        self.hosted
    }

    /// What goes into the login form's identity field: the local part for
    /// hosted domains, the full address otherwise.
    pub fn form_identity(&self) -> &str {
        if self.hosted {
            &self.local_part
        } else {
            &self.address
        }
    }
}

impl std::fmt::Display for MailIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.address)
    }
}

/// Login page, mailbox page and credential realm for one identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailEndpoints {
    pub login_url: Url,
    pub check_url: Url,
    pub realm: String,
}

impl MailEndpoints {
    pub fn new(login_url: Url, check_url: Url, realm: impl Into<String>) -> Self {
        Self {
            login_url,
            check_url,
            realm: realm.into(),
        }
    }

    pub fn for_identity(identity: &MailIdentity) -> Result<Self, NetError> {
        let (login, check) = if identity.is_hosted() {
            let domain = identity.domain();
            (
                format!("https://www.google.com/a/{domain}/LoginAction2"),
                format!("https://mail.google.com/a/{domain}/"),
            )
        } else {
            (
                "https://accounts.google.com/ServiceLoginAuth".to_string(),
                "https://mail.google.com/mail/".to_string(),
            )
        };
        let parse = |s: &str| Url::parse(s).map_err(|_| NetError::InvalidUrl);
        Ok(Self::new(parse(&login)?, parse(&check)?, DEFAULT_REALM))
    }
}
