//! Mailbox page decoding.
//!
//! The mailbox page embeds its data as JavaScript literals assigned in
//! inline scripts (`GLOBALS = [...]`, `VIEW_DATA = [...]`). These are
//! decoded by [`literal`], a parser for the literal subset only; nothing on
//! the page is ever executed.

pub mod labels;
pub mod literal;
pub mod snippets;
mod text;

pub use labels::{LabelCount, LabelSnapshot, SYSTEM_LABELS};
pub use snippets::{Snippet, SnippetLayout};

use crate::account::AccountState;
use crate::base::neterror::NetError;
use crate::dom::document::Document;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static SIGNATURE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(GLOBALS|VIEW_DATA)\s*=").expect("valid script signature regex")
});

/// Labels and snippets read from one mailbox page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailboxSnapshot {
    pub labels: LabelSnapshot,
    pub snippets: Vec<Snippet>,
}

impl MailboxSnapshot {
    pub fn inbox_unread(&self) -> u64 {
        self.labels.get(labels::INBOX).map_or(0, |l| l.unread)
    }

    /// `Notify` when the inbox has unread mail, `Online` otherwise.
    pub fn derived_state(&self) -> AccountState {
        if self.inbox_unread() > 0 {
            AccountState::Notify
        } else {
            AccountState::Online
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MailboxParser {
    layout: SnippetLayout,
}

impl MailboxParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layout(layout: SnippetLayout) -> Self {
        Self { layout }
    }

    pub fn parse(&self, doc: &Document) -> Result<MailboxSnapshot, NetError> {
        let mut globals = None;
        let mut view_data = None;

        for script in doc.script_texts() {
            for caps in SIGNATURE.captures_iter(&script) {
                let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                    continue;
                };
                let rest = &script[whole.end()..];
                // `GLOBALS == x` is a comparison, not an assignment.
                if rest.starts_with('=') {
                    continue;
                }
                let slot = match name.as_str() {
                    "GLOBALS" => &mut globals,
                    _ => &mut view_data,
                };
                if slot.is_some() {
                    continue;
                }
                let (value, _) = literal::parse_prefix(rest)?;
                *slot = Some(value);
            }
        }

        let globals = globals.ok_or_else(|| NetError::malformed("no GLOBALS block on page"))?;
        let labels = labels::parse_labels(&globals)?;
        let snippets = match view_data {
            Some(view) => snippets::parse_snippets(&view, self.layout)?,
            None => {
                tracing::debug!(url = %doc.url(), "page has no VIEW_DATA block");
                Vec::new()
            }
        };

        tracing::debug!(
            url = %doc.url(),
            labels = labels.len(),
            snippets = snippets.len(),
            "parsed mailbox page"
        );
        Ok(MailboxSnapshot { labels, snippets })
    }

    /// Decode the literal assigned to `name`, if any inline script has one.
    pub fn find_assignment(doc: &Document, name: &str) -> Result<Option<Value>, NetError> {
        for script in doc.script_texts() {
            for caps in SIGNATURE.captures_iter(&script) {
                let (Some(whole), Some(found)) = (caps.get(0), caps.get(1)) else {
                    continue;
                };
                let rest = &script[whole.end()..];
                if found.as_str() == name && !rest.starts_with('=') {
                    return Ok(Some(literal::parse_prefix(rest)?.0));
                }
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn page(scripts: &[&str]) -> Document {
        let body: String = scripts
            .iter()
            .map(|s| format!("<script>{s}</script>"))
            .collect();
        Document::new(
            Url::parse("https://mail.example.com/mail/").unwrap(),
            format!("<html><head>{body}</head><body></body></html>"),
        )
    }

    #[test]
    fn test_labels_and_state() {
        let doc = page(&[r#"var GLOBALS=[null,"en",[["ld",[["^i",5,100],["^s",0,20]]]]];"#]);
        let snapshot = MailboxParser::new().parse(&doc).unwrap();
        assert_eq!(snapshot.labels["Inbox"].unread, 5);
        assert_eq!(snapshot.labels["Spam"].total, 20);
        assert!(snapshot.snippets.is_empty());
        assert_eq!(snapshot.derived_state(), AccountState::Notify);
    }

    #[test]
    fn test_no_unread_is_online() {
        let doc = page(&[r#"GLOBALS = [[["ld",[["^i",0,3]]]]]"#]);
        let snapshot = MailboxParser::new().parse(&doc).unwrap();
        assert_eq!(snapshot.derived_state(), AccountState::Online);
    }

    #[test]
    fn test_view_data_in_separate_script() {
        let doc = page(&[
            "if (GLOBALS == null) {}",
            r#"var GLOBALS = [[["ld",[["^i",1,1]]]]]; var x = f();"#,
            r#"var VIEW_DATA = [["tb",0,[["abc",0,0,"Dan","Hi","Body",[],"9:00 am","Tue, Mar 5, 2013 at 9:00 AM"]]]];"#,
        ]);
        let snapshot = MailboxParser::new().parse(&doc).unwrap();
        assert_eq!(snapshot.snippets.len(), 1);
        assert_eq!(snapshot.snippets[0].subject, "Hi");
    }

    #[test]
    fn test_missing_globals() {
        let doc = page(&["var VIEW_DATA = [];"]);
        assert!(matches!(
            MailboxParser::new().parse(&doc),
            Err(NetError::MalformedMailboxData { .. })
        ));
    }

    #[test]
    fn test_executable_payload_rejected() {
        let doc = page(&["GLOBALS = steal(document.cookie);"]);
        assert!(matches!(
            MailboxParser::new().parse(&doc),
            Err(NetError::MalformedMailboxData { .. })
        ));
    }

    #[test]
    fn test_find_assignment() {
        let doc = page(&["var _GLOBALS = 1; var VIEW_DATA = [1, 2];"]);
        let value = MailboxParser::find_assignment(&doc, "VIEW_DATA").unwrap();
        assert_eq!(value, Some(serde_json::json!([1, 2])));
        assert_eq!(MailboxParser::find_assignment(&doc, "GLOBALS").unwrap(), None);
    }
}
