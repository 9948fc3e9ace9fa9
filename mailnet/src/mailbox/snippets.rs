use crate::base::neterror::NetError;
use crate::mailbox::text::{compact_ws, html_to_text, truthy};
use serde_json::Value;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::PrimitiveDateTime;

const PAGE_TAG: &str = "tb";

/// "Tue, Mar 5, 2013 10:35 AM", after the " at " separator is dropped.
const FULL_DATE: &[BorrowedFormatItem<'static>] = format_description!(
    "[weekday repr:short case_sensitive:false], [month repr:short case_sensitive:false] [day padding:none], [year] [hour repr:12 padding:none]:[minute] [period case:upper case_sensitive:false]"
);

/// Field positions inside one message record.
///
/// The service has shipped more than one record shape; the layout is
/// selected explicitly instead of being guessed from the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SnippetLayout {
    #[default]
    V1,
}

#[derive(Debug, Clone, Copy)]
struct Offsets {
    id: usize,
    read: usize,
    starred: usize,
    people: usize,
    subject: usize,
    body: usize,
    attachments: usize,
    short_date: usize,
    full_date: usize,
}

impl SnippetLayout {
    fn offsets(self) -> Offsets {
        match self {
            SnippetLayout::V1 => Offsets {
                id: 0,
                read: 1,
                starred: 2,
                people: 3,
                subject: 4,
                body: 5,
                attachments: 6,
                short_date: 7,
                full_date: 8,
            },
        }
    }
}

/// One message summary from the thread list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snippet {
    pub id: String,
    pub read: bool,
    pub starred: bool,
    /// Sender names, markup stripped.
    pub people: String,
    pub subject: String,
    pub body: String,
    pub attachments: Vec<String>,
    pub short_date: String,
    pub full_date: Option<PrimitiveDateTime>,
}

/// Decode every `["tb", offset, [messages]]` page of the view data.
///
/// Records that don't fit the layout are logged and skipped.
pub fn parse_snippets(view_data: &Value, layout: SnippetLayout) -> Result<Vec<Snippet>, NetError> {
    let pages = view_data
        .as_array()
        .ok_or_else(|| NetError::malformed("view data is not an array"))?;
    let offsets = layout.offsets();

    let mut snippets = Vec::new();
    for page in pages.iter().filter_map(Value::as_array) {
        if page.first().and_then(Value::as_str) != Some(PAGE_TAG) {
            continue;
        }
        let Some(messages) = page.get(2).and_then(Value::as_array) else {
            tracing::warn!("thread list page without a message array");
            continue;
        };
        for message in messages {
            match decode(message, offsets) {
                Some(snippet) => snippets.push(snippet),
                None => tracing::warn!(record = %message, "skipping malformed snippet"),
            }
        }
    }
    Ok(snippets)
}

fn decode(message: &Value, at: Offsets) -> Option<Snippet> {
    let fields = message.as_array()?;
    let id = fields.get(at.id)?.as_str().filter(|id| !id.is_empty())?;
    let flag = |i: usize| fields.get(i).is_some_and(truthy);
    let text = |i: usize| {
        fields
            .get(i)
            .and_then(Value::as_str)
            .map(html_to_text)
            .unwrap_or_default()
    };

    let full_date = fields
        .get(at.full_date)
        .and_then(Value::as_str)
        .and_then(parse_full_date);

    Some(Snippet {
        id: id.to_string(),
        read: flag(at.read),
        starred: flag(at.starred),
        people: text(at.people),
        subject: text(at.subject),
        body: text(at.body),
        attachments: fields.get(at.attachments).map(attachments).unwrap_or_default(),
        short_date: text(at.short_date),
        full_date,
    })
}

fn attachments(value: &Value) -> Vec<String> {
    match value {
        Value::String(names) => names
            .split(',')
            .map(compact_ws)
            .filter(|n| !n.is_empty())
            .collect(),
        Value::Array(names) => names
            .iter()
            .filter_map(Value::as_str)
            .map(compact_ws)
            .filter(|n| !n.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

/// Parse the long date form, e.g. "Tue, Mar 5, 2013 at 10:35 AM".
pub fn parse_full_date(raw: &str) -> Option<PrimitiveDateTime> {
    let normalized = raw.replace(['\u{202f}', '\u{a0}'], " ").replace(" at ", " ");
    let normalized = compact_ws(&normalized);
    match PrimitiveDateTime::parse(&normalized, FULL_DATE) {
        Ok(when) => Some(when),
        Err(e) => {
            tracing::debug!(date = raw, error = %e, "unparsed snippet date");
            None
        }
    }
}
