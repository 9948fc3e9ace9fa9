use crate::base::neterror::NetError;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Built-in label keys and their display names.
pub const SYSTEM_LABELS: &[(&str, &str)] = &[
    ("^i", "Inbox"),
    ("^s", "Spam"),
    ("^t", "Starred"),
    ("^f", "Sent"),
    ("^r", "Drafts"),
    ("^k", "Trash"),
    ("^b", "Chats"),
    ("^all", "All Mail"),
    ("^io_im", "Important"),
];

pub const INBOX: &str = "Inbox";

/// Counters for one label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelCount {
    pub key: String,
    pub name: String,
    pub unread: u64,
    pub total: u64,
}

/// Label counts keyed by display name.
pub type LabelSnapshot = BTreeMap<String, LabelCount>;

/// Decode the label table from the page's metadata value.
///
/// The metadata is an array whose first non-empty array-of-arrays child
/// holds `[key, ...rest]` records. `ld` (required) carries the counters;
/// `sld` names smart labels.
pub fn parse_labels(globals: &Value) -> Result<LabelSnapshot, NetError> {
    let top = globals
        .as_array()
        .ok_or_else(|| NetError::malformed("metadata is not an array"))?;

    let payload = top
        .iter()
        .filter_map(Value::as_array)
        .find(|child| !child.is_empty() && child.iter().all(Value::is_array))
        .ok_or_else(|| NetError::malformed("metadata has no keyed payload"))?;

    let mut keyed: HashMap<&str, &[Value]> = HashMap::new();
    for record in payload.iter().filter_map(Value::as_array) {
        if let Some((Value::String(key), rest)) = record.split_first() {
            keyed.entry(key.as_str()).or_insert(rest);
        }
    }

    let mut names: HashMap<String, String> = SYSTEM_LABELS
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    if let Some(sld) = keyed.get("sld") {
        for entry in flatten(sld, "sld")? {
            match entry.as_array().map(Vec::as_slice) {
                Some([Value::String(code), Value::String(name), ..]) => {
                    names.insert(code.clone(), name.clone());
                }
                _ => tracing::warn!(entry = %entry, "skipping malformed smart label"),
            }
        }
    }

    let ld = keyed
        .get("ld")
        .ok_or_else(|| NetError::malformed("metadata has no ld record"))?;

    let mut snapshot = LabelSnapshot::new();
    for entry in flatten(ld, "ld")? {
        let Some([Value::String(key), unread, total, ..]) = entry.as_array().map(Vec::as_slice)
        else {
            tracing::warn!(entry = %entry, "skipping malformed label count");
            continue;
        };
        let (Some(unread), Some(total)) = (count(unread), count(total)) else {
            tracing::warn!(entry = %entry, "skipping label count with non-numeric fields");
            continue;
        };
        let name = names.get(key).cloned().unwrap_or_else(|| key.clone());
        snapshot.insert(
            name.clone(),
            LabelCount {
                key: key.clone(),
                name,
                unread,
                total,
            },
        );
    }
    Ok(snapshot)
}

/// Flatten one level: each chunk is an array of entries.
fn flatten<'v>(chunks: &'v [Value], record: &str) -> Result<Vec<&'v Value>, NetError> {
    let mut entries = Vec::new();
    for chunk in chunks {
        let items = chunk
            .as_array()
            .ok_or_else(|| NetError::malformed(format!("{record} chunk is not an array")))?;
        entries.extend(items.iter());
    }
    Ok(entries)
}

/// Non-negative counter, clamping negatives to zero.
fn count(value: &Value) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    if value.as_i64().is_some() {
        return Some(0);
    }
    value
        .as_f64()
        .filter(|f| f.is_finite())
        .map(|f| f.max(0.0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_system_labels() {
        let globals = json!([null, "en", [["ld", [["^i", 5, 100], ["^s", 0, 20]]]]]);
        let labels = parse_labels(&globals).unwrap();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels["Inbox"].unread, 5);
        assert_eq!(labels["Inbox"].total, 100);
        assert_eq!(labels["Spam"].key, "^s");
        assert_eq!(labels["Spam"].unread, 0);
    }

    #[test]
    fn test_negative_counts_clamp() {
        let globals = json!([[["ld", [["^t", -1, -1]]]]]);
        let labels = parse_labels(&globals).unwrap();
        assert_eq!(labels["Starred"].unread, 0);
        assert_eq!(labels["Starred"].total, 0);
    }

    #[test]
    fn test_smart_labels_and_unknown_keys() {
        let globals = json!([
            1,
            [],
            [
                ["sld", [["^smartlabel_social", "Social"]]],
                ["ld", [["^smartlabel_social", 3, 9]], [["work", 1, 2]]]
            ]
        ]);
        let labels = parse_labels(&globals).unwrap();
        assert_eq!(labels["Social"].unread, 3);
        assert_eq!(labels["work"].total, 2);
    }

    #[test]
    fn test_bad_entries_skipped() {
        let globals = json!([[["ld", [["^i", 2, 4], ["^s"], [7, 1, 1], ["^k", "x", 1]]]]]);
        let labels = parse_labels(&globals).unwrap();
        assert_eq!(labels.len(), 1);
        assert!(labels.contains_key("Inbox"));
    }

    #[test]
    fn test_malformed_structure() {
        assert!(matches!(
            parse_labels(&json!({"ld": []})),
            Err(NetError::MalformedMailboxData { .. })
        ));
        assert!(matches!(
            parse_labels(&json!([1, 2, []])),
            Err(NetError::MalformedMailboxData { .. })
        ));
        assert!(matches!(
            parse_labels(&json!([[["sld", []]]])),
            Err(NetError::MalformedMailboxData { .. })
        ));
        assert!(matches!(
            parse_labels(&json!([[["ld", "oops"]]])),
            Err(NetError::MalformedMailboxData { .. })
        ));
    }
}
