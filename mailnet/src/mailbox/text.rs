use scraper::Html;

/// Visible text of an HTML fragment, whitespace collapsed.
pub(crate) fn html_to_text(fragment: &str) -> String {
    if !fragment.contains(['<', '&']) {
        return compact_ws(fragment);
    }
    let html = Html::parse_fragment(fragment);
    compact_ws(&html.root_element().text().collect::<String>())
}

pub(crate) fn compact_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// JavaScript truthiness of a decoded value.
pub(crate) fn truthy(value: &serde_json::Value) -> bool {
    use serde_json::Value;
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
