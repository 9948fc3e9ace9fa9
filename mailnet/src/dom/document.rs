use scraper::{Html, Selector};
use url::Url;

/// A fetched HTML page.
///
/// Keeps the markup and parses it on demand; a parsed tree is not `Send`,
/// a `Document` is.
#[derive(Debug, Clone)]
pub struct Document {
    url: Url,
    source: String,
}

impl Document {
    pub fn new(url: Url, source: impl Into<String>) -> Self {
        Self {
            url,
            source: source.into(),
        }
    }

    /// Final URL after redirects.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn html(&self) -> Html {
        Html::parse_document(&self.source)
    }

    /// Text of every inline `<script>` (those without `src`), in document
    /// order.
    pub fn script_texts(&self) -> Vec<String> {
        let Ok(selector) = Selector::parse("script:not([src])") else {
            return Vec::new();
        };
        self.html()
            .select(&selector)
            .map(|el| el.text().collect::<String>())
            .filter(|text| !text.trim().is_empty())
            .collect()
    }

    /// Whether this page is `target`, ignoring query and fragment.
    pub fn is_at(&self, target: &Url) -> bool {
        same_page(&self.url, target)
    }
}

/// Origin and path equality.
pub fn same_page(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin() && a.path() == b.path()
}
