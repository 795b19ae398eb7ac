//! Lightweight HTML extraction for fetched pages: title, visible text, and
//! outbound anchors.

use std::sync::OnceLock;

use regex::Regex;

/// An outbound anchor: raw href plus its flattened anchor text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub href: String,
    pub text: String,
}

/// Consolidates regexes for HTML parsing to avoid per-call overhead.
struct HtmlRegex {
    title: Regex,
    anchor: Regex,
    tag: Regex,
    whitespace: Regex,
}

impl HtmlRegex {
    fn get() -> Option<&'static Self> {
        static INSTANCE: OnceLock<Option<HtmlRegex>> = OnceLock::new();
        INSTANCE
            .get_or_init(|| {
                Some(Self {
                    title: Regex::new(r"(?is)<title[^>]*>(.*?)</title>").ok()?,
                    anchor: Regex::new(
                        r#"(?is)<a\s[^>]*href\s*=\s*["']([^"']+)["'][^>]*>(.*?)</a>"#,
                    )
                    .ok()?,
                    tag: Regex::new(r"<[^>]+>").ok()?,
                    whitespace: Regex::new(r"\s+").ok()?,
                })
            })
            .as_ref()
    }
}

/// Extracts the page title, falling back to "No Title".
#[must_use]
pub fn extract_title(html: &str) -> String {
    let Some(re) = HtmlRegex::get() else {
        return "No Title".to_string();
    };

    let title = re
        .title
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| flatten_fragment(m.as_str()))
        .unwrap_or_default();

    if title.is_empty() {
        "No Title".to_string()
    } else {
        title
    }
}

/// Extracts the visible text content of a page.
#[must_use]
pub fn extract_text(html: &str) -> String {
    html2text::from_read(html.as_bytes(), 80).unwrap_or_else(|_| flatten_fragment(html))
}

/// Extracts every anchor with an href, preserving document order.
#[must_use]
pub fn extract_anchors(html: &str) -> Vec<Anchor> {
    let Some(re) = HtmlRegex::get() else {
        return Vec::new();
    };

    re.anchor
        .captures_iter(html)
        .filter_map(|c| {
            let href = c.get(1)?.as_str().trim().to_string();
            if href.is_empty() {
                return None;
            }
            let text = flatten_fragment(c.get(2)?.as_str());
            Some(Anchor { href, text })
        })
        .collect()
}

/// Strips tags, decodes entities, and collapses whitespace in a fragment.
fn flatten_fragment(fragment: &str) -> String {
    let Some(re) = HtmlRegex::get() else {
        return fragment.trim().to_string();
    };

    let stripped = re.tag.replace_all(fragment, " ");
    let decoded = html_escape::decode_html_entities(&stripped);
    re.whitespace.replace_all(&decoded, " ").trim().to_string()
}
