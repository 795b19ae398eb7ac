use serde::{Deserialize, Serialize};

/// A single keyword match found on a crawled site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub keyword: String,
    /// Page the match was found on.
    pub source_url: String,
    /// Link target the matching anchor points at.
    pub result_url: String,
    pub title: String,
    pub snippet: String,
    /// Keyword occurrence count within the anchor text.
    pub relevance: i32,
    pub date_found: String,
}
