use serde::{Deserialize, Serialize};

/// Coarse page classification assigned during a crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteKind {
    Website,
    Forum,
    Blog,
    Chat,
    Marketplace,
}

/// Ordered marker buckets; the first bucket with a hit wins.
const KIND_BUCKETS: &[(SiteKind, &[&str])] = &[
    (SiteKind::Marketplace, &["product", "listing", "shop"]),
    (SiteKind::Forum, &["forum", "discussion"]),
    (SiteKind::Blog, &["blog"]),
    (SiteKind::Chat, &["chat", "message"]),
];

impl SiteKind {
    /// Classifies a page from its URL and visible text.
    #[must_use]
    pub fn classify(url: &str, content: &str) -> Self {
        let url = url.to_lowercase();
        let content = content.to_lowercase();

        for (kind, markers) in KIND_BUCKETS {
            if markers
                .iter()
                .any(|m| url.contains(m) || content.contains(m))
            {
                return *kind;
            }
        }

        Self::Website
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Website => "website",
            Self::Forum => "forum",
            Self::Blog => "blog",
            Self::Chat => "chat",
            Self::Marketplace => "marketplace",
        }
    }

    #[must_use]
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "forum" => Self::Forum,
            "blog" => Self::Blog,
            "chat" => Self::Chat,
            "marketplace" => Self::Marketplace,
            _ => Self::Website,
        }
    }
}

impl std::fmt::Display for SiteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A page fetched during a crawl, before persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawledPage {
    pub url: String,
    pub title: String,
    pub content: String,
    pub kind: SiteKind,
    pub geo_location: String,
    pub risk_level: i32,
}
