//! Stateless text-scanning utilities: address validators, sensitive-content
//! detection, similarity scoring, and the risk-scoring policy.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::constants::risk::MAX_RISK_LEVEL;

/// Consolidates scanning regexes to avoid per-call compilation.
struct PatternSet {
    onion: Regex,
    i2p: Regex,
    credit_card: Regex,
    ssn: Regex,
    email: Regex,
}

impl PatternSet {
    fn get() -> Option<&'static Self> {
        static INSTANCE: OnceLock<Option<PatternSet>> = OnceLock::new();
        INSTANCE
            .get_or_init(|| {
                Some(Self {
                    onion: Regex::new(r"^https?://[a-z2-7]{16,56}\.onion(/.*)?$").ok()?,
                    i2p: Regex::new(r"^https?://[A-Za-z0-9-]+\.i2p(/.*)?$").ok()?,
                    credit_card: Regex::new(r"\b\d{4}[- ]?\d{4}[- ]?\d{4}[- ]?\d{4}\b").ok()?,
                    ssn: Regex::new(r"\b\d{3}[- ]?\d{2}[- ]?\d{4}\b").ok()?,
                    email: Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")
                        .ok()?,
                })
            })
            .as_ref()
    }
}

/// Whether `url` is a well-formed v2/v3 onion address.
#[must_use]
pub fn is_onion_url(url: &str) -> bool {
    PatternSet::get().is_some_and(|p| p.onion.is_match(url))
}

/// Whether `url` is a well-formed I2P address.
#[must_use]
pub fn is_i2p_url(url: &str) -> bool {
    PatternSet::get().is_some_and(|p| p.i2p.is_match(url))
}

/// Whether `text` contains a credit-card-like, SSN-like, or email pattern.
/// First match wins; callers only get a boolean.
#[must_use]
pub fn contains_sensitive_pattern(text: &str) -> bool {
    PatternSet::get().is_some_and(|p| {
        p.credit_card.is_match(text) || p.ssn.is_match(text) || p.email.is_match(text)
    })
}

/// Jaccard similarity over the character sets of the two lowercased inputs.
///
/// Range [0, 1]; an empty union scores 0.0 rather than NaN.
#[must_use]
pub fn jaccard_similarity(a: &str, b: &str) -> f64 {
    let set_a: HashSet<char> = a.to_lowercase().chars().collect();
    let set_b: HashSet<char> = b.to_lowercase().chars().collect();

    let union = set_a.union(&set_b).count();
    if union == 0 {
        return 0.0;
    }

    let intersection = set_a.intersection(&set_b).count();

    #[allow(clippy::cast_precision_loss)]
    let score = intersection as f64 / union as f64;
    score
}

/// Risk-scoring policy for collected page text.
///
/// +3 per distinct high-risk keyword present (case-insensitive), +2 if any
/// sensitive pattern matches, clamped to the 0-10 scale.
#[must_use]
pub fn risk_score(content: &str, high_risk_keywords: &[String]) -> i32 {
    let content_lower = content.to_lowercase();

    let keyword_hits = high_risk_keywords
        .iter()
        .filter(|k| !k.is_empty() && content_lower.contains(&k.to_lowercase()))
        .count();

    let mut score = i32::try_from(keyword_hits).unwrap_or(i32::MAX).saturating_mul(3);

    if contains_sensitive_pattern(content) {
        score = score.saturating_add(2);
    }

    score.clamp(0, MAX_RISK_LEVEL)
}
