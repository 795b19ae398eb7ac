use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::clients::PageFetcher;
use crate::db::Store;
use crate::models::SearchHit;
use crate::parser::html;
use crate::services::AlertService;

/// Keyword search across every previously discovered site.
pub struct SearchService {
    store: Store,
    fetcher: Arc<dyn PageFetcher>,
    alerts: AlertService,
}

impl SearchService {
    #[must_use]
    pub fn new(store: Store, fetcher: Arc<dyn PageFetcher>, alerts: AlertService) -> Self {
        Self {
            store,
            fetcher,
            alerts,
        }
    }

    /// Sweeps every stored site URL for every keyword, persisting accepted
    /// hits and handing each pass to the alert engine. Returns the hit list
    /// deduplicated by result URL (last write wins).
    ///
    /// Sites are fetched fresh on every keyword pass; nothing is cached
    /// between passes. Fetch failures skip that site and continue.
    pub async fn search(
        &self,
        keywords: &[String],
        sources: Option<&[String]>,
        geo_filter: Option<&str>,
        date_filter: Option<&str>,
    ) -> Vec<SearchHit> {
        if !self.fetcher.is_configured() {
            warn!("No proxy configured; connect the tunnel before searching");
            return Vec::new();
        }

        info!("Searching for keywords: {}", keywords.join(", "));

        let urls = match self.store.get_all_urls().await {
            Ok(urls) => urls,
            Err(e) => {
                warn!("Failed to load site URLs: {e}");
                return Vec::new();
            }
        };

        let mut results: Vec<SearchHit> = Vec::new();

        for keyword in keywords {
            for url in &urls {
                let fetched = match self.fetcher.fetch(url).await {
                    Ok(fetched) => fetched,
                    Err(e) => {
                        warn!("Error accessing {url}: {e}");
                        continue;
                    }
                };

                let before = results.len();
                Self::collect_hits(
                    keyword,
                    url,
                    &fetched.body,
                    sources,
                    geo_filter,
                    date_filter,
                    &mut results,
                );

                for hit in &results[before..] {
                    if let Err(e) = self.store.store_search_result(hit).await {
                        warn!("Failed to store search result for {}: {e}", hit.result_url);
                    }
                }

                // Alert evaluation runs over the accumulated hit list, not
                // just this pass's additions.
                self.alerts.check_keyword_alerts(keyword, &results).await;
            }
        }

        let unique = dedup_by_result_url(results);
        info!("Found {} unique result(s)", unique.len());
        unique
    }

    #[allow(clippy::too_many_arguments)]
    fn collect_hits(
        keyword: &str,
        source_url: &str,
        body: &str,
        sources: Option<&[String]>,
        geo_filter: Option<&str>,
        date_filter: Option<&str>,
        results: &mut Vec<SearchHit>,
    ) {
        let keyword_lower = keyword.to_lowercase();
        let today = chrono::Utc::now().format("%Y-%m-%d").to_string();

        for anchor in html::extract_anchors(body) {
            let occurrences = anchor.text.to_lowercase().matches(&keyword_lower).count();
            if occurrences == 0 {
                continue;
            }

            let hit = SearchHit {
                keyword: keyword.to_string(),
                source_url: source_url.to_string(),
                result_url: anchor.href,
                title: anchor.text.clone(),
                snippet: anchor.text,
                relevance: i32::try_from(occurrences).unwrap_or(i32::MAX),
                date_found: today.clone(),
            };

            if !Self::passes_filters(&hit, sources, geo_filter, date_filter) {
                continue;
            }

            results.push(hit);
        }
    }

    fn passes_filters(
        hit: &SearchHit,
        sources: Option<&[String]>,
        geo_filter: Option<&str>,
        date_filter: Option<&str>,
    ) -> bool {
        if let Some(sources) = sources
            && !sources.iter().any(|s| s == &hit.source_url)
        {
            return false;
        }

        if !matches_geo_filter(hit, geo_filter) {
            return false;
        }

        matches_date_filter(hit, date_filter)
    }
}

/// Geo filtering is a pass-through until site geo data is resolved.
const fn matches_geo_filter(_hit: &SearchHit, _geo_filter: Option<&str>) -> bool {
    true
}

/// Keeps hits found on or after the filter date. Unparseable dates on
/// either side keep the hit.
fn matches_date_filter(hit: &SearchHit, date_filter: Option<&str>) -> bool {
    let Some(filter) = date_filter else {
        return true;
    };

    let parsed_hit = NaiveDate::parse_from_str(&hit.date_found, "%Y-%m-%d");
    let parsed_filter = NaiveDate::parse_from_str(filter, "%Y-%m-%d");

    match (parsed_hit, parsed_filter) {
        (Ok(hit_date), Ok(filter_date)) => hit_date >= filter_date,
        _ => true,
    }
}

/// Last write wins per result URL; first-appearance order is preserved.
fn dedup_by_result_url(results: Vec<SearchHit>) -> Vec<SearchHit> {
    let mut index_by_url: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<SearchHit> = Vec::new();

    for hit in results {
        if let Some(&i) = index_by_url.get(&hit.result_url) {
            unique[i] = hit;
        } else {
            index_by_url.insert(hit.result_url.clone(), unique.len());
            unique.push(hit);
        }
    }

    unique
}
