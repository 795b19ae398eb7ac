use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use url::Url;

use crate::analysis::patterns::risk_score;
use crate::clients::PageFetcher;
use crate::config::Config;
use crate::db::Store;
use crate::models::{CrawledPage, SiteKind};
use crate::parser::html;

/// Breadth-first, depth-bounded crawler over anonymized-network sites.
pub struct CrawlerService {
    store: Store,
    fetcher: Arc<dyn PageFetcher>,
    config: Config,
}

impl CrawlerService {
    #[must_use]
    pub fn new(store: Store, fetcher: Arc<dyn PageFetcher>, config: Config) -> Self {
        Self {
            store,
            fetcher,
            config,
        }
    }

    /// Crawls each seed breadth-first down to `depth`, upserting every
    /// fetched page as a site record and returning the fetched pages.
    ///
    /// An empty `seeds` slice falls back to the configured default seeds.
    /// Without a configured proxy the crawl yields nothing.
    pub async fn crawl(
        &self,
        seeds: &[String],
        depth: usize,
        max_pages: usize,
    ) -> Vec<CrawledPage> {
        if !self.fetcher.is_configured() {
            warn!("No proxy configured; connect the tunnel before crawling");
            return Vec::new();
        }

        let seeds = if seeds.is_empty() {
            self.config.crawler.default_seeds.clone()
        } else {
            seeds.to_vec()
        };

        info!("Starting crawl over {} seed(s)", seeds.len());

        let mut crawled = Vec::new();
        for seed in &seeds {
            info!("Crawling: {seed}");
            let pages = self.crawl_site(seed, depth, max_pages).await;
            crawled.extend(pages);
        }

        info!("Crawl completed. Found {} page(s)", crawled.len());
        crawled
    }

    /// One seed's sub-crawl. The visited set is scoped to this call, so a
    /// URL reached from two different seeds is fetched once per seed.
    async fn crawl_site(&self, seed: &str, depth_bound: usize, max_pages: usize) -> Vec<CrawledPage> {
        let mut queue: VecDeque<(String, usize)> = VecDeque::new();
        queue.push_back((seed.to_string(), 0));

        let mut visited: HashSet<String> = HashSet::new();
        let mut pages: Vec<CrawledPage> = Vec::new();

        while let Some((url, depth)) = queue.pop_front() {
            if pages.len() >= max_pages {
                break;
            }
            if visited.contains(&url) || depth > depth_bound {
                continue;
            }

            let fetched = match self.fetcher.fetch(&url).await {
                Ok(fetched) => fetched,
                Err(e) => {
                    warn!("Error fetching {url}: {e}");
                    continue;
                }
            };

            visited.insert(url.clone());

            let page = self.build_page(&url, &fetched.body);
            if let Err(e) = self.store.store_site(&page).await {
                warn!("Failed to store site {}: {e}", page.url);
            }
            pages.push(page);

            if depth < depth_bound {
                for link in outbound_links(&fetched.body, &url) {
                    if !visited.contains(&link) {
                        queue.push_back((link, depth + 1));
                    }
                }
            }

            tokio::time::sleep(Duration::from_millis(self.config.crawler.politeness_delay_ms))
                .await;
        }

        pages
    }

    fn build_page(&self, url: &str, body: &str) -> CrawledPage {
        let title = html::extract_title(body);
        let content = html::extract_text(body);
        let kind = SiteKind::classify(url, &content);
        let risk_level = risk_score(&content, &self.config.alerts.high_risk_keywords);

        CrawledPage {
            url: url.to_string(),
            title,
            content,
            kind,
            // Geo location stays unresolved for hidden services.
            geo_location: "Unknown".to_string(),
            risk_level,
        }
    }
}

/// Resolves every anchor against the page URL and keeps only absolute
/// http(s) links whose host stays inside an anonymized network.
fn outbound_links(body: &str, page_url: &str) -> Vec<String> {
    let Ok(base) = Url::parse(page_url) else {
        return Vec::new();
    };

    html::extract_anchors(body)
        .into_iter()
        .filter_map(|anchor| base.join(&anchor.href).ok())
        .filter(is_anonymized_link)
        .map(String::from)
        .collect()
}

fn is_anonymized_link(url: &Url) -> bool {
    if url.scheme() != "http" && url.scheme() != "https" {
        return false;
    }

    url.host_str()
        .is_some_and(|host| host.ends_with(".onion") || host.ends_with(".i2p"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outbound_links_keep_only_anonymized_hosts() {
        let body = r#"
            <a href="http://abcdefghij2345678901.onion/a">one</a>
            <a href="http://mirror.i2p/b">two</a>
            <a href="https://example.com/c">clearnet</a>
            <a href="ftp://abcdefghij2345678901.onion/d">wrong scheme</a>
        "#;

        let links = outbound_links(body, "http://seed.onion/");
        assert_eq!(
            links,
            vec![
                "http://abcdefghij2345678901.onion/a".to_string(),
                "http://mirror.i2p/b".to_string(),
            ]
        );
    }

    #[test]
    fn test_outbound_links_resolve_relative_hrefs() {
        let body = r#"<a href="/wiki">wiki</a>"#;
        let links = outbound_links(body, "http://seed.onion/index.html");
        assert_eq!(links, vec!["http://seed.onion/wiki".to_string()]);
    }

    #[test]
    fn test_clearnet_base_discards_relative_links() {
        let body = r#"<a href="/wiki">wiki</a>"#;
        let links = outbound_links(body, "https://example.com/");
        assert!(links.is_empty());
    }
}
