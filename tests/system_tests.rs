//! End-to-end tests over an in-memory store and a scripted page fetcher.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, IntoActiveModel, Set};

use darkwatch::clients::{FetchedPage, PageFetcher};
use darkwatch::config::Config;
use darkwatch::db::Store;
use darkwatch::entities::users;
use darkwatch::models::{CrawledPage, SearchHit, SiteKind};
use darkwatch::services::{AlertService, AnalyticsService, CrawlerService, SearchService, UserTracker};

/// Serves a fixed url -> body map and records every fetch.
struct MockFetcher {
    pages: HashMap<String, String>,
    configured: bool,
    calls: Mutex<Vec<String>>,
}

impl MockFetcher {
    fn new(pages: &[(&str, &str)]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|(url, body)| ((*url).to_string(), (*body).to_string()))
                .collect(),
            configured: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn unconfigured() -> Self {
        Self {
            pages: HashMap::new(),
            configured: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn fetch_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        self.calls.lock().unwrap().push(url.to_string());
        let body = self
            .pages
            .get(url)
            .ok_or_else(|| anyhow::anyhow!("GET {url} returned 404"))?;
        Ok(FetchedPage {
            url: url.to_string(),
            status: 200,
            body: body.clone(),
        })
    }
}

async fn memory_store() -> Store {
    Store::with_pool_options("sqlite::memory:", 1, 1)
        .await
        .expect("failed to open in-memory store")
}

/// Test config with the politeness delay zeroed out.
fn test_config() -> Config {
    let mut config = Config::default();
    config.crawler.politeness_delay_ms = 0;
    config
}

const SEED: &str = "http://seedseedseedseed.onion/";

fn seed_body() -> String {
    r#"
        <html><head><title>Directory</title></head><body>
          <a href="http://marketmarketmarket1.onion/shop">Market</a>
          <a href="http://forumforumforumfor2.onion/forum">Forum</a>
          <a href="https://example.com/outside">Clearnet mirror</a>
        </body></html>
    "#
    .to_string()
}

#[tokio::test]
async fn crawl_depth_one_visits_seed_and_both_anonymized_links() {
    let store = memory_store().await;
    let fetcher = Arc::new(MockFetcher::new(&[
        (SEED, &seed_body()),
        (
            "http://marketmarketmarket1.onion/shop",
            "<title>Shop</title><p>listings</p>",
        ),
        (
            "http://forumforumforumfor2.onion/forum",
            "<title>Board</title><p>discussion</p>",
        ),
    ]));

    let crawler = CrawlerService::new(store.clone(), fetcher.clone(), test_config());
    let pages = crawler.crawl(&[SEED.to_string()], 1, 50).await;

    assert_eq!(pages.len(), 3);
    assert_eq!(fetcher.fetch_count(), 3);

    // The clearnet link was filtered out before it could be fetched.
    let urls = store.get_all_urls().await.unwrap();
    assert_eq!(urls.len(), 3);
    assert!(!urls.iter().any(|u| u.contains("example.com")));
}

#[tokio::test]
async fn crawl_depth_zero_fetches_seeds_only() {
    let store = memory_store().await;
    let fetcher = Arc::new(MockFetcher::new(&[(SEED, &seed_body())]));

    let crawler = CrawlerService::new(store, fetcher.clone(), test_config());
    let pages = crawler.crawl(&[SEED.to_string()], 0, 50).await;

    assert_eq!(pages.len(), 1);
    assert_eq!(fetcher.fetch_count(), 1);
}

#[tokio::test]
async fn crawl_never_exceeds_max_pages() {
    let mut body = String::from("<title>Hub</title>");
    let mut pages: Vec<(String, String)> = Vec::new();
    for i in 0..5 {
        let url = format!("http://linkedpage{i}abcdefgh.onion/");
        body.push_str(&format!(r#"<a href="{url}">page {i}</a>"#));
        pages.push((url, "<title>Leaf</title>".to_string()));
    }
    let mut fixtures: Vec<(&str, &str)> = vec![(SEED, &body)];
    fixtures.extend(pages.iter().map(|(u, b)| (u.as_str(), b.as_str())));

    let store = memory_store().await;
    let fetcher = Arc::new(MockFetcher::new(&fixtures));

    let crawler = CrawlerService::new(store, fetcher, test_config());
    let crawled = crawler.crawl(&[SEED.to_string()], 1, 2).await;

    assert_eq!(crawled.len(), 2);
}

#[tokio::test]
async fn crawl_without_proxy_yields_nothing() {
    let store = memory_store().await;
    let fetcher = Arc::new(MockFetcher::unconfigured());

    let crawler = CrawlerService::new(store.clone(), fetcher, test_config());
    let pages = crawler.crawl(&[SEED.to_string()], 1, 50).await;

    assert!(pages.is_empty());
    assert!(store.get_all_urls().await.unwrap().is_empty());
}

#[tokio::test]
async fn crawl_continues_past_fetch_failures() {
    // Only one of the two linked pages resolves; the other 404s.
    let store = memory_store().await;
    let fetcher = Arc::new(MockFetcher::new(&[
        (SEED, &seed_body()),
        (
            "http://forumforumforumfor2.onion/forum",
            "<title>Board</title>",
        ),
    ]));

    let crawler = CrawlerService::new(store, fetcher, test_config());
    let pages = crawler.crawl(&[SEED.to_string()], 1, 50).await;

    assert_eq!(pages.len(), 2);
}

#[tokio::test]
async fn crawl_classifies_pages_by_bucket_order() {
    let store = memory_store().await;
    let fetcher = Arc::new(MockFetcher::new(&[(
        "http://marketmarketmarket1.onion/shop",
        "<title>Shop</title>",
    )]));

    let crawler = CrawlerService::new(store, fetcher, test_config());
    let pages = crawler
        .crawl(&["http://marketmarketmarket1.onion/shop".to_string()], 0, 10)
        .await;

    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].kind, SiteKind::Marketplace);
}

#[tokio::test]
async fn site_upsert_preserves_first_seen() {
    let store = memory_store().await;

    let page = CrawledPage {
        url: SEED.to_string(),
        title: "Directory".to_string(),
        content: "index".to_string(),
        kind: SiteKind::Website,
        geo_location: "Unknown".to_string(),
        risk_level: 0,
    };
    store.store_site(&page).await.unwrap();

    // Age the stored row, then refresh it with a new crawl result.
    let row = store.get_site(SEED).await.unwrap().unwrap();
    let mut model = row.into_active_model();
    model.first_seen = Set("2020-01-01".to_string());
    model.update(&store.conn).await.unwrap();

    let refreshed = CrawledPage {
        title: "Directory v2".to_string(),
        risk_level: 4,
        ..page
    };
    store.store_site(&refreshed).await.unwrap();

    let row = store.get_site(SEED).await.unwrap().unwrap();
    assert_eq!(row.first_seen, "2020-01-01");
    assert_eq!(row.title, "Directory v2");
    assert_eq!(row.risk_level, 4);
    assert_ne!(row.last_seen, "2020-01-01");
}

#[tokio::test]
async fn high_risk_keyword_raises_exactly_one_alert() {
    let store = memory_store().await;
    let alerts = AlertService::new(store.clone(), Config::default().alerts);

    alerts.check_keyword_alerts("ransomware kits", &[]).await;

    let raised = alerts.get_alerts(None, 0, 50).await;
    assert_eq!(raised.len(), 1);
    assert_eq!(raised[0].kind, "High-risk keyword detected");
    assert_eq!(raised[0].severity, 8);
    assert_eq!(raised[0].status, "new");
}

#[tokio::test]
async fn benign_keyword_raises_nothing() {
    let store = memory_store().await;
    let alerts = AlertService::new(store.clone(), Config::default().alerts);

    alerts.check_keyword_alerts("knitting patterns", &[]).await;

    assert!(alerts.get_alerts(None, 0, 50).await.is_empty());
}

fn hit_with_snippet(url: &str, snippet: &str) -> SearchHit {
    SearchHit {
        keyword: "benign".to_string(),
        source_url: SEED.to_string(),
        result_url: url.to_string(),
        title: "t".to_string(),
        snippet: snippet.to_string(),
        relevance: 1,
        date_found: "2025-06-01".to_string(),
    }
}

#[tokio::test]
async fn suspicious_snippets_raise_one_alert_per_result() {
    let store = memory_store().await;
    let alerts = AlertService::new(store.clone(), Config::default().alerts);

    let results = vec![
        hit_with_snippet("http://a.onion", "card 4111 1111 1111 1111 for sale"),
        hit_with_snippet("http://b.onion", "contact drop@example.com"),
        hit_with_snippet("http://c.onion", "nothing sensitive"),
    ];

    alerts.check_keyword_alerts("benign", &results).await;

    let raised = alerts.get_alerts(None, 0, 50).await;
    assert_eq!(raised.len(), 2);
    assert!(raised.iter().all(|a| a.kind == "Suspicious content detected"));
    assert!(raised.iter().all(|a| a.severity == 5));
}

#[tokio::test]
async fn alert_retrieval_honors_min_severity() {
    let store = memory_store().await;
    let alerts = AlertService::new(store.clone(), Config::default().alerts);

    assert!(alerts.create_alert("Test", "body", 9).await);

    let at_eight = alerts.get_alerts(None, 8, 50).await;
    assert_eq!(at_eight.len(), 1);
    assert_eq!(at_eight[0].kind, "Test");

    assert!(alerts.get_alerts(None, 10, 50).await.is_empty());
}

#[tokio::test]
async fn alert_ordering_is_severity_then_recency() {
    let store = memory_store().await;
    let alerts = AlertService::new(store.clone(), Config::default().alerts);

    assert!(alerts.create_alert("Low", "a", 2).await);
    assert!(alerts.create_alert("High", "b", 9).await);
    assert!(alerts.create_alert("Mid", "c", 5).await);

    let raised = alerts.get_alerts(None, 0, 50).await;
    let severities: Vec<i32> = raised.iter().map(|a| a.severity).collect();
    assert_eq!(severities, vec![9, 5, 2]);
}

#[tokio::test]
async fn alert_status_updates_are_unvalidated_and_always_succeed() {
    let store = memory_store().await;
    let alerts = AlertService::new(store.clone(), Config::default().alerts);

    // Zero matching rows still reports success.
    assert!(alerts.update_alert_status(9999, "acknowledged").await);

    assert!(alerts.create_alert("Test", "body", 6).await);
    let id = alerts.get_alerts(None, 0, 50).await[0].id;

    assert!(alerts.update_alert_status(id, "whatever-status").await);
    let updated = alerts.get_alerts(Some("whatever-status"), 0, 50).await;
    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0].id, id);
}

#[tokio::test]
async fn bulk_alert_updates_cover_all_ids() {
    let store = memory_store().await;
    let alerts = AlertService::new(store.clone(), Config::default().alerts);

    assert!(alerts.create_alert("One", "a", 5).await);
    assert!(alerts.create_alert("Two", "b", 5).await);
    let ids: Vec<i64> = alerts.get_alerts(None, 0, 50).await.iter().map(|a| a.id).collect();

    assert!(alerts.bulk_update_alerts(&ids, "resolved").await);
    assert_eq!(alerts.get_alerts(Some("resolved"), 0, 50).await.len(), 2);
}

#[tokio::test]
async fn search_dedups_by_result_url_and_persists_hits() {
    let store = memory_store().await;

    // Two stored sites both link to the same market page.
    for (url, title) in [
        ("http://firstsourcefirstsrc.onion/", "First"),
        ("http://secondsourcesecond2.onion/", "Second"),
    ] {
        store
            .store_site(&CrawledPage {
                url: url.to_string(),
                title: title.to_string(),
                content: String::new(),
                kind: SiteKind::Website,
                geo_location: "Unknown".to_string(),
                risk_level: 0,
            })
            .await
            .unwrap();
    }

    let linked = r#"<a href="http://sharedmarketshared1.onion/">midnight market entrance</a>"#;
    let fetcher = Arc::new(MockFetcher::new(&[
        ("http://firstsourcefirstsrc.onion/", linked),
        ("http://secondsourcesecond2.onion/", linked),
    ]));

    let alerts = AlertService::new(store.clone(), Config::default().alerts);
    let search = SearchService::new(store.clone(), fetcher, alerts);

    let hits = search.search(&["market".to_string()], None, None, None).await;

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].result_url, "http://sharedmarketshared1.onion/");
    // Last write wins: the surviving hit comes from the second source.
    assert_eq!(hits[0].source_url, "http://secondsourcesecond2.onion/");

    // The append-only log kept every occurrence.
    let stored = store.get_search_results(Some("market"), 50).await.unwrap();
    assert_eq!(stored.len(), 2);
}

#[tokio::test]
async fn search_without_proxy_yields_nothing() {
    let store = memory_store().await;
    let alerts = AlertService::new(store.clone(), Config::default().alerts);
    let search = SearchService::new(store, Arc::new(MockFetcher::unconfigured()), alerts);

    let hits = search.search(&["market".to_string()], None, None, None).await;
    assert!(hits.is_empty());
}

#[tokio::test]
async fn search_source_filter_drops_other_sources() {
    let store = memory_store().await;
    store
        .store_site(&CrawledPage {
            url: "http://firstsourcefirstsrc.onion/".to_string(),
            title: "First".to_string(),
            content: String::new(),
            kind: SiteKind::Website,
            geo_location: "Unknown".to_string(),
            risk_level: 0,
        })
        .await
        .unwrap();

    let linked = r#"<a href="http://sharedmarketshared1.onion/">market</a>"#;
    let fetcher = Arc::new(MockFetcher::new(&[(
        "http://firstsourcefirstsrc.onion/",
        linked,
    )]));

    let alerts = AlertService::new(store.clone(), Config::default().alerts);
    let search = SearchService::new(store, fetcher, alerts);

    let sources = vec!["http://someothersourceab.onion/".to_string()];
    let hits = search
        .search(&["market".to_string()], Some(&sources), None, None)
        .await;

    assert!(hits.is_empty());
}

#[tokio::test]
async fn tracked_users_are_linkable_by_similarity() {
    let store = memory_store().await;
    let tracker = UserTracker::new(store.clone());

    tracker.track_user("darkvendor", None, None).await.unwrap();
    tracker.track_user("darkvendor2", None, None).await.unwrap();
    tracker.track_user("xyz", None, None).await.unwrap();

    let similar = tracker.find_similar_users("darkvendor", 0.7).await;
    assert_eq!(similar, vec!["darkvendor2".to_string()]);
}

#[tokio::test]
async fn tracking_twice_overwrites_the_record() {
    let store = memory_store().await;
    let tracker = UserTracker::new(store.clone());

    tracker.track_user("alice", None, None).await.unwrap();
    tracker
        .track_user("alice", Some("REALKEY"), Some("alice@real.mail"))
        .await
        .unwrap();

    let row = store.get_user("alice").await.unwrap().unwrap();
    assert_eq!(row.pgp_key.as_deref(), Some("REALKEY"));
    assert_eq!(row.email.as_deref(), Some("alice@real.mail"));
}

#[tokio::test]
async fn analytics_report_aggregates_and_skips_malformed_rows() {
    let store = memory_store().await;

    let tracker = UserTracker::new(store.clone());
    tracker.track_user("vendor1", None, None).await.unwrap();

    // A row with an undecodable marketplace list must not poison the report.
    let broken = users::ActiveModel {
        username: Set("broken".to_string()),
        marketplaces: Set(Some("not-json".to_string())),
        last_active: Set("2025-05-01".to_string()),
        geo_location: Set("Unknown".to_string()),
        risk_level: Set(9),
        ..Default::default()
    };
    broken.insert(&store.conn).await.unwrap();

    store
        .store_site(&CrawledPage {
            url: SEED.to_string(),
            title: "Directory".to_string(),
            content: String::new(),
            kind: SiteKind::Marketplace,
            geo_location: "Unknown".to_string(),
            risk_level: 9,
        })
        .await
        .unwrap();

    let alerts = AlertService::new(store.clone(), Config::default().alerts);
    assert!(alerts.create_alert("Test", "body", 9).await);

    let analytics = AnalyticsService::new(store.clone());
    let report = analytics.report().await.unwrap();

    assert_eq!(report.summary.total_sites, 1);
    assert_eq!(report.summary.total_users, 2);
    assert_eq!(report.summary.total_alerts, 1);
    assert_eq!(report.summary.high_risk_sites, 1);
    assert_eq!(report.summary.high_risk_users, 1);
    assert_eq!(report.summary.high_severity_alerts, 1);
    assert_eq!(
        report.summary.most_common_site_kind.as_deref(),
        Some("marketplace")
    );
    // Both simulated marketplaces for vendor1; the broken row contributed none.
    assert_eq!(report.users.marketplace_distribution.len(), 2);
}
