pub mod analysis;
pub mod clients;
pub mod config;
pub mod constants;
pub mod db;
pub mod entities;
pub mod models;
pub mod parser;
pub mod proxy;
pub mod services;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use clients::ProxiedClient;
pub use config::Config;
use db::Store;
use proxy::{StaticTunnel, Tunnel};
use services::{AlertService, AnalyticsService, CrawlerService, SearchService, UserTracker};

pub async fn run() -> Result<()> {
    let config = Config::load()?;
    config.validate()?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_help();
        return Ok(());
    }

    match args[1].as_str() {
        "crawl" | "c" => {
            let urls: Vec<String> = args[2..].to_vec();
            cmd_crawl(&config, &urls).await
        }

        "search" | "s" => {
            if args.len() < 3 {
                println!("Usage: darkwatch search <keyword> [keyword...]");
                return Ok(());
            }
            let keywords: Vec<String> = args[2..].to_vec();
            cmd_search(&config, &keywords).await
        }

        "track" | "t" => {
            if args.len() < 3 {
                println!("Usage: darkwatch track <username> [pgp_key] [email]");
                return Ok(());
            }
            cmd_track(
                &config,
                &args[2],
                args.get(3).map(String::as_str),
                args.get(4).map(String::as_str),
            )
            .await
        }

        "similar" => {
            if args.len() < 3 {
                println!("Usage: darkwatch similar <username> [threshold]");
                return Ok(());
            }
            let threshold = args
                .get(3)
                .and_then(|s| s.parse().ok())
                .unwrap_or(constants::limits::DEFAULT_SIMILARITY_THRESHOLD);
            cmd_similar(&config, &args[2], threshold).await
        }

        "activity" => {
            if args.len() < 3 {
                println!("Usage: darkwatch activity <username> [days]");
                return Ok(());
            }
            let days = args
                .get(3)
                .and_then(|s| s.parse().ok())
                .unwrap_or(constants::limits::DEFAULT_ACTIVITY_DAYS);
            cmd_activity(&args[2], days);
            Ok(())
        }

        "alerts" | "a" => {
            let min_severity = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(0);
            cmd_alerts(&config, min_severity).await
        }

        "ack" => cmd_set_alert_status(&config, &args[2..], "acknowledged").await,

        "resolve" => cmd_set_alert_status(&config, &args[2..], "resolved").await,

        "report" | "r" => cmd_report(&config).await,

        "status" => cmd_status(&config).await,

        _ => {
            print_help();
            Ok(())
        }
    }
}

fn print_help() {
    println!("darkwatch - anonymized-network intelligence collector");
    println!();
    println!("Usage: darkwatch <command> [args]");
    println!();
    println!("Commands:");
    println!("  crawl [url...]                  Crawl seeds (or the configured defaults)");
    println!("  search <keyword...>             Search stored sites for keywords");
    println!("  track <username> [pgp] [email]  Record a user identity");
    println!("  similar <username> [threshold]  Find similar stored usernames");
    println!("  activity <username> [days]      Simulated activity timeline");
    println!("  alerts [min_severity]           List alerts, most urgent first");
    println!("  ack <id...>                     Mark alerts acknowledged");
    println!("  resolve <id...>                 Mark alerts resolved");
    println!("  report                          Aggregate intelligence report");
    println!("  status                          Check tunnel readiness");
}

async fn connect_store(config: &Config) -> Result<Store> {
    Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await
}

/// Builds the page fetcher, attaching the tunnel endpoint only when the
/// tunnel answers the readiness probe. An unconfigured fetcher makes the
/// crawler and search engine yield empty results instead of erroring.
async fn build_fetcher(config: &Config, timeout_seconds: u32) -> Result<ProxiedClient> {
    let tunnel = StaticTunnel::from_config(&config.proxy);

    let endpoint = if tunnel.is_ready().await {
        tunnel.endpoint()
    } else {
        warn!("Tunnel at {}:{} is not ready", config.proxy.socks_host, config.proxy.socks_port);
        None
    };

    ProxiedClient::new(
        endpoint,
        Duration::from_secs(u64::from(timeout_seconds)),
        &config.crawler.user_agent,
    )
}

async fn cmd_crawl(config: &Config, urls: &[String]) -> Result<()> {
    for url in urls {
        if !analysis::patterns::is_onion_url(url) && !analysis::patterns::is_i2p_url(url) {
            warn!("Seed '{url}' is not a well-formed onion/I2P address");
        }
    }

    let store = connect_store(config).await?;
    let fetcher = build_fetcher(config, config.crawler.fetch_timeout_seconds).await?;

    let crawler = CrawlerService::new(store, Arc::new(fetcher), config.clone());
    let pages = crawler
        .crawl(
            urls,
            config.crawler.default_depth,
            config.crawler.default_max_pages,
        )
        .await;

    println!("Crawled {} page(s)", pages.len());
    for page in &pages {
        println!("  [{}] {} (risk {})", page.kind, page.url, page.risk_level);
    }
    Ok(())
}

async fn cmd_search(config: &Config, keywords: &[String]) -> Result<()> {
    let store = connect_store(config).await?;
    let fetcher = build_fetcher(config, config.search.fetch_timeout_seconds).await?;

    let alerts = AlertService::new(store.clone(), config.alerts.clone());
    let search = SearchService::new(store, Arc::new(fetcher), alerts);

    let hits = search.search(keywords, None, None, None).await;

    println!("Found {} unique result(s)", hits.len());
    for hit in &hits {
        println!("  {} -> {} ({})", hit.keyword, hit.result_url, hit.title);
    }
    Ok(())
}

async fn cmd_track(
    config: &Config,
    username: &str,
    pgp_key: Option<&str>,
    email: Option<&str>,
) -> Result<()> {
    let store = connect_store(config).await?;
    let tracker = UserTracker::new(store);

    match tracker.track_user(username, pgp_key, email).await {
        Ok(profile) => {
            println!("Tracked user '{}' (risk {})", profile.username, profile.risk_level);
        }
        Err(e) => {
            println!("Failed to track user '{username}': {e}");
        }
    }
    Ok(())
}

async fn cmd_similar(config: &Config, username: &str, threshold: f64) -> Result<()> {
    let store = connect_store(config).await?;
    let tracker = UserTracker::new(store);

    let similar = tracker.find_similar_users(username, threshold).await;
    if similar.is_empty() {
        println!("No similar users at threshold {threshold}");
    } else {
        println!("Similar to '{username}':");
        for name in similar {
            println!("  {name}");
        }
    }
    Ok(())
}

fn cmd_activity(username: &str, days: u32) {
    let timeline = UserTracker::user_activity(username, days);
    println!("Simulated activity for '{username}' over {days} day(s):");
    for entry in timeline {
        println!("  {} {} @ {}", entry.date, entry.action, entry.location);
    }
}

async fn cmd_alerts(config: &Config, min_severity: i32) -> Result<()> {
    let store = connect_store(config).await?;
    let alerts = AlertService::new(store, config.alerts.clone());

    let list = alerts
        .get_alerts(None, min_severity, config.alerts.query_limit)
        .await;

    println!("{} alert(s)", list.len());
    for alert in list {
        println!(
            "  #{} [{}] severity {}: {} ({})",
            alert.id, alert.status, alert.severity, alert.kind, alert.content
        );
    }
    Ok(())
}

async fn cmd_set_alert_status(config: &Config, raw_ids: &[String], status: &str) -> Result<()> {
    let ids: Vec<i64> = raw_ids.iter().filter_map(|s| s.parse().ok()).collect();
    if ids.is_empty() {
        println!("Usage: darkwatch ack|resolve <alert_id...>");
        return Ok(());
    }

    let store = connect_store(config).await?;
    let alerts = AlertService::new(store, config.alerts.clone());

    if alerts.bulk_update_alerts(&ids, status).await {
        println!("Marked {} alert(s) {status}", ids.len());
    } else {
        println!("Failed to update alerts");
    }
    Ok(())
}

async fn cmd_report(config: &Config) -> Result<()> {
    let store = connect_store(config).await?;
    let analytics = AnalyticsService::new(store);

    let report = analytics.report().await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn cmd_status(config: &Config) -> Result<()> {
    let tunnel = StaticTunnel::from_config(&config.proxy);

    if tunnel.is_ready().await {
        info!("Tunnel is ready");
        println!(
            "Tunnel ready at socks5h://{}:{}",
            config.proxy.socks_host, config.proxy.socks_port
        );
    } else {
        println!(
            "Tunnel at {}:{} is not reachable",
            config.proxy.socks_host, config.proxy.socks_port
        );
    }
    Ok(())
}
