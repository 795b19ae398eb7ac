use crate::entities::{alerts, search_results, sites, users};
use crate::models::{CrawledPage, SearchHit, UserProfile};
use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

/// Storage gateway over the SQLite store. Every component takes a `Store`
/// handle explicitly; there is no ambient connection state.
#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn site_repo(&self) -> repositories::site::SiteRepository {
        repositories::site::SiteRepository::new(self.conn.clone())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn search_result_repo(&self) -> repositories::search_result::SearchResultRepository {
        repositories::search_result::SearchResultRepository::new(self.conn.clone())
    }

    fn alert_repo(&self) -> repositories::alert::AlertRepository {
        repositories::alert::AlertRepository::new(self.conn.clone())
    }

    // ---- sites ----

    pub async fn store_site(&self, page: &CrawledPage) -> Result<()> {
        self.site_repo().upsert(page).await
    }

    pub async fn get_site(&self, url: &str) -> Result<Option<sites::Model>> {
        self.site_repo().get_by_url(url).await
    }

    pub async fn get_all_urls(&self) -> Result<Vec<String>> {
        self.site_repo().all_urls().await
    }

    pub async fn site_count(&self) -> Result<u64> {
        self.site_repo().count().await
    }

    pub async fn site_kind_counts(&self) -> Result<Vec<(String, i64)>> {
        self.site_repo().count_by_kind().await
    }

    pub async fn site_risk_counts(&self) -> Result<Vec<(i32, i64)>> {
        self.site_repo().count_by_risk_level().await
    }

    pub async fn sites_first_seen_per_day(&self, since: &str) -> Result<Vec<(String, i64)>> {
        self.site_repo().first_seen_per_day(since).await
    }

    // ---- users ----

    pub async fn store_user(&self, profile: &UserProfile) -> Result<()> {
        self.user_repo().upsert(profile).await
    }

    pub async fn get_user(&self, username: &str) -> Result<Option<users::Model>> {
        self.user_repo().get(username).await
    }

    pub async fn all_usernames(&self) -> Result<Vec<String>> {
        self.user_repo().all_usernames().await
    }

    pub async fn user_count(&self) -> Result<u64> {
        self.user_repo().count().await
    }

    pub async fn user_risk_counts(&self) -> Result<Vec<(i32, i64)>> {
        self.user_repo().count_by_risk_level().await
    }

    pub async fn users_active_per_month(&self, months: u64) -> Result<Vec<(String, i64)>> {
        self.user_repo().active_per_month(months).await
    }

    pub async fn user_marketplace_columns(&self) -> Result<Vec<Option<String>>> {
        self.user_repo().marketplace_columns().await
    }

    // ---- search results ----

    pub async fn store_search_result(&self, hit: &SearchHit) -> Result<()> {
        self.search_result_repo().insert(hit).await
    }

    pub async fn get_search_results(
        &self,
        keyword: Option<&str>,
        limit: u64,
    ) -> Result<Vec<search_results::Model>> {
        self.search_result_repo().list(keyword, limit).await
    }

    // ---- alerts ----

    pub async fn insert_alert(&self, kind: &str, content: &str, severity: i32) -> Result<()> {
        self.alert_repo().insert(kind, content, severity).await
    }

    pub async fn query_alerts(
        &self,
        status: Option<&str>,
        min_severity: i32,
        limit: u64,
    ) -> Result<Vec<alerts::Model>> {
        self.alert_repo().query(status, min_severity, limit).await
    }

    pub async fn update_alert_status(&self, id: i64, status: &str) -> Result<u64> {
        self.alert_repo().set_status(id, status).await
    }

    pub async fn bulk_update_alert_status(&self, ids: &[i64], status: &str) -> Result<u64> {
        self.alert_repo().set_status_bulk(ids, status).await
    }

    pub async fn alert_severity_counts(&self) -> Result<Vec<(i32, i64)>> {
        self.alert_repo().count_by_severity().await
    }

    pub async fn alert_kind_counts(&self) -> Result<Vec<(String, i64)>> {
        self.alert_repo().count_by_kind().await
    }

    pub async fn alerts_created_per_day(&self, since: &str) -> Result<Vec<(String, i64)>> {
        self.alert_repo().created_per_day(since).await
    }
}
