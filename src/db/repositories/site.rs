use crate::entities::{prelude::*, sites};
use crate::models::CrawledPage;
use anyhow::Result;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use tracing::debug;

pub struct SiteRepository {
    conn: DatabaseConnection,
}

impl SiteRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Upserts a crawled page keyed on its URL.
    ///
    /// `first_seen` is excluded from the conflict update set, so the date of
    /// the first visit survives every refresh.
    pub async fn upsert(&self, page: &CrawledPage) -> Result<()> {
        let today = chrono::Utc::now().format("%Y-%m-%d").to_string();

        let active_model = sites::ActiveModel {
            url: Set(page.url.clone()),
            title: Set(page.title.clone()),
            content: Set(page.content.clone()),
            kind: Set(page.kind.to_string()),
            first_seen: Set(today.clone()),
            last_seen: Set(today),
            geo_location: Set(page.geo_location.clone()),
            risk_level: Set(page.risk_level),
            ..Default::default()
        };

        Sites::insert(active_model)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(sites::Column::Url)
                    .update_columns([
                        sites::Column::Title,
                        sites::Column::Content,
                        sites::Column::Kind,
                        sites::Column::LastSeen,
                        sites::Column::GeoLocation,
                        sites::Column::RiskLevel,
                    ])
                    .to_owned(),
            )
            .exec(&self.conn)
            .await?;

        debug!("Stored site: {}", page.url);
        Ok(())
    }

    pub async fn get_by_url(&self, url: &str) -> Result<Option<sites::Model>> {
        let site = Sites::find()
            .filter(sites::Column::Url.eq(url))
            .one(&self.conn)
            .await?;
        Ok(site)
    }

    pub async fn all_urls(&self) -> Result<Vec<String>> {
        let urls = Sites::find()
            .select_only()
            .column(sites::Column::Url)
            .order_by_asc(sites::Column::Id)
            .into_tuple::<String>()
            .all(&self.conn)
            .await?;
        Ok(urls)
    }

    pub async fn count_by_kind(&self) -> Result<Vec<(String, i64)>> {
        let rows = Sites::find()
            .select_only()
            .column(sites::Column::Kind)
            .column_as(sites::Column::Id.count(), "count")
            .group_by(sites::Column::Kind)
            .into_tuple::<(String, i64)>()
            .all(&self.conn)
            .await?;
        Ok(rows)
    }

    pub async fn count_by_risk_level(&self) -> Result<Vec<(i32, i64)>> {
        let rows = Sites::find()
            .select_only()
            .column(sites::Column::RiskLevel)
            .column_as(sites::Column::Id.count(), "count")
            .group_by(sites::Column::RiskLevel)
            .into_tuple::<(i32, i64)>()
            .all(&self.conn)
            .await?;
        Ok(rows)
    }

    /// Per-day counts of sites first seen on or after `since` (YYYY-MM-DD).
    pub async fn first_seen_per_day(&self, since: &str) -> Result<Vec<(String, i64)>> {
        let rows = Sites::find()
            .select_only()
            .column(sites::Column::FirstSeen)
            .column_as(sites::Column::Id.count(), "count")
            .filter(sites::Column::FirstSeen.gte(since))
            .group_by(sites::Column::FirstSeen)
            .into_tuple::<(String, i64)>()
            .all(&self.conn)
            .await?;
        Ok(rows)
    }

    pub async fn count(&self) -> Result<u64> {
        let total = Sites::find().count(&self.conn).await?;
        Ok(total)
    }
}
