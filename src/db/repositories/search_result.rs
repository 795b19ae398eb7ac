use crate::entities::{prelude::*, search_results};
use crate::models::SearchHit;
use anyhow::Result;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

pub struct SearchResultRepository {
    conn: DatabaseConnection,
}

impl SearchResultRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Appends one result row. The log is append-only; duplicates are
    /// expected and deduplicated at query time by callers that care.
    pub async fn insert(&self, hit: &SearchHit) -> Result<()> {
        let active_model = search_results::ActiveModel {
            keyword: Set(hit.keyword.clone()),
            source_url: Set(hit.source_url.clone()),
            result_url: Set(hit.result_url.clone()),
            title: Set(hit.title.clone()),
            snippet: Set(hit.snippet.clone()),
            relevance: Set(hit.relevance),
            date_found: Set(hit.date_found.clone()),
            ..Default::default()
        };

        SearchResults::insert(active_model).exec(&self.conn).await?;
        Ok(())
    }

    pub async fn list(
        &self,
        keyword: Option<&str>,
        limit: u64,
    ) -> Result<Vec<search_results::Model>> {
        let mut query = SearchResults::find()
            .order_by_desc(search_results::Column::DateFound)
            .order_by_desc(search_results::Column::Relevance);

        if let Some(keyword) = keyword {
            query = query.filter(search_results::Column::Keyword.eq(keyword));
        }

        let rows = query.limit(limit).all(&self.conn).await?;
        Ok(rows)
    }
}
