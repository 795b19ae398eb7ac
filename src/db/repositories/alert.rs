use crate::entities::{alerts, prelude::*};
use anyhow::Result;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

pub struct AlertRepository {
    conn: DatabaseConnection,
}

impl AlertRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(&self, kind: &str, content: &str, severity: i32) -> Result<()> {
        let created_at = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();

        let active_model = alerts::ActiveModel {
            kind: Set(kind.to_string()),
            content: Set(content.to_string()),
            severity: Set(severity),
            created_at: Set(created_at),
            status: Set("new".to_string()),
            ..Default::default()
        };

        Alerts::insert(active_model).exec(&self.conn).await?;
        Ok(())
    }

    /// Alerts at or above `min_severity`, optionally narrowed by status,
    /// most urgent and most recent first.
    pub async fn query(
        &self,
        status: Option<&str>,
        min_severity: i32,
        limit: u64,
    ) -> Result<Vec<alerts::Model>> {
        let mut query = Alerts::find()
            .filter(alerts::Column::Severity.gte(min_severity))
            .order_by_desc(alerts::Column::Severity)
            .order_by_desc(alerts::Column::CreatedAt);

        if let Some(status) = status {
            query = query.filter(alerts::Column::Status.eq(status));
        }

        let rows = query.limit(limit).all(&self.conn).await?;
        Ok(rows)
    }

    /// Sets the status of one alert. The target value is not validated and
    /// a zero-row update is not an error.
    pub async fn set_status(&self, id: i64, status: &str) -> Result<u64> {
        let result = Alerts::update_many()
            .col_expr(alerts::Column::Status, Expr::value(status))
            .filter(alerts::Column::Id.eq(id))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn set_status_bulk(&self, ids: &[i64], status: &str) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = Alerts::update_many()
            .col_expr(alerts::Column::Status, Expr::value(status))
            .filter(alerts::Column::Id.is_in(ids.iter().copied()))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn count_by_severity(&self) -> Result<Vec<(i32, i64)>> {
        let rows = Alerts::find()
            .select_only()
            .column(alerts::Column::Severity)
            .column_as(alerts::Column::Id.count(), "count")
            .group_by(alerts::Column::Severity)
            .into_tuple::<(i32, i64)>()
            .all(&self.conn)
            .await?;
        Ok(rows)
    }

    pub async fn count_by_kind(&self) -> Result<Vec<(String, i64)>> {
        let rows = Alerts::find()
            .select_only()
            .column(alerts::Column::Kind)
            .column_as(alerts::Column::Id.count(), "count")
            .group_by(alerts::Column::Kind)
            .into_tuple::<(String, i64)>()
            .all(&self.conn)
            .await?;
        Ok(rows)
    }

    /// Per-day counts of alerts created on or after `since` (YYYY-MM-DD).
    pub async fn created_per_day(&self, since: &str) -> Result<Vec<(String, i64)>> {
        let day_expr = Expr::cust("substr(created_at, 1, 10)");
        let rows = Alerts::find()
            .select_only()
            .column_as(day_expr.clone(), "day")
            .column_as(alerts::Column::Id.count(), "count")
            .filter(alerts::Column::CreatedAt.gte(since))
            .group_by(day_expr)
            .into_tuple::<(String, i64)>()
            .all(&self.conn)
            .await?;
        Ok(rows)
    }
}
