use crate::entities::{prelude::*, users};
use crate::models::UserProfile;
use anyhow::Result;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use tracing::debug;

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Upserts a user keyed on username, overwriting every tracked field.
    pub async fn upsert(&self, profile: &UserProfile) -> Result<()> {
        let active_model = users::ActiveModel {
            username: Set(profile.username.clone()),
            pgp_key: Set(profile.pgp_key.clone()),
            email: Set(profile.email.clone()),
            marketplaces: Set(serde_json::to_string(&profile.marketplaces).ok()),
            products: Set(serde_json::to_string(&profile.products).ok()),
            last_active: Set(profile.last_active.clone()),
            geo_location: Set(profile.geo_location.clone()),
            risk_level: Set(profile.risk_level),
            ..Default::default()
        };

        Users::insert(active_model)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(users::Column::Username)
                    .update_columns([
                        users::Column::PgpKey,
                        users::Column::Email,
                        users::Column::Marketplaces,
                        users::Column::Products,
                        users::Column::LastActive,
                        users::Column::GeoLocation,
                        users::Column::RiskLevel,
                    ])
                    .to_owned(),
            )
            .exec(&self.conn)
            .await?;

        debug!("Stored user: {}", profile.username);
        Ok(())
    }

    pub async fn get(&self, username: &str) -> Result<Option<users::Model>> {
        let user = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await?;
        Ok(user)
    }

    pub async fn all_usernames(&self) -> Result<Vec<String>> {
        let usernames = Users::find()
            .select_only()
            .column(users::Column::Username)
            .into_tuple::<String>()
            .all(&self.conn)
            .await?;
        Ok(usernames)
    }

    pub async fn count_by_risk_level(&self) -> Result<Vec<(i32, i64)>> {
        let rows = Users::find()
            .select_only()
            .column(users::Column::RiskLevel)
            .column_as(users::Column::Id.count(), "count")
            .group_by(users::Column::RiskLevel)
            .into_tuple::<(i32, i64)>()
            .all(&self.conn)
            .await?;
        Ok(rows)
    }

    /// Active-user counts grouped by month (YYYY-MM), newest first, capped.
    pub async fn active_per_month(&self, months: u64) -> Result<Vec<(String, i64)>> {
        let month_expr = Expr::cust("substr(last_active, 1, 7)");
        let rows = Users::find()
            .select_only()
            .column_as(month_expr.clone(), "month")
            .column_as(users::Column::Id.count(), "count")
            .group_by(month_expr.clone())
            .order_by_desc(month_expr)
            .limit(months)
            .into_tuple::<(String, i64)>()
            .all(&self.conn)
            .await?;
        Ok(rows)
    }

    /// Raw JSON marketplace columns for aggregation; decoding is the
    /// caller's concern so one bad row never aborts a report.
    pub async fn marketplace_columns(&self) -> Result<Vec<Option<String>>> {
        let rows = Users::find()
            .select_only()
            .column(users::Column::Marketplaces)
            .filter(users::Column::Marketplaces.is_not_null())
            .into_tuple::<Option<String>>()
            .all(&self.conn)
            .await?;
        Ok(rows)
    }

    pub async fn count(&self) -> Result<u64> {
        let total = Users::find().count(&self.conn).await?;
        Ok(total)
    }
}
