use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub username: String,
    pub pgp_key: Option<String>,
    pub email: Option<String>,
    /// JSON array of marketplace names.
    pub marketplaces: Option<String>,
    /// JSON array of product names.
    pub products: Option<String>,
    pub last_active: String,
    pub geo_location: String,
    pub risk_level: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
