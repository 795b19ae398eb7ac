use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "search_results")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub keyword: String,
    pub source_url: String,
    pub result_url: String,
    pub title: String,
    pub snippet: String,
    pub relevance: i32,
    pub date_found: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
