use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Sites::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Sites::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Sites::Url).string().not_null().unique_key())
                    .col(ColumnDef::new(Sites::Title).string().not_null())
                    .col(ColumnDef::new(Sites::Content).string().not_null())
                    .col(ColumnDef::new(Sites::Kind).string().not_null())
                    .col(ColumnDef::new(Sites::FirstSeen).string().not_null())
                    .col(ColumnDef::new(Sites::LastSeen).string().not_null())
                    .col(ColumnDef::new(Sites::GeoLocation).string().not_null())
                    .col(
                        ColumnDef::new(Sites::RiskLevel)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::PgpKey).string().null())
                    .col(ColumnDef::new(Users::Email).string().null())
                    .col(ColumnDef::new(Users::Marketplaces).string().null())
                    .col(ColumnDef::new(Users::Products).string().null())
                    .col(ColumnDef::new(Users::LastActive).string().not_null())
                    .col(ColumnDef::new(Users::GeoLocation).string().not_null())
                    .col(
                        ColumnDef::new(Users::RiskLevel)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SearchResults::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SearchResults::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SearchResults::Keyword).string().not_null())
                    .col(
                        ColumnDef::new(SearchResults::SourceUrl)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SearchResults::ResultUrl)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SearchResults::Title).string().not_null())
                    .col(ColumnDef::new(SearchResults::Snippet).string().not_null())
                    .col(
                        ColumnDef::new(SearchResults::Relevance)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SearchResults::DateFound)
                            .string()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_search_results_keyword")
                    .table(SearchResults::Table)
                    .col(SearchResults::Keyword)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Alerts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Alerts::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Alerts::Type).string().not_null())
                    .col(ColumnDef::new(Alerts::Content).string().not_null())
                    .col(ColumnDef::new(Alerts::Severity).integer().not_null())
                    .col(
                        ColumnDef::new(Alerts::CreatedAt)
                            .date_time()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP".to_owned()),
                    )
                    .col(
                        ColumnDef::new(Alerts::Status)
                            .string()
                            .not_null()
                            .default("new"),
                    )
                    .to_owned(),
            )
            .await?;

        // Index matching the retrieval ordering (severity desc, recency desc).
        manager
            .create_index(
                Index::create()
                    .name("idx_alerts_severity_created_at")
                    .table(Alerts::Table)
                    .col(Alerts::Severity)
                    .col(Alerts::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Alerts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SearchResults::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Sites::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Sites {
    Table,
    Id,
    Url,
    Title,
    Content,
    Kind,
    FirstSeen,
    LastSeen,
    GeoLocation,
    RiskLevel,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Username,
    PgpKey,
    Email,
    Marketplaces,
    Products,
    LastActive,
    GeoLocation,
    RiskLevel,
}

#[derive(Iden)]
enum SearchResults {
    Table,
    Id,
    Keyword,
    SourceUrl,
    ResultUrl,
    Title,
    Snippet,
    Relevance,
    DateFound,
}

#[derive(Iden)]
enum Alerts {
    Table,
    Id,
    Type,
    Content,
    Severity,
    CreatedAt,
    Status,
}
