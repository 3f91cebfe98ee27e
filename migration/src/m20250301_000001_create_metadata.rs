use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Metadata::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Metadata::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Metadata::Version)
                            .string_len(20)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Metadata::LastCheckUpdateTimestamp)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(Metadata::MainPid).integer())
                    .col(
                        ColumnDef::new(Metadata::Pageview)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Metadata::UrlScrapydash)
                            .text()
                            .not_null()
                            .default("http://127.0.0.1:5000"),
                    )
                    .col(ColumnDef::new(Metadata::Username).string_len(255))
                    .col(ColumnDef::new(Metadata::Password).string_len(255))
                    .col(
                        ColumnDef::new(Metadata::SchedulerState)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(Metadata::JobsPerPage)
                            .integer()
                            .not_null()
                            .default(100),
                    )
                    .col(
                        ColumnDef::new(Metadata::TasksPerPage)
                            .integer()
                            .not_null()
                            .default(100),
                    )
                    .col(
                        ColumnDef::new(Metadata::JobsStyle)
                            .string_len(8)
                            .not_null()
                            .default("database"),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Metadata::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Metadata {
    Table,
    Id,
    Version,
    LastCheckUpdateTimestamp,
    MainPid,
    Pageview,
    UrlScrapydash,
    Username,
    Password,
    SchedulerState,
    JobsPerPage,
    TasksPerPage,
    JobsStyle,
}
