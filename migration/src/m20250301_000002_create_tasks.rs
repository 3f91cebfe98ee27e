use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create task table
        manager
            .create_table(
                Table::create()
                    .table(Task::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Task::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Task::Name).string_len(255))
                    .col(ColumnDef::new(Task::Trigger).string_len(8).not_null())
                    .col(
                        ColumnDef::new(Task::CreateTime)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Task::UpdateTime)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Task::Project).string_len(255).not_null())
                    .col(ColumnDef::new(Task::Version).string_len(255).not_null())
                    .col(ColumnDef::new(Task::Spider).string_len(255).not_null())
                    .col(ColumnDef::new(Task::Jobid).string_len(255).not_null())
                    .col(ColumnDef::new(Task::SettingsArguments).text().not_null())
                    .col(ColumnDef::new(Task::SelectedNodes).text().not_null())
                    .col(ColumnDef::new(Task::Year).string_len(255).not_null())
                    .col(ColumnDef::new(Task::Month).string_len(255).not_null())
                    .col(ColumnDef::new(Task::Day).string_len(255).not_null())
                    .col(ColumnDef::new(Task::Week).string_len(255).not_null())
                    .col(ColumnDef::new(Task::DayOfWeek).string_len(255).not_null())
                    .col(ColumnDef::new(Task::Hour).string_len(255).not_null())
                    .col(ColumnDef::new(Task::Minute).string_len(255).not_null())
                    .col(ColumnDef::new(Task::Second).string_len(255).not_null())
                    .col(ColumnDef::new(Task::StartDate).string_len(19))
                    .col(ColumnDef::new(Task::EndDate).string_len(19))
                    .col(ColumnDef::new(Task::Timezone).string_len(255))
                    .col(ColumnDef::new(Task::Jitter).integer().not_null().default(0))
                    .col(ColumnDef::new(Task::MisfireGraceTime).integer())
                    .col(
                        ColumnDef::new(Task::Coalesce)
                            .string_len(5)
                            .not_null()
                            .default("True"),
                    )
                    .col(
                        ColumnDef::new(Task::MaxInstances)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(Task::Paused)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .to_owned(),
            )
            .await?;

        // Create task_result table
        manager
            .create_table(
                Table::create()
                    .table(TaskResult::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TaskResult::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TaskResult::TaskId).integer().not_null())
                    .col(
                        ColumnDef::new(TaskResult::ExecuteTime)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(TaskResult::FailCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(TaskResult::PassCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_task_result_task")
                            .from(TaskResult::Table, TaskResult::TaskId)
                            .to(Task::Table, Task::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_task_result_task_id")
                    .table(TaskResult::Table)
                    .col(TaskResult::TaskId)
                    .to_owned(),
            )
            .await?;

        // Create task_job_result table
        manager
            .create_table(
                Table::create()
                    .table(TaskJobResult::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TaskJobResult::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TaskJobResult::TaskResultId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TaskJobResult::RunTime)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(TaskJobResult::Node).integer().not_null())
                    .col(
                        ColumnDef::new(TaskJobResult::Server)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TaskJobResult::StatusCode)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TaskJobResult::Status)
                            .string_len(9)
                            .not_null(),
                    )
                    .col(ColumnDef::new(TaskJobResult::Result).text().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_task_job_result_task_result")
                            .from(TaskJobResult::Table, TaskJobResult::TaskResultId)
                            .to(TaskResult::Table, TaskResult::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_task_job_result_task_result_id")
                    .table(TaskJobResult::Table)
                    .col(TaskJobResult::TaskResultId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_task_job_result_node")
                    .table(TaskJobResult::Table)
                    .col(TaskJobResult::Node)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TaskJobResult::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TaskResult::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Task::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Task {
    Table,
    Id,
    Name,
    Trigger,
    CreateTime,
    UpdateTime,
    Project,
    Version,
    Spider,
    Jobid,
    SettingsArguments,
    SelectedNodes,
    Year,
    Month,
    Day,
    Week,
    DayOfWeek,
    Hour,
    Minute,
    Second,
    StartDate,
    EndDate,
    Timezone,
    Jitter,
    MisfireGraceTime,
    Coalesce,
    MaxInstances,
    Paused,
}

#[derive(DeriveIden)]
enum TaskResult {
    Table,
    Id,
    TaskId,
    ExecuteTime,
    FailCount,
    PassCount,
}

#[derive(DeriveIden)]
enum TaskJobResult {
    Table,
    Id,
    TaskResultId,
    RunTime,
    Node,
    Server,
    StatusCode,
    Status,
    Result,
}
