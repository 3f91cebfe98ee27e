// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "task_job_result")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub task_result_id: i32,
    pub run_time: ChronoDateTimeWithTimeZone,
    pub node: i32,
    pub server: String,
    pub status_code: i32,
    pub status: String,
    #[sea_orm(column_type = "Text")]
    pub result: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::task_result::Entity",
        from = "Column::TaskResultId",
        to = "super::task_result::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    TaskResult,
}

impl Related<super::task_result::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TaskResult.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
