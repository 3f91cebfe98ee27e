// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "task")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: Option<String>,
    pub trigger: String,
    pub create_time: ChronoDateTimeWithTimeZone,
    pub update_time: ChronoDateTimeWithTimeZone,
    pub project: String,
    pub version: String,
    pub spider: String,
    pub jobid: String,
    /// JSON 对象：参数名 -> 值列表
    #[sea_orm(column_type = "Text")]
    pub settings_arguments: String,
    /// JSON 数组：节点序号
    #[sea_orm(column_type = "Text")]
    pub selected_nodes: String,
    pub year: String,
    pub month: String,
    pub day: String,
    pub week: String,
    pub day_of_week: String,
    pub hour: String,
    pub minute: String,
    pub second: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub timezone: Option<String>,
    pub jitter: i32,
    pub misfire_grace_time: Option<i32>,
    /// "True" 或 "False"
    pub coalesce: String,
    pub max_instances: i32,
    pub paused: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::task_result::Entity")]
    TaskResult,
}

impl Related<super::task_result::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TaskResult.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
