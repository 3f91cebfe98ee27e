// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "metadata")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub version: String,
    #[sea_orm(column_type = "Double")]
    pub last_check_update_timestamp: f64,
    pub main_pid: Option<i32>,
    pub pageview: i32,
    #[sea_orm(column_type = "Text")]
    pub url_scrapydash: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub scheduler_state: i32,
    pub jobs_per_page: i32,
    pub tasks_per_page: i32,
    pub jobs_style: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
