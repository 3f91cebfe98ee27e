// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 每个节点一张的作业表
//!
//! 表名在运行时由节点地址决定，因此不使用实体，而是直接构造 sea-query 语句

use crate::domain::models::job::JobSnapshot;
use chrono::{DateTime, NaiveDateTime, Utc};
use sea_orm::sea_query::{
    Alias, ColumnDef, Expr, Index, IndexCreateStatement, InsertStatement, OnConflict, Order,
    Query, SelectStatement, SimpleExpr, Table, TableCreateStatement, UpdateStatement,
};
use sea_orm::{DbErr, DeriveIden, FromQueryResult};
use std::collections::HashSet;

#[derive(DeriveIden, Clone, Copy)]
pub enum JobColumn {
    Id,
    Project,
    Spider,
    Job,
    Status,
    Deleted,
    CreateTime,
    UpdateTime,
    Pages,
    Items,
    Pid,
    Start,
    Runtime,
    Finish,
    HrefLog,
    HrefItems,
}

const ALL_COLUMNS: [JobColumn; 16] = [
    JobColumn::Id,
    JobColumn::Project,
    JobColumn::Spider,
    JobColumn::Job,
    JobColumn::Status,
    JobColumn::Deleted,
    JobColumn::CreateTime,
    JobColumn::UpdateTime,
    JobColumn::Pages,
    JobColumn::Items,
    JobColumn::Pid,
    JobColumn::Start,
    JobColumn::Runtime,
    JobColumn::Finish,
    JobColumn::HrefLog,
    JobColumn::HrefItems,
];

/// 作业表的一行
#[derive(Debug, Clone, FromQueryResult)]
pub struct JobRow {
    pub id: i32,
    pub project: String,
    pub spider: String,
    pub job: String,
    pub status: String,
    pub deleted: String,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
    pub pages: Option<i32>,
    pub items: Option<i32>,
    pub pid: Option<i32>,
    pub start: Option<NaiveDateTime>,
    pub runtime: Option<String>,
    pub finish: Option<NaiveDateTime>,
    pub href_log: Option<String>,
    pub href_items: Option<String>,
}

#[derive(Debug, FromQueryResult)]
pub struct CountRow {
    pub count: i64,
}

/// 建表语句，已存在时跳过
pub fn create_table(table: &str) -> TableCreateStatement {
    Table::create()
        .table(Alias::new(table))
        .if_not_exists()
        .col(
            ColumnDef::new(JobColumn::Id)
                .integer()
                .not_null()
                .auto_increment()
                .primary_key(),
        )
        .col(ColumnDef::new(JobColumn::Project).string_len(255).not_null())
        .col(ColumnDef::new(JobColumn::Spider).string_len(255).not_null())
        .col(ColumnDef::new(JobColumn::Job).string_len(255).not_null())
        .col(ColumnDef::new(JobColumn::Status).string_len(1).not_null())
        .col(
            ColumnDef::new(JobColumn::Deleted)
                .string_len(1)
                .not_null()
                .default("0"),
        )
        .col(
            ColumnDef::new(JobColumn::CreateTime)
                .timestamp_with_time_zone()
                .not_null(),
        )
        .col(
            ColumnDef::new(JobColumn::UpdateTime)
                .timestamp_with_time_zone()
                .not_null(),
        )
        .col(ColumnDef::new(JobColumn::Pages).integer())
        .col(ColumnDef::new(JobColumn::Items).integer())
        .col(ColumnDef::new(JobColumn::Pid).integer())
        .col(ColumnDef::new(JobColumn::Start).date_time())
        .col(ColumnDef::new(JobColumn::Runtime).string_len(20))
        .col(ColumnDef::new(JobColumn::Finish).date_time())
        .col(ColumnDef::new(JobColumn::HrefLog).string_len(255))
        .col(ColumnDef::new(JobColumn::HrefItems).string_len(255))
        .index(
            Index::create()
                .unique()
                .name(format!("uq_{}_project_spider_job", table))
                .col(JobColumn::Project)
                .col(JobColumn::Spider)
                .col(JobColumn::Job),
        )
        .to_owned()
}

/// 状态、删除标记、开始和结束时间上的索引
pub fn create_indexes(table: &str) -> Vec<IndexCreateStatement> {
    [
        (JobColumn::Status, "status"),
        (JobColumn::Deleted, "deleted"),
        (JobColumn::Start, "start"),
        (JobColumn::Finish, "finish"),
    ]
    .into_iter()
    .map(|(column, suffix)| {
        Index::create()
            .if_not_exists()
            .name(format!("idx_{}_{}", table, suffix))
            .table(Alias::new(table))
            .col(column)
            .to_owned()
    })
    .collect()
}

/// 同一 (project, spider, job) 只保留最后一条快照，保持其余顺序
///
/// 单条 ON CONFLICT DO UPDATE 语句不能两次更新同一行
pub fn latest_per_key(snapshots: &[JobSnapshot]) -> Vec<JobSnapshot> {
    let mut seen = HashSet::new();
    let mut latest: Vec<JobSnapshot> = snapshots
        .iter()
        .rev()
        .filter(|s| seen.insert((s.project.as_str(), s.spider.as_str(), s.job.as_str())))
        .cloned()
        .collect();
    latest.reverse();
    latest
}

/// 批量写入作业快照
///
/// 按 (project, spider, job) 冲突时更新状态相关字段，删除标记保持不变
pub fn upsert(
    table: &str,
    snapshots: &[JobSnapshot],
    now: DateTime<Utc>,
) -> Result<InsertStatement, DbErr> {
    let mut insert = Query::insert()
        .into_table(Alias::new(table))
        .columns([
            JobColumn::Project,
            JobColumn::Spider,
            JobColumn::Job,
            JobColumn::Status,
            JobColumn::Deleted,
            JobColumn::CreateTime,
            JobColumn::UpdateTime,
            JobColumn::Pid,
            JobColumn::Start,
            JobColumn::Runtime,
            JobColumn::Finish,
            JobColumn::HrefLog,
            JobColumn::HrefItems,
        ])
        .on_conflict(
            OnConflict::columns([JobColumn::Project, JobColumn::Spider, JobColumn::Job])
                .update_columns([
                    JobColumn::Status,
                    JobColumn::UpdateTime,
                    JobColumn::Pid,
                    JobColumn::Start,
                    JobColumn::Runtime,
                    JobColumn::Finish,
                    JobColumn::HrefLog,
                    JobColumn::HrefItems,
                ])
                .to_owned(),
        )
        .to_owned();

    for snapshot in snapshots {
        let values: Vec<SimpleExpr> = vec![
            snapshot.project.clone().into(),
            snapshot.spider.clone().into(),
            snapshot.job.clone().into(),
            snapshot.status.code().into(),
            "0".into(),
            now.into(),
            now.into(),
            snapshot.pid.into(),
            snapshot.start.into(),
            snapshot.runtime().into(),
            snapshot.finish.into(),
            snapshot.href_log().into(),
            snapshot.href_items().into(),
        ];
        insert
            .values(values)
            .map_err(|e| DbErr::Custom(e.to_string()))?;
    }

    Ok(insert)
}

/// 未删除作业的分页查询：按状态排序，同状态内开始时间新的在前
pub fn select_page(table: &str, limit: u64, offset: u64) -> SelectStatement {
    Query::select()
        .columns(ALL_COLUMNS)
        .from(Alias::new(table))
        .and_where(Expr::col(JobColumn::Deleted).eq("0"))
        .order_by(JobColumn::Status, Order::Asc)
        .order_by(JobColumn::Start, Order::Desc)
        .order_by(JobColumn::Id, Order::Desc)
        .limit(limit)
        .offset(offset)
        .to_owned()
}

/// 未删除作业总数
pub fn count_visible(table: &str) -> SelectStatement {
    Query::select()
        .expr_as(Expr::col(JobColumn::Id).count(), Alias::new("count"))
        .from(Alias::new(table))
        .and_where(Expr::col(JobColumn::Deleted).eq("0"))
        .to_owned()
}

/// 软删除
pub fn soft_delete(table: &str, id: i32, now: DateTime<Utc>) -> UpdateStatement {
    Query::update()
        .table(Alias::new(table))
        .value(JobColumn::Deleted, "1")
        .value(JobColumn::UpdateTime, now)
        .and_where(Expr::col(JobColumn::Id).eq(id))
        .and_where(Expr::col(JobColumn::Deleted).eq("0"))
        .to_owned()
}
