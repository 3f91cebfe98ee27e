// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::{Job, JobSnapshot};
use crate::domain::repositories::task_repository::{Page, RepositoryError};
use async_trait::async_trait;

/// 作业仓库特质
///
/// 每个节点对应一张作业表，`table` 参数为 [`crate::scrapyd::ScrapydNode::jobs_table_name`]
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// 建表（已存在时跳过）
    async fn ensure_table(&self, table: &str) -> Result<(), RepositoryError>;
    /// 按 (project, spider, job) 写入或更新快照，返回写入条数
    async fn upsert(&self, table: &str, snapshots: &[JobSnapshot]) -> Result<u64, RepositoryError>;
    /// 分页列出未删除的作业
    async fn list(&self, table: &str, page: u64, per_page: u64)
        -> Result<Page<Job>, RepositoryError>;
    /// 软删除
    async fn soft_delete(&self, table: &str, id: i32) -> Result<(), RepositoryError>;
}
