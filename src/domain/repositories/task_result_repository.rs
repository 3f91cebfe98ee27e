// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::task_result::{NewTaskJobResult, TaskResult, TaskResultDetail};
use crate::domain::repositories::task_repository::{Page, RepositoryError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// 任务执行记录仓库特质
#[async_trait]
pub trait TaskResultRepository: Send + Sync {
    /// 新建一条执行记录，计数为 0
    async fn create(
        &self,
        task_id: i32,
        execute_time: DateTime<Utc>,
    ) -> Result<TaskResult, RepositoryError>;
    /// 写入各节点的执行结果
    async fn add_job_results(
        &self,
        task_result_id: i32,
        results: &[NewTaskJobResult],
    ) -> Result<(), RepositoryError>;
    /// 更新成功和失败的节点数
    async fn update_counts(
        &self,
        task_result_id: i32,
        pass_count: i32,
        fail_count: i32,
    ) -> Result<TaskResult, RepositoryError>;
    /// 分页列出某个任务的执行记录，新的在前
    async fn list_by_task(
        &self,
        task_id: i32,
        page: u64,
        per_page: u64,
    ) -> Result<Page<TaskResult>, RepositoryError>;
    /// 执行记录及其节点明细
    async fn find_detail(
        &self,
        task_result_id: i32,
    ) -> Result<Option<TaskResultDetail>, RepositoryError>;
    /// 删除一条执行记录，节点明细级联删除
    async fn delete(&self, task_result_id: i32) -> Result<(), RepositoryError>;
}
