// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::task_repository::RepositoryError;
use async_trait::async_trait;
use thiserror::Error;

/// 任务执行错误
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// 任务已被删除
    #[error("task #{0} not found")]
    TaskNotFound(i32),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// 一次运行的汇总
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    /// 执行记录ID
    pub task_result_id: i32,
    pub pass_count: i32,
    pub fail_count: i32,
}

/// 执行一次任务运行
///
/// 调度器只依赖这个特质，实际的调度请求由实现方发出
#[async_trait]
pub trait TaskRunner: Send + Sync {
    async fn run(&self, task_id: i32) -> Result<RunSummary, ExecutionError>;
}
