// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::task::Task;
use async_trait::async_trait;
use sea_orm::DbErr;
use thiserror::Error;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    /// 记录未找到
    #[error("Record not found")]
    NotFound,
    /// 持久化的数据无法解析
    #[error("Corrupted record: {0}")]
    Corrupted(String),
}

/// 分页结果
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 总条数
    pub total: u64,
    /// 当前页（从 1 开始）
    pub page: u64,
    pub per_page: u64,
}

impl<T> Page<T> {
    /// 第 `page` 页（从 1 开始）的起始偏移，超出数据库可表示范围时返回 None
    pub fn offset(page: u64, per_page: u64) -> Option<u64> {
        page.saturating_sub(1)
            .checked_mul(per_page)
            .filter(|offset| *offset <= i64::MAX as u64)
    }

    /// 偏移超出范围时的空页
    pub fn empty(total: u64, page: u64, per_page: u64) -> Self {
        Page {
            items: Vec::new(),
            total,
            page,
            per_page,
        }
    }

    pub fn total_pages(&self) -> u64 {
        if self.per_page == 0 {
            0
        } else {
            self.total.div_ceil(self.per_page)
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
        }
    }
}

/// 任务仓库特质
///
/// 定义任务数据访问接口
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// 创建新任务，返回带有数据库分配ID的任务
    async fn create(&self, task: &Task) -> Result<Task, RepositoryError>;
    /// 根据ID查找任务
    async fn find_by_id(&self, id: i32) -> Result<Option<Task>, RepositoryError>;
    /// 分页列出任务，新任务在前
    async fn list(&self, page: u64, per_page: u64) -> Result<Page<Task>, RepositoryError>;
    /// 列出全部任务，用于调度器加载
    async fn list_all(&self) -> Result<Vec<Task>, RepositoryError>;
    /// 更新任务
    async fn update(&self, task: &Task) -> Result<Task, RepositoryError>;
    /// 删除任务，执行记录级联删除
    async fn delete(&self, id: i32) -> Result<(), RepositoryError>;
    /// 设置暂停标记
    async fn set_paused(&self, id: i32, paused: bool) -> Result<(), RepositoryError>;
}
