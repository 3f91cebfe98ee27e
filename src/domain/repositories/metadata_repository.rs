// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::metadata::{Metadata, SchedulerState};
use crate::domain::repositories::task_repository::RepositoryError;
use async_trait::async_trait;

/// 元数据仓库特质
///
/// 元数据按程序版本区分，每个版本一行
#[async_trait]
pub trait MetadataRepository: Send + Sync {
    /// 获取当前版本的元数据，不存在时按默认值创建
    async fn get_or_create(&self, version: &str) -> Result<Metadata, RepositoryError>;
    /// 页面访问计数加一，返回新值
    async fn increment_pageview(&self, version: &str) -> Result<i32, RepositoryError>;
    async fn set_scheduler_state(
        &self,
        version: &str,
        state: SchedulerState,
    ) -> Result<(), RepositoryError>;
    async fn set_main_pid(&self, version: &str, pid: i32) -> Result<(), RepositoryError>;
    async fn update_page_sizes(
        &self,
        version: &str,
        jobs_per_page: Option<i32>,
        tasks_per_page: Option<i32>,
    ) -> Result<Metadata, RepositoryError>;
    /// 记录本次检查更新的时间
    async fn touch_check_update(&self, version: &str) -> Result<(), RepositoryError>;
}
