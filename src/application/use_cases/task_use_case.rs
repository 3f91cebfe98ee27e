// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::{
    application::dto::task_request::{PageQuery, TaskRequestDto},
    domain::{
        models::{
            metadata::SchedulerState,
            task::Task,
            task_result::{TaskResult, TaskResultDetail},
        },
        repositories::{
            metadata_repository::MetadataRepository,
            task_repository::{Page, RepositoryError, TaskRepository},
            task_result_repository::TaskResultRepository,
        },
        services::trigger::{Trigger, TriggerError},
    },
    queue::scheduler::{ScheduledTaskInfo, SchedulerError, TaskScheduler},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use validator::Validate;

#[derive(Error, Debug)]
pub enum TaskUseCaseError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Invalid trigger: {0}")]
    Trigger(#[from] TriggerError),
    #[error("Task #{0} not found")]
    TaskNotFound(i32),
    #[error("Task result #{0} not found")]
    ResultNotFound(i32),
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<SchedulerError> for TaskUseCaseError {
    fn from(err: SchedulerError) -> Self {
        match err {
            SchedulerError::TaskNotFound(id) => TaskUseCaseError::TaskNotFound(id),
            SchedulerError::Trigger(e) => TaskUseCaseError::Trigger(e),
        }
    }
}

/// 任务及其下一次运行时间
#[derive(Debug, Clone, Serialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    /// 暂停或不再触发时为空
    pub next_run_time: Option<DateTime<Utc>>,
}

/// 调度器整体状态
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub state: SchedulerState,
    pub tasks: Vec<ScheduledTaskInfo>,
}

/// 重新加载的结果
#[derive(Debug, Clone, Serialize)]
pub struct ReloadReport {
    pub loaded: usize,
    /// 无法编译触发器的任务及原因
    pub failed: Vec<ReloadFailure>,
    pub state: SchedulerState,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReloadFailure {
    pub task_id: i32,
    pub message: String,
}

/// 定时任务用例
///
/// 负责任务的增删改查，并保持调度器中的计划与数据库一致
pub struct TaskUseCase {
    tasks: Arc<dyn TaskRepository>,
    results: Arc<dyn TaskResultRepository>,
    metadata: Arc<dyn MetadataRepository>,
    scheduler: Arc<TaskScheduler>,
    version: String,
}

impl TaskUseCase {
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        results: Arc<dyn TaskResultRepository>,
        metadata: Arc<dyn MetadataRepository>,
        scheduler: Arc<TaskScheduler>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            tasks,
            results,
            metadata,
            scheduler,
            version: version.into(),
        }
    }

    pub fn scheduler(&self) -> &Arc<TaskScheduler> {
        &self.scheduler
    }

    fn view(&self, task: Task) -> TaskView {
        let next_run_time = self.scheduler.next_run_time(task.id);
        TaskView {
            task,
            next_run_time,
        }
    }

    async fn require_task(&self, id: i32) -> Result<Task, TaskUseCaseError> {
        self.tasks
            .find_by_id(id)
            .await?
            .ok_or(TaskUseCaseError::TaskNotFound(id))
    }

    fn prepare(dto: TaskRequestDto, id: i32, create_time: DateTime<Utc>) -> Result<Task, TaskUseCaseError> {
        dto.validate()
            .map_err(|e| TaskUseCaseError::ValidationError(e.to_string()))?;
        let task = dto.into_task(id, create_time);
        // reject bad triggers before anything is written
        Trigger::compile(&task, Utc::now())?;
        Ok(task)
    }

    /// 创建任务并加入调度
    pub async fn create_task(&self, dto: TaskRequestDto) -> Result<TaskView, TaskUseCaseError> {
        let task = Self::prepare(dto, 0, Utc::now())?;
        let stored = self.tasks.create(&task).await?;
        self.scheduler.add_task(stored.clone())?;
        info!("Task {} created", stored.label());
        Ok(self.view(stored))
    }

    /// 更新任务并重新计算调度
    pub async fn update_task(
        &self,
        id: i32,
        mut dto: TaskRequestDto,
    ) -> Result<TaskView, TaskUseCaseError> {
        let existing = self.require_task(id).await?;
        dto.paused = dto.paused.or(Some(existing.paused));
        let task = Self::prepare(dto, id, existing.create_time)?;
        let stored = match self.tasks.update(&task).await {
            Ok(stored) => stored,
            Err(RepositoryError::NotFound) => return Err(TaskUseCaseError::TaskNotFound(id)),
            Err(e) => return Err(e.into()),
        };
        self.scheduler.reschedule(stored.clone())?;
        info!("Task {} updated", stored.label());
        Ok(self.view(stored))
    }

    /// 删除任务，执行记录随之级联删除
    pub async fn delete_task(&self, id: i32) -> Result<(), TaskUseCaseError> {
        self.scheduler.remove_task(id);
        match self.tasks.delete(id).await {
            Ok(()) => {
                info!("Task #{} deleted", id);
                Ok(())
            }
            Err(RepositoryError::NotFound) => Err(TaskUseCaseError::TaskNotFound(id)),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get_task(&self, id: i32) -> Result<TaskView, TaskUseCaseError> {
        let task = self.require_task(id).await?;
        Ok(self.view(task))
    }

    /// 分页列出任务
    ///
    /// 未指定每页条数时使用元数据中的 `tasks_per_page`
    pub async fn list_tasks(&self, query: PageQuery) -> Result<Page<TaskView>, TaskUseCaseError> {
        query
            .validate()
            .map_err(|e| TaskUseCaseError::ValidationError(e.to_string()))?;
        let per_page = match query.per_page {
            Some(per_page) => per_page,
            None => self.metadata.get_or_create(&self.version).await?.tasks_per_page.max(1) as u64,
        };
        let page = self.tasks.list(query.page(), per_page).await?;
        Ok(page.map(|task| self.view(task)))
    }

    /// 暂停单个任务
    pub async fn pause_task(&self, id: i32) -> Result<TaskView, TaskUseCaseError> {
        let mut task = self.require_task(id).await?;
        self.tasks.set_paused(id, true).await?;
        task.paused = true;
        if let Err(e) = self.scheduler.pause_task(id) {
            warn!("Task #{} paused in storage only: {}", id, e);
        }
        Ok(self.view(task))
    }

    /// 恢复单个任务，下一次运行时间从当前时刻重新计算
    pub async fn resume_task(&self, id: i32) -> Result<TaskView, TaskUseCaseError> {
        let mut task = self.require_task(id).await?;
        self.tasks.set_paused(id, false).await?;
        task.paused = false;
        match self.scheduler.resume_task(id) {
            Ok(_) => {}
            // the trigger failed to load earlier, try again with the stored row
            Err(SchedulerError::TaskNotFound(_)) => {
                self.scheduler.add_task(task.clone())?;
            }
            Err(e) => return Err(e.into()),
        }
        Ok(self.view(task))
    }

    /// 立即运行一次任务
    pub async fn fire_task(&self, id: i32) -> Result<(), TaskUseCaseError> {
        let task = self.require_task(id).await?;
        if !self.scheduler.contains(id) {
            self.scheduler.add_task(task)?;
        }
        self.scheduler.fire_now(id)?;
        Ok(())
    }

    /// 分页列出任务的执行记录
    pub async fn list_results(
        &self,
        task_id: i32,
        query: PageQuery,
    ) -> Result<Page<TaskResult>, TaskUseCaseError> {
        query
            .validate()
            .map_err(|e| TaskUseCaseError::ValidationError(e.to_string()))?;
        self.require_task(task_id).await?;
        let per_page = match query.per_page {
            Some(per_page) => per_page,
            None => self.metadata.get_or_create(&self.version).await?.tasks_per_page.max(1) as u64,
        };
        Ok(self
            .results
            .list_by_task(task_id, query.page(), per_page)
            .await?)
    }

    /// 一次执行在各节点上的结果
    pub async fn get_result(
        &self,
        task_id: i32,
        result_id: i32,
    ) -> Result<TaskResultDetail, TaskUseCaseError> {
        match self.results.find_detail(result_id).await? {
            Some(detail) if detail.result.task_id == task_id => Ok(detail),
            _ => Err(TaskUseCaseError::ResultNotFound(result_id)),
        }
    }

    pub async fn delete_result(&self, task_id: i32, result_id: i32) -> Result<(), TaskUseCaseError> {
        self.get_result(task_id, result_id).await?;
        match self.results.delete(result_id).await {
            Ok(()) => Ok(()),
            Err(RepositoryError::NotFound) => Err(TaskUseCaseError::ResultNotFound(result_id)),
            Err(e) => Err(e.into()),
        }
    }

    pub fn scheduler_status(&self) -> SchedulerStatus {
        SchedulerStatus {
            state: self.scheduler.state(),
            tasks: self.scheduler.snapshot(),
        }
    }

    /// 暂停调度器并持久化状态
    pub async fn pause_scheduler(&self) -> Result<SchedulerState, TaskUseCaseError> {
        self.scheduler.pause();
        self.metadata
            .set_scheduler_state(&self.version, SchedulerState::Paused)
            .await?;
        Ok(self.scheduler.state())
    }

    /// 恢复调度器并持久化状态
    pub async fn resume_scheduler(&self) -> Result<SchedulerState, TaskUseCaseError> {
        self.scheduler.resume();
        self.metadata
            .set_scheduler_state(&self.version, SchedulerState::Running)
            .await?;
        Ok(self.scheduler.state())
    }

    /// 从数据库重新加载全部任务，并恢复持久化的调度器状态
    ///
    /// 启动时和重启调度器时调用
    pub async fn reload(&self) -> Result<ReloadReport, TaskUseCaseError> {
        let tasks = self.tasks.list_all().await?;
        let total = tasks.len();
        let failed: Vec<ReloadFailure> = self
            .scheduler
            .load(tasks)
            .into_iter()
            .map(|(task_id, e)| {
                warn!("Task #{} could not be scheduled: {}", task_id, e);
                ReloadFailure {
                    task_id,
                    message: e.to_string(),
                }
            })
            .collect();

        let metadata = self.metadata.get_or_create(&self.version).await?;
        match metadata.scheduler_state {
            SchedulerState::Paused => self.scheduler.pause(),
            _ if self.scheduler.state() == SchedulerState::Paused => self.scheduler.resume(),
            _ => {}
        }

        let report = ReloadReport {
            loaded: total - failed.len(),
            failed,
            state: self.scheduler.state(),
        };
        info!(
            "Scheduler reloaded: {} tasks, {} failed, state {}",
            report.loaded,
            report.failed.len(),
            report.state
        );
        Ok(report)
    }
}

#[cfg(test)]
#[path = "task_use_case_test.rs"]
mod tests;
