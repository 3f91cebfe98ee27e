// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::task::Task;
use crate::domain::models::task_result::{JobOutcomeStatus, NewTaskJobResult};
use crate::domain::repositories::task_repository::TaskRepository;
use crate::domain::repositories::task_result_repository::TaskResultRepository;
use crate::queue::runner::{ExecutionError, RunSummary, TaskRunner};
use crate::scrapyd::client::ScrapydClient;
use crate::scrapyd::node::NodeRegistry;
use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{info, warn};

/// 节点序号越界时记录的状态码
const NODE_NOT_FOUND: i32 = 404;

/// 任务执行器
///
/// 一次运行：新建执行记录，向每个选中的节点并发发送 schedule.json，
/// 逐节点写入结果并更新成功/失败计数
pub struct TaskExecutor {
    tasks: Arc<dyn TaskRepository>,
    results: Arc<dyn TaskResultRepository>,
    registry: Arc<NodeRegistry>,
    client: Arc<ScrapydClient>,
}

impl TaskExecutor {
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        results: Arc<dyn TaskResultRepository>,
        registry: Arc<NodeRegistry>,
        client: Arc<ScrapydClient>,
    ) -> Self {
        Self {
            tasks,
            results,
            registry,
            client,
        }
    }

    async fn schedule_on(&self, task: &Task, node: usize, params: &[(String, String)]) -> NewTaskJobResult {
        let target = match self.registry.get(node) {
            Ok(target) => target,
            Err(e) => {
                warn!("Task {} selects an unknown node: {}", task.label(), e);
                return NewTaskJobResult {
                    node: i32::try_from(node).unwrap_or(i32::MAX),
                    server: String::new(),
                    status_code: NODE_NOT_FOUND,
                    status: JobOutcomeStatus::Error,
                    result: e.to_string(),
                };
            }
        };

        let outcome = self.client.schedule(target, params).await;
        match outcome.status {
            JobOutcomeStatus::Ok => {
                info!("Task {} scheduled on {}: {}", task.label(), target.server(), outcome.result)
            }
            _ => warn!(
                "Task {} failed on {} ({}): {}",
                task.label(),
                target.server(),
                outcome.status,
                outcome.result
            ),
        }

        NewTaskJobResult {
            node: i32::try_from(node).unwrap_or(i32::MAX),
            server: target.server(),
            status_code: outcome.status_code,
            status: outcome.status,
            result: outcome.result,
        }
    }
}

#[async_trait]
impl TaskRunner for TaskExecutor {
    async fn run(&self, task_id: i32) -> Result<RunSummary, ExecutionError> {
        let task = self
            .tasks
            .find_by_id(task_id)
            .await?
            .ok_or(ExecutionError::TaskNotFound(task_id))?;

        let task_result = self.results.create(task.id, Utc::now()).await?;
        let jobid = task.jobid_for_run();
        let params = task.schedule_params(&jobid);

        let outcomes = join_all(
            task.selected_nodes
                .iter()
                .map(|node| self.schedule_on(&task, *node, &params)),
        )
        .await;

        let pass_count = outcomes.iter().filter(|o| o.status.is_pass()).count() as i32;
        let fail_count = outcomes.len() as i32 - pass_count;
        for outcome in &outcomes {
            metrics::counter!("task_node_results_total", "status" => outcome.status.to_string())
                .increment(1);
        }

        self.results
            .add_job_results(task_result.id, &outcomes)
            .await?;
        self.results
            .update_counts(task_result.id, pass_count, fail_count)
            .await?;

        Ok(RunSummary {
            task_result_id: task_result.id,
            pass_count,
            fail_count,
        })
    }
}

#[cfg(test)]
#[path = "task_executor_test.rs"]
mod tests;
