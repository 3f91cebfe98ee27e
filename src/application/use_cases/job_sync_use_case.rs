// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::task_request::PageQuery;
use crate::domain::models::job::Job;
use crate::domain::repositories::job_repository::JobRepository;
use crate::domain::repositories::metadata_repository::MetadataRepository;
use crate::domain::repositories::task_repository::{Page, RepositoryError};
use crate::scrapyd::{NodeRegistry, ScrapydClient, ScrapydError};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use validator::Validate;

#[derive(Error, Debug)]
pub enum JobSyncError {
    #[error(transparent)]
    Scrapyd(#[from] ScrapydError),
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Job #{0} not found")]
    JobNotFound(i32),
}

/// 单个节点的同步结果
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub node: usize,
    pub server: String,
    pub projects: usize,
    pub jobs: usize,
}

/// 作业同步用例
///
/// 把各节点 listjobs 的结果写入以节点地址命名的作业表
pub struct JobSyncUseCase {
    jobs: Arc<dyn JobRepository>,
    metadata: Arc<dyn MetadataRepository>,
    registry: Arc<NodeRegistry>,
    client: Arc<ScrapydClient>,
    version: String,
}

impl JobSyncUseCase {
    pub fn new(
        jobs: Arc<dyn JobRepository>,
        metadata: Arc<dyn MetadataRepository>,
        registry: Arc<NodeRegistry>,
        client: Arc<ScrapydClient>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            jobs,
            metadata,
            registry,
            client,
            version: version.into(),
        }
    }

    /// 为每个节点建好作业表
    pub async fn ensure_tables(&self) -> Result<(), JobSyncError> {
        for node in self.registry.iter() {
            self.jobs.ensure_table(&node.jobs_table_name()).await?;
        }
        Ok(())
    }

    /// 同步一个节点
    ///
    /// # 参数
    ///
    /// * `node` - 从 1 开始的节点序号
    ///
    /// # 返回值
    ///
    /// 同步的项目数和作业数
    pub async fn sync_node(&self, node: usize) -> Result<SyncReport, JobSyncError> {
        let target = self.registry.get(node)?;
        let table = target.jobs_table_name();
        self.jobs.ensure_table(&table).await?;

        let projects = self.client.list_projects(target).await?;
        let mut jobs = 0;
        for project in &projects {
            let snapshots = self.client.list_jobs(target, project).await?;
            jobs += snapshots.len();
            self.jobs.upsert(&table, &snapshots).await?;
        }

        debug!(
            "Synced {} jobs of {} projects from {}",
            jobs,
            projects.len(),
            target.server()
        );
        Ok(SyncReport {
            node,
            server: target.server(),
            projects: projects.len(),
            jobs,
        })
    }

    /// 同步所有节点，单个节点失败不影响其余节点
    pub async fn sync_all(&self) -> Vec<Result<SyncReport, JobSyncError>> {
        let mut reports = Vec::with_capacity(self.registry.len());
        for node in 1..=self.registry.len() {
            let result = self.sync_node(node).await;
            match &result {
                Ok(report) => {
                    metrics::counter!("job_sync_total", "outcome" => "ok").increment(1);
                    debug!("Node {} synced: {} jobs", report.node, report.jobs);
                }
                Err(e) => {
                    metrics::counter!("job_sync_total", "outcome" => "error").increment(1);
                    warn!("Job sync for node {} failed: {}", node, e);
                }
            }
            reports.push(result);
        }
        reports
    }

    /// 分页列出节点上的作业
    ///
    /// 未指定每页条数时使用元数据中的 `jobs_per_page`
    pub async fn list_jobs(&self, node: usize, query: PageQuery) -> Result<Page<Job>, JobSyncError> {
        query
            .validate()
            .map_err(|e| JobSyncError::ValidationError(e.to_string()))?;
        let target = self.registry.get(node)?;
        let per_page = match query.per_page {
            Some(per_page) => per_page,
            None => self.metadata.get_or_create(&self.version).await?.jobs_per_page.max(1) as u64,
        };
        Ok(self
            .jobs
            .list(&target.jobs_table_name(), query.page(), per_page)
            .await?)
    }

    /// 软删除作业记录，之后的同步不会恢复它
    pub async fn delete_job(&self, node: usize, id: i32) -> Result<(), JobSyncError> {
        let target = self.registry.get(node)?;
        match self.jobs.soft_delete(&target.jobs_table_name(), id).await {
            Ok(()) => {
                info!("Job #{} on {} marked as deleted", id, target.server());
                Ok(())
            }
            Err(RepositoryError::NotFound) => Err(JobSyncError::JobNotFound(id)),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[path = "job_sync_use_case_test.rs"]
mod tests;
