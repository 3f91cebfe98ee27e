// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::task_result::{
    JobOutcomeStatus, NewTaskJobResult, TaskJobResult, TaskResult, TaskResultDetail,
};
use crate::domain::repositories::task_repository::{Page, RepositoryError};
use crate::domain::repositories::task_result_repository::TaskResultRepository;
use crate::infrastructure::database::entities::{task_job_result, task_result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;

/// 任务执行记录仓库实现
#[derive(Clone)]
pub struct TaskResultRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl TaskResultRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<task_result::Model> for TaskResult {
    fn from(model: task_result::Model) -> Self {
        Self {
            id: model.id,
            task_id: model.task_id,
            execute_time: model.execute_time.with_timezone(&Utc),
            fail_count: model.fail_count,
            pass_count: model.pass_count,
        }
    }
}

impl From<task_job_result::Model> for TaskJobResult {
    fn from(model: task_job_result::Model) -> Self {
        Self {
            id: model.id,
            task_result_id: model.task_result_id,
            run_time: model.run_time.with_timezone(&Utc),
            node: model.node,
            server: model.server,
            status_code: model.status_code,
            status: model.status.parse().unwrap_or(JobOutcomeStatus::Error),
            result: model.result,
        }
    }
}

#[async_trait]
impl TaskResultRepository for TaskResultRepositoryImpl {
    async fn create(
        &self,
        task_id: i32,
        execute_time: DateTime<Utc>,
    ) -> Result<TaskResult, RepositoryError> {
        let model = task_result::ActiveModel {
            id: NotSet,
            task_id: Set(task_id),
            execute_time: Set(execute_time.into()),
            fail_count: Set(0),
            pass_count: Set(0),
        };
        Ok(model.insert(self.db.as_ref()).await?.into())
    }

    async fn add_job_results(
        &self,
        task_result_id: i32,
        results: &[NewTaskJobResult],
    ) -> Result<(), RepositoryError> {
        if results.is_empty() {
            return Ok(());
        }
        let now = Utc::now();
        let models = results.iter().map(|r| task_job_result::ActiveModel {
            id: NotSet,
            task_result_id: Set(task_result_id),
            run_time: Set(now.into()),
            node: Set(r.node),
            server: Set(r.server.clone()),
            status_code: Set(r.status_code),
            status: Set(r.status.to_string()),
            result: Set(r.result.clone()),
        });
        task_job_result::Entity::insert_many(models)
            .exec(self.db.as_ref())
            .await?;
        Ok(())
    }

    async fn update_counts(
        &self,
        task_result_id: i32,
        pass_count: i32,
        fail_count: i32,
    ) -> Result<TaskResult, RepositoryError> {
        let existing = task_result::Entity::find_by_id(task_result_id)
            .one(self.db.as_ref())
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let mut active: task_result::ActiveModel = existing.into();
        active.pass_count = Set(pass_count);
        active.fail_count = Set(fail_count);
        Ok(active.update(self.db.as_ref()).await?.into())
    }

    async fn list_by_task(
        &self,
        task_id: i32,
        page: u64,
        per_page: u64,
    ) -> Result<Page<TaskResult>, RepositoryError> {
        let per_page = per_page.max(1);
        let page = page.max(1);
        let paginator = task_result::Entity::find()
            .filter(task_result::Column::TaskId.eq(task_id))
            .order_by_desc(task_result::Column::Id)
            .paginate(self.db.as_ref(), per_page);

        let total = paginator.num_items().await?;
        if Page::<()>::offset(page, per_page).is_none() {
            return Ok(Page::empty(total, page, per_page));
        }
        let models = paginator.fetch_page(page - 1).await?;

        Ok(Page {
            items: models.into_iter().map(Into::into).collect(),
            total,
            page,
            per_page,
        })
    }

    async fn find_detail(
        &self,
        task_result_id: i32,
    ) -> Result<Option<TaskResultDetail>, RepositoryError> {
        let found = task_result::Entity::find_by_id(task_result_id)
            .find_with_related(task_job_result::Entity)
            .all(self.db.as_ref())
            .await?;

        Ok(found.into_iter().next().map(|(result, mut jobs)| {
            jobs.sort_by_key(|j| (j.node, j.id));
            TaskResultDetail {
                result: result.into(),
                job_results: jobs.into_iter().map(Into::into).collect(),
            }
        }))
    }

    async fn delete(&self, task_result_id: i32) -> Result<(), RepositoryError> {
        let result = task_result::Entity::delete_by_id(task_result_id)
            .exec(self.db.as_ref())
            .await?;
        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
