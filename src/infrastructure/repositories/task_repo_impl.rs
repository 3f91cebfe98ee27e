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

use crate::domain::models::task::{Task, TriggerFields};
use crate::domain::repositories::task_repository::{Page, RepositoryError, TaskRepository};
use crate::infrastructure::database::entities::task as task_entity;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    NotSet, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;

/// 任务仓库实现
///
/// 基于SeaORM实现的任务数据访问层
#[derive(Clone)]
pub struct TaskRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl TaskRepositoryImpl {
    /// 创建新的任务仓库实例
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    ///
    /// # 返回值
    ///
    /// 返回新的任务仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<task_entity::Model> for Task {
    fn from(model: task_entity::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            trigger: model.trigger.parse().unwrap_or_default(),
            create_time: model.create_time.with_timezone(&Utc),
            update_time: model.update_time.with_timezone(&Utc),
            project: model.project,
            version: model.version,
            spider: model.spider,
            jobid: model.jobid,
            settings_arguments: serde_json::from_str(&model.settings_arguments).unwrap_or_default(),
            selected_nodes: serde_json::from_str(&model.selected_nodes).unwrap_or_default(),
            fields: TriggerFields {
                year: model.year,
                month: model.month,
                day: model.day,
                week: model.week,
                day_of_week: model.day_of_week,
                hour: model.hour,
                minute: model.minute,
                second: model.second,
            },
            start_date: model.start_date,
            end_date: model.end_date,
            timezone: model.timezone,
            jitter: model.jitter.max(0) as u32,
            misfire_grace_time: model.misfire_grace_time.map(|v| v.max(0) as u32),
            coalesce: model.coalesce.eq_ignore_ascii_case("true"),
            max_instances: model.max_instances.max(1) as u32,
            paused: model.paused,
        }
    }
}

impl From<&Task> for task_entity::ActiveModel {
    fn from(task: &Task) -> Self {
        Self {
            id: if task.id > 0 { Set(task.id) } else { NotSet },
            name: Set(task.name.clone()),
            trigger: Set(task.trigger.to_string()),
            create_time: Set(task.create_time.into()),
            update_time: Set(task.update_time.into()),
            project: Set(task.project.clone()),
            version: Set(task.version.clone()),
            spider: Set(task.spider.clone()),
            jobid: Set(task.jobid.clone()),
            settings_arguments: Set(
                serde_json::to_string(&task.settings_arguments).unwrap_or_else(|_| "{}".to_string()),
            ),
            selected_nodes: Set(
                serde_json::to_string(&task.selected_nodes).unwrap_or_else(|_| "[]".to_string()),
            ),
            year: Set(task.fields.year.clone()),
            month: Set(task.fields.month.clone()),
            day: Set(task.fields.day.clone()),
            week: Set(task.fields.week.clone()),
            day_of_week: Set(task.fields.day_of_week.clone()),
            hour: Set(task.fields.hour.clone()),
            minute: Set(task.fields.minute.clone()),
            second: Set(task.fields.second.clone()),
            start_date: Set(task.start_date.clone()),
            end_date: Set(task.end_date.clone()),
            timezone: Set(task.timezone.clone()),
            jitter: Set(task.jitter as i32),
            misfire_grace_time: Set(task.misfire_grace_time.map(|v| v as i32)),
            coalesce: Set(if task.coalesce { "True" } else { "False" }.to_string()),
            max_instances: Set(task.max_instances.max(1) as i32),
            paused: Set(task.paused),
        }
    }
}

#[async_trait]
impl TaskRepository for TaskRepositoryImpl {
    async fn create(&self, task: &Task) -> Result<Task, RepositoryError> {
        let mut model: task_entity::ActiveModel = task.into();
        model.id = NotSet;

        let inserted = model.insert(self.db.as_ref()).await?;
        Ok(inserted.into())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Task>, RepositoryError> {
        let model = task_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;

        Ok(model.map(Into::into))
    }

    async fn list(&self, page: u64, per_page: u64) -> Result<Page<Task>, RepositoryError> {
        let per_page = per_page.max(1);
        let page = page.max(1);
        let paginator = task_entity::Entity::find()
            .order_by_desc(task_entity::Column::Id)
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

    async fn list_all(&self) -> Result<Vec<Task>, RepositoryError> {
        let models = task_entity::Entity::find()
            .order_by_asc(task_entity::Column::Id)
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn update(&self, task: &Task) -> Result<Task, RepositoryError> {
        if task.id <= 0 {
            return Err(RepositoryError::NotFound);
        }
        let mut model: task_entity::ActiveModel = task.into();
        model.create_time = NotSet;
        model.update_time = Set(Utc::now().into());

        match model.update(self.db.as_ref()).await {
            Ok(updated) => Ok(updated.into()),
            Err(DbErr::RecordNotUpdated) | Err(DbErr::RecordNotFound(_)) => {
                Err(RepositoryError::NotFound)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, id: i32) -> Result<(), RepositoryError> {
        let result = task_entity::Entity::delete_by_id(id)
            .exec(self.db.as_ref())
            .await?;
        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn set_paused(&self, id: i32, paused: bool) -> Result<(), RepositoryError> {
        let result = task_entity::Entity::update_many()
            .col_expr(task_entity::Column::Paused, Expr::value(paused))
            .filter(task_entity::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;
        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
