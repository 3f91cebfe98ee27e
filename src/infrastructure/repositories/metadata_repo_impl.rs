// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::metadata::{Metadata, SchedulerState};
use crate::domain::repositories::metadata_repository::MetadataRepository;
use crate::domain::repositories::task_repository::RepositoryError;
use crate::infrastructure::database::entities::metadata as metadata_entity;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    sea_query::{Expr, OnConflict},
    ColumnTrait, DatabaseConnection, EntityTrait, NotSet, QueryFilter, Set,
};
use std::sync::Arc;

/// 元数据仓库实现
#[derive(Clone)]
pub struct MetadataRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl MetadataRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn find(&self, version: &str) -> Result<Option<Metadata>, RepositoryError> {
        let model = metadata_entity::Entity::find()
            .filter(metadata_entity::Column::Version.eq(version))
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn update_column(
        &self,
        version: &str,
        column: metadata_entity::Column,
        value: sea_orm::sea_query::SimpleExpr,
    ) -> Result<(), RepositoryError> {
        self.get_or_create(version).await?;
        metadata_entity::Entity::update_many()
            .col_expr(column, value)
            .filter(metadata_entity::Column::Version.eq(version))
            .exec(self.db.as_ref())
            .await?;
        Ok(())
    }
}

impl From<metadata_entity::Model> for Metadata {
    fn from(model: metadata_entity::Model) -> Self {
        Self {
            id: model.id,
            version: model.version,
            last_check_update_timestamp: model.last_check_update_timestamp,
            main_pid: model.main_pid,
            pageview: model.pageview,
            url_scrapydash: model.url_scrapydash,
            username: model.username,
            password: model.password,
            scheduler_state: SchedulerState::from_i32(model.scheduler_state),
            jobs_per_page: model.jobs_per_page,
            tasks_per_page: model.tasks_per_page,
            jobs_style: model.jobs_style,
        }
    }
}

fn unix_now() -> f64 {
    Utc::now().timestamp_millis() as f64 / 1000.0
}

#[async_trait]
impl MetadataRepository for MetadataRepositoryImpl {
    async fn get_or_create(&self, version: &str) -> Result<Metadata, RepositoryError> {
        if let Some(metadata) = self.find(version).await? {
            return Ok(metadata);
        }

        let model = metadata_entity::ActiveModel {
            id: NotSet,
            version: Set(version.to_string()),
            last_check_update_timestamp: Set(unix_now()),
            main_pid: Set(None),
            pageview: Set(0),
            url_scrapydash: Set("http://127.0.0.1:5000".to_string()),
            username: Set(None),
            password: Set(None),
            scheduler_state: Set(SchedulerState::Running.as_i32()),
            jobs_per_page: Set(100),
            tasks_per_page: Set(100),
            jobs_style: Set("database".to_string()),
        };

        // concurrent first requests may race on the unique version
        metadata_entity::Entity::insert(model)
            .on_conflict(
                OnConflict::column(metadata_entity::Column::Version)
                    .do_nothing()
                    .to_owned(),
            )
            .do_nothing()
            .exec(self.db.as_ref())
            .await?;

        self.find(version).await?.ok_or(RepositoryError::NotFound)
    }

    async fn increment_pageview(&self, version: &str) -> Result<i32, RepositoryError> {
        self.update_column(
            version,
            metadata_entity::Column::Pageview,
            Expr::col(metadata_entity::Column::Pageview).add(1),
        )
        .await?;
        Ok(self
            .find(version)
            .await?
            .map(|m| m.pageview)
            .unwrap_or_default())
    }

    async fn set_scheduler_state(
        &self,
        version: &str,
        state: SchedulerState,
    ) -> Result<(), RepositoryError> {
        self.update_column(
            version,
            metadata_entity::Column::SchedulerState,
            Expr::value(state.as_i32()),
        )
        .await
    }

    async fn set_main_pid(&self, version: &str, pid: i32) -> Result<(), RepositoryError> {
        self.update_column(version, metadata_entity::Column::MainPid, Expr::value(pid))
            .await
    }

    async fn update_page_sizes(
        &self,
        version: &str,
        jobs_per_page: Option<i32>,
        tasks_per_page: Option<i32>,
    ) -> Result<Metadata, RepositoryError> {
        if let Some(jobs) = jobs_per_page.filter(|n| *n > 0) {
            self.update_column(version, metadata_entity::Column::JobsPerPage, Expr::value(jobs))
                .await?;
        }
        if let Some(tasks) = tasks_per_page.filter(|n| *n > 0) {
            self.update_column(
                version,
                metadata_entity::Column::TasksPerPage,
                Expr::value(tasks),
            )
            .await?;
        }
        self.get_or_create(version).await
    }

    async fn touch_check_update(&self, version: &str) -> Result<(), RepositoryError> {
        self.update_column(
            version,
            metadata_entity::Column::LastCheckUpdateTimestamp,
            Expr::value(unix_now()),
        )
        .await
    }
}
