// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::{Job, JobSnapshot, JobStatus};
use crate::domain::repositories::job_repository::JobRepository;
use crate::domain::repositories::task_repository::{Page, RepositoryError};
use crate::infrastructure::database::job_table::{self, CountRow, JobRow};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ConnectionTrait, DatabaseConnection, FromQueryResult};
use std::sync::Arc;
use tracing::debug;

/// 单条 INSERT 中的最大行数，避免超过 SQLite 的绑定参数上限
const UPSERT_CHUNK: usize = 50;

/// 作业仓库实现
#[derive(Clone)]
pub struct JobRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl JobRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl TryFrom<JobRow> for Job {
    type Error = RepositoryError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let status: JobStatus = row
            .status
            .parse()
            .map_err(|_| RepositoryError::Corrupted(format!("job status '{}'", row.status)))?;
        Ok(Self {
            id: row.id,
            project: row.project,
            spider: row.spider,
            job: row.job,
            status,
            deleted: row.deleted == "1",
            create_time: row.create_time,
            update_time: row.update_time,
            pages: row.pages,
            items: row.items,
            pid: row.pid,
            start: row.start,
            runtime: row.runtime,
            finish: row.finish,
            href_log: row.href_log,
            href_items: row.href_items,
        })
    }
}

#[async_trait]
impl JobRepository for JobRepositoryImpl {
    async fn ensure_table(&self, table: &str) -> Result<(), RepositoryError> {
        let backend = self.db.get_database_backend();
        self.db
            .execute(backend.build(&job_table::create_table(table)))
            .await?;
        for index in job_table::create_indexes(table) {
            self.db.execute(backend.build(&index)).await?;
        }
        debug!("Job table {} is ready", table);
        Ok(())
    }

    async fn upsert(&self, table: &str, snapshots: &[JobSnapshot]) -> Result<u64, RepositoryError> {
        let backend = self.db.get_database_backend();
        let now = Utc::now();
        let mut written = 0;
        let snapshots = job_table::latest_per_key(snapshots);
        for chunk in snapshots.chunks(UPSERT_CHUNK) {
            let statement = job_table::upsert(table, chunk, now)?;
            let result = self.db.execute(backend.build(&statement)).await?;
            written += result.rows_affected();
        }
        Ok(written)
    }

    async fn list(&self, table: &str, page: u64, per_page: u64) -> Result<Page<Job>, RepositoryError> {
        let backend = self.db.get_database_backend();
        let per_page = per_page.max(1);
        let page = page.max(1);

        let total = CountRow::find_by_statement(backend.build(&job_table::count_visible(table)))
            .one(self.db.as_ref())
            .await?
            .map(|row| row.count.max(0) as u64)
            .unwrap_or_default();

        let offset = match Page::<Job>::offset(page, per_page) {
            Some(offset) => offset,
            None => return Ok(Page::empty(total, page, per_page)),
        };
        let rows = JobRow::find_by_statement(backend.build(&job_table::select_page(
            table, per_page, offset,
        )))
        .all(self.db.as_ref())
        .await?;

        let items = rows
            .into_iter()
            .map(Job::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            items,
            total,
            page,
            per_page,
        })
    }

    async fn soft_delete(&self, table: &str, id: i32) -> Result<(), RepositoryError> {
        let backend = self.db.get_database_backend();
        let result = self
            .db
            .execute(backend.build(&job_table::soft_delete(table, id, Utc::now())))
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
