// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::task_request::PageQuery;
use crate::application::use_cases::job_sync_use_case::JobSyncUseCase;
use crate::presentation::errors::{AppError, StatusError};
use crate::presentation::handlers::task_handler::PageResponse;
use axum::{
    extract::{Extension, Path, Query},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

fn parse_node(raw: &str) -> Result<usize, AppError> {
    raw.parse::<usize>()
        .map_err(|_| StatusError::not_found(format!("Node not found: {}", raw)).into())
}

/// 节点作业列表，数据来自最近一次同步
pub async fn list_jobs(
    Extension(use_case): Extension<Arc<JobSyncUseCase>>,
    Path(node): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Value>, AppError> {
    let node = parse_node(&node)?;
    let page = use_case.list_jobs(node, query).await?;
    let mut body = json!(PageResponse::from(page));
    body["node"] = json!(node);
    Ok(Json(body))
}

/// 立即同步一个节点
pub async fn sync_jobs(
    Extension(use_case): Extension<Arc<JobSyncUseCase>>,
    Path(node): Path<String>,
) -> Result<Json<Value>, AppError> {
    let report = use_case.sync_node(parse_node(&node)?).await?;
    Ok(Json(json!({ "status": "ok", "report": report })))
}

pub async fn delete_job(
    Extension(use_case): Extension<Arc<JobSyncUseCase>>,
    Path((node, id)): Path<(String, i32)>,
) -> Result<Json<Value>, AppError> {
    let node = parse_node(&node)?;
    use_case.delete_job(node, id).await?;
    Ok(Json(json!({ "status": "ok", "node": node, "job_id": id })))
}
