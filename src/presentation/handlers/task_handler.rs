// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::task_request::{PageQuery, TaskRequestDto};
use crate::application::use_cases::task_use_case::TaskUseCase;
use crate::domain::repositories::task_repository::Page;
use crate::presentation::errors::AppError;
use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// 分页响应
#[derive(Debug, Serialize)]
pub struct PageResponse<T: Serialize> {
    pub status: &'static str,
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
}

impl<T: Serialize> From<Page<T>> for PageResponse<T> {
    fn from(page: Page<T>) -> Self {
        let total_pages = page.total_pages();
        Self {
            status: "ok",
            items: page.items,
            total: page.total,
            page: page.page,
            per_page: page.per_page,
            total_pages,
        }
    }
}

pub async fn list_tasks(
    Extension(use_case): Extension<Arc<TaskUseCase>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Value>, AppError> {
    let page = use_case.list_tasks(query).await?;
    Ok(Json(json!(PageResponse::from(page))))
}

/// 创建任务
///
/// # 返回值
///
/// * `201` - 创建成功，返回任务和下一次运行时间
/// * `400` - 参数或触发器无效
pub async fn create_task(
    Extension(use_case): Extension<Arc<TaskUseCase>>,
    Json(payload): Json<TaskRequestDto>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let view = use_case.create_task(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "status": "ok", "task": view })),
    ))
}

pub async fn get_task(
    Extension(use_case): Extension<Arc<TaskUseCase>>,
    Path(id): Path<i32>,
) -> Result<Json<Value>, AppError> {
    let view = use_case.get_task(id).await?;
    Ok(Json(json!({ "status": "ok", "task": view })))
}

pub async fn update_task(
    Extension(use_case): Extension<Arc<TaskUseCase>>,
    Path(id): Path<i32>,
    Json(payload): Json<TaskRequestDto>,
) -> Result<Json<Value>, AppError> {
    let view = use_case.update_task(id, payload).await?;
    Ok(Json(json!({ "status": "ok", "task": view })))
}

pub async fn delete_task(
    Extension(use_case): Extension<Arc<TaskUseCase>>,
    Path(id): Path<i32>,
) -> Result<Json<Value>, AppError> {
    use_case.delete_task(id).await?;
    Ok(Json(json!({ "status": "ok", "task_id": id })))
}

pub async fn pause_task(
    Extension(use_case): Extension<Arc<TaskUseCase>>,
    Path(id): Path<i32>,
) -> Result<Json<Value>, AppError> {
    let view = use_case.pause_task(id).await?;
    Ok(Json(json!({ "status": "ok", "task": view })))
}

pub async fn resume_task(
    Extension(use_case): Extension<Arc<TaskUseCase>>,
    Path(id): Path<i32>,
) -> Result<Json<Value>, AppError> {
    let view = use_case.resume_task(id).await?;
    Ok(Json(json!({ "status": "ok", "task": view })))
}

/// 立即运行一次，运行在后台进行
pub async fn fire_task(
    Extension(use_case): Extension<Arc<TaskUseCase>>,
    Path(id): Path<i32>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    use_case.fire_task(id).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "status": "ok", "task_id": id, "message": "Task fired" })),
    ))
}

pub async fn list_results(
    Extension(use_case): Extension<Arc<TaskUseCase>>,
    Path(id): Path<i32>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Value>, AppError> {
    let page = use_case.list_results(id, query).await?;
    Ok(Json(json!(PageResponse::from(page))))
}

pub async fn get_result(
    Extension(use_case): Extension<Arc<TaskUseCase>>,
    Path((id, result_id)): Path<(i32, i32)>,
) -> Result<Json<Value>, AppError> {
    let detail = use_case.get_result(id, result_id).await?;
    Ok(Json(json!({ "status": "ok", "result": detail })))
}

pub async fn delete_result(
    Extension(use_case): Extension<Arc<TaskUseCase>>,
    Path((id, result_id)): Path<(i32, i32)>,
) -> Result<Json<Value>, AppError> {
    use_case.delete_result(id, result_id).await?;
    Ok(Json(json!({ "status": "ok", "task_id": id, "result_id": result_id })))
}

pub async fn scheduler_status(Extension(use_case): Extension<Arc<TaskUseCase>>) -> Json<Value> {
    Json(json!({ "status": "ok", "scheduler": use_case.scheduler_status() }))
}

pub async fn pause_scheduler(
    Extension(use_case): Extension<Arc<TaskUseCase>>,
) -> Result<Json<Value>, AppError> {
    let state = use_case.pause_scheduler().await?;
    Ok(Json(json!({ "status": "ok", "state": state })))
}

pub async fn resume_scheduler(
    Extension(use_case): Extension<Arc<TaskUseCase>>,
) -> Result<Json<Value>, AppError> {
    let state = use_case.resume_scheduler().await?;
    Ok(Json(json!({ "status": "ok", "state": state })))
}
