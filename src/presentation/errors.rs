// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::application::use_cases::deploy_use_case::DeployError;
use crate::application::use_cases::job_sync_use_case::JobSyncError;
use crate::application::use_cases::task_use_case::TaskUseCaseError;
use crate::domain::repositories::task_repository::RepositoryError;
use crate::scrapyd::ScrapydError;

/// 带明确状态码的错误
#[derive(Error, Debug)]
#[error("{message}")]
pub struct StatusError {
    pub status: StatusCode,
    pub message: String,
}

impl StatusError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

/// 应用错误类型
///
/// 封装所有可能的应用层错误，渲染为 `{"status":"error","message":...}`
#[derive(Debug)]
pub struct AppError(anyhow::Error);

fn repository_status(err: &RepositoryError) -> StatusCode {
    match err {
        RepositoryError::NotFound => StatusCode::NOT_FOUND,
        RepositoryError::Database(_) | RepositoryError::Corrupted(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Scrapyd 错误对应的状态码
pub fn scrapyd_status(err: &ScrapydError) -> StatusCode {
    match err {
        ScrapydError::NodeOutOfRange { .. } => StatusCode::NOT_FOUND,
        ScrapydError::InvalidServer(_)
        | ScrapydError::UnsupportedOperation(_)
        | ScrapydError::MissingParameter(_) => StatusCode::BAD_REQUEST,
        ScrapydError::Request(_) | ScrapydError::Status { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        if let Some(e) = self.0.downcast_ref::<StatusError>() {
            return e.status;
        }
        if let Some(e) = self.0.downcast_ref::<TaskUseCaseError>() {
            return match e {
                TaskUseCaseError::ValidationError(_) | TaskUseCaseError::Trigger(_) => {
                    StatusCode::BAD_REQUEST
                }
                TaskUseCaseError::TaskNotFound(_) | TaskUseCaseError::ResultNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                TaskUseCaseError::Repository(e) => repository_status(e),
            };
        }
        if let Some(e) = self.0.downcast_ref::<JobSyncError>() {
            return match e {
                JobSyncError::Scrapyd(e) => scrapyd_status(e),
                JobSyncError::Repository(e) => repository_status(e),
                JobSyncError::ValidationError(_) => StatusCode::BAD_REQUEST,
                JobSyncError::JobNotFound(_) => StatusCode::NOT_FOUND,
            };
        }
        if self.0.downcast_ref::<DeployError>().is_some() {
            return StatusCode::BAD_REQUEST;
        }
        if let Some(e) = self.0.downcast_ref::<ScrapydError>() {
            return scrapyd_status(e);
        }
        if let Some(e) = self.0.downcast_ref::<RepositoryError>() {
            return repository_status(e);
        }
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {:#}", self.0);
        }

        let body = Json(json!({ "status": "error", "message": self.0.to_string() }));
        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
