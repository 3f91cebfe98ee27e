// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::use_cases::deploy_use_case::{parse_nodes, DeployRequest, DeployUseCase};
use crate::presentation::errors::{AppError, StatusError};
use crate::presentation::handlers::api_handler::node_from_path;
use axum::{
    extract::{Extension, Multipart, Path},
    Json,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// 上传 egg 包
///
/// 表单字段：`project`、`version`（可选）、`egg`（文件）、
/// `selected_nodes`（可选，逗号分隔的节点序号）
///
/// # 返回值
///
/// 每个节点的 addversion 结果
pub async fn upload(
    Extension(use_case): Extension<Arc<DeployUseCase>>,
    Path(path): Path<HashMap<String, String>>,
    mut multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let node = node_from_path(&path)?;

    let mut project = String::new();
    let mut version = None;
    let mut egg = Vec::new();
    let mut selected_nodes = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| StatusError::bad_request(format!("invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "egg" | "file" => {
                egg = field
                    .bytes()
                    .await
                    .map_err(|e| StatusError::bad_request(format!("failed to read egg: {}", e)))?
                    .to_vec();
            }
            "project" | "version" | "selected_nodes" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| StatusError::bad_request(format!("invalid {}: {}", name, e)))?;
                match name.as_str() {
                    "project" => project = value,
                    "version" => version = Some(value),
                    _ => selected_nodes = parse_nodes(&value)?,
                }
            }
            _ => {}
        }
    }

    info!(
        "Deploy request for project {} ({} bytes) from node {}",
        project,
        egg.len(),
        node
    );
    let report = use_case
        .deploy(
            node,
            DeployRequest {
                project,
                version,
                egg,
                selected_nodes,
            },
        )
        .await?;

    Ok(Json(json!({ "status": "ok", "deploy": report })))
}
