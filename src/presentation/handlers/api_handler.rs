// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::presentation::errors::{scrapyd_status, AppError, StatusError};
use crate::scrapyd::{NodeRegistry, ScrapydClient, ScrapydError, ScrapydOperation};
use axum::{
    body::Bytes,
    extract::{Extension, Path, RawQuery},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::future::join_all;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// 路径中的节点序号，缺省为 1
pub(crate) fn node_from_path(params: &HashMap<String, String>) -> Result<usize, AppError> {
    match params.get("node") {
        None => Ok(1),
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|_| StatusError::not_found(format!("Node not found: {}", raw)).into()),
    }
}

/// 查询字符串与表单正文中的参数，保留重复键和原始顺序
fn request_params(
    method: &Method,
    headers: &HeaderMap,
    query: Option<&str>,
    body: &[u8],
) -> Result<Vec<(String, String)>, AppError> {
    let mut params: Vec<(String, String)> = match query {
        Some(query) => serde_urlencoded::from_str(query)
            .map_err(|e| StatusError::bad_request(format!("invalid query string: {}", e)))?,
        None => Vec::new(),
    };

    let is_form = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false);
    if *method == Method::POST && is_form && !body.is_empty() {
        let form: Vec<(String, String)> = serde_urlencoded::from_bytes(body)
            .map_err(|e| StatusError::bad_request(format!("invalid form body: {}", e)))?;
        params.extend(form);
    }
    Ok(params)
}

/// 上游调用失败时的响应，附带目标节点地址
fn upstream_failure(err: &ScrapydError, server: &str) -> Response {
    let message = match err {
        ScrapydError::Request(_) => err.to_string(),
        other => format!("Failed to connect to Scrapyd server: {}", other),
    };
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "status": "error",
            "message": message,
            "server": server,
        })),
    )
        .into_response()
}

/// Scrapyd 代理接口
///
/// 处理 `[/{node}]/api/{opt}[/{project}[/{version_spider_job}]]` 的 GET 与 POST，
/// 成功时原样返回 Scrapyd 的 JSON
pub async fn proxy(
    Extension(registry): Extension<Arc<NodeRegistry>>,
    Extension(client): Extension<Arc<ScrapydClient>>,
    Path(path): Path<HashMap<String, String>>,
    RawQuery(query): RawQuery,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let node = node_from_path(&path)?;
    let opt = path.get("opt").map(String::as_str).unwrap_or_default();
    let op: ScrapydOperation = opt.parse()?;
    if !op.is_proxyable() {
        return Err(StatusError::bad_request(format!(
            "{} is only available through the deploy endpoint",
            op
        ))
        .into());
    }

    let target = registry.get(node)?;
    let extra = request_params(&method, &headers, query.as_deref(), &body)?;
    let params = op.build_params(
        path.get("project").map(String::as_str),
        path.get("version_spider_job").map(String::as_str),
        &extra,
    )?;

    debug!("Proxying {} to node {} ({})", op, node, target.server());
    match client.call(target, op, &params).await {
        Ok(value) => Ok(Json(value).into_response()),
        Err(e) if scrapyd_status(&e).is_server_error() => {
            Ok(upstream_failure(&e, &target.base_url()))
        }
        Err(e) => Err(e.into()),
    }
}

/// 默认节点的状态
pub async fn status(
    Extension(registry): Extension<Arc<NodeRegistry>>,
    Extension(client): Extension<Arc<ScrapydClient>>,
) -> Result<Response, AppError> {
    status_of(&registry, &client, 1).await
}

/// 指定节点的状态
pub async fn node_status(
    Extension(registry): Extension<Arc<NodeRegistry>>,
    Extension(client): Extension<Arc<ScrapydClient>>,
    Path(path): Path<HashMap<String, String>>,
) -> Result<Response, AppError> {
    let node = node_from_path(&path)?;
    status_of(&registry, &client, node).await
}

/// 成功时返回 daemonstatus 的计数，节点不可达时返回 503
async fn status_of(
    registry: &NodeRegistry,
    client: &ScrapydClient,
    node: usize,
) -> Result<Response, AppError> {
    let target = registry.get(node)?;
    let server = target.base_url();

    let response = match client.daemon_status(target).await {
        Ok(daemon) => {
            let scrapyd_status = if daemon.status.is_empty() {
                "unknown".to_string()
            } else {
                daemon.status
            };
            Json(json!({
                "status": "ok",
                "node": node,
                "server": server,
                "scrapyd_status": scrapyd_status,
                "running_jobs": daemon.running,
                "pending_jobs": daemon.pending,
                "finished_jobs": daemon.finished,
            }))
            .into_response()
        }
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "error",
                "node": node,
                "server": server,
                "message": format!("Cannot connect to Scrapyd: {}", e),
            })),
        )
            .into_response(),
    };
    Ok(response)
}

/// 所有节点的状态，并发查询
pub async fn servers(
    Extension(registry): Extension<Arc<NodeRegistry>>,
    Extension(client): Extension<Arc<ScrapydClient>>,
) -> Json<Value> {
    let entries = join_all(registry.iter().map(|node| {
        let client = client.clone();
        async move {
            let mut entry = json!({
                "node": node.index,
                "server": node.server(),
                "group": node.group,
                "auth": node.has_auth(),
            });
            match client.daemon_status(node).await {
                Ok(daemon) => {
                    entry["status"] = json!("ok");
                    entry["node_name"] = json!(daemon.node_name);
                    entry["pending"] = json!(daemon.pending);
                    entry["running"] = json!(daemon.running);
                    entry["finished"] = json!(daemon.finished);
                }
                Err(e) => {
                    entry["status"] = json!("error");
                    entry["message"] = json!(e.to_string());
                }
            }
            entry
        }
    }))
    .await;

    Json(json!({
        "status": "ok",
        "servers": entries,
        "groups": registry.groups(),
    }))
}
