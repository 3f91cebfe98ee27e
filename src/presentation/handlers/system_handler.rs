// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::use_cases::task_use_case::TaskUseCase;
use crate::config::settings::Settings;
use crate::domain::repositories::metadata_repository::MetadataRepository;
use crate::infrastructure::database::connection::redact_url;
use crate::presentation::errors::AppError;
use crate::scrapyd::NodeRegistry;
use crate::utils::time_utils::get_now_string;
use crate::VERSION;
use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    Json,
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{info, warn};

const MASK: &str = "********";
const SENSITIVE_KEYS: [&str; 4] = ["password", "token", "key", "secret"];

fn is_sensitive(key: &str) -> bool {
    let key = key.to_lowercase();
    SENSITIVE_KEYS.iter().any(|s| key.contains(s))
}

/// 递归隐藏敏感字段，空值保持原样
fn mask_sensitive(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, item) in map.iter_mut() {
                let filled = match item {
                    Value::Null => false,
                    Value::String(s) => !s.is_empty(),
                    _ => true,
                };
                if is_sensitive(key) && filled {
                    *item = json!(MASK);
                } else {
                    mask_sensitive(item);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(mask_sensitive),
        _ => {}
    }
}

/// 脱敏后的配置，节点地址中的密码和数据库密码都会被隐藏
fn masked_settings(settings: &Settings) -> Value {
    let mut value = json!(settings);
    mask_sensitive(&mut value);
    value["database"]["url"] = json!(redact_url(&settings.database.url));
    value["scrapyd"]["servers"] = json!(settings
        .scrapyd
        .servers
        .iter()
        .map(|s| redact_server(s))
        .collect::<Vec<_>>());
    value
}

fn redact_server(server: &str) -> String {
    match server.rfind('@') {
        Some(at) => {
            let (credentials, rest) = server.split_at(at);
            let start = credentials.find("://").map(|i| i + 3).unwrap_or(0);
            match credentials[start..].split_once(':') {
                Some((user, _)) => format!("{}{}:{}{}", &credentials[..start], user, MASK, rest),
                None => server.to_string(),
            }
        }
        None => server.to_string(),
    }
}

/// 存活检查，不需要认证
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "version": VERSION,
        "timestamp": get_now_string(true),
    }))
}

/// 带数据库和调度器状态的健康检查
///
/// 数据库不可用时返回 503
pub async fn system_health(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(tasks): Extension<Arc<TaskUseCase>>,
) -> (StatusCode, Json<Value>) {
    let (status, database) = match db.ping().await {
        Ok(()) => (StatusCode::OK, json!("ok")),
        Err(e) => {
            warn!("Database ping failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, json!(e.to_string()))
        }
    };

    let health = if status.is_success() { "healthy" } else { "unhealthy" };
    (
        status,
        Json(json!({
            "status": health,
            "version": VERSION,
            "timestamp": get_now_string(true),
            "database": database,
            "scheduler": tasks.scheduler().state(),
        })),
    )
}

pub async fn metadata(
    Extension(metadata): Extension<Arc<dyn MetadataRepository>>,
) -> Result<Json<Value>, AppError> {
    let mut value = json!(metadata.get_or_create(VERSION).await?);
    mask_sensitive(&mut value);
    Ok(Json(json!({ "status": "ok", "metadata": value })))
}

pub async fn system_info(
    Extension(settings): Extension<Arc<Settings>>,
    Extension(registry): Extension<Arc<NodeRegistry>>,
    Extension(tasks): Extension<Arc<TaskUseCase>>,
) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "system": {
            "os": std::env::consts::OS,
            "arch": std::env::consts::ARCH,
            "version": VERSION,
        },
        "configuration": {
            "scrapyd_servers": registry.iter().map(|n| n.server()).collect::<Vec<_>>(),
            "servers_amount": registry.len(),
            "auth_enabled": settings.auth.enabled,
            "debug_mode": settings.server.debug,
        },
        "process": {
            "main_pid": std::process::id(),
            "scheduler_state": tasks.scheduler().state(),
        },
    }))
}

#[derive(Debug, Deserialize)]
pub struct NodeQuery {
    pub node: Option<usize>,
}

/// 当前配置（脱敏）
///
/// 指定 `node` 时附带该节点的地址
pub async fn config(
    Extension(settings): Extension<Arc<Settings>>,
    Extension(registry): Extension<Arc<NodeRegistry>>,
    Query(query): Query<NodeQuery>,
) -> Result<Json<Value>, AppError> {
    let mut body = json!({ "status": "ok", "config": masked_settings(&settings) });
    if let Some(node) = query.node {
        let target = registry.get(node)?;
        body["node"] = json!(node);
        body["server"] = json!(target.server());
    }
    Ok(Json(body))
}

/// 按类别分组的设置项
pub async fn settings(Extension(settings): Extension<Arc<Settings>>) -> Json<Value> {
    let masked = masked_settings(&settings);
    let categories: Map<String, Value> = [
        ("server", "Server"),
        ("database", "Database"),
        ("scrapyd", "Scrapyd"),
        ("auth", "Authentication"),
        ("scheduler", "Scheduler"),
        ("page", "Page display"),
    ]
    .into_iter()
    .map(|(key, title)| {
        (
            key.to_string(),
            json!({ "title": title, "items": masked[key].clone() }),
        )
    })
    .collect();

    Json(json!({ "status": "ok", "categories": categories }))
}

pub async fn server_status(
    Extension(settings): Extension<Arc<Settings>>,
    Extension(registry): Extension<Arc<NodeRegistry>>,
) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "node": registry.len(),
        "servers": registry.iter().map(|n| n.server()).collect::<Vec<_>>(),
        "bind": settings.server.host,
        "port": settings.server.port,
        "auth_enabled": settings.auth.enabled,
    }))
}

/// 重新从数据库加载全部任务
pub async fn restart_scheduler(
    Extension(tasks): Extension<Arc<TaskUseCase>>,
) -> Result<Json<Value>, AppError> {
    let report = tasks.reload().await?;
    info!("Scheduler restarted with {} tasks", report.loaded);
    Ok(Json(json!({
        "status": "success",
        "message": format!("Scheduler restarted, {} tasks loaded", report.loaded),
        "report": report,
    })))
}
