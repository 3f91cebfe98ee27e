// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::super::helpers::{create_test_app, create_test_app_with_settings};
use axum::http::StatusCode;
use base64::{engine::general_purpose::STANDARD, Engine};
use scrapydash::VERSION;
use serde_json::Value;

#[tokio::test]
async fn test_health() {
    let app = create_test_app(vec!["127.0.0.1:6800".to_string()]).await;

    let response = app.server.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<Value>();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], VERSION);

    let response = app.server.get("/system/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<Value>();
    assert_eq!(body["database"], "ok");
    assert_eq!(body["scheduler"], "running");
}

/// 配置和元数据中的密码都被隐藏
#[tokio::test]
async fn test_config_and_metadata_are_masked() {
    let app = create_test_app_with_settings(
        vec!["admin:hunter2@127.0.0.1:6800#prod".to_string()],
        |settings| {
            settings.auth.username = "admin".to_string();
            settings.auth.password = "s3cret".to_string();
        },
    )
    .await;

    let response = app.server.get("/system/config").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let text = response.text();
    assert!(!text.contains("s3cret"));
    assert!(!text.contains("hunter2"));
    let config = response.json::<Value>()["config"].clone();
    assert_eq!(config["auth"]["password"], "********");
    assert_eq!(config["auth"]["username"], "admin");

    let response = app.server.get("/system/config?node=2").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let response = app.server.get("/system/settings").await;
    let categories = response.json::<Value>()["categories"].clone();
    assert_eq!(categories["auth"]["items"]["password"], "********");
    assert_eq!(categories["page"]["title"], "Page display");

    let response = app.server.get("/system/metadata").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["metadata"]["version"], VERSION);
}

#[tokio::test]
async fn test_system_info_and_server_status() {
    let app = create_test_app(vec![
        "127.0.0.1:6800".to_string(),
        "127.0.0.1:6801".to_string(),
    ])
    .await;

    let response = app.server.get("/system/system-info").await;
    let body = response.json::<Value>();
    assert_eq!(body["configuration"]["servers_amount"], 2);
    assert_eq!(body["configuration"]["auth_enabled"], false);
    assert!(body["process"]["main_pid"].is_u64());

    let response = app.server.get("/system/server-status").await;
    let body = response.json::<Value>();
    assert_eq!(body["node"], 2);
    assert_eq!(body["servers"][1], "127.0.0.1:6801");
}

/// 开启认证后，除健康检查外的端点都需要 Basic 认证
#[tokio::test]
async fn test_basic_auth_protects_routes() {
    let app = create_test_app_with_settings(vec!["127.0.0.1:6800".to_string()], |settings| {
        settings.auth.enabled = true;
        settings.auth.username = "admin".to_string();
        settings.auth.password = "s3cret".to_string();
    })
    .await;

    let response = app.server.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = app.server.get("/tasks").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["status"], "error");

    let response = app
        .server
        .get("/tasks")
        .add_header(
            "Authorization",
            format!("Basic {}", STANDARD.encode("admin:s3cret")),
        )
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_pageviews_are_counted() {
    let app = create_test_app(vec!["127.0.0.1:6800".to_string()]).await;
    let before = app.metadata.get_or_create(VERSION).await.unwrap().pageview;

    app.server.get("/tasks").await;
    app.server.get("/scheduler").await;
    app.server.get("/health").await;

    let after = app.metadata.get_or_create(VERSION).await.unwrap().pageview;
    assert_eq!(after - before, 2);
}

#[tokio::test]
async fn test_metrics_without_recorder() {
    let app = create_test_app(vec!["127.0.0.1:6800".to_string()]).await;
    let response = app.server.get("/metrics").await;
    assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
}
