// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::super::helpers::{create_test_app, node_address};
use axum::http::StatusCode;
use serde_json::{json, Value};
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// 代理把路径参数映射为 Scrapyd 参数，并原样返回 JSON
#[tokio::test]
async fn test_proxy_listspiders_on_second_node() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/listspiders.json"))
        .and(query_param("project", "demo"))
        .and(query_param("_version", "r12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "spiders": ["quotes", "news"]
        })))
        .expect(1)
        .mount(&second)
        .await;

    let app = create_test_app(vec![node_address(&first), node_address(&second)]).await;
    let response = app.server.get("/2/api/listspiders/demo/r12").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<Value>();
    assert_eq!(body["spiders"], json!(["quotes", "news"]));
    second.verify().await;
}

#[tokio::test]
async fn test_proxy_without_node_uses_first_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/listprojects.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "projects": ["demo"]
        })))
        .mount(&server)
        .await;

    let app = create_test_app(vec![node_address(&server)]).await;
    let response = app.server.get("/api/listprojects").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["projects"][0], "demo");
}

/// schedule 使用 POST，表单字段与路径参数合并
#[tokio::test]
async fn test_proxy_schedule_merges_form_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/schedule.json"))
        .and(body_string_contains("project=demo"))
        .and(body_string_contains("spider=quotes"))
        .and(body_string_contains("setting=DOWNLOAD_DELAY%3D2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "jobid": "abc123"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let app = create_test_app(vec![node_address(&server)]).await;
    let response = app
        .server
        .post("/1/api/schedule/demo/quotes")
        .form(&[("setting", "DOWNLOAD_DELAY=2")])
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["jobid"], "abc123");
    server.verify().await;
}

#[tokio::test]
async fn test_proxy_node_out_of_range() {
    let app = create_test_app(vec!["127.0.0.1:6800".to_string()]).await;

    for uri in ["/2/api/listprojects", "/0/api/listprojects"] {
        let response = app.server.get(uri).await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
        let body = response.json::<Value>();
        assert_eq!(body["status"], "error");
        assert!(body["message"]
            .as_str()
            .unwrap()
            .contains("node index error"));
    }
}

#[tokio::test]
async fn test_proxy_rejects_unknown_operation_and_missing_parameter() {
    let app = create_test_app(vec!["127.0.0.1:6800".to_string()]).await;

    let response = app.server.get("/api/shutdown").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = app.server.post("/api/cancel/demo").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = app.server.post("/api/addversion/demo").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_proxy_unreachable_server() {
    let app = create_test_app(vec!["127.0.0.1:1".to_string()]).await;
    let response = app.server.get("/api/listprojects").await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.json::<Value>();
    assert_eq!(body["status"], "error");
    assert_eq!(body["server"], "http://127.0.0.1:1");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Failed to connect to Scrapyd server"));
}

#[tokio::test]
async fn test_status_reports_counts_and_unreachable_nodes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/daemonstatus.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "node_name": "worker-1",
            "pending": 1,
            "running": 2,
            "finished": 3
        })))
        .mount(&server)
        .await;

    let app = create_test_app(vec![node_address(&server), "127.0.0.1:1".to_string()]).await;

    let response = app.server.get("/api/status").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<Value>();
    assert_eq!(body["scrapyd_status"], "ok");
    assert_eq!(body["running_jobs"], 2);
    assert_eq!(body["finished_jobs"], 3);

    let response = app.server.get("/2/api/status").await;
    assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.json::<Value>()["node"], 2);

    let response = app.server.get("/api/servers").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let servers = response.json::<Value>()["servers"].clone();
    assert_eq!(servers[0]["status"], "ok");
    assert_eq!(servers[0]["node_name"], "worker-1");
    assert_eq!(servers[1]["status"], "error");
}
