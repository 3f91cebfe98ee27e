// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::super::helpers::{create_test_app, node_address};
use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_jobs(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/listprojects.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "projects": ["demo"]
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/listjobs.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "pending": [],
            "running": [{"id": "r1", "spider": "quotes", "pid": 12,
                         "start_time": "2025-03-01 10:00:00.000001"}],
            "finished": [{"id": "f1", "spider": "quotes",
                          "start_time": "2025-03-01 08:00:00.000001",
                          "end_time": "2025-03-01 08:30:00.000001"}]
        })))
        .mount(server)
        .await;
}

/// 同步后列出作业，删除的作业不再出现
#[tokio::test]
async fn test_sync_list_and_delete_jobs() {
    let server = MockServer::start().await;
    mount_jobs(&server).await;
    let app = create_test_app(vec![node_address(&server)]).await;

    let response = app.server.post("/1/jobs/sync").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["report"]["jobs"], 2);

    let response = app.server.get("/1/jobs").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let page = response.json::<Value>();
    assert_eq!(page["node"], 1);
    assert_eq!(page["total"], 2);
    assert_eq!(page["items"][0]["job"], "r1");
    assert_eq!(page["items"][1]["runtime"], "0:30:00");

    let id = page["items"][0]["id"].as_i64().unwrap();
    let response = app.server.delete(&format!("/1/jobs/{}", id)).await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = app.server.get("/1/jobs").await;
    assert_eq!(response.json::<Value>()["total"], 1);

    let response = app.server.delete(&format!("/1/jobs/{}", id + 100)).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_jobs_of_unknown_node() {
    let app = create_test_app(vec!["127.0.0.1:6800".to_string()]).await;

    let response = app.server.get("/3/jobs").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let response = app.server.get("/abc/jobs").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deploy_upload_to_selected_nodes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/addversion.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "project": "demo",
            "spiders": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    let app = create_test_app(vec![node_address(&server)]).await;
    let form = MultipartForm::new()
        .add_text("project", "demo")
        .add_text("version", "r7")
        .add_text("selected_nodes", "1,2")
        .add_part(
            "egg",
            Part::bytes(b"fake egg".to_vec())
                .file_name("demo.egg")
                .mime_type("application/octet-stream"),
        );

    let response = app.server.post("/1/deploy/upload").multipart(form).await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let deploy = response.json::<Value>()["deploy"].clone();
    assert_eq!(deploy["version"], "r7");
    assert_eq!(deploy["results"][0]["status"], "ok");
    assert_eq!(deploy["results"][0]["response"]["spiders"], 2);
    assert_eq!(deploy["results"][1]["status"], "error");
    server.verify().await;
}

#[tokio::test]
async fn test_deploy_upload_requires_egg() {
    let app = create_test_app(vec!["127.0.0.1:6800".to_string()]).await;
    let form = MultipartForm::new().add_text("project", "demo");

    let response = app.server.post("/deploy/upload").multipart(form).await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}
