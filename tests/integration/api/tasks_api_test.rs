// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::super::helpers::{create_test_app, node_address};
use axum::http::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn interval_task(nodes: Vec<usize>) -> Value {
    json!({
        "name": "hourly quotes",
        "trigger": "interval",
        "project": "demo",
        "spider": "quotes",
        "selected_nodes": nodes,
        "hour": "1",
        "settings_arguments": { "setting": ["CLOSESPIDER_TIMEOUT=60"] }
    })
}

/// 创建、查询、更新、删除任务的完整流程
#[tokio::test]
async fn test_task_crud_flow() {
    let app = create_test_app(vec!["127.0.0.1:6800".to_string()]).await;

    let response = app.server.post("/tasks").json(&interval_task(vec![1])).await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let task = response.json::<Value>()["task"].clone();
    let id = task["id"].as_i64().unwrap();
    assert_eq!(task["trigger"], "interval");
    assert!(task["next_run_time"].is_string());

    let response = app.server.get(&format!("/tasks/{}", id)).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["task"]["spider"], "quotes");

    let mut update = interval_task(vec![1]);
    update["spider"] = json!("news");
    let response = app.server.put(&format!("/tasks/{}", id)).json(&update).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["task"]["spider"], "news");

    let response = app.server.get("/tasks").await;
    let page = response.json::<Value>();
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["id"], id);

    let response = app.server.delete(&format!("/tasks/{}", id)).await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = app.server.get(&format!("/tasks/{}", id)).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_task_rejects_invalid_input() {
    let app = create_test_app(vec!["127.0.0.1:6800".to_string()]).await;

    let mut no_nodes = interval_task(vec![]);
    no_nodes["selected_nodes"] = json!([]);
    let response = app.server.post("/tasks").json(&no_nodes).await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let bad_cron = json!({
        "project": "demo",
        "spider": "quotes",
        "selected_nodes": [1],
        "minute": "not-a-minute"
    });
    let response = app.server.post("/tasks").json(&bad_cron).await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["status"], "error");
}

#[tokio::test]
async fn test_pause_and_resume_task() {
    let app = create_test_app(vec!["127.0.0.1:6800".to_string()]).await;
    let response = app.server.post("/tasks").json(&interval_task(vec![1])).await;
    let id = response.json::<Value>()["task"]["id"].as_i64().unwrap();

    let response = app.server.post(&format!("/tasks/{}/pause", id)).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let task = response.json::<Value>()["task"].clone();
    assert_eq!(task["paused"], true);
    assert!(task["next_run_time"].is_null());

    let response = app.server.post(&format!("/tasks/{}/resume", id)).await;
    let task = response.json::<Value>()["task"].clone();
    assert_eq!(task["paused"], false);
    assert!(task["next_run_time"].is_string());

    let response = app.server.post("/tasks/999/pause").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

/// 立即运行后生成执行记录，节点明细可查询和删除
#[tokio::test]
async fn test_fire_task_records_results() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/schedule.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "jobid": "job-1"
        })))
        .mount(&server)
        .await;

    let app = create_test_app(vec![node_address(&server)]).await;
    let response = app.server.post("/tasks").json(&interval_task(vec![1, 2])).await;
    let id = response.json::<Value>()["task"]["id"].as_i64().unwrap();

    let response = app.server.post(&format!("/tasks/{}/fire", id)).await;
    assert_eq!(response.status_code(), StatusCode::ACCEPTED);

    // the run happens in the background
    let mut results = Value::Null;
    for _ in 0..50 {
        let page = app
            .server
            .get(&format!("/tasks/{}/results", id))
            .await
            .json::<Value>();
        if page["total"] == 1 && page["items"][0]["pass_count"].as_i64().unwrap_or(0)
            + page["items"][0]["fail_count"].as_i64().unwrap_or(0)
            == 2
        {
            results = page;
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(results["items"][0]["pass_count"], 1);
    assert_eq!(results["items"][0]["fail_count"], 1);

    let result_id = results["items"][0]["id"].as_i64().unwrap();
    let response = app
        .server
        .get(&format!("/tasks/{}/results/{}", id, result_id))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let detail = response.json::<Value>()["result"].clone();
    let job_results = detail["job_results"].as_array().unwrap();
    assert_eq!(job_results.len(), 2);
    assert!(job_results
        .iter()
        .any(|r| r["status"] == "ok" && r["result"] == "job-1"));
    assert!(job_results
        .iter()
        .any(|r| r["node"] == 2 && r["status_code"] == 404));

    let response = app
        .server
        .delete(&format!("/tasks/{}/results/{}", id, result_id))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let response = app
        .server
        .get(&format!("/tasks/{}/results/{}", id, result_id))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_scheduler_pause_resume_and_restart() {
    let app = create_test_app(vec!["127.0.0.1:6800".to_string()]).await;
    app.server.post("/tasks").json(&interval_task(vec![1])).await;

    let response = app.server.post("/scheduler/pause").await;
    assert_eq!(response.json::<Value>()["state"], "paused");

    let response = app.server.get("/scheduler").await;
    let scheduler = response.json::<Value>()["scheduler"].clone();
    assert_eq!(scheduler["state"], "paused");
    assert_eq!(scheduler["tasks"].as_array().unwrap().len(), 1);

    // the persisted state survives a restart
    let response = app.server.post("/system/restart-scheduler").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<Value>();
    assert_eq!(body["status"], "success");
    assert_eq!(body["report"]["loaded"], 1);
    assert_eq!(body["report"]["state"], "paused");

    let response = app.server.post("/scheduler/resume").await;
    assert_eq!(response.json::<Value>()["state"], "running");
}
