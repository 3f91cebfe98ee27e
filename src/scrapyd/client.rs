// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::{JobSnapshot, JobStatus};
use crate::domain::models::task_result::JobOutcomeStatus;
use crate::scrapyd::api::ScrapydOperation;
use crate::scrapyd::error::ScrapydError;
use crate::scrapyd::node::ScrapydNode;
use crate::utils::time_utils::parse_scrapyd_datetime;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Scrapyd daemonstatus.json 的返回
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DaemonStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub node_name: Option<String>,
    #[serde(default)]
    pub pending: u64,
    #[serde(default)]
    pub running: u64,
    #[serde(default)]
    pub finished: u64,
}

/// 一次调度请求在某个节点上的结果
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleOutcome {
    /// HTTP 状态码，请求异常时为 -1
    pub status_code: i32,
    pub status: JobOutcomeStatus,
    /// 成功时为作业ID，否则为错误信息
    pub result: String,
}

#[derive(Debug, Deserialize)]
struct ListProjectsResponse {
    #[serde(default)]
    projects: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ListJobsEntry {
    id: String,
    spider: String,
    #[serde(default)]
    pid: Option<i32>,
    #[serde(default)]
    start_time: Option<String>,
    #[serde(default)]
    end_time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListJobsResponse {
    #[serde(default)]
    pending: Vec<ListJobsEntry>,
    #[serde(default)]
    running: Vec<ListJobsEntry>,
    #[serde(default)]
    finished: Vec<ListJobsEntry>,
}

/// Scrapyd HTTP 客户端
///
/// 所有节点共用一个连接池，每次调用使用固定超时，不做重试
#[derive(Debug, Clone)]
pub struct ScrapydClient {
    http: reqwest::Client,
    timeout: Duration,
    status_timeout: Duration,
}

impl ScrapydClient {
    /// 创建客户端
    ///
    /// # 参数
    ///
    /// * `timeout` - 普通调用超时
    /// * `status_timeout` - daemonstatus 探测超时
    pub fn new(timeout: Duration, status_timeout: Duration) -> Result<Self, ScrapydError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("scrapydash/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            timeout,
            status_timeout,
        })
    }

    /// 调用一个 Scrapyd 接口并返回其 JSON
    ///
    /// 非 JSON 的响应体被包装为 `{"status":"ok","message":<text>}`
    pub async fn call(
        &self,
        node: &ScrapydNode,
        op: ScrapydOperation,
        params: &[(String, String)],
    ) -> Result<Value, ScrapydError> {
        let url = node.endpoint(op.name());
        let builder = if op.method() == Method::GET {
            self.http.get(&url).query(params)
        } else {
            self.http.post(&url).form(params)
        };
        self.send(node, op, builder, self.timeout).await
    }

    /// 查询节点状态，使用较短的超时
    pub async fn daemon_status(&self, node: &ScrapydNode) -> Result<DaemonStatus, ScrapydError> {
        let op = ScrapydOperation::DaemonStatus;
        let builder = self.http.get(node.endpoint(op.name()));
        let value = self.send(node, op, builder, self.status_timeout).await?;
        Ok(serde_json::from_value(value).unwrap_or_default())
    }

    /// 在节点上调度一个爬虫
    ///
    /// 错误不会向上传播，而是折叠进 [`ScheduleOutcome`]：
    /// Scrapyd 拒绝为 `error`，请求失败为 `exception`（状态码 -1）
    pub async fn schedule(&self, node: &ScrapydNode, params: &[(String, String)]) -> ScheduleOutcome {
        match self.call(node, ScrapydOperation::Schedule, params).await {
            Ok(value) => {
                let status = value.get("status").and_then(Value::as_str).unwrap_or("");
                if status == "ok" {
                    let jobid = value
                        .get("jobid")
                        .and_then(Value::as_str)
                        .or_else(|| value.get("message").and_then(Value::as_str))
                        .unwrap_or_default();
                    ScheduleOutcome {
                        status_code: 200,
                        status: JobOutcomeStatus::Ok,
                        result: jobid.to_string(),
                    }
                } else {
                    ScheduleOutcome {
                        status_code: 200,
                        status: JobOutcomeStatus::Error,
                        result: error_message(&value),
                    }
                }
            }
            Err(ScrapydError::Status { status, body }) => ScheduleOutcome {
                status_code: i32::from(status),
                status: JobOutcomeStatus::Error,
                result: serde_json::from_str::<Value>(&body)
                    .map(|v| error_message(&v))
                    .unwrap_or(body),
            },
            Err(e) => ScheduleOutcome {
                status_code: -1,
                status: JobOutcomeStatus::Exception,
                result: e.to_string(),
            },
        }
    }

    /// 上传 egg 包（addversion.json）
    pub async fn add_version(
        &self,
        node: &ScrapydNode,
        project: &str,
        version: &str,
        egg: Vec<u8>,
    ) -> Result<Value, ScrapydError> {
        let op = ScrapydOperation::AddVersion;
        let part = Part::bytes(egg).file_name(format!("{}.egg", project));
        let form = Form::new()
            .text("project", project.to_string())
            .text("version", version.to_string())
            .part("egg", part);
        let builder = self.http.post(node.endpoint(op.name())).multipart(form);
        self.send(node, op, builder, self.timeout).await
    }

    /// 节点上的项目列表
    pub async fn list_projects(&self, node: &ScrapydNode) -> Result<Vec<String>, ScrapydError> {
        let value = self.call(node, ScrapydOperation::ListProjects, &[]).await?;
        let response: ListProjectsResponse =
            serde_json::from_value(value).unwrap_or(ListProjectsResponse { projects: vec![] });
        Ok(response.projects)
    }

    /// 节点上某个项目的作业快照
    pub async fn list_jobs(
        &self,
        node: &ScrapydNode,
        project: &str,
    ) -> Result<Vec<JobSnapshot>, ScrapydError> {
        let params = vec![("project".to_string(), project.to_string())];
        let value = self.call(node, ScrapydOperation::ListJobs, &params).await?;
        let response: ListJobsResponse = match serde_json::from_value(value) {
            Ok(response) => response,
            Err(e) => {
                warn!("Unexpected listjobs payload from {}: {}", node.server(), e);
                return Ok(Vec::new());
            }
        };

        let to_snapshot = |entry: ListJobsEntry, status: JobStatus| JobSnapshot {
            project: project.to_string(),
            spider: entry.spider,
            job: entry.id,
            status,
            pid: entry.pid,
            start: entry.start_time.as_deref().and_then(parse_scrapyd_datetime),
            finish: entry.end_time.as_deref().and_then(parse_scrapyd_datetime),
        };

        let mut snapshots = Vec::new();
        snapshots.extend(response.pending.into_iter().map(|e| to_snapshot(e, JobStatus::Pending)));
        snapshots.extend(response.running.into_iter().map(|e| to_snapshot(e, JobStatus::Running)));
        snapshots.extend(response.finished.into_iter().map(|e| to_snapshot(e, JobStatus::Finished)));
        Ok(snapshots)
    }

    async fn send(
        &self,
        node: &ScrapydNode,
        op: ScrapydOperation,
        builder: RequestBuilder,
        timeout: Duration,
    ) -> Result<Value, ScrapydError> {
        let builder = match node.auth() {
            Some((username, password)) => builder.basic_auth(username, Some(password)),
            None => builder,
        };

        let started = Instant::now();
        let result = async {
            let response = builder.timeout(timeout).send().await?;
            let status = response.status();
            let body = response.text().await?;
            Ok::<_, ScrapydError>((status, body))
        }
        .await;

        metrics::histogram!("scrapyd_request_duration_seconds", "operation" => op.name())
            .record(started.elapsed().as_secs_f64());

        let (status, body) = match result {
            Ok(pair) => pair,
            Err(e) => {
                metrics::counter!("scrapyd_request_errors_total", "operation" => op.name())
                    .increment(1);
                warn!("{} on {} failed: {}", op, node.server(), e);
                return Err(e);
            }
        };

        debug!("{} on {} returned {}", op, node.server(), status);

        if !status.is_success() {
            metrics::counter!("scrapyd_request_errors_total", "operation" => op.name())
                .increment(1);
            return Err(ScrapydError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(normalize_body(&body))
    }
}

/// 把 Scrapyd 响应体规范化为 JSON
pub fn normalize_body(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|_| json!({"status": "ok", "message": body}))
}

fn error_message(value: &Value) -> String {
    value
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| value.to_string())
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
