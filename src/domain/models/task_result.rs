// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 任务执行记录
///
/// 任务每触发一次生成一条，统计成功和失败的节点数
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskResult {
    pub id: i32,
    pub task_id: i32,
    pub execute_time: DateTime<Utc>,
    pub fail_count: i32,
    pub pass_count: i32,
}

/// 单个节点上的执行结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskJobResult {
    pub id: i32,
    pub task_result_id: i32,
    pub run_time: DateTime<Utc>,
    /// 节点序号（从 1 开始）
    pub node: i32,
    /// 节点地址 `host:port`
    pub server: String,
    /// HTTP 状态码，请求异常时为 -1
    pub status_code: i32,
    pub status: JobOutcomeStatus,
    /// 成功时为作业ID，否则为错误信息
    pub result: String,
}

/// 执行结果附带各节点明细
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResultDetail {
    #[serde(flatten)]
    pub result: TaskResult,
    pub job_results: Vec<TaskJobResult>,
}

/// 节点执行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobOutcomeStatus {
    /// Scrapyd 接受了调度请求
    Ok,
    /// Scrapyd 返回了错误
    Error,
    /// 请求本身失败（连接、超时等）
    Exception,
}

impl JobOutcomeStatus {
    pub fn is_pass(self) -> bool {
        matches!(self, JobOutcomeStatus::Ok)
    }
}

impl fmt::Display for JobOutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JobOutcomeStatus::Ok => write!(f, "ok"),
            JobOutcomeStatus::Error => write!(f, "error"),
            JobOutcomeStatus::Exception => write!(f, "exception"),
        }
    }
}

impl FromStr for JobOutcomeStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ok" => Ok(JobOutcomeStatus::Ok),
            "error" => Ok(JobOutcomeStatus::Error),
            "exception" => Ok(JobOutcomeStatus::Exception),
            _ => Err(()),
        }
    }
}

/// 待写入的节点执行结果
#[derive(Debug, Clone, PartialEq)]
pub struct NewTaskJobResult {
    pub node: i32,
    pub server: String,
    pub status_code: i32,
    pub status: JobOutcomeStatus,
    pub result: String,
}
