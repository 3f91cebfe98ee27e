// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 作业记录
///
/// 镜像 Scrapyd 的作业簿记，每个节点一张表，(project, spider, job) 唯一
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Job {
    pub id: i32,
    pub project: String,
    pub spider: String,
    pub job: String,
    pub status: JobStatus,
    /// 软删除标记
    pub deleted: bool,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
    pub pages: Option<i32>,
    pub items: Option<i32>,
    pub pid: Option<i32>,
    pub start: Option<NaiveDateTime>,
    /// 运行时长 `H:MM:SS`
    pub runtime: Option<String>,
    pub finish: Option<NaiveDateTime>,
    pub href_log: Option<String>,
    pub href_items: Option<String>,
}

/// 作业状态，持久化为单字符：0 等待、1 运行、2 完成
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Finished,
}

impl JobStatus {
    pub fn code(self) -> &'static str {
        match self {
            JobStatus::Pending => "0",
            JobStatus::Running => "1",
            JobStatus::Finished => "2",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Finished => write!(f, "finished"),
        }
    }
}

impl FromStr for JobStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0" | "pending" => Ok(JobStatus::Pending),
            "1" | "running" => Ok(JobStatus::Running),
            "2" | "finished" => Ok(JobStatus::Finished),
            _ => Err(()),
        }
    }
}

/// 从 Scrapyd listjobs 得到的作业快照，用于写入作业表
#[derive(Debug, Clone, PartialEq)]
pub struct JobSnapshot {
    pub project: String,
    pub spider: String,
    pub job: String,
    pub status: JobStatus,
    pub pid: Option<i32>,
    pub start: Option<NaiveDateTime>,
    pub finish: Option<NaiveDateTime>,
}

impl JobSnapshot {
    /// 日志链接
    pub fn href_log(&self) -> String {
        format!("/logs/{}/{}/{}.log", self.project, self.spider, self.job)
    }

    /// 数据项链接
    pub fn href_items(&self) -> String {
        format!("/items/{}/{}/{}.jl", self.project, self.spider, self.job)
    }

    /// 运行时长，仅对已完成的作业有意义
    pub fn runtime(&self) -> Option<String> {
        match (self.start, self.finish) {
            (Some(start), Some(finish)) if finish >= start => {
                let secs = (finish - start).num_seconds();
                Some(format!(
                    "{}:{:02}:{:02}",
                    secs / 3600,
                    (secs % 3600) / 60,
                    secs % 60
                ))
            }
            _ => None,
        }
    }
}
