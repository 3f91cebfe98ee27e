// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::utils::time_utils::get_now_string;

/// 表示"使用最新版本"的版本占位值
pub const LATEST_VERSION: &str = "default: the latest version";

/// 定时任务实体
///
/// 描述一个周期性的爬取调度：在哪些节点上、以什么参数、按什么触发器运行哪个爬虫。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    /// 任务ID，创建前为 0
    pub id: i32,
    /// 任务名称
    pub name: Option<String>,
    /// 触发器类型
    pub trigger: TriggerKind,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
    pub project: String,
    /// 项目版本，空字符串或 [`LATEST_VERSION`] 表示最新版本
    pub version: String,
    pub spider: String,
    /// 作业ID，为空时每次运行自动生成
    pub jobid: String,
    /// 传给 Scrapyd 的设置和爬虫参数，每个键可以对应多个值
    pub settings_arguments: BTreeMap<String, Vec<String>>,
    /// 选中的节点（从 1 开始）
    pub selected_nodes: Vec<usize>,
    /// 触发器字段
    #[serde(flatten)]
    pub fields: TriggerFields,
    /// 开始时间 `YYYY-MM-DD HH:MM:SS`
    pub start_date: Option<String>,
    /// 结束时间 `YYYY-MM-DD HH:MM:SS`
    pub end_date: Option<String>,
    /// 时区：UTC、local 或 +HH:MM 形式的固定偏移
    pub timezone: Option<String>,
    /// 随机抖动秒数
    pub jitter: u32,
    /// 允许的最大延迟秒数，None 表示不限制
    pub misfire_grace_time: Option<u32>,
    /// 是否合并错过的多次触发
    pub coalesce: bool,
    /// 同一任务允许同时运行的最大实例数
    pub max_instances: u32,
    /// 任务是否被暂停
    pub paused: bool,
}

/// 触发器字段
///
/// cron 触发器按字段表达式解释；interval 触发器把 week/day/hour/minute/second 解释为整数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerFields {
    pub year: String,
    pub month: String,
    pub day: String,
    pub week: String,
    pub day_of_week: String,
    pub hour: String,
    pub minute: String,
    pub second: String,
}

impl Default for TriggerFields {
    fn default() -> Self {
        Self {
            year: "*".to_string(),
            month: "*".to_string(),
            day: "*".to_string(),
            week: "*".to_string(),
            day_of_week: "*".to_string(),
            hour: "*".to_string(),
            minute: "0".to_string(),
            second: "0".to_string(),
        }
    }
}

/// 触发器类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    #[default]
    Cron,
    Interval,
    Date,
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TriggerKind::Cron => write!(f, "cron"),
            TriggerKind::Interval => write!(f, "interval"),
            TriggerKind::Date => write!(f, "date"),
        }
    }
}

impl FromStr for TriggerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cron" => Ok(TriggerKind::Cron),
            "interval" => Ok(TriggerKind::Interval),
            "date" => Ok(TriggerKind::Date),
            other => Err(format!("unknown trigger: {}", other)),
        }
    }
}

impl Task {
    /// 是否使用项目的最新版本
    pub fn uses_latest_version(&self) -> bool {
        let version = self.version.trim();
        version.is_empty() || version == LATEST_VERSION
    }

    /// 本次运行使用的作业ID
    pub fn jobid_for_run(&self) -> String {
        if self.jobid.trim().is_empty() {
            format!("task_{}_{}", self.id, get_now_string(false))
        } else {
            self.jobid.clone()
        }
    }

    /// 构造 schedule.json 的表单参数
    ///
    /// 包含 project、spider、可选的 _version、jobid，以及所有设置和参数
    pub fn schedule_params(&self, jobid: &str) -> Vec<(String, String)> {
        let mut params = vec![
            ("project".to_string(), self.project.clone()),
            ("spider".to_string(), self.spider.clone()),
        ];
        if !self.uses_latest_version() {
            params.push(("_version".to_string(), self.version.clone()));
        }
        params.push(("jobid".to_string(), jobid.to_string()));
        for (key, values) in &self.settings_arguments {
            for value in values {
                params.push((key.clone(), value.clone()));
            }
        }
        params
    }

    /// 任务的可读标识
    pub fn label(&self) -> String {
        format!(
            "#{} ({}) {}/{}",
            self.id,
            self.name.as_deref().unwrap_or("-"),
            self.project,
            self.spider
        )
    }
}
