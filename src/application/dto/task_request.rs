// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::task::{Task, TriggerFields, TriggerKind, LATEST_VERSION};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::{Validate, ValidationError};

fn default_true() -> bool {
    true
}

fn default_max_instances() -> u32 {
    1
}

fn validate_nodes(nodes: &[usize]) -> Result<(), ValidationError> {
    if nodes.contains(&0) {
        return Err(ValidationError::new("node_index_starts_at_one"));
    }
    // 执行记录以 i32 保存节点序号
    if nodes.iter().any(|node| i32::try_from(*node).is_err()) {
        return Err(ValidationError::new("node_index_out_of_range"));
    }
    Ok(())
}

/// 创建或更新任务的请求DTO
///
/// 触发器字段缺省时使用 `*`（minute 与 second 缺省为 `0`）
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct TaskRequestDto {
    #[validate(length(max = 255))]
    pub name: Option<String>,
    #[serde(default)]
    pub trigger: TriggerKind,
    #[validate(length(min = 1, max = 255))]
    pub project: String,
    /// 为空时使用最新版本
    pub version: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub spider: String,
    /// 为空时每次运行自动生成
    pub jobid: Option<String>,
    #[serde(default)]
    pub settings_arguments: BTreeMap<String, Vec<String>>,
    #[validate(length(min = 1), custom(function = "validate_nodes"))]
    pub selected_nodes: Vec<usize>,

    pub year: Option<String>,
    pub month: Option<String>,
    pub day: Option<String>,
    pub week: Option<String>,
    pub day_of_week: Option<String>,
    pub hour: Option<String>,
    pub minute: Option<String>,
    pub second: Option<String>,

    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub timezone: Option<String>,
    #[serde(default)]
    #[validate(range(max = 86400))]
    pub jitter: u32,
    pub misfire_grace_time: Option<u32>,
    #[serde(default = "default_true")]
    pub coalesce: bool,
    #[serde(default = "default_max_instances")]
    #[validate(range(min = 1, max = 1000))]
    pub max_instances: u32,
    /// 缺省时新建任务不暂停，更新任务沿用原状态
    pub paused: Option<bool>,
}

fn field_or(value: Option<String>, default: &str) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl TaskRequestDto {
    /// 转换为任务实体
    ///
    /// # 参数
    ///
    /// * `id` - 任务ID，新建时为 0
    /// * `create_time` - 创建时间，更新时沿用原值
    pub fn into_task(self, id: i32, create_time: DateTime<Utc>) -> Task {
        let defaults = TriggerFields::default();
        Task {
            id,
            name: non_empty(self.name),
            trigger: self.trigger,
            create_time,
            update_time: Utc::now(),
            project: self.project.trim().to_string(),
            version: field_or(self.version, LATEST_VERSION),
            spider: self.spider.trim().to_string(),
            jobid: self.jobid.map(|j| j.trim().to_string()).unwrap_or_default(),
            settings_arguments: self.settings_arguments,
            selected_nodes: self.selected_nodes,
            fields: TriggerFields {
                year: field_or(self.year, &defaults.year),
                month: field_or(self.month, &defaults.month),
                day: field_or(self.day, &defaults.day),
                week: field_or(self.week, &defaults.week),
                day_of_week: field_or(self.day_of_week, &defaults.day_of_week),
                hour: field_or(self.hour, &defaults.hour),
                minute: field_or(self.minute, &defaults.minute),
                second: field_or(self.second, &defaults.second),
            },
            start_date: non_empty(self.start_date),
            end_date: non_empty(self.end_date),
            timezone: non_empty(self.timezone),
            jitter: self.jitter,
            misfire_grace_time: self.misfire_grace_time,
            coalesce: self.coalesce,
            max_instances: self.max_instances,
            paused: self.paused.unwrap_or(false),
        }
    }
}

/// 分页查询参数
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, Validate)]
pub struct PageQuery {
    #[validate(range(min = 1))]
    pub page: Option<u64>,
    #[validate(range(min = 1, max = 1000))]
    pub per_page: Option<u64>,
}

impl PageQuery {
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }
}
