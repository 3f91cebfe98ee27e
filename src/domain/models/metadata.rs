// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 元数据实体
///
/// 每个程序版本对应一行，保存仪表盘级别的设置和计数器
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Metadata {
    pub id: i32,
    /// 程序版本号，唯一
    pub version: String,
    /// 上次检查更新的时间戳（Unix 秒）
    pub last_check_update_timestamp: f64,
    /// 主进程 PID
    pub main_pid: Option<i32>,
    /// 页面访问计数
    pub pageview: i32,
    pub url_scrapydash: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// 调度器状态
    pub scheduler_state: SchedulerState,
    pub jobs_per_page: i32,
    pub tasks_per_page: i32,
    /// 作业页面风格：database 或 classic
    pub jobs_style: String,
}

/// 调度器状态
///
/// 数值与持久化的整数一致：0 停止、1 运行、2 暂停
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerState {
    Stopped,
    #[default]
    Running,
    Paused,
}

impl SchedulerState {
    pub fn as_i32(self) -> i32 {
        match self {
            SchedulerState::Stopped => 0,
            SchedulerState::Running => 1,
            SchedulerState::Paused => 2,
        }
    }

    pub fn from_i32(value: i32) -> Self {
        match value {
            0 => SchedulerState::Stopped,
            2 => SchedulerState::Paused,
            _ => SchedulerState::Running,
        }
    }
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SchedulerState::Stopped => write!(f, "stopped"),
            SchedulerState::Running => write!(f, "running"),
            SchedulerState::Paused => write!(f, "paused"),
        }
    }
}
