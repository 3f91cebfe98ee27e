// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{Local, NaiveDateTime};

/// 任务日期字段的格式
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 当前本地时间字符串
///
/// `allow_space` 为 true 时返回 `2025-03-01 10:00:00`，否则返回可用于作业ID和
/// 版本号的 `2025-03-01T10_00_00`
pub fn get_now_string(allow_space: bool) -> String {
    let now = Local::now();
    if allow_space {
        now.format(DATE_FORMAT).to_string()
    } else {
        now.format("%Y-%m-%dT%H_%M_%S").to_string()
    }
}

/// 解析 `YYYY-MM-DD HH:MM:SS` 形式的日期
pub fn parse_date_string(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

/// 解析 Scrapyd 返回的时间，例如 `2025-03-01 10:00:00.123456`
pub fn parse_scrapyd_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, DATE_FORMAT))
        .ok()
}
