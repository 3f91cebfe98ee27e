// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::task::{Task, TriggerFields, TriggerKind};
use crate::utils::time_utils::parse_date_string;
use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDateTime, TimeZone, Utc};
use cron::Schedule;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// 触发器错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TriggerError {
    #[error("invalid cron expression '{expr}': {message}")]
    InvalidCron { expr: String, message: String },

    #[error("the week field is not supported, use day_of_week instead (got '{0}')")]
    UnsupportedWeek(String),

    #[error("invalid day_of_week: {0}")]
    InvalidDayOfWeek(String),

    #[error("invalid interval field {field}: '{value}'")]
    InvalidInterval { field: &'static str, value: String },

    #[error("interval must be greater than zero")]
    ZeroInterval,

    #[error("date trigger requires start_date")]
    MissingRunDate,

    #[error("invalid date '{0}', expected YYYY-MM-DD HH:MM:SS")]
    InvalidDate(String),

    #[error("invalid timezone '{0}'")]
    InvalidTimezone(String),

    #[error("end_date is earlier than start_date")]
    EmptyWindow,
}

/// 触发器使用的时区
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerTimezone {
    Utc,
    Local,
    Fixed(FixedOffset),
}

impl TriggerTimezone {
    /// 解析时区：空值为本地时区，`UTC`/`Z`，`local`，或 `+HH:MM` 固定偏移
    pub fn parse(value: Option<&str>) -> Result<Self, TriggerError> {
        let raw = match value.map(str::trim) {
            None | Some("") => return Ok(TriggerTimezone::Local),
            Some(raw) => raw,
        };
        match raw.to_ascii_lowercase().as_str() {
            "utc" | "z" | "etc/utc" | "gmt" => return Ok(TriggerTimezone::Utc),
            "local" => return Ok(TriggerTimezone::Local),
            _ => {}
        }

        let invalid = || TriggerError::InvalidTimezone(raw.to_string());
        let (sign, rest) = match raw.as_bytes().first() {
            Some(b'+') => (1, &raw[1..]),
            Some(b'-') => (-1, &raw[1..]),
            _ => return Err(invalid()),
        };
        let (hours, minutes) = rest.split_once(':').unwrap_or((rest, "0"));
        let hours: i32 = hours.parse().map_err(|_| invalid())?;
        let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
        if hours > 23 || minutes > 59 {
            return Err(invalid());
        }
        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
            .map(TriggerTimezone::Fixed)
            .ok_or_else(invalid)
    }

    /// 把该时区下的本地时间转换为 UTC
    pub fn to_utc(&self, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
        match self {
            TriggerTimezone::Utc => Some(Utc.from_utc_datetime(&naive)),
            TriggerTimezone::Local => Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|t| t.with_timezone(&Utc)),
            TriggerTimezone::Fixed(offset) => offset
                .from_local_datetime(&naive)
                .single()
                .map(|t| t.with_timezone(&Utc)),
        }
    }

    fn cron_after(&self, schedule: &Schedule, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            TriggerTimezone::Utc => schedule.after(&after).next(),
            TriggerTimezone::Local => schedule
                .after(&after.with_timezone(&Local))
                .next()
                .map(|t| t.with_timezone(&Utc)),
            TriggerTimezone::Fixed(offset) => schedule
                .after(&after.with_timezone(offset))
                .next()
                .map(|t| t.with_timezone(&Utc)),
        }
    }
}

#[derive(Debug, Clone)]
enum Rule {
    Cron { expr: String, schedule: Box<Schedule> },
    Interval { start: DateTime<Utc>, period: Duration },
    Date { run_at: DateTime<Utc> },
}

/// 编译后的触发器
///
/// 由任务的触发器字段、起止时间和时区生成，只负责计算下一次触发时间
#[derive(Debug, Clone)]
pub struct Trigger {
    rule: Rule,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    timezone: TriggerTimezone,
}

impl Trigger {
    /// 编译任务的触发器
    ///
    /// # 参数
    ///
    /// * `task` - 任务定义
    /// * `added_at` - 任务加入调度器的时间，interval 触发器未指定 start_date 时以此为基准
    ///
    /// # 返回值
    ///
    /// * `Ok(Trigger)` - 编译后的触发器
    /// * `Err(TriggerError)` - 字段不合法
    pub fn compile(task: &Task, added_at: DateTime<Utc>) -> Result<Self, TriggerError> {
        let timezone = TriggerTimezone::parse(task.timezone.as_deref())?;
        let start = parse_bound(task.start_date.as_deref(), timezone)?;
        let end = parse_bound(task.end_date.as_deref(), timezone)?;
        if let (Some(start), Some(end)) = (start, end) {
            if end < start {
                return Err(TriggerError::EmptyWindow);
            }
        }

        let rule = match task.trigger {
            TriggerKind::Cron => {
                let expr = cron_expression(&task.fields)?;
                let schedule = Schedule::from_str(&expr).map_err(|e| TriggerError::InvalidCron {
                    expr: expr.clone(),
                    message: e.to_string(),
                })?;
                Rule::Cron {
                    expr,
                    schedule: Box::new(schedule),
                }
            }
            TriggerKind::Interval => {
                let period = interval_period(&task.fields)?;
                let start = match start {
                    Some(start) => start,
                    None => added_at.checked_add_signed(period).ok_or_else(|| {
                        TriggerError::InvalidInterval {
                            field: "interval",
                            value: format!("{}s", period.num_seconds()),
                        }
                    })?,
                };
                Rule::Interval { start, period }
            }
            TriggerKind::Date => Rule::Date {
                run_at: start.ok_or(TriggerError::MissingRunDate)?,
            },
        };

        Ok(Self {
            rule,
            start,
            end,
            timezone,
        })
    }

    /// 严格晚于 `after` 的第一个触发时间，超出 end_date 或不再触发时返回 None
    pub fn next_fire_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let next = match &self.rule {
            Rule::Cron { schedule, .. } => {
                // cron 的 after 是开区间，向前挪一秒让 start_date 本身也能命中
                let from = match self.start.and_then(|s| s.checked_sub_signed(Duration::seconds(1))) {
                    Some(before_start) if before_start > after => before_start,
                    _ => after,
                };
                self.timezone.cron_after(schedule, from)?
            }
            Rule::Interval { start, period } => {
                if after < *start {
                    *start
                } else {
                    // 超出可表示的时间范围时不再触发
                    let elapsed = (after - *start).num_milliseconds();
                    let step = period.num_milliseconds();
                    let offset = (elapsed / step + 1).checked_mul(step)?;
                    start.checked_add_signed(Duration::try_milliseconds(offset)?)?
                }
            }
            Rule::Date { run_at } => {
                if *run_at > after {
                    *run_at
                } else {
                    return None;
                }
            }
        };

        match self.end {
            Some(end) if next > end => None,
            _ => Some(next),
        }
    }

    pub fn timezone(&self) -> TriggerTimezone {
        self.timezone
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.rule {
            Rule::Cron { expr, .. } => write!(f, "cron[{}]", expr),
            Rule::Interval { period, .. } => write!(f, "interval[{}s]", period.num_seconds()),
            Rule::Date { run_at } => write!(f, "date[{}]", run_at.format("%Y-%m-%d %H:%M:%S UTC")),
        }
    }
}

fn parse_bound(
    value: Option<&str>,
    timezone: TriggerTimezone,
) -> Result<Option<DateTime<Utc>>, TriggerError> {
    let value = match value.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(value) => value,
    };
    let naive = parse_date_string(value).ok_or_else(|| TriggerError::InvalidDate(value.to_string()))?;
    timezone
        .to_utc(naive)
        .map(Some)
        .ok_or_else(|| TriggerError::InvalidDate(value.to_string()))
}

fn field_or_any(value: &str) -> &str {
    let value = value.trim();
    if value.is_empty() {
        "*"
    } else {
        value
    }
}

/// 把任务的 cron 字段转换为 `sec min hour day month day_of_week year` 七段表达式
pub fn cron_expression(fields: &TriggerFields) -> Result<String, TriggerError> {
    let week = field_or_any(&fields.week);
    if week != "*" {
        return Err(TriggerError::UnsupportedWeek(week.to_string()));
    }

    Ok(format!(
        "{} {} {} {} {} {} {}",
        field_or_any(&fields.second),
        field_or_any(&fields.minute),
        field_or_any(&fields.hour),
        field_or_any(&fields.day),
        field_or_any(&fields.month),
        day_of_week_field(field_or_any(&fields.day_of_week))?,
        field_or_any(&fields.year),
    ))
}

/// 星期字段：0 表示周一，名称为 mon..sun，统一转换为 Mon..Sun
fn day_of_week_field(value: &str) -> Result<String, TriggerError> {
    let invalid = || TriggerError::InvalidDayOfWeek(value.to_string());

    let convert_endpoint = |token: &str| -> Result<String, TriggerError> {
        if token == "*" {
            return Ok(token.to_string());
        }
        if let Ok(n) = token.parse::<usize>() {
            return WEEKDAYS.get(n).map(|d| d.to_string()).ok_or_else(invalid);
        }
        let lower = token.to_ascii_lowercase();
        WEEKDAYS
            .iter()
            .find(|d| lower.starts_with(&d.to_ascii_lowercase()))
            .map(|d| d.to_string())
            .ok_or_else(invalid)
    };

    let mut parts = Vec::new();
    for part in value.split(',') {
        let (base, step) = match part.split_once('/') {
            Some((base, step)) => (base, Some(step)),
            None => (part, None),
        };
        let base = base
            .split('-')
            .map(|t| convert_endpoint(t.trim()))
            .collect::<Result<Vec<_>, _>>()?
            .join("-");
        parts.push(match step {
            Some(step) => format!("{}/{}", base, step.trim()),
            None => base,
        });
    }
    Ok(parts.join(","))
}

fn interval_period(fields: &TriggerFields) -> Result<Duration, TriggerError> {
    let amount = |field: &'static str, value: &str| -> Result<i64, TriggerError> {
        let value = value.trim();
        if value.is_empty() || value == "*" {
            return Ok(0);
        }
        value
            .parse::<i64>()
            .ok()
            .filter(|n| *n >= 0)
            .ok_or_else(|| TriggerError::InvalidInterval {
                field,
                value: value.to_string(),
            })
    };

    let units: [(&'static str, &str, i64); 5] = [
        ("week", &fields.week, 7 * 86_400),
        ("day", &fields.day, 86_400),
        ("hour", &fields.hour, 3_600),
        ("minute", &fields.minute, 60),
        ("second", &fields.second, 1),
    ];

    let mut seconds: i64 = 0;
    for (field, value, unit) in units {
        let overflow = || TriggerError::InvalidInterval {
            field,
            value: value.trim().to_string(),
        };
        seconds = amount(field, value)?
            .checked_mul(unit)
            .and_then(|s| seconds.checked_add(s))
            .ok_or_else(overflow)?;
    }

    if seconds <= 0 {
        return Err(TriggerError::ZeroInterval);
    }
    Duration::try_seconds(seconds).ok_or_else(|| TriggerError::InvalidInterval {
        field: "interval",
        value: format!("{}s", seconds),
    })
}

#[cfg(test)]
#[path = "trigger_test.rs"]
mod tests;
