// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 调度模块
///
/// 进程内的定时任务调度：按触发器计算触发时间，到期后交给 [`runner::TaskRunner`] 执行
pub mod runner;
pub mod scheduler;

pub use runner::{ExecutionError, RunSummary, TaskRunner};
pub use scheduler::{ScheduledTaskInfo, SchedulerError, TaskScheduler, TickReport};
