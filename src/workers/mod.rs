// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 提供后台运行的组件：执行定时任务的执行器和定期同步作业的轮询器
pub mod job_poller;
pub mod task_executor;

pub use job_poller::JobPoller;
pub use task_executor::TaskExecutor;
