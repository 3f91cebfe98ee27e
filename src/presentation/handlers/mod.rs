// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// HTTP请求处理器模块
///
/// 包含 Scrapyd 代理、任务、作业、部署和系统信息等端点的处理逻辑
pub mod api_handler;
pub mod deploy_handler;
pub mod job_handler;
pub mod metrics_handler;
pub mod system_handler;
pub mod task_handler;
