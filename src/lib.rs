// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 程序版本号，同时作为元数据行的键
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 应用程序模块
///
/// 任务、作业同步和部署用例
pub mod application;

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含核心业务实体、服务和仓库接口
pub mod domain;

/// 基础设施模块
///
/// 数据库连接、实体、仓库实现和指标
pub mod infrastructure;

/// 表示层模块
///
/// 处理HTTP请求和响应，包括路由、处理器和中间件
pub mod presentation;

/// 队列模块
///
/// 进程内的定时任务调度
pub mod queue;

/// Scrapyd 模块
///
/// 节点注册表和 Scrapyd JSON API 客户端
pub mod scrapyd;

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
pub mod utils;

/// 工作器模块
///
/// 任务执行和作业轮询等后台工作
pub mod workers;
