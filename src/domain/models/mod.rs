// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 元数据（metadata）：按版本存储的单例设置与计数器
/// - 定时任务（task）：周期性爬取调度定义及其触发器字段
/// - 任务结果（task_result）：每次任务执行记录及各节点的执行结果
/// - 作业（job）：镜像 Scrapyd 作业记录的按节点数据
pub mod job;
pub mod metadata;
pub mod task;
pub mod task_result;
