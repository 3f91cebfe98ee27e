// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 该模块包含系统的技术实现细节，负责与外部系统的交互。
///
/// 包含的子模块：
/// - 数据库（database）：连接、迁移、实体映射和按节点命名的作业表
/// - 指标（metrics）：Prometheus 记录器
/// - 仓库实现（repositories）：提供领域仓库接口的具体实现
///
/// 基础设施层依赖于领域层的抽象接口，
/// 领域层不依赖具体的技术实现。
pub mod database;
pub mod metrics;
pub mod repositories;
