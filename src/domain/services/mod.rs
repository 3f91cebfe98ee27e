// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// - 触发器（trigger）：把任务的 cron / interval / date 字段编译为可计算下一次触发时间的触发器
pub mod trigger;
