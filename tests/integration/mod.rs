// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 集成测试
///
/// 使用内存 SQLite 和 wiremock 模拟的 Scrapyd 节点，通过完整路由验证各个端点
mod api;
mod helpers;
mod repositories;
