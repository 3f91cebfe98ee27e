// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 包含任务管理、作业同步和部署用例，
/// 把领域仓库、调度器与 Scrapyd 客户端组合成完整的业务流程
pub mod dto;
pub mod use_cases;
