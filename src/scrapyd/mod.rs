// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// Scrapyd 模块
///
/// 负责把一次逻辑请求路由到配置的某个 Scrapyd 节点：
/// 节点解析与编号（node）、接口与参数映射（api）、HTTP 调用（client）
pub mod api;
pub mod client;
pub mod error;
pub mod node;

pub use api::ScrapydOperation;
pub use client::ScrapydClient;
pub use error::ScrapydError;
pub use node::{NodeRegistry, ScrapydNode};
