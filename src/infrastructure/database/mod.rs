// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 数据库模块
///
/// 提供数据库连接、迁移和实体管理功能，
/// 以及按节点动态命名的作业表语句
pub mod connection;
pub mod entities;
pub mod job_table;

#[cfg(test)]
pub mod testing;
