// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 数据库实体模块
///
/// 定义数据库表对应的实体结构，使用SeaORM框架进行对象关系映射。
/// 每个节点的作业表名称是动态的，不在这里定义，见 [`crate::infrastructure::database::job_table`]
pub mod metadata;
pub mod task;
pub mod task_job_result;
pub mod task_result;
