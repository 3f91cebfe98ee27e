// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 定义领域层的数据持久化抽象，具体实现位于基础设施层
pub mod job_repository;
pub mod metadata_repository;
pub mod task_repository;
pub mod task_result_repository;

pub use job_repository::JobRepository;
pub use metadata_repository::MetadataRepository;
pub use task_repository::{Page, RepositoryError, TaskRepository};
pub use task_result_repository::TaskResultRepository;
