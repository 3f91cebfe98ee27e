// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

/// scrapydash 数据库迁移命令行
///
/// 服务启动时会自动迁移，这里用于手动执行 up/down/status，
/// 连接串取自 `DATABASE_URL`
#[async_std::main]
async fn main() {
    cli::run_cli(migration::Migrator).await;
}
