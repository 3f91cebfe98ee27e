// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 初始化日志
///
/// `RUST_LOG` 优先；否则默认 `info,scrapydash=debug`，调试模式下全局 debug
pub fn init_telemetry(debug: bool) {
    let default_filter = if debug {
        "debug,sea_orm=info,sqlx=warn"
    } else {
        "info,scrapydash=debug,sqlx=warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
