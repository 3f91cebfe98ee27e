// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::metadata_repository::MetadataRepository;
use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::warn;

const UNCOUNTED_PATHS: [&str; 2] = ["/health", "/metrics"];

#[derive(Clone)]
pub struct PageviewState {
    pub metadata: Arc<dyn MetadataRepository>,
    pub version: String,
}

/// 统计 GET 请求的页面访问数
///
/// 计数失败只记录日志，不影响请求
pub async fn pageview_middleware(
    State(state): State<PageviewState>,
    req: Request,
    next: Next,
) -> Response {
    if req.method() == Method::GET && !UNCOUNTED_PATHS.contains(&req.uri().path()) {
        metrics::counter!("http_pageviews_total").increment(1);
        if let Err(e) = state.metadata.increment_pageview(&state.version).await {
            warn!("Failed to record pageview: {}", e);
        }
    }
    next.run(req).await
}
