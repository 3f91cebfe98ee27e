// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::config::settings::AuthSettings;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

/// 不需要认证的路径
const PUBLIC_PATHS: [&str; 2] = ["/health", "/metrics"];

/// 认证状态
#[derive(Clone)]
pub struct AuthState {
    pub settings: Arc<AuthSettings>,
}

/// 解析 `Authorization: Basic ...` 中的用户名和密码
fn basic_credentials(value: &str) -> Option<(String, String)> {
    let encoded = value.strip_prefix("Basic ")?.trim();
    let decoded = STANDARD.decode(encoded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Basic realm=\"scrapydash\"")],
        Json(json!({ "status": "error", "message": "Authentication required" })),
    )
        .into_response()
}

/// 认证中间件
///
/// 启用认证时校验 HTTP Basic 用户名和密码
///
/// # 参数
///
/// * `state` - 认证状态
/// * `req` - HTTP请求
/// * `next` - 下一个中间件
///
/// # 返回值
///
/// 认证失败时返回带 `WWW-Authenticate` 头的 401
pub async fn auth_middleware(State(state): State<AuthState>, req: Request, next: Next) -> Response {
    if !state.settings.enabled {
        return next.run(req).await;
    }

    let path = req.uri().path();
    debug!("AuthMiddleware processing path: {}", path);
    if PUBLIC_PATHS.contains(&path) {
        return next.run(req).await;
    }

    let credentials = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(basic_credentials);

    match credentials {
        Some((username, password))
            if username == state.settings.username && password == state.settings.password =>
        {
            next.run(req).await
        }
        Some((username, _)) => {
            warn!("Rejected credentials for user {}", username);
            unauthorized()
        }
        None => unauthorized(),
    }
}

#[cfg(test)]
#[path = "auth_middleware_test.rs"]
mod tests;
