// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::use_cases::deploy_use_case::DeployUseCase;
use crate::application::use_cases::job_sync_use_case::JobSyncUseCase;
use crate::application::use_cases::task_use_case::TaskUseCase;
use crate::config::settings::Settings;
use crate::domain::repositories::metadata_repository::MetadataRepository;
use crate::presentation::handlers::{
    api_handler, deploy_handler, job_handler, metrics_handler, system_handler, task_handler,
};
use crate::presentation::middleware::auth_middleware::{auth_middleware, AuthState};
use crate::presentation::middleware::pageview_middleware::{pageview_middleware, PageviewState};
use crate::scrapyd::{NodeRegistry, ScrapydClient};
use crate::VERSION;
use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Extension, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// egg 包上传的大小上限
const MAX_EGG_BYTES: usize = 64 * 1024 * 1024;

/// 路由依赖的全部组件
#[derive(Clone)]
pub struct AppComponents {
    pub settings: Arc<Settings>,
    pub db: Arc<DatabaseConnection>,
    pub registry: Arc<NodeRegistry>,
    pub client: Arc<ScrapydClient>,
    pub metadata: Arc<dyn MetadataRepository>,
    pub tasks: Arc<TaskUseCase>,
    pub jobs: Arc<JobSyncUseCase>,
    pub deploy: Arc<DeployUseCase>,
    pub metrics: Option<PrometheusHandle>,
}

/// Scrapyd 代理路由，带节点和不带节点的两组路径
fn api_routes() -> Router {
    let mut router = Router::new()
        .route("/api/status", get(api_handler::status))
        .route("/{node}/api/status", get(api_handler::node_status))
        .route("/api/servers", get(api_handler::servers));

    for path in [
        "/api/{opt}",
        "/api/{opt}/{project}",
        "/api/{opt}/{project}/{version_spider_job}",
        "/{node}/api/{opt}",
        "/{node}/api/{opt}/{project}",
        "/{node}/api/{opt}/{project}/{version_spider_job}",
    ] {
        router = router.route(path, get(api_handler::proxy).post(api_handler::proxy));
    }
    router
}

fn task_routes() -> Router {
    Router::new()
        .route(
            "/tasks",
            get(task_handler::list_tasks).post(task_handler::create_task),
        )
        .route(
            "/tasks/{id}",
            get(task_handler::get_task)
                .put(task_handler::update_task)
                .delete(task_handler::delete_task),
        )
        .route("/tasks/{id}/pause", post(task_handler::pause_task))
        .route("/tasks/{id}/resume", post(task_handler::resume_task))
        .route("/tasks/{id}/fire", post(task_handler::fire_task))
        .route("/tasks/{id}/results", get(task_handler::list_results))
        .route(
            "/tasks/{id}/results/{result_id}",
            get(task_handler::get_result).delete(task_handler::delete_result),
        )
        .route("/scheduler", get(task_handler::scheduler_status))
        .route("/scheduler/pause", post(task_handler::pause_scheduler))
        .route("/scheduler/resume", post(task_handler::resume_scheduler))
}

fn job_routes() -> Router {
    Router::new()
        .route("/{node}/jobs", get(job_handler::list_jobs))
        .route("/{node}/jobs/sync", post(job_handler::sync_jobs))
        .route("/{node}/jobs/{id}", delete(job_handler::delete_job))
        .route("/deploy/upload", post(deploy_handler::upload))
        .route("/{node}/deploy/upload", post(deploy_handler::upload))
        .layer(DefaultBodyLimit::max(MAX_EGG_BYTES))
}

fn system_routes() -> Router {
    Router::new()
        .route("/health", get(system_handler::health))
        .route("/metrics", get(metrics_handler::metrics))
        .route("/system/health", get(system_handler::system_health))
        .route("/system/metadata", get(system_handler::metadata))
        .route("/system/system-info", get(system_handler::system_info))
        .route("/system/config", get(system_handler::config))
        .route("/system/settings", get(system_handler::settings))
        .route("/system/server-status", get(system_handler::server_status))
        .route(
            "/system/restart-scheduler",
            post(system_handler::restart_scheduler),
        )
}

/// 创建应用路由
///
/// # 参数
///
/// * `components` - 处理器需要的共享组件
///
/// # 返回值
///
/// 带认证、访问计数和请求追踪的完整路由
pub fn app(components: AppComponents) -> Router {
    let auth_state = AuthState {
        settings: Arc::new(components.settings.auth.clone()),
    };
    let pageview_state = PageviewState {
        metadata: components.metadata.clone(),
        version: VERSION.to_string(),
    };

    Router::new()
        .merge(system_routes())
        .merge(api_routes())
        .merge(task_routes())
        .merge(job_routes())
        .layer(axum::middleware::from_fn_with_state(
            pageview_state,
            pageview_middleware,
        ))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ))
        .layer(Extension(components.settings))
        .layer(Extension(components.db))
        .layer(Extension(components.registry))
        .layer(Extension(components.client))
        .layer(Extension(components.metadata))
        .layer(Extension(components.tasks))
        .layer(Extension(components.jobs))
        .layer(Extension(components.deploy))
        .layer(Extension(components.metrics))
        .layer(TraceLayer::new_for_http())
}
