// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum_test::TestServer;
use scrapydash::application::use_cases::deploy_use_case::DeployUseCase;
use scrapydash::application::use_cases::job_sync_use_case::JobSyncUseCase;
use scrapydash::application::use_cases::task_use_case::TaskUseCase;
use scrapydash::config::settings::Settings;
use scrapydash::domain::repositories::metadata_repository::MetadataRepository;
use scrapydash::infrastructure::repositories::job_repo_impl::JobRepositoryImpl;
use scrapydash::infrastructure::repositories::metadata_repo_impl::MetadataRepositoryImpl;
use scrapydash::infrastructure::repositories::task_repo_impl::TaskRepositoryImpl;
use scrapydash::infrastructure::repositories::task_result_repo_impl::TaskResultRepositoryImpl;
use scrapydash::presentation::routes::{app, AppComponents};
use scrapydash::queue::TaskScheduler;
use scrapydash::scrapyd::{NodeRegistry, ScrapydClient};
use scrapydash::workers::TaskExecutor;
use scrapydash::VERSION;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::sync::Arc;
use std::time::Duration;
use wiremock::MockServer;

#[allow(dead_code)]
pub struct TestApp {
    pub server: TestServer,
    pub db: Arc<DatabaseConnection>,
    pub tasks: Arc<TaskUseCase>,
    pub metadata: Arc<dyn MetadataRepository>,
}

/// 已迁移的内存 SQLite，单连接
pub async fn memory_db() -> Arc<DatabaseConnection> {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    Arc::new(db)
}

/// wiremock 服务器的 `host:port`
pub fn node_address(server: &MockServer) -> String {
    let address = server.address();
    format!("{}:{}", address.ip(), address.port())
}

pub async fn create_test_app(servers: Vec<String>) -> TestApp {
    create_test_app_with_settings(servers, |_| {}).await
}

/// 按给定节点创建完整应用，调度循环不启动
pub async fn create_test_app_with_settings(
    servers: Vec<String>,
    configure: impl FnOnce(&mut Settings),
) -> TestApp {
    let mut settings = Settings::defaults().unwrap();
    settings.scrapyd.servers = servers;
    configure(&mut settings);
    let settings = Arc::new(settings);

    let db = memory_db().await;
    let metadata: Arc<dyn MetadataRepository> = Arc::new(MetadataRepositoryImpl::new(db.clone()));
    metadata.get_or_create(VERSION).await.unwrap();

    let registry = Arc::new(NodeRegistry::from_servers(&settings.scrapyd.servers).unwrap());
    let client =
        Arc::new(ScrapydClient::new(Duration::from_secs(5), Duration::from_secs(2)).unwrap());

    let task_repo = Arc::new(TaskRepositoryImpl::new(db.clone()));
    let result_repo = Arc::new(TaskResultRepositoryImpl::new(db.clone()));
    let executor = Arc::new(TaskExecutor::new(
        task_repo.clone(),
        result_repo.clone(),
        registry.clone(),
        client.clone(),
    ));
    let scheduler = Arc::new(TaskScheduler::new(executor, Duration::from_millis(100)));
    let tasks = Arc::new(TaskUseCase::new(
        task_repo,
        result_repo,
        metadata.clone(),
        scheduler,
        VERSION,
    ));
    let jobs = Arc::new(JobSyncUseCase::new(
        Arc::new(JobRepositoryImpl::new(db.clone())),
        metadata.clone(),
        registry.clone(),
        client.clone(),
        VERSION,
    ));
    jobs.ensure_tables().await.unwrap();
    let deploy = Arc::new(DeployUseCase::new(registry.clone(), client.clone()));

    let router = app(AppComponents {
        settings,
        db: db.clone(),
        registry,
        client,
        metadata: metadata.clone(),
        tasks: tasks.clone(),
        jobs,
        deploy,
        metrics: None,
    });

    TestApp {
        server: TestServer::new(router).unwrap(),
        db,
        tasks,
        metadata,
    }
}
