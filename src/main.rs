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

use clap::Parser;
use scrapydash::application::use_cases::deploy_use_case::DeployUseCase;
use scrapydash::application::use_cases::job_sync_use_case::JobSyncUseCase;
use scrapydash::application::use_cases::task_use_case::TaskUseCase;
use scrapydash::config::settings::Settings;
use scrapydash::domain::repositories::metadata_repository::MetadataRepository;
use scrapydash::infrastructure::database::connection;
use scrapydash::infrastructure::metrics::init_metrics;
use scrapydash::infrastructure::repositories::job_repo_impl::JobRepositoryImpl;
use scrapydash::infrastructure::repositories::metadata_repo_impl::MetadataRepositoryImpl;
use scrapydash::infrastructure::repositories::task_repo_impl::TaskRepositoryImpl;
use scrapydash::infrastructure::repositories::task_result_repo_impl::TaskResultRepositoryImpl;
use scrapydash::presentation::routes::{self, AppComponents};
use scrapydash::queue::TaskScheduler;
use scrapydash::scrapyd::{NodeRegistry, ScrapydClient};
use scrapydash::utils::telemetry;
use scrapydash::workers::{JobPoller, TaskExecutor};
use scrapydash::VERSION;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

/// 命令行参数，优先于配置文件和环境变量
#[derive(Debug, Parser)]
#[command(name = "scrapydash", version, about)]
struct Cli {
    /// 监听地址
    #[arg(long)]
    host: Option<String>,
    /// 监听端口
    #[arg(long)]
    port: Option<u16>,
    /// 调试模式
    #[arg(long)]
    debug: bool,
}

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration
    let cli = Cli::parse();
    let mut settings = Settings::new()?;
    if let Some(host) = cli.host {
        settings.server.host = host;
    }
    if let Some(port) = cli.port {
        settings.server.port = port;
    }
    settings.server.debug |= cli.debug;
    let settings = Arc::new(settings);

    // 2. Initialize logging and metrics
    telemetry::init_telemetry(settings.server.debug);
    info!("Starting scrapydash {}...", VERSION);
    let metrics = init_metrics();

    // 3. Connect to database and run migrations
    let db = Arc::new(connection::connect_and_migrate(&settings.database).await?);
    info!("Database connection established");

    let metadata: Arc<dyn MetadataRepository> = Arc::new(MetadataRepositoryImpl::new(db.clone()));
    metadata.get_or_create(VERSION).await?;
    metadata.touch_check_update(VERSION).await?;
    metadata
        .set_main_pid(VERSION, std::process::id() as i32)
        .await?;
    metadata
        .update_page_sizes(
            VERSION,
            Some(settings.page.jobs_per_page as i32),
            Some(settings.page.tasks_per_page as i32),
        )
        .await?;

    // 4. Scrapyd nodes
    let registry = Arc::new(NodeRegistry::from_servers(&settings.scrapyd.servers)?);
    let client = Arc::new(ScrapydClient::new(
        Duration::from_secs(settings.scrapyd.timeout_secs),
        Duration::from_secs(settings.scrapyd.status_timeout_secs),
    )?);
    info!("{} Scrapyd servers configured", registry.len());

    // 5. Use cases
    let task_repo = Arc::new(TaskRepositoryImpl::new(db.clone()));
    let result_repo = Arc::new(TaskResultRepositoryImpl::new(db.clone()));
    let job_repo = Arc::new(JobRepositoryImpl::new(db.clone()));

    let jobs = Arc::new(JobSyncUseCase::new(
        job_repo,
        metadata.clone(),
        registry.clone(),
        client.clone(),
        VERSION,
    ));
    jobs.ensure_tables().await?;

    let executor = Arc::new(TaskExecutor::new(
        task_repo.clone(),
        result_repo.clone(),
        registry.clone(),
        client.clone(),
    ));
    let scheduler = Arc::new(TaskScheduler::new(
        executor,
        Duration::from_millis(settings.scheduler.tick_millis.max(10)),
    ));
    let tasks = Arc::new(TaskUseCase::new(
        task_repo,
        result_repo,
        metadata.clone(),
        scheduler.clone(),
        VERSION,
    ));
    let deploy = Arc::new(DeployUseCase::new(registry.clone(), client.clone()));

    // 6. Start background workers
    let report = tasks.reload().await?;
    if !report.failed.is_empty() {
        warn!("{} tasks could not be scheduled", report.failed.len());
    }
    let scheduler_handle = if settings.scheduler.enabled {
        Some(scheduler.start())
    } else {
        info!("Scheduler disabled by configuration");
        None
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let poller_handle = JobPoller::new(
        jobs.clone(),
        Duration::from_secs(settings.scrapyd.poll_interval_secs),
        shutdown_rx,
    )
    .start();

    // 7. Start HTTP server
    let app = routes::app(AppComponents {
        settings: settings.clone(),
        db,
        registry,
        client,
        metadata,
        tasks,
        jobs,
        deploy,
        metrics,
    });

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // 8. Stop background workers
    info!("Shutting down background workers");
    scheduler.shutdown();
    let _ = shutdown_tx.send(true);
    if let Some(handle) = scheduler_handle {
        let _ = handle.await;
    }
    if let Some(handle) = poller_handle {
        let _ = handle.await;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
