// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing::{info, warn};

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// 初始化指标系统
///
/// 安装 Prometheus 记录器并注册指标说明。重复调用返回同一个句柄；
/// 若进程中已有其他全局记录器，返回 None，此时 `/metrics` 为空
pub fn init_metrics() -> Option<PrometheusHandle> {
    if let Some(handle) = HANDLE.get() {
        return Some(handle.clone());
    }

    let handle = match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => handle,
        Err(e) => {
            warn!("Failed to install Prometheus recorder: {}", e);
            return None;
        }
    };

    describe_histogram!(
        "scrapyd_request_duration_seconds",
        "Duration of calls to Scrapyd servers in seconds"
    );
    describe_counter!(
        "scrapyd_request_errors_total",
        "Scrapyd calls that failed or returned a non-2xx status"
    );
    describe_counter!("scheduler_runs_total", "Task runs started by the scheduler");
    describe_counter!(
        "scheduler_run_errors_total",
        "Task runs that ended with an error"
    );
    describe_counter!(
        "scheduler_misfires_total",
        "Fire times skipped because they were later than the grace time"
    );
    describe_counter!(
        "scheduler_max_instances_skips_total",
        "Fire times skipped because the task already had max_instances runs"
    );
    describe_gauge!("scheduler_tasks", "Tasks currently known to the scheduler");
    describe_counter!(
        "task_node_results_total",
        "Per-node outcomes of task runs, labelled by status"
    );
    describe_counter!("job_sync_total", "Job synchronisations per node, labelled by outcome");
    describe_counter!("http_pageviews_total", "Dashboard requests counted as page views");

    info!("Prometheus recorder installed");
    Some(HANDLE.get_or_init(|| handle).clone())
}
