use crate::application::use_cases::job_sync_use_case::JobSyncUseCase;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// 作业轮询工作器
///
/// 定期把所有节点的作业同步到数据库
pub struct JobPoller {
    sync: Arc<JobSyncUseCase>,
    interval: Duration,
    shutdown: watch::Receiver<bool>,
}

impl JobPoller {
    pub fn new(sync: Arc<JobSyncUseCase>, interval: Duration, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            sync,
            interval,
            shutdown,
        }
    }

    /// 运行工作器，收到关闭信号后返回
    pub async fn run(mut self) {
        info!("Job poller started, every {:?}", self.interval);

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let reports = self.sync.sync_all().await;
                    let ok = reports.iter().filter(|r| r.is_ok()).count();
                    debug!("Job poll finished: {}/{} nodes synced", ok, reports.len());
                }
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        info!("Job poller shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// 启动后台运行，间隔为 0 时不启动
    pub fn start(self) -> Option<JoinHandle<()>> {
        if self.interval.is_zero() {
            info!("Job poller disabled");
            return None;
        }
        Some(tokio::spawn(self.run()))
    }
}

#[cfg(test)]
#[path = "job_poller_test.rs"]
mod tests;
