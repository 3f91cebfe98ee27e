// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::metadata::SchedulerState;
use crate::domain::models::task::Task;
use crate::domain::services::trigger::{Trigger, TriggerError};
use crate::queue::runner::{ExecutionError, TaskRunner};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use rand::Rng;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration as TokioDuration, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// 单次检查中最多追溯的错过触发次数
const MAX_CATCH_UP: usize = 1000;

/// 调度器错误
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("task #{0} is not scheduled")]
    TaskNotFound(i32),
    #[error(transparent)]
    Trigger(#[from] TriggerError),
}

struct Entry {
    task: Task,
    trigger: Trigger,
    /// 下一次名义触发时间（不含抖动）
    nominal: Option<DateTime<Utc>>,
    /// 实际生效的下一次触发时间（含抖动）
    next_run: Option<DateTime<Utc>>,
    paused: bool,
    running: Arc<AtomicU32>,
}

impl Entry {
    fn new(task: Task, now: DateTime<Utc>) -> Result<Self, TriggerError> {
        let trigger = Trigger::compile(&task, now)?;
        let mut entry = Self {
            paused: task.paused,
            task,
            trigger,
            nominal: None,
            next_run: None,
            running: Arc::new(AtomicU32::new(0)),
        };
        entry.plan_after(now);
        Ok(entry)
    }

    fn plan_after(&mut self, after: DateTime<Utc>) {
        self.nominal = self.trigger.next_fire_after(after);
        self.next_run = self.nominal.map(|t| with_jitter(t, self.task.jitter));
    }
}

/// 在触发时间上加 `0..=jitter` 秒的随机偏移
pub fn with_jitter(fire_time: DateTime<Utc>, jitter: u32) -> DateTime<Utc> {
    if jitter == 0 {
        return fire_time;
    }
    let offset = rand::rng().random_range(0..=jitter);
    fire_time + Duration::seconds(i64::from(offset))
}

/// 调度器中一个任务的状态
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScheduledTaskInfo {
    pub task_id: i32,
    pub label: String,
    pub trigger: String,
    pub next_run_time: Option<DateTime<Utc>>,
    pub paused: bool,
    /// 正在运行的实例数
    pub running: u32,
}

/// 一次检查的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// 启动的运行数
    pub launched: usize,
    /// 因超过 misfire_grace_time 被跳过的触发数
    pub misfired: usize,
    /// 因达到 max_instances 被跳过的运行数
    pub skipped: usize,
}

/// 任务调度器
///
/// 每个 tick 检查一次到期的任务，把到期的运行作为独立的 tokio 任务交给 [`TaskRunner`]。
/// 支持抖动、misfire 宽限、合并错过的触发以及最大并发实例数。
pub struct TaskScheduler {
    entries: DashMap<i32, Entry>,
    runner: Arc<dyn TaskRunner>,
    state: RwLock<SchedulerState>,
    tick: TokioDuration,
    shutdown: watch::Sender<bool>,
}

impl TaskScheduler {
    /// 创建新的任务调度器实例
    ///
    /// # 参数
    ///
    /// * `runner` - 任务执行器
    /// * `tick` - 检查间隔
    pub fn new(runner: Arc<dyn TaskRunner>, tick: TokioDuration) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            entries: DashMap::new(),
            runner,
            state: RwLock::new(SchedulerState::Running),
            tick,
            shutdown,
        }
    }

    /// 启动调度循环
    ///
    /// # 返回值
    ///
    /// 返回后台任务的句柄，调用 [`TaskScheduler::shutdown`] 后结束
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);
        let mut shutdown_rx = self.shutdown.subscribe();
        {
            let mut state = self.state.write();
            if *state == SchedulerState::Stopped {
                *state = SchedulerState::Running;
            }
        }
        info!(
            "Scheduler started with {} tasks, tick every {:?}",
            self.entries.len(),
            self.tick
        );

        tokio::spawn(async move {
            let mut ticker = interval(scheduler.tick);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        scheduler.run_pending(Utc::now());
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            info!("Scheduler loop shutting down");
                            break;
                        }
                    }
                }
            }
        })
    }

    /// 停止调度循环，正在运行的任务不受影响
    pub fn shutdown(&self) {
        *self.state.write() = SchedulerState::Stopped;
        let _ = self.shutdown.send(true);
    }

    /// 暂停整个调度器，期间到期的触发在恢复后按 misfire 规则处理
    pub fn pause(&self) {
        *self.state.write() = SchedulerState::Paused;
        info!("Scheduler paused");
    }

    pub fn resume(&self) {
        *self.state.write() = SchedulerState::Running;
        info!("Scheduler resumed");
    }

    pub fn state(&self) -> SchedulerState {
        *self.state.read()
    }

    /// 添加任务，已存在时替换
    pub fn add_task(&self, task: Task) -> Result<Option<DateTime<Utc>>, SchedulerError> {
        let task_id = task.id;
        let label = task.label();
        let entry = Entry::new(task, Utc::now())?;
        let next = entry.next_run;
        let trigger = entry.trigger.to_string();
        if let Some(old) = self.entries.insert(task_id, entry) {
            // keep the in-flight counter so max_instances still holds
            if let Some(mut current) = self.entries.get_mut(&task_id) {
                current.running = old.running;
            }
        }
        metrics::gauge!("scheduler_tasks").set(self.entries.len() as f64);
        info!("Scheduled task {} with {}, next run at {:?}", label, trigger, next);
        Ok(self.next_run_time(task_id))
    }

    /// 按新的任务定义重新计算触发器
    pub fn reschedule(&self, task: Task) -> Result<Option<DateTime<Utc>>, SchedulerError> {
        self.add_task(task)
    }

    /// 移除任务，返回任务是否存在
    pub fn remove_task(&self, task_id: i32) -> bool {
        let removed = self.entries.remove(&task_id).is_some();
        if removed {
            metrics::gauge!("scheduler_tasks").set(self.entries.len() as f64);
            info!("Removed task #{} from scheduler", task_id);
        }
        removed
    }

    pub fn pause_task(&self, task_id: i32) -> Result<(), SchedulerError> {
        let mut entry = self
            .entries
            .get_mut(&task_id)
            .ok_or(SchedulerError::TaskNotFound(task_id))?;
        entry.paused = true;
        info!("Paused task #{}", task_id);
        Ok(())
    }

    /// 恢复任务，下一次触发时间从当前时间重新计算
    pub fn resume_task(&self, task_id: i32) -> Result<Option<DateTime<Utc>>, SchedulerError> {
        let mut entry = self
            .entries
            .get_mut(&task_id)
            .ok_or(SchedulerError::TaskNotFound(task_id))?;
        entry.paused = false;
        entry.plan_after(Utc::now());
        info!("Resumed task #{}, next run at {:?}", task_id, entry.next_run);
        Ok(entry.next_run)
    }

    /// 立即运行一次，不影响原有的触发计划
    pub fn fire_now(self: &Arc<Self>, task_id: i32) -> Result<(), SchedulerError> {
        let running = {
            let entry = self
                .entries
                .get(&task_id)
                .ok_or(SchedulerError::TaskNotFound(task_id))?;
            if entry.running.load(Ordering::SeqCst) >= entry.task.max_instances.max(1) {
                warn!(
                    "Task {} already has {} running instances, fire skipped",
                    entry.task.label(),
                    entry.task.max_instances
                );
                metrics::counter!("scheduler_max_instances_skips_total").increment(1);
                return Ok(());
            }
            Arc::clone(&entry.running)
        };
        self.launch(task_id, running);
        Ok(())
    }

    /// 下一次触发时间，任务暂停或不再触发时为 None
    pub fn next_run_time(&self, task_id: i32) -> Option<DateTime<Utc>> {
        self.entries
            .get(&task_id)
            .filter(|entry| !entry.paused)
            .and_then(|entry| entry.next_run)
    }

    pub fn contains(&self, task_id: i32) -> bool {
        self.entries.contains_key(&task_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 所有任务的调度状态，按任务ID排序
    pub fn snapshot(&self) -> Vec<ScheduledTaskInfo> {
        let mut infos: Vec<ScheduledTaskInfo> = self
            .entries
            .iter()
            .map(|entry| ScheduledTaskInfo {
                task_id: *entry.key(),
                label: entry.task.label(),
                trigger: entry.trigger.to_string(),
                next_run_time: if entry.paused { None } else { entry.next_run },
                paused: entry.paused,
                running: entry.running.load(Ordering::SeqCst),
            })
            .collect();
        infos.sort_by_key(|info| info.task_id);
        infos
    }

    /// 用给定的任务集合替换当前的调度内容
    ///
    /// # 返回值
    ///
    /// 触发器无法编译的任务及其错误，这些任务不会被调度
    pub fn load(&self, tasks: Vec<Task>) -> Vec<(i32, TriggerError)> {
        // runs still in flight keep counting against max_instances
        let mut in_flight: HashMap<i32, Arc<AtomicU32>> = self
            .entries
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(&entry.running)))
            .collect();
        self.entries.clear();
        let now = Utc::now();
        let mut failures = Vec::new();
        for task in tasks {
            let task_id = task.id;
            match Entry::new(task, now) {
                Ok(mut entry) => {
                    if let Some(running) = in_flight.remove(&task_id) {
                        entry.running = running;
                    }
                    self.entries.insert(task_id, entry);
                }
                Err(e) => {
                    error!("Task #{} was not scheduled: {}", task_id, e);
                    failures.push((task_id, e));
                }
            }
        }
        metrics::gauge!("scheduler_tasks").set(self.entries.len() as f64);
        info!(
            "Loaded {} tasks into scheduler ({} failed)",
            self.entries.len(),
            failures.len()
        );
        failures
    }

    /// 处理在 `now` 之前到期的所有触发
    pub fn run_pending(self: &Arc<Self>, now: DateTime<Utc>) -> TickReport {
        let mut report = TickReport::default();
        if self.state() != SchedulerState::Running {
            return report;
        }

        let mut launches = Vec::new();
        for mut entry in self.entries.iter_mut() {
            let due = matches!(entry.next_run, Some(next) if next <= now);
            if entry.paused || !due {
                continue;
            }
            let task_id = *entry.key();
            let (Some(first_run), Some(first_nominal)) = (entry.next_run, entry.nominal) else {
                continue;
            };

            // all fire times up to now, the first one with its jitter applied
            let mut fires = vec![first_run];
            let mut last_nominal = first_nominal;
            while fires.len() < MAX_CATCH_UP {
                match entry.trigger.next_fire_after(last_nominal) {
                    Some(next) if next <= now => {
                        fires.push(next);
                        last_nominal = next;
                    }
                    _ => break,
                }
            }

            let grace = entry.task.misfire_grace_time;
            let on_time: Vec<DateTime<Utc>> = fires
                .iter()
                .copied()
                .filter(|fire| match grace {
                    Some(grace) => now - *fire <= Duration::seconds(i64::from(grace)),
                    None => true,
                })
                .collect();

            let misfired = fires.len() - on_time.len();
            if misfired > 0 {
                warn!(
                    "Task {} missed {} run(s) by more than {:?}s",
                    entry.task.label(),
                    misfired,
                    grace
                );
                metrics::counter!("scheduler_misfires_total").increment(misfired as u64);
                report.misfired += misfired;
            }

            let runs = if entry.task.coalesce {
                on_time.len().min(1)
            } else {
                on_time.len()
            };

            let max_instances = entry.task.max_instances.max(1);
            for _ in 0..runs {
                if entry.running.load(Ordering::SeqCst) >= max_instances {
                    warn!(
                        "Execution of task {} skipped: maximum number of running instances reached ({})",
                        entry.task.label(),
                        max_instances
                    );
                    metrics::counter!("scheduler_max_instances_skips_total").increment(1);
                    report.skipped += 1;
                    continue;
                }
                // reserve the slot now so later fires in this tick see it
                entry.running.fetch_add(1, Ordering::SeqCst);
                launches.push((task_id, Arc::clone(&entry.running)));
            }

            entry.plan_after(last_nominal);
            if entry.next_run.is_none() {
                debug!("Task {} has no further fire times", entry.task.label());
            }
        }

        report.launched = launches.len();
        for (task_id, running) in launches {
            self.spawn_run(task_id, running);
        }
        report
    }

    fn launch(self: &Arc<Self>, task_id: i32, running: Arc<AtomicU32>) {
        running.fetch_add(1, Ordering::SeqCst);
        self.spawn_run(task_id, running);
    }

    /// 运行一次任务，`running` 计数已由调用方加一
    fn spawn_run(self: &Arc<Self>, task_id: i32, running: Arc<AtomicU32>) {
        let scheduler = Arc::clone(self);
        metrics::counter!("scheduler_runs_total").increment(1);
        tokio::spawn(async move {
            let result = scheduler.runner.run(task_id).await;
            running.fetch_sub(1, Ordering::SeqCst);
            match result {
                Ok(summary) => {
                    info!(
                        "Task #{} executed: result #{} with {} pass, {} fail",
                        task_id, summary.task_result_id, summary.pass_count, summary.fail_count
                    );
                }
                Err(ExecutionError::TaskNotFound(id)) => {
                    warn!("Task #{} no longer exists, removing it from scheduler", id);
                    metrics::counter!("scheduler_run_errors_total").increment(1);
                    scheduler.remove_task(id);
                }
                Err(e) => {
                    error!("Task #{} raised an exception: {}", task_id, e);
                    metrics::counter!("scheduler_run_errors_total").increment(1);
                }
            }
        });
    }
}

#[cfg(test)]
#[path = "scheduler_test.rs"]
mod tests;
