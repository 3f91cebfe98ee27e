use super::*;
use crate::domain::models::task::{TriggerFields, TriggerKind, LATEST_VERSION};
use crate::queue::runner::RunSummary;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::AtomicUsize;
use tokio::sync::Semaphore;

#[derive(Default)]
struct FakeRunner {
    calls: AtomicUsize,
    gate: Option<Arc<Semaphore>>,
    missing: bool,
}

#[async_trait]
impl TaskRunner for FakeRunner {
    async fn run(&self, task_id: i32) -> Result<RunSummary, ExecutionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        if self.missing {
            return Err(ExecutionError::TaskNotFound(task_id));
        }
        Ok(RunSummary {
            task_result_id: 1,
            pass_count: 1,
            fail_count: 0,
        })
    }
}

fn interval_task(id: i32) -> Task {
    Task {
        id,
        name: Some(format!("task-{}", id)),
        trigger: TriggerKind::Interval,
        create_time: Utc::now(),
        update_time: Utc::now(),
        project: "demo".to_string(),
        version: LATEST_VERSION.to_string(),
        spider: "quotes".to_string(),
        jobid: String::new(),
        settings_arguments: BTreeMap::new(),
        selected_nodes: vec![1],
        fields: TriggerFields {
            year: "*".to_string(),
            month: "*".to_string(),
            day: "0".to_string(),
            week: "0".to_string(),
            day_of_week: "*".to_string(),
            hour: "0".to_string(),
            minute: "1".to_string(),
            second: "0".to_string(),
        },
        start_date: Some("2020-01-01 00:00:00".to_string()),
        end_date: None,
        timezone: Some("UTC".to_string()),
        jitter: 0,
        misfire_grace_time: None,
        coalesce: true,
        max_instances: 1,
        paused: false,
    }
}

fn scheduler_with(runner: Arc<FakeRunner>) -> Arc<TaskScheduler> {
    Arc::new(TaskScheduler::new(runner, TokioDuration::from_millis(50)))
}

async fn wait_for(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(TokioDuration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}

#[tokio::test]
async fn test_coalesce_collapses_missed_fires() {
    let runner = Arc::new(FakeRunner::default());
    let scheduler = scheduler_with(runner.clone());
    scheduler.add_task(interval_task(1)).unwrap();

    let first = scheduler.next_run_time(1).unwrap();
    let report = scheduler.run_pending(first + Duration::minutes(10));

    assert_eq!(report.launched, 1);
    assert_eq!(report.misfired, 0);
    wait_for(|| runner.calls.load(Ordering::SeqCst) == 1).await;
    assert_eq!(
        scheduler.next_run_time(1),
        Some(first + Duration::minutes(11))
    );
}

#[tokio::test]
async fn test_without_coalesce_every_fire_runs() {
    let runner = Arc::new(FakeRunner::default());
    let scheduler = scheduler_with(runner.clone());
    let mut task = interval_task(2);
    task.coalesce = false;
    task.max_instances = 100;
    scheduler.add_task(task).unwrap();

    let first = scheduler.next_run_time(2).unwrap();
    let report = scheduler.run_pending(first + Duration::minutes(10));

    assert_eq!(report.launched, 11);
    wait_for(|| runner.calls.load(Ordering::SeqCst) == 11).await;
}

#[tokio::test]
async fn test_misfire_grace_time_skips_late_fires() {
    let runner = Arc::new(FakeRunner::default());
    let scheduler = scheduler_with(runner.clone());
    let mut task = interval_task(3);
    task.coalesce = false;
    task.max_instances = 100;
    task.misfire_grace_time = Some(90);
    scheduler.add_task(task).unwrap();

    let first = scheduler.next_run_time(3).unwrap();
    let report = scheduler.run_pending(first + Duration::minutes(10));

    assert_eq!(report.misfired, 9);
    assert_eq!(report.launched, 2);
}

#[tokio::test]
async fn test_max_instances_limits_concurrent_runs() {
    let gate = Arc::new(Semaphore::new(0));
    let runner = Arc::new(FakeRunner {
        gate: Some(gate.clone()),
        ..FakeRunner::default()
    });
    let scheduler = scheduler_with(runner.clone());
    let mut task = interval_task(4);
    task.coalesce = false;
    scheduler.add_task(task).unwrap();

    let first = scheduler.next_run_time(4).unwrap();
    let report = scheduler.run_pending(first + Duration::minutes(2));
    assert_eq!(report.launched, 1);
    assert_eq!(report.skipped, 2);

    wait_for(|| runner.calls.load(Ordering::SeqCst) == 1).await;
    // still blocked, so a manual fire is skipped too
    scheduler.fire_now(4).unwrap();
    tokio::time::sleep(TokioDuration::from_millis(50)).await;
    assert_eq!(runner.calls.load(Ordering::SeqCst), 1);
    assert_eq!(scheduler.snapshot()[0].running, 1);

    gate.add_permits(10);
    wait_for(|| scheduler.snapshot()[0].running == 0).await;
}

#[tokio::test]
async fn test_paused_scheduler_and_paused_task_do_not_fire() {
    let runner = Arc::new(FakeRunner::default());
    let scheduler = scheduler_with(runner.clone());
    scheduler.add_task(interval_task(5)).unwrap();
    let first = scheduler.next_run_time(5).unwrap();

    scheduler.pause();
    assert_eq!(scheduler.state(), SchedulerState::Paused);
    assert_eq!(scheduler.run_pending(first), TickReport::default());

    scheduler.resume();
    scheduler.pause_task(5).unwrap();
    assert_eq!(scheduler.next_run_time(5), None);
    assert_eq!(scheduler.run_pending(first).launched, 0);

    let next = scheduler.resume_task(5).unwrap();
    assert!(next.is_some());
    assert!(scheduler.pause_task(99).is_err());
}

#[tokio::test]
async fn test_missing_task_is_removed_after_run() {
    let runner = Arc::new(FakeRunner {
        missing: true,
        ..FakeRunner::default()
    });
    let scheduler = scheduler_with(runner);
    scheduler.add_task(interval_task(6)).unwrap();
    assert!(scheduler.contains(6));

    scheduler.fire_now(6).unwrap();
    wait_for(|| !scheduler.contains(6)).await;
}

#[tokio::test]
async fn test_date_trigger_fires_once() {
    let runner = Arc::new(FakeRunner::default());
    let scheduler = scheduler_with(runner.clone());
    let mut task = interval_task(7);
    task.trigger = TriggerKind::Date;
    task.start_date = Some("2099-01-01 00:00:00".to_string());
    scheduler.add_task(task).unwrap();

    let run_at = scheduler.next_run_time(7).unwrap();
    assert_eq!(scheduler.run_pending(run_at).launched, 1);
    assert_eq!(scheduler.next_run_time(7), None);
    assert_eq!(scheduler.run_pending(run_at + Duration::days(1)).launched, 0);
}

#[tokio::test]
async fn test_load_reports_bad_triggers() {
    let scheduler = scheduler_with(Arc::new(FakeRunner::default()));
    let mut bad = interval_task(9);
    bad.trigger = TriggerKind::Cron;
    bad.fields.week = "3".to_string();

    let failures = scheduler.load(vec![interval_task(8), bad]);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, 9);
    assert_eq!(scheduler.len(), 1);
    assert_eq!(scheduler.snapshot()[0].trigger, "interval[60s]");
}

#[tokio::test]
async fn test_load_keeps_in_flight_runs_counted() {
    let gate = Arc::new(Semaphore::new(0));
    let runner = Arc::new(FakeRunner {
        gate: Some(gate.clone()),
        ..FakeRunner::default()
    });
    let scheduler = scheduler_with(runner.clone());
    scheduler.add_task(interval_task(10)).unwrap();

    scheduler.fire_now(10).unwrap();
    wait_for(|| runner.calls.load(Ordering::SeqCst) == 1).await;

    let failures = scheduler.load(vec![interval_task(10)]);
    assert!(failures.is_empty());
    assert_eq!(scheduler.snapshot()[0].running, 1);

    // the earlier run is still blocked, so max_instances = 1 holds
    scheduler.fire_now(10).unwrap();
    tokio::time::sleep(TokioDuration::from_millis(50)).await;
    assert_eq!(runner.calls.load(Ordering::SeqCst), 1);

    gate.add_permits(10);
    wait_for(|| scheduler.snapshot()[0].running == 0).await;
}

#[tokio::test]
async fn test_start_and_shutdown_loop() {
    let runner = Arc::new(FakeRunner::default());
    let scheduler = scheduler_with(runner);
    let handle = scheduler.start();
    assert_eq!(scheduler.state(), SchedulerState::Running);

    scheduler.shutdown();
    tokio::time::timeout(TokioDuration::from_secs(2), handle)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(scheduler.state(), SchedulerState::Stopped);
}

#[test]
fn test_jitter_range() {
    let base = Utc::now();
    for _ in 0..50 {
        let jittered = with_jitter(base, 5);
        assert!(jittered >= base);
        assert!(jittered <= base + Duration::seconds(5));
    }
    assert_eq!(with_jitter(base, 0), base);
}
