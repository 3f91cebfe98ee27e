// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::super::helpers::memory_db;
use chrono::Utc;
use scrapydash::domain::models::task::{Task, TriggerFields, TriggerKind};
use scrapydash::domain::models::task_result::{JobOutcomeStatus, NewTaskJobResult};
use scrapydash::domain::repositories::task_repository::{RepositoryError, TaskRepository};
use scrapydash::domain::repositories::task_result_repository::TaskResultRepository;
use scrapydash::infrastructure::repositories::task_repo_impl::TaskRepositoryImpl;
use scrapydash::infrastructure::repositories::task_result_repo_impl::TaskResultRepositoryImpl;
use std::collections::BTreeMap;

fn task(name: &str) -> Task {
    let now = Utc::now();
    Task {
        id: 0,
        name: Some(name.to_string()),
        trigger: TriggerKind::Cron,
        create_time: now,
        update_time: now,
        project: "demo".to_string(),
        version: String::new(),
        spider: "quotes".to_string(),
        jobid: String::new(),
        settings_arguments: BTreeMap::new(),
        selected_nodes: vec![1],
        fields: TriggerFields::default(),
        start_date: None,
        end_date: None,
        timezone: None,
        jitter: 0,
        misfire_grace_time: None,
        coalesce: true,
        max_instances: 1,
        paused: false,
    }
}

/// 删除任务时执行记录和节点明细一并删除
#[tokio::test]
async fn test_task_delete_cascades_to_results() {
    let db = memory_db().await;
    let tasks = TaskRepositoryImpl::new(db.clone());
    let results = TaskResultRepositoryImpl::new(db);

    let stored = tasks.create(&task("cascade")).await.unwrap();
    let result = results.create(stored.id, Utc::now()).await.unwrap();
    results
        .add_job_results(
            result.id,
            &[NewTaskJobResult {
                node: 1,
                server: "127.0.0.1:6800".to_string(),
                status_code: 200,
                status: JobOutcomeStatus::Ok,
                result: "job-1".to_string(),
            }],
        )
        .await
        .unwrap();
    results.update_counts(result.id, 1, 0).await.unwrap();

    let detail = results.find_detail(result.id).await.unwrap().unwrap();
    assert_eq!(detail.result.pass_count, 1);
    assert_eq!(detail.job_results.len(), 1);

    tasks.delete(stored.id).await.unwrap();
    assert!(results.find_detail(result.id).await.unwrap().is_none());
    assert!(matches!(
        tasks.delete(stored.id).await,
        Err(RepositoryError::NotFound)
    ));
}

#[tokio::test]
async fn test_task_round_trip_keeps_settings_and_nodes() {
    let db = memory_db().await;
    let tasks = TaskRepositoryImpl::new(db);

    let mut new_task = task("arguments");
    new_task
        .settings_arguments
        .insert("setting".to_string(), vec!["A=1".to_string(), "B=2".to_string()]);
    new_task.selected_nodes = vec![1, 3];
    new_task.misfire_grace_time = Some(30);

    let stored = tasks.create(&new_task).await.unwrap();
    let loaded = tasks.find_by_id(stored.id).await.unwrap().unwrap();
    assert_eq!(loaded.settings_arguments["setting"], vec!["A=1", "B=2"]);
    assert_eq!(loaded.selected_nodes, vec![1, 3]);
    assert_eq!(loaded.misfire_grace_time, Some(30));

    tasks.set_paused(stored.id, true).await.unwrap();
    let page = tasks.list(1, 10).await.unwrap();
    assert_eq!(page.total, 1);
    assert!(page.items[0].paused);
}

/// 页码超出范围时返回空页而不是报错
#[tokio::test]
async fn test_list_with_huge_page_is_empty() {
    let db = memory_db().await;
    let tasks = TaskRepositoryImpl::new(db.clone());
    let results = TaskResultRepositoryImpl::new(db);

    let stored = tasks.create(&task("paging")).await.unwrap();
    results.create(stored.id, Utc::now()).await.unwrap();

    let page = tasks.list(u64::MAX, 20).await.unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total, 1);

    let page = results.list_by_task(stored.id, u64::MAX, 20).await.unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total, 1);
}
