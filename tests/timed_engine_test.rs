//! Async facade tests

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{FailingStore, date, memory_engine};
use progression::{ProgressionStore, RewardEngine, TimedEngine};

#[tokio::test]
async fn test_operations_run_on_blocking_pool() {
    let (engine, store, _) = memory_engine();
    let timed = TimedEngine::new(engine, Duration::from_secs(5));

    timed.award_reward("u1", "lesson_completed", Some("lesson-1"), None).await;
    let touch = timed.touch_streak("u1", date(1)).await;
    timed.auto_enroll("u1").await;
    timed.record_progress("u1", "lesson_completed").await;

    assert!(touch.is_success());
    assert_eq!(touch.value.streak, 1);
    assert_eq!(store.aggregate("u1").unwrap().unwrap().total_xp, 50);
}

#[tokio::test]
async fn test_concurrent_async_callers() {
    let (engine, store, _) = memory_engine();
    let timed = TimedEngine::new(engine, Duration::from_secs(5));

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let timed = timed.clone();
            tokio::spawn(async move { timed.award_reward("u1", "daily_login", None, None).await })
        })
        .collect();
    for task in tasks {
        assert!(task.await.unwrap().value.granted);
    }

    assert_eq!(store.ledger_totals("u1").unwrap().entries, 16);
    common::assert_consistent(store.as_ref(), "u1");
}

#[tokio::test]
async fn test_store_failure_passes_through() {
    let timed = TimedEngine::new(RewardEngine::new(Arc::new(FailingStore)), Duration::from_secs(5));
    let outcome = timed.evaluate_badges("u1").await;
    assert!(!outcome.is_success());
}
