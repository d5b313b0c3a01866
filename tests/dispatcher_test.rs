//! Reward dispatcher tests: ledger, aggregate, notifications and isolation

mod common;

use std::sync::Arc;

use common::{FailingNotifier, FailingStore, RecordingNotifier, memory_engine};
use progression::engine::{EngineSettings, Grant};
use progression::notify::{Delivery, NoticeKind};
use progression::rewards::{REWARD_TABLE, reward_for};
use progression::{MemoryStore, ProgressionStore, RewardEngine};

#[test]
fn test_every_table_kind_writes_ledger_and_aggregate() {
    let (engine, store, _) = memory_engine();

    let mut expected_xp = 0;
    let mut expected_coins = 0;
    for (kind, reward) in REWARD_TABLE {
        let outcome = engine.award_reward("u1", kind.as_str(), None, None);
        assert!(outcome.value.granted, "{} should grant", kind.as_str());
        assert_eq!((outcome.value.xp, outcome.value.coins), (reward.xp, reward.coins));
        expected_xp += reward.xp;
        expected_coins += reward.coins;
    }

    let agg = store.aggregate("u1").unwrap().unwrap();
    assert_eq!(agg.total_xp, expected_xp);
    assert_eq!(agg.coins, expected_coins);
    assert_eq!(store.ledger("u1", 100).unwrap().len(), REWARD_TABLE.len());
    common::assert_consistent(store.as_ref(), "u1");
}

#[test]
fn test_lesson_completed_scenario() {
    let (engine, store, _) = memory_engine();

    let outcome = engine.award_reward("u1", "lesson_completed", Some("lesson-42"), None);
    assert!(outcome.is_success());

    let agg = store.aggregate("u1").unwrap().unwrap();
    assert_eq!((agg.total_xp, agg.coins), (50, 10));

    let ledger = store.ledger("u1", 10).unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].kind, "lesson_completed");
    assert_eq!((ledger[0].xp, ledger[0].coins), (50, 10));
    assert_eq!(ledger[0].reference_id.as_deref(), Some("lesson-42"));
}

#[test]
fn test_unknown_kind_writes_nothing() {
    let (engine, store, _) = memory_engine();

    let outcome = engine.award_reward("u1", "unknown_kind", None, None);
    assert!(outcome.is_success());
    assert_eq!(outcome.value, Grant::default());
    assert!(reward_for("unknown_kind").is_zero());
    assert!(store.ledger("u1", 10).unwrap().is_empty());
    assert!(store.aggregate("u1").unwrap().is_none());
}

#[test]
fn test_custom_description_is_kept() {
    let (engine, store, _) = memory_engine();
    engine.award_reward("u1", "referral", Some("friend-7"), Some("Invited Sam"));

    let entry = &store.ledger("u1", 1).unwrap()[0];
    assert_eq!(entry.description, "Invited Sam");
    assert_eq!((entry.xp, entry.coins), (200, 50));
}

#[test]
fn test_ledger_is_newest_first() {
    let (engine, store, _) = memory_engine();
    engine.award_reward("u1", "daily_login", None, None);
    engine.award_reward("u1", "quiz_completed", None, None);

    let kinds: Vec<String> = store.ledger("u1", 10).unwrap().into_iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec!["quiz_completed", "daily_login"]);
}

#[test]
fn test_users_are_independent() {
    let (engine, store, _) = memory_engine();
    engine.award_reward("alice", "lesson_completed", None, None);
    engine.award_reward("bob", "quiz_completed", None, None);

    assert_eq!(store.aggregate("alice").unwrap().unwrap().total_xp, 50);
    assert_eq!(store.aggregate("bob").unwrap().unwrap().total_xp, 20);
}

#[test]
fn test_level_tracks_total_xp() {
    let (engine, store, _) = memory_engine();

    // 200 XP per referral: 1000 XP after five reaches level 5
    let mut level_ups = Vec::new();
    for _ in 0..5 {
        let outcome = engine.award_reward("u1", "referral", None, None);
        if let Some(up) = outcome.value.level_up {
            level_ups.push(up.new_level);
        }
    }

    assert_eq!(level_ups, vec![2, 3, 4, 5]);
    assert_eq!(store.aggregate("u1").unwrap().unwrap().level, 5);
}

#[test]
fn test_notification_kind_follows_event() {
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let engine = RewardEngine::new(store).with_notifier(notifier.clone());

    let outcome = engine.award_reward("u1", "lesson_completed", None, None);
    assert_eq!(outcome.value.notification, Delivery::Sent);
    engine.award_reward("u1", "badge_earned", None, Some("Earned badge: First Lesson"));
    engine.award_reward("u1", "streak_bonus", None, None);

    let kinds: Vec<NoticeKind> = notifier.sent().into_iter().map(|(_, _, kind)| kind).collect();
    assert_eq!(kinds, vec![NoticeKind::Reward, NoticeKind::Badge, NoticeKind::Streak]);
}

#[test]
fn test_no_notification_for_noop() {
    let notifier = Arc::new(RecordingNotifier::default());
    let engine = RewardEngine::new(Arc::new(MemoryStore::new())).with_notifier(notifier.clone());

    engine.award_reward("u1", "unknown_kind", None, None);
    assert!(notifier.sent().is_empty());
}

#[test]
fn test_disabled_notifications_are_skipped() {
    let notifier = Arc::new(RecordingNotifier::default());
    let engine = RewardEngine::new(Arc::new(MemoryStore::new()))
        .with_notifier(notifier.clone())
        .with_settings(EngineSettings {
            notifications: false,
            ..Default::default()
        });

    let outcome = engine.award_reward("u1", "lesson_completed", None, None);
    assert!(outcome.value.granted);
    assert_eq!(outcome.value.notification, Delivery::Skipped);
    assert!(notifier.sent().is_empty());
}

#[test]
fn test_failing_notifier_does_not_block_grant() {
    let store = Arc::new(MemoryStore::new());
    let engine = RewardEngine::new(store.clone()).with_notifier(Arc::new(FailingNotifier));

    let outcome = engine.award_reward("u1", "lesson_completed", None, None);
    assert!(outcome.is_success());
    assert!(outcome.value.granted);
    assert!(matches!(outcome.value.notification, Delivery::Failed(_)));
    assert_eq!(store.aggregate("u1").unwrap().unwrap().total_xp, 50);
}

#[test]
fn test_failing_store_is_reported_not_raised() {
    let notifier = Arc::new(RecordingNotifier::default());
    let engine = RewardEngine::new(Arc::new(FailingStore)).with_notifier(notifier.clone());

    let outcome = engine.award_reward("u1", "lesson_completed", None, None);
    assert!(!outcome.is_success());
    assert!(!outcome.value.granted);
    assert!(outcome.error.unwrap().contains("database offline"));
    assert!(notifier.sent().is_empty());
}
