//! Badge rule engine tests

mod common;

use std::sync::Arc;

use common::{FailingStore, date, memory_engine};
use progression::activity::{ActivityCounts, StaticActivity};
use progression::{ProgressionStore, RewardEngine};

fn badge_names(store: &dyn ProgressionStore, user: &str) -> Vec<String> {
    let mut names: Vec<String> = store
        .held_badges(user)
        .unwrap()
        .into_iter()
        .map(|held| held.badge.name)
        .collect();
    names.sort();
    names
}

#[test]
fn test_five_lessons_award_once() {
    let (engine, store, _) = memory_engine();
    engine.seed_badges();

    for i in 0..5 {
        engine.award_reward("u1", "lesson_completed", Some(&format!("lesson-{}", i)), None);
    }

    let first = engine.evaluate_badges("u1");
    assert!(first.is_success());
    assert_eq!(first.value.newly_awarded, 2);

    let second = engine.evaluate_badges("u1");
    assert_eq!(second.value.newly_awarded, 0);
    assert!(second.value.awarded.is_empty());

    assert_eq!(badge_names(store.as_ref(), "u1"), vec!["Eager Learner", "First Lesson"]);
    assert_eq!(store.count_entries("u1", "badge_earned").unwrap(), 2);

    let eager = store.badge_by_name("Eager Learner").unwrap().unwrap();
    let refs: Vec<Option<String>> = store
        .ledger("u1", 20)
        .unwrap()
        .into_iter()
        .filter(|e| e.kind == "badge_earned")
        .map(|e| e.reference_id)
        .collect();
    let eager_ref = eager.id.to_string();
    let matching = refs
        .iter()
        .filter(|r| r.as_deref() == Some(eager_ref.as_str()))
        .count();
    assert_eq!(matching, 1);
}

#[test]
fn test_badge_reward_is_table_value() {
    let (engine, store, _) = memory_engine();
    engine.seed_badges();
    engine.award_reward("u1", "lesson_completed", None, None);
    engine.evaluate_badges("u1");

    let agg = store.aggregate("u1").unwrap().unwrap();
    // 50/10 for the lesson, 25/5 for "First Lesson"
    assert_eq!((agg.total_xp, agg.coins), (75, 15));
    common::assert_consistent(store.as_ref(), "u1");
}

#[test]
fn test_streak_badges_use_longest() {
    let (engine, store, _) = memory_engine();
    engine.seed_badges();

    for day in 1..=3 {
        engine.touch_streak("u1", date(day));
    }
    // Broken streak keeps the longest
    engine.touch_streak("u1", date(10));

    let report = engine.evaluate_badges("u1").value;
    assert_eq!(report.awarded, vec!["On Fire".to_string()]);
    assert_eq!(badge_names(store.as_ref(), "u1"), vec!["On Fire"]);
}

#[test]
fn test_external_activity_counts() {
    let (engine, store, _) = memory_engine();
    let activity = Arc::new(StaticActivity::new());
    activity.set(
        "tutor",
        ActivityCounts {
            lessons_delivered: 50,
            reviews_received: 12,
            average_rating: 4.8,
            ..Default::default()
        },
    );
    let engine = engine.with_activity(activity.clone());
    engine.seed_badges();

    engine.evaluate_badges("tutor");
    assert_eq!(
        badge_names(store.as_ref(), "tutor"),
        vec!["First Class", "Seasoned Tutor", "Top Rated"]
    );

    // A low rating does not earn Top Rated
    activity.set(
        "other",
        ActivityCounts {
            reviews_received: 30,
            average_rating: 3.9,
            ..Default::default()
        },
    );
    assert_eq!(engine.evaluate_badges("other").value.newly_awarded, 0);
}

#[test]
fn test_top_rated_needs_rating_source() {
    let (engine, store, _) = memory_engine();
    engine.seed_badges();

    for i in 0..12 {
        engine.award_reward("u1", "student_review_received", Some(&format!("review-{}", i)), None);
    }
    engine.evaluate_badges("u1");

    assert_eq!(engine.user_stats("u1").value.reviews_received, 12);
    assert!(!badge_names(store.as_ref(), "u1").contains(&"Top Rated".to_string()));
}

#[test]
fn test_badges_are_skipped_without_catalog() {
    let (engine, store, _) = memory_engine();
    engine.award_reward("u1", "lesson_completed", None, None);

    let report = engine.evaluate_badges("u1");
    assert!(report.is_success());
    assert_eq!(report.value.newly_awarded, 0);
    assert!(store.held_badges("u1").unwrap().is_empty());
}

#[test]
fn test_user_stats_snapshot() {
    let (engine, _, _) = memory_engine();
    engine.award_reward("u1", "lesson_completed", None, None);
    engine.award_reward("u1", "lesson_completed", None, None);
    engine.award_reward("u1", "quiz_completed", None, None);
    engine.touch_streak("u1", date(1));

    let stats = engine.user_stats("u1").value;
    assert_eq!(stats.lessons_completed, 2);
    assert_eq!(stats.quizzes_completed, 1);
    assert_eq!(stats.current_streak, 1);
    assert_eq!(stats.level, 2);
}

#[test]
fn test_store_failure_is_isolated() {
    let engine = RewardEngine::new(Arc::new(FailingStore));
    let report = engine.evaluate_badges("u1");
    assert!(!report.is_success());
    assert_eq!(report.value.newly_awarded, 0);
}
