//! Shared test utilities for engine integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use tempfile::TempDir;

use progression::clock::FixedClock;
use progression::models::{
    Badge, Challenge, ChallengeKind, EnrolledChallenge, HeldBadge, LedgerEntry, LedgerTotals,
    NewBadge, NewChallenge, ProgressionAggregate, StreakState, UserChallenge,
};
use progression::notify::{NoticeKind, Notifier, NotifyError, NullNotifier};
use progression::store::{ChallengeUpdate, StoreResult, StreakUpdate};
use progression::{MemoryStore, ProgressionStore, RewardEngine, SqliteStore, StoreError};

/// Noon UTC on the given day of January 2024
pub fn jan(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap()
}

pub fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
}

/// Engine over a fresh in-memory store with a fixed clock and no notifications
pub fn memory_engine() -> (RewardEngine, Arc<MemoryStore>, Arc<FixedClock>) {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(FixedClock::new(jan(1)));
    let engine = RewardEngine::new(store.clone())
        .with_notifier(Arc::new(NullNotifier))
        .with_clock(clock.clone());
    (engine, store, clock)
}

/// SQLite store in a temp directory. Keep the `TempDir` alive for the test.
pub fn sqlite_store() -> (TempDir, Arc<SqliteStore>) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = SqliteStore::open(&dir.path().join("progression.db"), Duration::from_secs(5))
        .expect("Failed to open sqlite store");
    (dir, Arc::new(store))
}

/// A challenge running from Jan 1 to Jan 31 2024
pub fn january_challenge(kind: ChallengeKind, target: u32, xp: i64, coins: i64) -> NewChallenge {
    NewChallenge {
        title: format!("January {}", kind.as_str()),
        kind,
        target_value: target,
        xp_reward: xp,
        coin_reward: coins,
        start_time: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        end_time: Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap(),
        active: true,
    }
}

/// Ledger sums must equal the aggregate
pub fn assert_consistent(store: &dyn ProgressionStore, user_id: &str) {
    let totals = store.ledger_totals(user_id).unwrap();
    let aggregate = store.aggregate(user_id).unwrap();
    match aggregate {
        Some(agg) => {
            assert_eq!(agg.total_xp, totals.xp, "xp drift for {}", user_id);
            assert_eq!(agg.coins, totals.coins, "coin drift for {}", user_id);
        }
        None => assert_eq!(totals.entries, 0, "ledger without aggregate for {}", user_id),
    }
}

/// Captures every notification sent
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String, NoticeKind)>>,
}

impl RecordingNotifier {
    /// (user_id, message, kind) per notification, oldest first
    pub fn sent(&self) -> Vec<(String, String, NoticeKind)> {
        self.sent.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(
        &self,
        user_id: &str,
        _title: &str,
        message: &str,
        kind: NoticeKind,
    ) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((user_id.to_string(), message.to_string(), kind));
        Ok(())
    }
}

/// Rejects every notification
#[derive(Debug, Default)]
pub struct FailingNotifier;

impl Notifier for FailingNotifier {
    fn notify(&self, _: &str, _: &str, _: &str, _: NoticeKind) -> Result<(), NotifyError> {
        Err(NotifyError::Unavailable("push gateway down".to_string()))
    }
}

/// Store whose every call fails
#[derive(Debug, Default)]
pub struct FailingStore;

fn down<T>() -> StoreResult<T> {
    Err(StoreError::Unavailable("database offline".to_string()))
}

impl ProgressionStore for FailingStore {
    fn apply_grant(&self, _: &LedgerEntry) -> StoreResult<ProgressionAggregate> {
        down()
    }
    fn aggregate(&self, _: &str) -> StoreResult<Option<ProgressionAggregate>> {
        down()
    }
    fn replace_aggregate(&self, _: &ProgressionAggregate) -> StoreResult<()> {
        down()
    }
    fn ledger(&self, _: &str, _: usize) -> StoreResult<Vec<LedgerEntry>> {
        down()
    }
    fn ledger_totals(&self, _: &str) -> StoreResult<LedgerTotals> {
        down()
    }
    fn count_entries(&self, _: &str, _: &str) -> StoreResult<u64> {
        down()
    }
    fn streak(&self, _: &str) -> StoreResult<Option<StreakState>> {
        down()
    }
    fn update_streak(&self, _: &str, _: &mut StreakUpdate<'_>) -> StoreResult<Option<StreakState>> {
        down()
    }
    fn upsert_badge(&self, _: &NewBadge) -> StoreResult<Badge> {
        down()
    }
    fn badge_by_name(&self, _: &str) -> StoreResult<Option<Badge>> {
        down()
    }
    fn owned_badge_ids(&self, _: &str) -> StoreResult<Vec<i64>> {
        down()
    }
    fn insert_user_badge(&self, _: &str, _: i64, _: DateTime<Utc>) -> StoreResult<bool> {
        down()
    }
    fn held_badges(&self, _: &str) -> StoreResult<Vec<HeldBadge>> {
        down()
    }
    fn insert_challenge(&self, _: &NewChallenge) -> StoreResult<Challenge> {
        down()
    }
    fn active_challenges(&self, _: DateTime<Utc>) -> StoreResult<Vec<Challenge>> {
        down()
    }
    fn user_challenges(&self, _: &str) -> StoreResult<Vec<EnrolledChallenge>> {
        down()
    }
    fn enroll(&self, _: &str, _: i64, _: DateTime<Utc>) -> StoreResult<bool> {
        down()
    }
    fn update_user_challenge(
        &self,
        _: &str,
        _: i64,
        _: &mut ChallengeUpdate<'_>,
    ) -> StoreResult<Option<UserChallenge>> {
        down()
    }
}
