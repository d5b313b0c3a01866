//! Storage port for the progression engine
//!
//! Every method on [`ProgressionStore`] is one atomic unit. Methods taking an
//! `apply` closure perform a read-modify-write of a single row without letting
//! a concurrent writer interleave between the read and the write.
//!
//! Two adapters ship with the crate:
//! - [`MemoryStore`]: in-process tables behind one mutex
//! - [`SqliteStore`]: `rusqlite` database with transactions and unique constraints

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use chrono::{DateTime, Utc};

use crate::models::{
    Badge, Challenge, EnrolledChallenge, HeldBadge, LedgerEntry, LedgerTotals, NewBadge,
    NewChallenge, ProgressionAggregate, StreakState, UserChallenge,
};

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Store lock poisoned")]
    Poisoned,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Read-modify-write step for a streak row. `None` leaves the row untouched.
pub type StreakUpdate<'a> = dyn FnMut(Option<&StreakState>) -> Option<StreakState> + 'a;

/// Read-modify-write step for an enrollment row. `None` leaves the row untouched.
pub type ChallengeUpdate<'a> = dyn FnMut(&UserChallenge) -> Option<UserChallenge> + 'a;

/// Persistence capability injected into the engine
pub trait ProgressionStore: Send + Sync {
    // ========================================
    // LEDGER & AGGREGATE
    // ========================================

    /// Append a ledger entry and add its amounts to the user's aggregate
    /// (creating a zeroed aggregate if absent). Returns the aggregate as written.
    fn apply_grant(&self, entry: &LedgerEntry) -> StoreResult<ProgressionAggregate>;

    fn aggregate(&self, user_id: &str) -> StoreResult<Option<ProgressionAggregate>>;

    /// Overwrite an aggregate (used by reconciliation)
    fn replace_aggregate(&self, aggregate: &ProgressionAggregate) -> StoreResult<()>;

    /// Most recent ledger entries first
    fn ledger(&self, user_id: &str, limit: usize) -> StoreResult<Vec<LedgerEntry>>;

    fn ledger_totals(&self, user_id: &str) -> StoreResult<LedgerTotals>;

    fn count_entries(&self, user_id: &str, kind: &str) -> StoreResult<u64>;

    // ========================================
    // STREAKS
    // ========================================

    fn streak(&self, user_id: &str) -> StoreResult<Option<StreakState>>;

    /// Returns the row as written, or `None` when `apply` declined to write
    fn update_streak(
        &self,
        user_id: &str,
        apply: &mut StreakUpdate<'_>,
    ) -> StoreResult<Option<StreakState>>;

    // ========================================
    // BADGES
    // ========================================

    /// Insert or refresh a catalog entry keyed by name
    fn upsert_badge(&self, badge: &NewBadge) -> StoreResult<Badge>;

    fn badge_by_name(&self, name: &str) -> StoreResult<Option<Badge>>;

    fn owned_badge_ids(&self, user_id: &str) -> StoreResult<Vec<i64>>;

    /// Grant a badge. Returns `false` if the user already holds it.
    fn insert_user_badge(
        &self,
        user_id: &str,
        badge_id: i64,
        earned_at: DateTime<Utc>,
    ) -> StoreResult<bool>;

    fn held_badges(&self, user_id: &str) -> StoreResult<Vec<HeldBadge>>;

    // ========================================
    // CHALLENGES
    // ========================================

    fn insert_challenge(&self, challenge: &NewChallenge) -> StoreResult<Challenge>;

    /// Challenges flagged active whose window has not ended at `now`
    fn active_challenges(&self, now: DateTime<Utc>) -> StoreResult<Vec<Challenge>>;

    fn user_challenges(&self, user_id: &str) -> StoreResult<Vec<EnrolledChallenge>>;

    /// Insert a zeroed enrollment. Returns `false` if already enrolled.
    fn enroll(
        &self,
        user_id: &str,
        challenge_id: i64,
        enrolled_at: DateTime<Utc>,
    ) -> StoreResult<bool>;

    /// Returns the row as written, or `None` when there is no enrollment or
    /// `apply` declined to write
    fn update_user_challenge(
        &self,
        user_id: &str,
        challenge_id: i64,
        apply: &mut ChallengeUpdate<'_>,
    ) -> StoreResult<Option<UserChallenge>>;
}
