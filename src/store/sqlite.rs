//! SQLite-backed progression store
//!
//! Manages the progression database with automatic schema setup. Every
//! multi-row unit runs inside an immediate transaction, and badge grants and
//! enrollments rely on unique constraints rather than read-then-insert.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};

use super::{ChallengeUpdate, ProgressionStore, StoreError, StoreResult, StreakUpdate};
use crate::levels::Level;
use crate::models::{
    Badge, Challenge, ChallengeKind, EnrolledChallenge, HeldBadge, LedgerEntry, LedgerTotals,
    NewBadge, NewChallenge, ProgressionAggregate, Rarity, StreakState, UserChallenge,
};

const SCHEMA_VERSION: i32 = 1;

/// Database wrapper shared across threads
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open or create the progression database at a specific path
    pub fn open(path: &Path, busy_timeout: Duration) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create db dir: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open progression db: {}", path.display()))?;

        // Bounded wait on a locked database; expiry surfaces as SQLITE_BUSY.
        // Set before WAL so a concurrent open waits instead of failing.
        conn.busy_timeout(busy_timeout)?;
        // WAL lets several engine processes share one file
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Self::from_connection(conn, busy_timeout)
    }

    /// Private in-memory database (tests, dry runs)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory db")?;
        Self::from_connection(conn, Duration::from_secs(5))
    }

    fn from_connection(conn: Connection, busy_timeout: Duration) -> Result<Self> {
        conn.busy_timeout(busy_timeout)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA_SQL)
            .context("Failed to initialize progression schema")?;
        conn.execute(
            "INSERT OR IGNORE INTO schema_version VALUES (?1)",
            [SCHEMA_VERSION],
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Names of all tables, for diagnostics
    pub fn table_names(&self) -> StoreResult<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type='table'")?;
        let tables = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(tables)
    }
}

fn to_ms(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

fn from_ms(ms: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms).ok_or(rusqlite::Error::IntegralValueOutOfRange(0, ms))
}

fn date_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let text: String = row.get(idx)?;
    NaiveDate::parse_from_str(&text, "%Y-%m-%d")
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn ledger_from_row(row: &Row<'_>) -> rusqlite::Result<LedgerEntry> {
    Ok(LedgerEntry {
        user_id: row.get(0)?,
        kind: row.get(1)?,
        xp: row.get(2)?,
        coins: row.get(3)?,
        reference_id: row.get(4)?,
        description: row.get(5)?,
        created_at: from_ms(row.get(6)?)?,
    })
}

fn aggregate_from_row(row: &Row<'_>) -> rusqlite::Result<ProgressionAggregate> {
    Ok(ProgressionAggregate {
        user_id: row.get(0)?,
        total_xp: row.get(1)?,
        coins: row.get(2)?,
        level: row.get(3)?,
        updated_at: from_ms(row.get(4)?)?,
    })
}

fn streak_from_row(row: &Row<'_>) -> rusqlite::Result<StreakState> {
    Ok(StreakState {
        user_id: row.get(0)?,
        current: row.get(1)?,
        longest: row.get(2)?,
        last_activity: date_column(row, 3)?,
    })
}

fn badge_from_row(row: &Row<'_>) -> rusqlite::Result<Badge> {
    let rarity: String = row.get(3)?;
    Ok(Badge {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        // Unknown tiers written by other tools fall back to common
        rarity: Rarity::from_str(&rarity).unwrap_or_default(),
    })
}

/// Challenge columns starting at `offset`
fn challenge_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Challenge> {
    let kind: String = row.get(offset + 1)?;
    Ok(Challenge {
        id: row.get(offset)?,
        kind: ChallengeKind::parse(&kind),
        title: row.get(offset + 2)?,
        target_value: row.get(offset + 3)?,
        xp_reward: row.get(offset + 4)?,
        coin_reward: row.get(offset + 5)?,
        start_time: from_ms(row.get(offset + 6)?)?,
        end_time: from_ms(row.get(offset + 7)?)?,
        active: row.get(offset + 8)?,
    })
}

/// Enrollment columns starting at `offset`
fn user_challenge_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<UserChallenge> {
    let completed_at: Option<i64> = row.get(offset + 4)?;
    Ok(UserChallenge {
        user_id: row.get(offset)?,
        challenge_id: row.get(offset + 1)?,
        current_value: row.get(offset + 2)?,
        completed: row.get(offset + 3)?,
        completed_at: completed_at.map(from_ms).transpose()?,
    })
}

const CHALLENGE_COLUMNS: &str =
    "c.id, c.kind, c.title, c.target_value, c.xp_reward, c.coin_reward, c.start_time, c.end_time, c.active";

const USER_CHALLENGE_COLUMNS: &str =
    "uc.user_id, uc.challenge_id, uc.current_value, uc.completed, uc.completed_at";

impl ProgressionStore for SqliteStore {
    fn apply_grant(&self, entry: &LedgerEntry) -> StoreResult<ProgressionAggregate> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let now = to_ms(entry.created_at);

        tx.execute(
            r#"INSERT INTO ledger (user_id, kind, xp, coins, reference_id, description, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"#,
            params![
                entry.user_id, entry.kind, entry.xp, entry.coins, entry.reference_id,
                entry.description, now,
            ],
        )?;

        // Atomic increment; the aggregate is never read back into the app first
        tx.execute(
            r#"INSERT INTO progression (user_id, total_xp, coins, level, updated_at)
               VALUES (?1, ?2, ?3, 1, ?4)
               ON CONFLICT(user_id) DO UPDATE SET
                   total_xp = total_xp + ?2, coins = coins + ?3, updated_at = ?4"#,
            params![entry.user_id, entry.xp, entry.coins, now],
        )?;

        let total_xp: i64 = tx.query_row(
            "SELECT total_xp FROM progression WHERE user_id = ?1",
            [&entry.user_id],
            |r| r.get(0),
        )?;
        tx.execute(
            "UPDATE progression SET level = ?2 WHERE user_id = ?1",
            params![entry.user_id, Level::for_xp(total_xp).level],
        )?;

        let aggregate = tx.query_row(
            "SELECT user_id, total_xp, coins, level, updated_at FROM progression WHERE user_id = ?1",
            [&entry.user_id],
            aggregate_from_row,
        )?;
        tx.commit()?;
        Ok(aggregate)
    }

    fn aggregate(&self, user_id: &str) -> StoreResult<Option<ProgressionAggregate>> {
        let conn = self.conn()?;
        let aggregate = conn
            .query_row(
                "SELECT user_id, total_xp, coins, level, updated_at FROM progression WHERE user_id = ?1",
                [user_id],
                aggregate_from_row,
            )
            .optional()?;
        Ok(aggregate)
    }

    fn replace_aggregate(&self, aggregate: &ProgressionAggregate) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"INSERT INTO progression (user_id, total_xp, coins, level, updated_at)
               VALUES (?1, ?2, ?3, ?4, ?5)
               ON CONFLICT(user_id) DO UPDATE SET
                   total_xp = ?2, coins = ?3, level = ?4, updated_at = ?5"#,
            params![
                aggregate.user_id, aggregate.total_xp, aggregate.coins, aggregate.level,
                to_ms(aggregate.updated_at),
            ],
        )?;
        Ok(())
    }

    fn ledger(&self, user_id: &str, limit: usize) -> StoreResult<Vec<LedgerEntry>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT user_id, kind, xp, coins, reference_id, description, created_at
               FROM ledger WHERE user_id = ?1 ORDER BY id DESC LIMIT ?2"#,
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let entries = stmt
            .query_map(params![user_id, limit], ledger_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    fn ledger_totals(&self, user_id: &str) -> StoreResult<LedgerTotals> {
        let conn = self.conn()?;
        let (xp, coins, entries) = conn.query_row(
            "SELECT COALESCE(SUM(xp), 0), COALESCE(SUM(coins), 0), COUNT(*) FROM ledger WHERE user_id = ?1",
            [user_id],
            |r| Ok((r.get::<_, i64>(0)?, r.get::<_, i64>(1)?, r.get::<_, i64>(2)?)),
        )?;
        Ok(LedgerTotals {
            xp,
            coins,
            entries: entries as u64,
        })
    }

    fn count_entries(&self, user_id: &str, kind: &str) -> StoreResult<u64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM ledger WHERE user_id = ?1 AND kind = ?2",
            [user_id, kind],
            |r| r.get(0),
        )?;
        Ok(count as u64)
    }

    fn streak(&self, user_id: &str) -> StoreResult<Option<StreakState>> {
        let conn = self.conn()?;
        let streak = conn
            .query_row(
                "SELECT user_id, current_streak, longest_streak, last_activity FROM streaks WHERE user_id = ?1",
                [user_id],
                streak_from_row,
            )
            .optional()?;
        Ok(streak)
    }

    fn update_streak(
        &self,
        user_id: &str,
        apply: &mut StreakUpdate<'_>,
    ) -> StoreResult<Option<StreakState>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing = tx
            .query_row(
                "SELECT user_id, current_streak, longest_streak, last_activity FROM streaks WHERE user_id = ?1",
                [user_id],
                streak_from_row,
            )
            .optional()?;

        let Some(next) = apply(existing.as_ref()) else {
            return Ok(None); // rollback on drop, nothing written
        };

        tx.execute(
            r#"INSERT INTO streaks (user_id, current_streak, longest_streak, last_activity)
               VALUES (?1, ?2, ?3, ?4)
               ON CONFLICT(user_id) DO UPDATE SET
                   current_streak = ?2, longest_streak = ?3, last_activity = ?4"#,
            params![
                user_id,
                next.current,
                next.longest,
                next.last_activity.format("%Y-%m-%d").to_string(),
            ],
        )?;
        tx.commit()?;
        Ok(Some(next))
    }

    fn upsert_badge(&self, badge: &NewBadge) -> StoreResult<Badge> {
        let conn = self.conn()?;
        conn.execute(
            r#"INSERT INTO badges (name, description, rarity) VALUES (?1, ?2, ?3)
               ON CONFLICT(name) DO UPDATE SET description = excluded.description, rarity = excluded.rarity"#,
            params![badge.name, badge.description, badge.rarity.as_str()],
        )?;
        let stored = conn.query_row(
            "SELECT id, name, description, rarity FROM badges WHERE name = ?1",
            [&badge.name],
            badge_from_row,
        )?;
        Ok(stored)
    }

    fn badge_by_name(&self, name: &str) -> StoreResult<Option<Badge>> {
        let conn = self.conn()?;
        let badge = conn
            .query_row(
                "SELECT id, name, description, rarity FROM badges WHERE name = ?1",
                [name],
                badge_from_row,
            )
            .optional()?;
        Ok(badge)
    }

    fn owned_badge_ids(&self, user_id: &str) -> StoreResult<Vec<i64>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT badge_id FROM user_badges WHERE user_id = ?1")?;
        let ids = stmt
            .query_map([user_id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<i64>>>()?;
        Ok(ids)
    }

    fn insert_user_badge(
        &self,
        user_id: &str,
        badge_id: i64,
        earned_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let conn = self.conn()?;
        // UNIQUE(user_id, badge_id) turns a duplicate grant into a no-op
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO user_badges (user_id, badge_id, earned_at) VALUES (?1, ?2, ?3)",
            params![user_id, badge_id, to_ms(earned_at)],
        )?;
        Ok(inserted == 1)
    }

    fn held_badges(&self, user_id: &str) -> StoreResult<Vec<HeldBadge>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT b.id, b.name, b.description, b.rarity, ub.earned_at
               FROM user_badges ub JOIN badges b ON b.id = ub.badge_id
               WHERE ub.user_id = ?1 ORDER BY ub.earned_at, b.id"#,
        )?;
        let held = stmt
            .query_map([user_id], |row| {
                Ok(HeldBadge {
                    badge: badge_from_row(row)?,
                    earned_at: from_ms(row.get(4)?)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(held)
    }

    fn insert_challenge(&self, challenge: &NewChallenge) -> StoreResult<Challenge> {
        let conn = self.conn()?;
        conn.execute(
            r#"INSERT INTO challenges
               (kind, title, target_value, xp_reward, coin_reward, start_time, end_time, active)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"#,
            params![
                challenge.kind.as_str(), challenge.title, challenge.target_value,
                challenge.xp_reward, challenge.coin_reward, to_ms(challenge.start_time),
                to_ms(challenge.end_time), challenge.active,
            ],
        )?;
        let id = conn.last_insert_rowid();
        let stored = conn.query_row(
            &format!("SELECT {CHALLENGE_COLUMNS} FROM challenges c WHERE c.id = ?1"),
            [id],
            |row| challenge_from_row(row, 0),
        )?;
        Ok(stored)
    }

    fn active_challenges(&self, now: DateTime<Utc>) -> StoreResult<Vec<Challenge>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {CHALLENGE_COLUMNS} FROM challenges c WHERE c.active = 1 AND c.end_time >= ?1 ORDER BY c.id"
        ))?;
        let challenges = stmt
            .query_map([to_ms(now)], |row| challenge_from_row(row, 0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(challenges)
    }

    fn user_challenges(&self, user_id: &str) -> StoreResult<Vec<EnrolledChallenge>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            r#"SELECT {CHALLENGE_COLUMNS}, {USER_CHALLENGE_COLUMNS}
               FROM user_challenges uc JOIN challenges c ON c.id = uc.challenge_id
               WHERE uc.user_id = ?1 ORDER BY uc.id"#
        ))?;
        let enrolled = stmt
            .query_map([user_id], |row| {
                Ok(EnrolledChallenge {
                    challenge: challenge_from_row(row, 0)?,
                    progress: user_challenge_from_row(row, 9)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(enrolled)
    }

    fn enroll(
        &self,
        user_id: &str,
        challenge_id: i64,
        enrolled_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let conn = self.conn()?;
        let inserted = conn.execute(
            r#"INSERT OR IGNORE INTO user_challenges
               (user_id, challenge_id, current_value, completed, enrolled_at)
               VALUES (?1, ?2, 0, 0, ?3)"#,
            params![user_id, challenge_id, to_ms(enrolled_at)],
        )?;
        Ok(inserted == 1)
    }

    fn update_user_challenge(
        &self,
        user_id: &str,
        challenge_id: i64,
        apply: &mut ChallengeUpdate<'_>,
    ) -> StoreResult<Option<UserChallenge>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing = tx
            .query_row(
                &format!(
                    "SELECT {USER_CHALLENGE_COLUMNS} FROM user_challenges uc WHERE uc.user_id = ?1 AND uc.challenge_id = ?2"
                ),
                params![user_id, challenge_id],
                |row| user_challenge_from_row(row, 0),
            )
            .optional()?;

        let Some(existing) = existing else {
            return Ok(None);
        };
        let Some(next) = apply(&existing) else {
            return Ok(None);
        };

        tx.execute(
            r#"UPDATE user_challenges SET current_value = ?3, completed = ?4, completed_at = ?5
               WHERE user_id = ?1 AND challenge_id = ?2"#,
            params![
                user_id,
                challenge_id,
                next.current_value,
                next.completed,
                next.completed_at.map(to_ms),
            ],
        )?;
        tx.commit()?;
        Ok(Some(next))
    }
}

/// SQL schema for the progression database
const SCHEMA_SQL: &str = r#"
-- Append-only reward history (audit trail)
CREATE TABLE IF NOT EXISTS ledger (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    kind TEXT NOT NULL,
    xp INTEGER NOT NULL,
    coins INTEGER NOT NULL,
    reference_id TEXT,
    description TEXT NOT NULL,
    created_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_ledger_user ON ledger(user_id);
CREATE INDEX IF NOT EXISTS idx_ledger_user_kind ON ledger(user_id, kind);

-- Running totals per user
CREATE TABLE IF NOT EXISTS progression (
    user_id TEXT PRIMARY KEY,
    total_xp INTEGER NOT NULL DEFAULT 0,
    coins INTEGER NOT NULL DEFAULT 0,
    level INTEGER NOT NULL DEFAULT 1,
    updated_at INTEGER NOT NULL
);

-- Daily activity streaks
CREATE TABLE IF NOT EXISTS streaks (
    user_id TEXT PRIMARY KEY,
    current_streak INTEGER NOT NULL DEFAULT 0,
    longest_streak INTEGER NOT NULL DEFAULT 0,
    last_activity TEXT NOT NULL,
    CHECK (longest_streak >= current_streak)
);

-- Badge catalog (seeded, not mutated by grants)
CREATE TABLE IF NOT EXISTS badges (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL DEFAULT '',
    rarity TEXT NOT NULL DEFAULT 'common'
);

-- Badges held by users, at most once each
CREATE TABLE IF NOT EXISTS user_badges (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    badge_id INTEGER NOT NULL REFERENCES badges(id),
    earned_at INTEGER NOT NULL,
    UNIQUE (user_id, badge_id)
);

-- Time-boxed challenges (externally managed)
CREATE TABLE IF NOT EXISTS challenges (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    kind TEXT NOT NULL,
    title TEXT NOT NULL DEFAULT '',
    target_value INTEGER NOT NULL,
    xp_reward INTEGER NOT NULL DEFAULT 0,
    coin_reward INTEGER NOT NULL DEFAULT 0,
    start_time INTEGER NOT NULL,
    end_time INTEGER NOT NULL,
    active INTEGER NOT NULL DEFAULT 1
);
CREATE INDEX IF NOT EXISTS idx_challenges_active ON challenges(active, end_time);

-- Challenge progress per user
CREATE TABLE IF NOT EXISTS user_challenges (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    challenge_id INTEGER NOT NULL REFERENCES challenges(id),
    current_value INTEGER NOT NULL DEFAULT 0,
    completed INTEGER NOT NULL DEFAULT 0,
    completed_at INTEGER,
    enrolled_at INTEGER NOT NULL,
    UNIQUE (user_id, challenge_id)
);
CREATE INDEX IF NOT EXISTS idx_user_challenges_user ON user_challenges(user_id);

-- Schema version
CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY);
"#;
