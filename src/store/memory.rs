//! In-process store
//!
//! All tables live behind a single mutex, so every port method is atomic.
//! Used by tests and by embedders that do not need persistence.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use super::{ChallengeUpdate, ProgressionStore, StoreError, StoreResult, StreakUpdate};
use crate::levels::Level;
use crate::models::{
    Badge, Challenge, EnrolledChallenge, HeldBadge, LedgerEntry, LedgerTotals, NewBadge,
    NewChallenge, ProgressionAggregate, StreakState, UserChallenge,
};

#[derive(Debug, Default)]
struct Tables {
    ledger: Vec<LedgerEntry>,
    aggregates: HashMap<String, ProgressionAggregate>,
    streaks: HashMap<String, StreakState>,
    badges: Vec<Badge>,
    /// (user_id, badge_id) -> earned_at
    user_badges: HashMap<(String, i64), DateTime<Utc>>,
    challenges: Vec<Challenge>,
    /// Insertion ordered enrollments
    user_challenges: Vec<UserChallenge>,
    next_badge_id: i64,
    next_challenge_id: i64,
}

/// Store backed by process memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.tables.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl ProgressionStore for MemoryStore {
    fn apply_grant(&self, entry: &LedgerEntry) -> StoreResult<ProgressionAggregate> {
        let mut tables = self.tables()?;
        tables.ledger.push(entry.clone());

        let aggregate = tables
            .aggregates
            .entry(entry.user_id.clone())
            .or_insert_with(|| ProgressionAggregate::empty(&entry.user_id, entry.created_at));
        aggregate.total_xp += entry.xp;
        aggregate.coins += entry.coins;
        aggregate.level = Level::for_xp(aggregate.total_xp).level;
        aggregate.updated_at = entry.created_at;
        Ok(aggregate.clone())
    }

    fn aggregate(&self, user_id: &str) -> StoreResult<Option<ProgressionAggregate>> {
        Ok(self.tables()?.aggregates.get(user_id).cloned())
    }

    fn replace_aggregate(&self, aggregate: &ProgressionAggregate) -> StoreResult<()> {
        self.tables()?
            .aggregates
            .insert(aggregate.user_id.clone(), aggregate.clone());
        Ok(())
    }

    fn ledger(&self, user_id: &str, limit: usize) -> StoreResult<Vec<LedgerEntry>> {
        Ok(self
            .tables()?
            .ledger
            .iter()
            .rev()
            .filter(|e| e.user_id == user_id)
            .take(limit)
            .cloned()
            .collect())
    }

    fn ledger_totals(&self, user_id: &str) -> StoreResult<LedgerTotals> {
        let tables = self.tables()?;
        Ok(tables
            .ledger
            .iter()
            .filter(|e| e.user_id == user_id)
            .fold(LedgerTotals::default(), |acc, e| LedgerTotals {
                xp: acc.xp + e.xp,
                coins: acc.coins + e.coins,
                entries: acc.entries + 1,
            }))
    }

    fn count_entries(&self, user_id: &str, kind: &str) -> StoreResult<u64> {
        Ok(self
            .tables()?
            .ledger
            .iter()
            .filter(|e| e.user_id == user_id && e.kind == kind)
            .count() as u64)
    }

    fn streak(&self, user_id: &str) -> StoreResult<Option<StreakState>> {
        Ok(self.tables()?.streaks.get(user_id).cloned())
    }

    fn update_streak(
        &self,
        user_id: &str,
        apply: &mut StreakUpdate<'_>,
    ) -> StoreResult<Option<StreakState>> {
        let mut tables = self.tables()?;
        let next = apply(tables.streaks.get(user_id));
        if let Some(state) = &next {
            tables.streaks.insert(user_id.to_string(), state.clone());
        }
        Ok(next)
    }

    fn upsert_badge(&self, badge: &NewBadge) -> StoreResult<Badge> {
        let mut tables = self.tables()?;
        if let Some(existing) = tables.badges.iter_mut().find(|b| b.name == badge.name) {
            existing.description = badge.description.clone();
            existing.rarity = badge.rarity;
            return Ok(existing.clone());
        }

        tables.next_badge_id += 1;
        let created = Badge {
            id: tables.next_badge_id,
            name: badge.name.clone(),
            description: badge.description.clone(),
            rarity: badge.rarity,
        };
        tables.badges.push(created.clone());
        Ok(created)
    }

    fn badge_by_name(&self, name: &str) -> StoreResult<Option<Badge>> {
        Ok(self
            .tables()?
            .badges
            .iter()
            .find(|b| b.name == name)
            .cloned())
    }

    fn owned_badge_ids(&self, user_id: &str) -> StoreResult<Vec<i64>> {
        Ok(self
            .tables()?
            .user_badges
            .keys()
            .filter(|(user, _)| user == user_id)
            .map(|(_, badge_id)| *badge_id)
            .collect())
    }

    fn insert_user_badge(
        &self,
        user_id: &str,
        badge_id: i64,
        earned_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let mut tables = self.tables()?;
        let key = (user_id.to_string(), badge_id);
        if tables.user_badges.contains_key(&key) {
            return Ok(false);
        }
        tables.user_badges.insert(key, earned_at);
        Ok(true)
    }

    fn held_badges(&self, user_id: &str) -> StoreResult<Vec<HeldBadge>> {
        let tables = self.tables()?;
        let mut held: Vec<HeldBadge> = tables
            .user_badges
            .iter()
            .filter(|((user, _), _)| user == user_id)
            .filter_map(|((_, badge_id), earned_at)| {
                tables
                    .badges
                    .iter()
                    .find(|b| b.id == *badge_id)
                    .map(|badge| HeldBadge {
                        badge: badge.clone(),
                        earned_at: *earned_at,
                    })
            })
            .collect();
        held.sort_by_key(|h| (h.earned_at, h.badge.id));
        Ok(held)
    }

    fn insert_challenge(&self, challenge: &NewChallenge) -> StoreResult<Challenge> {
        let mut tables = self.tables()?;
        tables.next_challenge_id += 1;
        let created = Challenge {
            id: tables.next_challenge_id,
            kind: challenge.kind.clone(),
            title: challenge.title.clone(),
            target_value: challenge.target_value,
            xp_reward: challenge.xp_reward,
            coin_reward: challenge.coin_reward,
            start_time: challenge.start_time,
            end_time: challenge.end_time,
            active: challenge.active,
        };
        tables.challenges.push(created.clone());
        Ok(created)
    }

    fn active_challenges(&self, now: DateTime<Utc>) -> StoreResult<Vec<Challenge>> {
        Ok(self
            .tables()?
            .challenges
            .iter()
            .filter(|c| c.active && !c.has_ended(now))
            .cloned()
            .collect())
    }

    fn user_challenges(&self, user_id: &str) -> StoreResult<Vec<EnrolledChallenge>> {
        let tables = self.tables()?;
        tables
            .user_challenges
            .iter()
            .filter(|uc| uc.user_id == user_id)
            .map(|uc| -> StoreResult<EnrolledChallenge> {
                let challenge = tables
                    .challenges
                    .iter()
                    .find(|c| c.id == uc.challenge_id)
                    .cloned()
                    .ok_or_else(|| StoreError::NotFound(format!("challenge {}", uc.challenge_id)))?;
                Ok(EnrolledChallenge {
                    challenge,
                    progress: uc.clone(),
                })
            })
            .collect()
    }

    fn enroll(
        &self,
        user_id: &str,
        challenge_id: i64,
        _enrolled_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let mut tables = self.tables()?;
        if !tables.challenges.iter().any(|c| c.id == challenge_id) {
            return Err(StoreError::NotFound(format!("challenge {}", challenge_id)));
        }
        if tables
            .user_challenges
            .iter()
            .any(|uc| uc.user_id == user_id && uc.challenge_id == challenge_id)
        {
            return Ok(false);
        }
        tables
            .user_challenges
            .push(UserChallenge::enrolled(user_id, challenge_id));
        Ok(true)
    }

    fn update_user_challenge(
        &self,
        user_id: &str,
        challenge_id: i64,
        apply: &mut ChallengeUpdate<'_>,
    ) -> StoreResult<Option<UserChallenge>> {
        let mut tables = self.tables()?;
        let Some(row) = tables
            .user_challenges
            .iter_mut()
            .find(|uc| uc.user_id == user_id && uc.challenge_id == challenge_id)
        else {
            return Ok(None);
        };

        let next = apply(row);
        if let Some(updated) = &next {
            *row = updated.clone();
        }
        Ok(next)
    }
}
