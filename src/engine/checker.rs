//! Badge evaluation
//!
//! Evaluates [`BADGE_RULES`] against a fresh [`UserStats`] snapshot and grants
//! each newly satisfied badge at most once.

use std::collections::HashSet;

use tracing::{debug, info};

use super::{BadgeReport, Outcome, RewardEngine, SeedReport};
use crate::badges::BADGE_RULES;
use crate::models::UserStats;
use crate::rewards::EventKind;
use crate::store::StoreResult;

impl RewardEngine {
    /// Grant every badge whose rule now holds and the user does not yet own.
    ///
    /// A storage error aborts the evaluation; badges granted before the error
    /// stay granted.
    pub fn evaluate_badges(&self, user_id: &str) -> Outcome<BadgeReport> {
        Outcome::from_result("evaluate_badges", user_id, self.check_badges(user_id))
    }

    /// Snapshot of the numbers badge rules look at
    pub fn user_stats(&self, user_id: &str) -> Outcome<UserStats> {
        Outcome::from_result("user_stats", user_id, self.load_stats(user_id))
    }

    /// Upsert a catalog entry for every badge rule
    pub fn seed_badges(&self) -> Outcome<SeedReport> {
        let seeded: StoreResult<SeedReport> = BADGE_RULES
            .iter()
            .map(|rule| self.store.upsert_badge(&rule.catalog_entry()))
            .collect::<StoreResult<Vec<_>>>()
            .map(|badges| SeedReport { badges });
        Outcome::from_result("seed_badges", "*", seeded)
    }

    fn load_stats(&self, user_id: &str) -> StoreResult<UserStats> {
        let activity = self.activity.activity(user_id)?;
        let streak = self.store.streak(user_id)?;
        let level = self.store.aggregate(user_id)?.map(|a| a.level).unwrap_or(1);

        Ok(UserStats {
            lessons_completed: activity.lessons_completed,
            reviews_written: activity.reviews_written,
            current_streak: streak.as_ref().map(|s| s.current).unwrap_or(0),
            longest_streak: streak.as_ref().map(|s| s.longest).unwrap_or(0),
            level,
            quizzes_completed: activity.quizzes_completed,
            lessons_delivered: activity.lessons_delivered,
            reviews_received: activity.reviews_received,
            average_rating: activity.average_rating,
        })
    }

    fn check_badges(&self, user_id: &str) -> StoreResult<BadgeReport> {
        let stats = self.load_stats(user_id)?;
        let owned: HashSet<i64> = self.store.owned_badge_ids(user_id)?.into_iter().collect();
        let mut report = BadgeReport::default();

        for rule in BADGE_RULES {
            if !rule.is_earned(&stats) {
                continue;
            }

            let Some(badge) = self.store.badge_by_name(rule.name)? else {
                debug!(badge = rule.name, "Badge not in catalog, skipping");
                continue;
            };
            if owned.contains(&badge.id) {
                continue;
            }

            // The store's uniqueness check decides when two evaluations race
            if !self.store.insert_user_badge(user_id, badge.id, self.clock.now())? {
                debug!(user_id, badge = rule.name, "Badge already granted concurrently");
                continue;
            }

            info!(user_id, badge = rule.name, "Badge earned");
            let reference = badge.id.to_string();
            let description = format!("Earned badge: {}", badge.name);
            self.award_reward(
                user_id,
                EventKind::BadgeEarned.as_str(),
                Some(&reference),
                Some(&description),
            );

            report.newly_awarded += 1;
            report.awarded.push(badge.name);
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::activity::{ActivityCounts, StaticActivity};
    use crate::notify::NullNotifier;
    use crate::store::{MemoryStore, ProgressionStore};

    #[test]
    fn test_uncatalogued_badges_are_skipped() {
        let store = Arc::new(MemoryStore::new());
        let activity = Arc::new(StaticActivity::new());
        activity.set(
            "u1",
            ActivityCounts {
                lessons_completed: 3,
                ..Default::default()
            },
        );
        let engine = RewardEngine::new(store.clone())
            .with_activity(activity)
            .with_notifier(Arc::new(NullNotifier));

        let outcome = engine.evaluate_badges("u1");
        assert!(outcome.is_success());
        assert_eq!(outcome.value.newly_awarded, 0);
        assert!(store.ledger("u1", 10).unwrap().is_empty());
    }

    #[test]
    fn test_seed_badges_is_repeatable() {
        let store = Arc::new(MemoryStore::new());
        let engine = RewardEngine::new(store.clone()).with_notifier(Arc::new(NullNotifier));

        let first = engine.seed_badges();
        let second = engine.seed_badges();
        assert_eq!(first.value.badges.len(), BADGE_RULES.len());
        assert_eq!(first.value.badges, second.value.badges);
        assert!(store.badge_by_name("Week Warrior").unwrap().is_some());
    }
}
