//! Reward dispatcher
//!
//! Looks up the reward for an event, writes the ledger entry and aggregate
//! delta in one store call, then sends a best-effort notification.

use tracing::{debug, info};

use super::{Grant, Outcome, RewardEngine};
use crate::levels::LevelUp;
use crate::models::LedgerEntry;
use crate::notify::{Delivery, NoticeKind};
use crate::rewards::{EventKind, Reward, reward_for};
use crate::store::StoreResult;

impl RewardEngine {
    /// Award the table reward for `kind`.
    ///
    /// Unknown or zero-value kinds are a successful no-op: nothing is written
    /// and zero deltas are returned, so callers may dispatch any event kind.
    pub fn award_reward(
        &self,
        user_id: &str,
        kind: &str,
        reference_id: Option<&str>,
        description: Option<&str>,
    ) -> Outcome<Grant> {
        let reward = reward_for(kind);
        if reward.is_zero() {
            debug!(user_id, kind, "No reward for event kind");
            return Outcome::ok(Grant::default());
        }
        self.award_amount(user_id, kind, reward, reference_id, description)
    }

    /// Award an explicit amount, bypassing the table.
    ///
    /// Used for rewards defined elsewhere, e.g. a challenge's own payout.
    pub fn award_amount(
        &self,
        user_id: &str,
        kind: &str,
        reward: Reward,
        reference_id: Option<&str>,
        description: Option<&str>,
    ) -> Outcome<Grant> {
        if reward.is_zero() {
            debug!(user_id, kind, "Zero reward, nothing to grant");
            return Outcome::ok(Grant::default());
        }

        let description = description
            .map(str::to_string)
            .or_else(|| EventKind::from_str(kind).map(|k| k.label().to_string()))
            .unwrap_or_else(|| kind.to_string());

        let mut outcome = Outcome::from_result(
            "award_reward",
            user_id,
            self.write_grant(user_id, kind, reward, reference_id, &description),
        );

        if outcome.value.granted {
            outcome.value.notification =
                self.send_grant_notice(user_id, kind, &description, &outcome.value);
        }
        outcome
    }

    fn write_grant(
        &self,
        user_id: &str,
        kind: &str,
        reward: Reward,
        reference_id: Option<&str>,
        description: &str,
    ) -> StoreResult<Grant> {
        let entry = LedgerEntry {
            user_id: user_id.to_string(),
            kind: kind.to_string(),
            xp: reward.xp,
            coins: reward.coins,
            reference_id: reference_id.map(str::to_string),
            description: description.to_string(),
            created_at: self.clock.now(),
        };

        let aggregate = self.store.apply_grant(&entry)?;
        let level_up = LevelUp::between(aggregate.total_xp - reward.xp, aggregate.total_xp);

        info!(
            user_id,
            kind,
            xp = reward.xp,
            coins = reward.coins,
            total_xp = aggregate.total_xp,
            "Reward granted"
        );
        if let Some(up) = &level_up {
            info!(user_id, new_level = up.new_level, "Level up: {}", up.title);
        }

        Ok(Grant {
            granted: true,
            xp: reward.xp,
            coins: reward.coins,
            level_up,
            notification: Delivery::Skipped,
        })
    }

    /// Fire-and-forget notification; failures only show up in the Delivery
    fn send_grant_notice(
        &self,
        user_id: &str,
        kind: &str,
        description: &str,
        grant: &Grant,
    ) -> Delivery {
        if !self.settings.notifications {
            return Delivery::Skipped;
        }

        let notice_kind = match EventKind::from_str(kind) {
            Some(EventKind::StreakBonus) => NoticeKind::Streak,
            Some(EventKind::BadgeEarned) => NoticeKind::Badge,
            Some(EventKind::ChallengeCompleted) => NoticeKind::Challenge,
            _ => NoticeKind::Reward,
        };

        let title = format!("+{} XP, +{} coins", grant.xp, grant.coins);
        let message = match &grant.level_up {
            Some(up) => format!(
                "{} - you reached level {} ({})!",
                description, up.new_level, up.title
            ),
            None => description.to_string(),
        };

        let delivery =
            Delivery::from_result(self.notifier.notify(user_id, &title, &message, notice_kind));
        if let Delivery::Failed(reason) = &delivery {
            debug!(user_id, kind, "Notification dropped: {}", reason);
        }
        delivery
    }
}
