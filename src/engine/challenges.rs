//! Challenge progress tracking
//!
//! Counter challenges count matching events; streak challenges mirror the
//! user's live streak. Completion is terminal and pays the challenge's own
//! reward exactly once.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::{Enrollment, Outcome, ProgressReport, RewardEngine};
use crate::models::{ChallengeKind, EnrolledChallenge, UserChallenge};
use crate::rewards::{EventKind, Reward};
use crate::store::StoreResult;

/// New enrollment state for a counter or streak update, or `None` to leave
/// the row untouched
fn advance(
    row: &UserChallenge,
    kind: &ChallengeKind,
    target: u32,
    streak: u32,
    now: DateTime<Utc>,
) -> Option<UserChallenge> {
    if row.completed {
        return None;
    }

    let value = match kind {
        ChallengeKind::Streak => streak,
        _ => row.current_value.saturating_add(1),
    };
    let completed = value >= target;
    if value == row.current_value && !completed {
        return None;
    }

    Some(UserChallenge {
        current_value: value,
        completed,
        completed_at: completed.then_some(now),
        ..row.clone()
    })
}

impl RewardEngine {
    /// Enroll the user in every active, unended challenge they have not joined.
    /// Never removes enrollments.
    pub fn auto_enroll(&self, user_id: &str) -> Outcome<Enrollment> {
        Outcome::from_result("auto_enroll", user_id, self.enroll_active(user_id))
    }

    /// Advance the user's open challenges for one event.
    ///
    /// Streak challenges are set to the current streak on every call; counter
    /// challenges whose type matches the event are incremented by one.
    pub fn record_progress(&self, user_id: &str, kind: &str) -> Outcome<ProgressReport> {
        Outcome::from_result("record_progress", user_id, self.progress(user_id, kind))
    }

    fn enroll_active(&self, user_id: &str) -> StoreResult<Enrollment> {
        let now = self.clock.now();
        let active = self.store.active_challenges(now)?;
        let joined: HashSet<i64> = self
            .store
            .user_challenges(user_id)?
            .into_iter()
            .map(|e| e.challenge.id)
            .collect();

        let mut enrollment = Enrollment::default();
        for challenge in active.iter().filter(|c| !joined.contains(&c.id)) {
            if self.store.enroll(user_id, challenge.id, now)? {
                debug!(user_id, challenge_id = challenge.id, "Enrolled in challenge");
                enrollment.enrolled += 1;
            }
        }
        Ok(enrollment)
    }

    fn progress(&self, user_id: &str, kind: &str) -> StoreResult<ProgressReport> {
        let now = self.clock.now();
        let mapped = EventKind::from_str(kind).and_then(|k| k.challenge_kind());

        let open: Vec<EnrolledChallenge> = self
            .store
            .user_challenges(user_id)?
            .into_iter()
            .filter(|e| !e.progress.completed && !e.challenge.has_ended(now))
            .collect();

        let mut streak: Option<u32> = None;
        let mut report = ProgressReport::default();

        for enrolled in open {
            let challenge = &enrolled.challenge;
            let live_streak = match &challenge.kind {
                ChallengeKind::Streak => match streak {
                    Some(value) => value,
                    None => {
                        let value = self.store.streak(user_id)?.map(|s| s.current).unwrap_or(0);
                        streak = Some(value);
                        value
                    }
                },
                other if Some(other) == mapped.as_ref() => 0,
                _ => continue,
            };

            let written = self.store.update_user_challenge(
                user_id,
                challenge.id,
                &mut |row: &UserChallenge| {
                    advance(row, &challenge.kind, challenge.target_value, live_streak, now)
                },
            )?;
            let Some(row) = written else {
                continue;
            };

            report.advanced += 1;
            if row.completed {
                info!(
                    user_id,
                    challenge_id = challenge.id,
                    "Challenge completed: {}", challenge.title
                );
                let reference = challenge.id.to_string();
                let description = format!("Completed challenge: {}", challenge.title);
                self.award_amount(
                    user_id,
                    EventKind::ChallengeCompleted.as_str(),
                    Reward::new(challenge.xp_reward, challenge.coin_reward),
                    Some(&reference),
                    Some(&description),
                );
                report.completed.push(challenge.id);
            }
        }

        Ok(report)
    }
}
