//! Streak tracking
//!
//! A streak counts consecutive calendar days with activity. The calendar day
//! is whatever the caller passes in (the server's UTC date for
//! [`RewardEngine::touch_streak_today`]), not the user's local day.

use chrono::NaiveDate;
use tracing::debug;

use super::{Outcome, RewardEngine, StreakTouch};
use crate::models::StreakState;
use crate::rewards::EventKind;

/// Streak after activity on `today`, or `None` if `today` was already counted.
///
/// - no previous state: start at 1
/// - last activity yesterday: extend by 1
/// - any larger gap: reset to 1
/// - last activity today, or a date after `today`: unchanged
pub fn next_streak(
    previous: Option<&StreakState>,
    user_id: &str,
    today: NaiveDate,
) -> Option<StreakState> {
    let Some(prev) = previous else {
        return Some(StreakState {
            user_id: user_id.to_string(),
            current: 1,
            longest: 1,
            last_activity: today,
        });
    };

    let days_since = (today - prev.last_activity).num_days();
    let current = match days_since {
        d if d <= 0 => return None, // already counted, or clock went backwards
        1 => prev.current + 1,
        _ => 1, // Reset
    };

    Some(StreakState {
        user_id: prev.user_id.clone(),
        current,
        longest: prev.longest.max(current),
        last_activity: today,
    })
}

impl RewardEngine {
    /// Record activity for `user_id` on `today`.
    ///
    /// Idempotent within a day. Every `streak_bonus_interval`-th consecutive
    /// day pays a `streak_bonus` through the dispatcher.
    pub fn touch_streak(&self, user_id: &str, today: NaiveDate) -> Outcome<StreakTouch> {
        let mut unchanged: Option<StreakState> = None;
        let written = self.store.update_streak(user_id, &mut |previous: Option<&StreakState>| {
            let next = next_streak(previous, user_id, today);
            if next.is_none() {
                unchanged = previous.cloned();
            }
            next
        });

        let written = match written {
            Ok(written) => written,
            Err(e) => return Outcome::failed("touch_streak", user_id, e),
        };

        let Some(state) = written else {
            let state = unchanged.unwrap_or_else(|| StreakState {
                user_id: user_id.to_string(),
                current: 0,
                longest: 0,
                last_activity: today,
            });
            debug!(user_id, streak = state.current, "Streak already counted today");
            return Outcome::ok(StreakTouch {
                streak: state.current,
                longest: state.longest,
                already_touched_today: true,
                bonus: None,
            });
        };

        let interval = self.settings.streak_bonus_interval;
        let bonus = (interval > 0 && state.current % interval == 0).then(|| {
            let description = format!("{}-day streak", state.current);
            self.award_reward(
                user_id,
                EventKind::StreakBonus.as_str(),
                None,
                Some(&description),
            )
            .value
        });

        Outcome::ok(StreakTouch {
            streak: state.current,
            longest: state.longest,
            already_touched_today: false,
            bonus,
        })
    }

    /// [`touch_streak`](Self::touch_streak) for the engine clock's current day
    pub fn touch_streak_today(&self, user_id: &str) -> Outcome<StreakTouch> {
        self.touch_streak(user_id, self.clock.today())
    }
}
