//! Reward engine - core progression logic
//!
//! [`RewardEngine`] is the single entry point business handlers call after an
//! event. Every grant, bonus included, flows through
//! [`RewardEngine::award_reward`] or its explicit-amount sibling, which append
//! to the ledger and update the aggregate in one store call.
//!
//! ```text
//! event ──► award_reward ──► ledger + aggregate ──► notify (best effort)
//!              ▲
//!              ├── touch_streak     (streak_bonus every N days)
//!              ├── evaluate_badges  (badge_earned per new badge)
//!              └── record_progress  (challenge_completed per completion)
//! ```

mod checker;
mod challenges;
mod dispatch;
mod outcome;
mod profile;
mod reconcile;
mod streaks;
mod timed;

pub use outcome::{
    BadgeReport, Enrollment, Grant, Outcome, Profile, ProgressReport, Reconciliation, SeedReport,
    StreakTouch,
};
pub use streaks::next_streak;
pub use timed::TimedEngine;

use std::sync::Arc;

use crate::activity::{ActivitySource, LedgerActivity};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::notify::{LogNotifier, Notifier};
use crate::store::ProgressionStore;

/// Tunables for the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Pay a streak bonus whenever the streak is a multiple of this
    pub streak_bonus_interval: u32,
    pub notifications: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            streak_bonus_interval: 7,
            notifications: true,
        }
    }
}

impl From<&Config> for EngineSettings {
    fn from(config: &Config) -> Self {
        Self {
            streak_bonus_interval: config.streaks.bonus_interval,
            notifications: config.notifications.enabled,
        }
    }
}

/// Main engine for all progression features
#[derive(Clone)]
pub struct RewardEngine {
    store: Arc<dyn ProgressionStore>,
    notifier: Arc<dyn Notifier>,
    activity: Arc<dyn ActivitySource>,
    clock: Arc<dyn Clock>,
    settings: EngineSettings,
}

impl RewardEngine {
    /// Engine over `store` with log notifications, ledger-derived activity
    /// counts and the system clock
    pub fn new(store: Arc<dyn ProgressionStore>) -> Self {
        Self {
            activity: Arc::new(LedgerActivity::new(Arc::clone(&store))),
            store,
            notifier: Arc::new(LogNotifier),
            clock: Arc::new(SystemClock),
            settings: EngineSettings::default(),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_activity(mut self, activity: Arc<dyn ActivitySource>) -> Self {
        self.activity = activity;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn store(&self) -> &Arc<dyn ProgressionStore> {
        &self.store
    }

    pub fn settings(&self) -> EngineSettings {
        self.settings
    }
}
