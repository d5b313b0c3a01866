//! Results returned by engine operations
//!
//! Engine operations never return `Err`. A storage failure is logged and
//! carried in [`Outcome::error`] next to a default value, so the business
//! action that triggered the call always proceeds.

use std::fmt::Display;

use serde::Serialize;
use tracing::warn;

use crate::levels::LevelUp;
use crate::models::{
    Badge, EnrolledChallenge, HeldBadge, LedgerEntry, ProgressionAggregate, StreakState,
};
use crate::notify::Delivery;

/// Value of an engine operation plus the failure that replaced it, if any
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Outcome<T> {
    pub value: T,
    pub error: Option<String>,
}

impl<T: Default> Outcome<T> {
    pub fn ok(value: T) -> Self {
        Self { value, error: None }
    }

    /// Log and wrap a failure
    pub fn failed(operation: &str, user_id: &str, error: impl Display) -> Self {
        warn!(operation, user_id, "Progression operation failed: {}", error);
        Self {
            value: T::default(),
            error: Some(error.to_string()),
        }
    }

    pub(crate) fn from_result<E: Display>(
        operation: &str,
        user_id: &str,
        result: Result<T, E>,
    ) -> Self {
        match result {
            Ok(value) => Self::ok(value),
            Err(e) => Self::failed(operation, user_id, e),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of one reward grant
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Grant {
    /// A ledger entry was written
    pub granted: bool,
    pub xp: i64,
    pub coins: i64,
    pub level_up: Option<LevelUp>,
    /// Secondary, ignorable result of the notification side effect
    pub notification: Delivery,
}

/// Result of a streak touch
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StreakTouch {
    pub streak: u32,
    pub longest: u32,
    pub already_touched_today: bool,
    /// Bonus paid when the streak hit a multiple of the bonus interval
    pub bonus: Option<Grant>,
}

/// Result of a badge evaluation
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BadgeReport {
    pub newly_awarded: u32,
    /// Names of the badges granted by this evaluation
    pub awarded: Vec<String>,
}

/// Result of auto-enrollment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Enrollment {
    pub enrolled: u32,
}

/// Result of recording challenge progress
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProgressReport {
    /// Enrollments whose value changed
    pub advanced: u32,
    /// Challenges completed by this event
    pub completed: Vec<i64>,
}

/// Result of recomputing an aggregate from the ledger
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Reconciliation {
    pub before: Option<ProgressionAggregate>,
    pub after: Option<ProgressionAggregate>,
    pub drifted: bool,
}

/// Everything the engine knows about one user
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Profile {
    pub aggregate: Option<ProgressionAggregate>,
    pub title: String,
    pub progress_to_next: f32,
    pub streak: Option<StreakState>,
    pub badges: Vec<HeldBadge>,
    pub challenges: Vec<EnrolledChallenge>,
    pub recent: Vec<LedgerEntry>,
}

/// Catalog rows written by seeding
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeedReport {
    pub badges: Vec<Badge>,
}
