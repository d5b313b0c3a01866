//! Data models for the progression engine
//!
//! These structures represent the rows stored in and read from a
//! [`ProgressionStore`](crate::store::ProgressionStore).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One reward grant in the append-only ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub user_id: String,
    pub kind: String,
    pub xp: i64,
    pub coins: i64,
    pub reference_id: Option<String>,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Sums over a user's ledger
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LedgerTotals {
    pub xp: i64,
    pub coins: i64,
    pub entries: u64,
}

/// Per-user running totals, maintained incrementally from ledger grants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionAggregate {
    pub user_id: String,
    pub total_xp: i64,
    pub coins: i64,
    pub level: u32,
    pub updated_at: DateTime<Utc>,
}

impl ProgressionAggregate {
    /// A zeroed aggregate, as created lazily on a user's first grant
    pub fn empty(user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            total_xp: 0,
            coins: 0,
            level: 1,
            updated_at: now,
        }
    }
}

/// Daily-activity continuity for one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    pub user_id: String,
    pub current: u32,
    pub longest: u32,
    pub last_activity: NaiveDate,
}

/// Badge rarity tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    #[default]
    Common,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Rare => "rare",
            Self::Epic => "epic",
            Self::Legendary => "legendary",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "common" => Some(Self::Common),
            "rare" => Some(Self::Rare),
            "epic" => Some(Self::Epic),
            "legendary" => Some(Self::Legendary),
            _ => None,
        }
    }
}

/// Catalog entry for a badge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub rarity: Rarity,
}

/// Badge catalog row before the store assigns an id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBadge {
    pub name: String,
    pub description: String,
    pub rarity: Rarity,
}

/// A badge held by a user, with the time it was earned
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeldBadge {
    pub badge: Badge,
    pub earned_at: DateTime<Utc>,
}

/// What a challenge counts
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeKind {
    Lessons,
    Quizzes,
    Reviews,
    Referrals,
    Logins,
    Teaching,
    /// Mirrors the user's live streak instead of counting events
    Streak,
    /// A type this engine does not know how to progress
    #[serde(untagged)]
    Other(String),
}

impl ChallengeKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Lessons => "lessons",
            Self::Quizzes => "quizzes",
            Self::Reviews => "reviews",
            Self::Referrals => "referrals",
            Self::Logins => "logins",
            Self::Teaching => "teaching",
            Self::Streak => "streak",
            Self::Other(s) => s,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "lessons" => Self::Lessons,
            "quizzes" => Self::Quizzes,
            "reviews" => Self::Reviews,
            "referrals" => Self::Referrals,
            "logins" => Self::Logins,
            "teaching" => Self::Teaching,
            "streak" => Self::Streak,
            other => Self::Other(other.to_string()),
        }
    }
}

/// A time-boxed goal, managed outside this engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: i64,
    pub kind: ChallengeKind,
    pub title: String,
    pub target_value: u32,
    pub xp_reward: i64,
    pub coin_reward: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub active: bool,
}

impl Challenge {
    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        self.end_time < now
    }
}

/// Challenge row before the store assigns an id
#[derive(Debug, Clone, PartialEq)]
pub struct NewChallenge {
    pub kind: ChallengeKind,
    pub title: String,
    pub target_value: u32,
    pub xp_reward: i64,
    pub coin_reward: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub active: bool,
}

/// A user's progress on one challenge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserChallenge {
    pub user_id: String,
    pub challenge_id: i64,
    pub current_value: u32,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

impl UserChallenge {
    /// A zeroed enrollment
    pub fn enrolled(user_id: &str, challenge_id: i64) -> Self {
        Self {
            user_id: user_id.to_string(),
            challenge_id,
            current_value: 0,
            completed: false,
            completed_at: None,
        }
    }
}

/// A user's enrollment joined with the challenge definition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrolledChallenge {
    pub challenge: Challenge,
    pub progress: UserChallenge,
}

impl EnrolledChallenge {
    /// Progress fraction (0.0 - 1.0)
    pub fn progress_percent(&self) -> f32 {
        if self.progress.completed || self.challenge.target_value == 0 {
            1.0
        } else {
            (self.progress.current_value as f32 / self.challenge.target_value as f32).min(1.0)
        }
    }
}

/// Snapshot of a user's numbers that badge rules are evaluated against
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserStats {
    pub lessons_completed: u64,
    pub reviews_written: u64,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub level: u32,
    pub quizzes_completed: u64,
    /// Lessons delivered as a tutor
    pub lessons_delivered: u64,
    pub reviews_received: u64,
    pub average_rating: f64,
}
