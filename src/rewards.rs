//! Reward table: event kind to (xp, coins)
//!
//! Adding an event kind is a data change: a new [`EventKind`] variant plus one
//! row in [`REWARD_TABLE`]. Unknown kinds resolve to a zero reward.

use serde::Serialize;

use crate::models::ChallengeKind;

/// Named categories of business occurrence that earn rewards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    LessonCompleted,
    QuizCompleted,
    StreakBonus,
    ReviewWritten,
    Referral,
    DailyLogin,
    BadgeEarned,
    LessonDelivered,
    StudentReviewReceived,
    TutorMilestone,
    /// Paid from the challenge's own reward, not from the table
    ChallengeCompleted,
}

impl EventKind {
    /// Get the string ID used in the ledger
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LessonCompleted => "lesson_completed",
            Self::QuizCompleted => "quiz_completed",
            Self::StreakBonus => "streak_bonus",
            Self::ReviewWritten => "review_written",
            Self::Referral => "referral",
            Self::DailyLogin => "daily_login",
            Self::BadgeEarned => "badge_earned",
            Self::LessonDelivered => "lesson_delivered",
            Self::StudentReviewReceived => "student_review_received",
            Self::TutorMilestone => "tutor_milestone",
            Self::ChallengeCompleted => "challenge_completed",
        }
    }

    /// Parse from a ledger / caller string
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "lesson_completed" => Some(Self::LessonCompleted),
            "quiz_completed" => Some(Self::QuizCompleted),
            "streak_bonus" => Some(Self::StreakBonus),
            "review_written" => Some(Self::ReviewWritten),
            "referral" => Some(Self::Referral),
            "daily_login" => Some(Self::DailyLogin),
            "badge_earned" => Some(Self::BadgeEarned),
            "lesson_delivered" => Some(Self::LessonDelivered),
            "student_review_received" => Some(Self::StudentReviewReceived),
            "tutor_milestone" => Some(Self::TutorMilestone),
            "challenge_completed" => Some(Self::ChallengeCompleted),
            _ => None,
        }
    }

    /// Human readable label, used as the default ledger description
    pub fn label(&self) -> &'static str {
        match self {
            Self::LessonCompleted => "Lesson completed",
            Self::QuizCompleted => "Quiz completed",
            Self::StreakBonus => "Streak bonus",
            Self::ReviewWritten => "Review written",
            Self::Referral => "Referral",
            Self::DailyLogin => "Daily login",
            Self::BadgeEarned => "Badge earned",
            Self::LessonDelivered => "Lesson delivered",
            Self::StudentReviewReceived => "Student review received",
            Self::TutorMilestone => "Tutor milestone",
            Self::ChallengeCompleted => "Challenge completed",
        }
    }

    /// Challenge type this event advances, if any
    pub fn challenge_kind(&self) -> Option<ChallengeKind> {
        match self {
            Self::LessonCompleted => Some(ChallengeKind::Lessons),
            Self::QuizCompleted => Some(ChallengeKind::Quizzes),
            Self::ReviewWritten => Some(ChallengeKind::Reviews),
            Self::Referral => Some(ChallengeKind::Referrals),
            Self::DailyLogin => Some(ChallengeKind::Logins),
            Self::LessonDelivered => Some(ChallengeKind::Teaching),
            Self::StreakBonus => Some(ChallengeKind::Streak),
            Self::BadgeEarned
            | Self::StudentReviewReceived
            | Self::TutorMilestone
            | Self::ChallengeCompleted => None,
        }
    }
}

/// XP and coins paid for one event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Reward {
    pub xp: i64,
    pub coins: i64,
}

impl Reward {
    pub const fn new(xp: i64, coins: i64) -> Self {
        Self { xp, coins }
    }

    pub fn is_zero(&self) -> bool {
        self.xp == 0 && self.coins == 0
    }
}

/// Static reward per event kind
pub static REWARD_TABLE: &[(EventKind, Reward)] = &[
    (EventKind::LessonCompleted, Reward::new(50, 10)),
    (EventKind::QuizCompleted, Reward::new(20, 5)),
    (EventKind::StreakBonus, Reward::new(10, 2)),
    (EventKind::ReviewWritten, Reward::new(15, 3)),
    (EventKind::Referral, Reward::new(200, 50)),
    (EventKind::DailyLogin, Reward::new(5, 1)),
    (EventKind::BadgeEarned, Reward::new(25, 5)),
    (EventKind::LessonDelivered, Reward::new(30, 5)),
    (EventKind::StudentReviewReceived, Reward::new(10, 2)),
    (EventKind::TutorMilestone, Reward::new(100, 20)),
];

/// Look up the reward for an event kind string; unknown kinds pay nothing
pub fn reward_for(kind: &str) -> Reward {
    EventKind::from_str(kind)
        .and_then(|kind| {
            REWARD_TABLE
                .iter()
                .find(|(k, _)| *k == kind)
                .map(|(_, reward)| *reward)
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_values() {
        assert_eq!(reward_for("lesson_completed"), Reward::new(50, 10));
        assert_eq!(reward_for("referral"), Reward::new(200, 50));
        assert_eq!(reward_for("tutor_milestone"), Reward::new(100, 20));
        assert_eq!(reward_for("badge_earned"), Reward::new(25, 5));
    }

    #[test]
    fn test_unknown_and_unpriced_kinds_are_zero() {
        assert!(reward_for("unknown_kind").is_zero());
        assert!(reward_for("").is_zero());
        assert!(reward_for("challenge_completed").is_zero());
    }

    #[test]
    fn test_kind_strings_parse_back() {
        for (kind, _) in REWARD_TABLE {
            assert_eq!(EventKind::from_str(kind.as_str()), Some(*kind));
        }
    }

    #[test]
    fn test_challenge_mapping() {
        assert_eq!(
            EventKind::LessonCompleted.challenge_kind(),
            Some(ChallengeKind::Lessons)
        );
        assert_eq!(
            EventKind::QuizCompleted.challenge_kind(),
            Some(ChallengeKind::Quizzes)
        );
        assert_eq!(EventKind::BadgeEarned.challenge_kind(), None);
    }
}
