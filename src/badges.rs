//! Badge rule table
//!
//! Each rule pairs a catalog badge name with a pure predicate over
//! [`UserStats`]. Rules are independent booleans, so table order does not
//! change which badges a user earns. New badges are a new row here plus a
//! catalog entry; the evaluation loop never changes.

use crate::models::{NewBadge, Rarity, UserStats};

/// A badge and the condition that earns it
#[derive(Debug, Clone)]
pub struct BadgeRule {
    /// Catalog name the rule resolves to
    pub name: &'static str,
    pub description: &'static str,
    pub rarity: Rarity,
    pub earned: fn(&UserStats) -> bool,
}

impl BadgeRule {
    pub fn is_earned(&self, stats: &UserStats) -> bool {
        (self.earned)(stats)
    }

    /// Catalog row for seeding
    pub fn catalog_entry(&self) -> NewBadge {
        NewBadge {
            name: self.name.to_string(),
            description: self.description.to_string(),
            rarity: self.rarity,
        }
    }
}

/// All badge rules
pub static BADGE_RULES: &[BadgeRule] = &[
    // === LEARNING ===
    BadgeRule {
        name: "First Lesson",
        description: "Complete your first lesson",
        rarity: Rarity::Common,
        earned: |s| s.lessons_completed >= 1,
    },
    BadgeRule {
        name: "Eager Learner",
        description: "Complete 5 lessons",
        rarity: Rarity::Common,
        earned: |s| s.lessons_completed >= 5,
    },
    BadgeRule {
        name: "Dedicated Student",
        description: "Complete 25 lessons",
        rarity: Rarity::Rare,
        earned: |s| s.lessons_completed >= 25,
    },
    BadgeRule {
        name: "Scholar",
        description: "Complete 100 lessons",
        rarity: Rarity::Epic,
        earned: |s| s.lessons_completed >= 100,
    },
    BadgeRule {
        name: "Quiz Whiz",
        description: "Complete 10 quizzes",
        rarity: Rarity::Common,
        earned: |s| s.quizzes_completed >= 10,
    },
    BadgeRule {
        name: "Critic",
        description: "Write your first review",
        rarity: Rarity::Common,
        earned: |s| s.reviews_written >= 1,
    },
    // === STREAKS ===
    BadgeRule {
        name: "On Fire",
        description: "Keep a 3-day streak",
        rarity: Rarity::Common,
        earned: |s| s.longest_streak >= 3,
    },
    BadgeRule {
        name: "Week Warrior",
        description: "Keep a 7-day streak",
        rarity: Rarity::Rare,
        earned: |s| s.longest_streak >= 7,
    },
    BadgeRule {
        name: "Unstoppable",
        description: "Keep a 30-day streak",
        rarity: Rarity::Legendary,
        earned: |s| s.longest_streak >= 30,
    },
    // === LEVELS ===
    BadgeRule {
        name: "Rising Star",
        description: "Reach level 5",
        rarity: Rarity::Rare,
        earned: |s| s.level >= 5,
    },
    BadgeRule {
        name: "Master Mind",
        description: "Reach level 12",
        rarity: Rarity::Epic,
        earned: |s| s.level >= 12,
    },
    // === TUTORS ===
    BadgeRule {
        name: "First Class",
        description: "Deliver your first lesson as a tutor",
        rarity: Rarity::Common,
        earned: |s| s.lessons_delivered >= 1,
    },
    BadgeRule {
        name: "Seasoned Tutor",
        description: "Deliver 50 lessons as a tutor",
        rarity: Rarity::Epic,
        earned: |s| s.lessons_delivered >= 50,
    },
    // Needs an ActivitySource that supplies ratings; LedgerActivity reports 0.0
    BadgeRule {
        name: "Top Rated",
        description: "Receive 10 reviews with an average rating of 4.5 or more",
        rarity: Rarity::Legendary,
        earned: |s| s.reviews_received >= 10 && s.average_rating >= 4.5,
    },
];

/// Rules whose predicate holds for `stats`
pub fn earned_rules(stats: &UserStats) -> impl Iterator<Item = &'static BadgeRule> + '_ {
    BADGE_RULES.iter().filter(move |rule| rule.is_earned(stats))
}
