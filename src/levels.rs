//! XP and Level system
//!
//! Defines level thresholds and titles. A user's level is always derived
//! from total XP, never stored independently of it.

use serde::Serialize;

/// Level definition
#[derive(Debug, Clone)]
pub struct Level {
    pub level: u32,
    pub xp_required: i64,
    pub title: &'static str,
}

/// All level definitions (must be sorted by level)
pub static LEVELS: &[Level] = &[
    Level {
        level: 1,
        xp_required: 0,
        title: "Newcomer",
    },
    Level {
        level: 2,
        xp_required: 100,
        title: "Learner",
    },
    Level {
        level: 3,
        xp_required: 250,
        title: "Learner",
    },
    Level {
        level: 4,
        xp_required: 500,
        title: "Apprentice",
    },
    Level {
        level: 5,
        xp_required: 1000,
        title: "Apprentice",
    },
    Level {
        level: 6,
        xp_required: 1750,
        title: "Practitioner",
    },
    Level {
        level: 7,
        xp_required: 2750,
        title: "Practitioner",
    },
    Level {
        level: 8,
        xp_required: 4000,
        title: "Adept",
    },
    Level {
        level: 9,
        xp_required: 5500,
        title: "Adept",
    },
    Level {
        level: 10,
        xp_required: 7500,
        title: "Expert",
    },
    Level {
        level: 11,
        xp_required: 10000,
        title: "Expert",
    },
    Level {
        level: 12,
        xp_required: 13000,
        title: "Master",
    },
    Level {
        level: 13,
        xp_required: 16500,
        title: "Master",
    },
    Level {
        level: 14,
        xp_required: 20500,
        title: "Grandmaster",
    },
    Level {
        level: 15,
        xp_required: 25000,
        title: "Legend",
    },
];

impl Level {
    /// Calculate level and title for given XP
    pub fn for_xp(xp: i64) -> &'static Level {
        LEVELS
            .iter()
            .rev()
            .find(|l| xp >= l.xp_required)
            .unwrap_or(&LEVELS[0])
    }

    /// Get XP needed for next level (None if max level)
    pub fn xp_for_next(current_level: u32) -> Option<i64> {
        LEVELS
            .iter()
            .find(|l| l.level == current_level + 1)
            .map(|l| l.xp_required)
    }

    /// Get max level
    pub fn max_level() -> u32 {
        LEVELS.last().map(|l| l.level).unwrap_or(1)
    }
}

/// A grant that moved the user across a level threshold
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelUp {
    pub old_level: u32,
    pub new_level: u32,
    pub title: String,
}

impl LevelUp {
    /// Compare the levels for XP before and after a grant
    pub fn between(xp_before: i64, xp_after: i64) -> Option<Self> {
        let old = Level::for_xp(xp_before);
        let new = Level::for_xp(xp_after);
        (new.level > old.level).then(|| Self {
            old_level: old.level,
            new_level: new.level,
            title: new.title.to_string(),
        })
    }
}

/// Progress within the current level (0.0 - 1.0)
pub fn progress_to_next(total_xp: i64) -> f32 {
    let current = Level::for_xp(total_xp);
    match Level::xp_for_next(current.level) {
        Some(next) => {
            let xp_in_level = total_xp - current.xp_required;
            let xp_for_level = next - current.xp_required;
            if xp_for_level == 0 {
                1.0
            } else {
                xp_in_level as f32 / xp_for_level as f32
            }
        }
        None => 1.0, // Max level
    }
}
