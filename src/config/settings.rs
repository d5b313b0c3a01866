//! Settings sections

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// `[store]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// SQLite database file. Defaults to `~/.progression/progression.db`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// How long a writer waits for a competing transaction before failing
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            path: None,
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

/// `[notifications]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationSettings {
    /// When false, grants are never announced
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_true() -> bool {
    true
}

/// `[streaks]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreakSettings {
    /// Pay `streak_bonus` every N consecutive days (0 disables the bonus)
    #[serde(default = "default_bonus_interval")]
    pub bonus_interval: u32,
}

impl Default for StreakSettings {
    fn default() -> Self {
        Self {
            bonus_interval: default_bonus_interval(),
        }
    }
}

fn default_bonus_interval() -> u32 {
    7
}

/// `[engine]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Deadline for operations run through the async facade
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_timeout_ms() -> u64 {
    2000
}
