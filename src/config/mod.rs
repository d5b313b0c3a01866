//! Configuration loading and management

mod io;
mod settings;

pub use settings::{EngineConfig, NotificationSettings, StoreSettings, StreakSettings};

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Main configuration structure (`~/.progression/config.toml`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Database location and SQLite tuning
    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub notifications: NotificationSettings,

    #[serde(default)]
    pub streaks: StreakSettings,

    /// Async facade settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl Config {
    /// Database file: the configured path, else `~/.progression/progression.db`
    pub fn db_path(&self) -> PathBuf {
        self.store
            .path
            .clone()
            .unwrap_or_else(|| Self::global_config_dir().join("progression.db"))
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.store.busy_timeout_ms)
    }

    pub fn engine_timeout(&self) -> Duration {
        Duration::from_millis(self.engine.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.store.busy_timeout_ms, 5000);
        assert!(config.notifications.enabled);
        assert_eq!(config.streaks.bonus_interval, 7);
        assert_eq!(config.engine.timeout_ms, 2000);
    }

    #[test]
    fn test_partial_sections() {
        let config: Config = toml::from_str(
            r#"
[store]
path = "/var/lib/progression/rewards.db"

[streaks]
bonus_interval = 5
"#,
        )
        .unwrap();

        assert_eq!(config.db_path(), PathBuf::from("/var/lib/progression/rewards.db"));
        assert_eq!(config.busy_timeout(), Duration::from_millis(5000));
        assert_eq!(config.streaks.bonus_interval, 5);
        assert!(config.notifications.enabled);
    }

    #[test]
    fn test_default_db_path_is_under_config_dir() {
        let config = Config::default();
        assert!(config.db_path().starts_with(Config::global_config_dir()));
    }
}
