//! Init command implementation

use anyhow::{Result, bail};
use std::path::Path;
use tracing::info;

use progression::config::Config;

/// Default configuration content for progression init
pub const DEFAULT_CONFIG: &str = r#"# Progression Configuration
# =========================

# ============================================================================
# STORE - SQLite database holding ledger, aggregates, streaks, badges, challenges
# ============================================================================
#
#   path            - Database file (default: ~/.progression/progression.db)
#   busy_timeout_ms - How long a write waits on a competing writer (default: 5000)

[store]
busy_timeout_ms = 5000

# ============================================================================
# NOTIFICATIONS
# ============================================================================

[notifications]
enabled = true

# ============================================================================
# STREAKS
# ============================================================================
#
#   bonus_interval - Pay a streak bonus every N consecutive days (0 = never)

[streaks]
bonus_interval = 7

# ============================================================================
# ENGINE
# ============================================================================
#
#   timeout_ms - Deadline for engine calls made from async handlers

[engine]
timeout_ms = 2000
"#;

/// Write a default config file to `path` (the global config path when `None`)
pub async fn init_command(path: Option<&Path>, force: bool) -> Result<()> {
    let config_path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::global_config_path);

    if config_path.exists() && !force {
        bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    Config::write_file(&config_path, DEFAULT_CONFIG)?;
    info!("Created config file at {}", config_path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses_to_defaults() {
        let config: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config, Config::default());
    }
}
