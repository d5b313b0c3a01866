//! CLI command implementations

pub mod challenge;
pub mod events;
pub mod init;
pub mod show;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use progression::config::Config;
use progression::{Outcome, RewardEngine, SqliteStore, TimedEngine};

/// Open the SQLite store named by `--db` or the config, and build an engine on it
/// bounded by `[engine] timeout_ms`
pub fn open_engine(config: &Config, db: Option<&Path>) -> Result<TimedEngine> {
    let path = db.map(Path::to_path_buf).unwrap_or_else(|| config.db_path());
    debug!(path = %path.display(), "Opening progression database");

    let store = SqliteStore::open(&path, config.busy_timeout())?;
    Ok(TimedEngine::from_config(RewardEngine::new(Arc::new(store)), config))
}

/// Print the carried error of a failed outcome. The command still succeeds.
pub fn report_error<T>(outcome: &Outcome<T>) {
    if let Some(err) = &outcome.error {
        eprintln!("  Error: {}", err);
    }
}
