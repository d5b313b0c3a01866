//! Progression - rewards engine for business events
//!
//! Turns business events (a lesson completed, a review written, a daily
//! login) into XP and coin grants, and layers streaks, badges and
//! time-boxed challenges on top of a per-user append-only ledger.
//!
//! ## Entry points
//!
//! Business handlers hold a [`RewardEngine`] and call it after their own
//! action has committed:
//!
//! 1. [`RewardEngine::award_reward`] for the event itself
//! 2. [`RewardEngine::touch_streak_today`] on activity
//! 3. [`RewardEngine::evaluate_badges`] and [`RewardEngine::record_progress`]
//!    after state changes
//!
//! None of these return `Err`: failures come back inside an
//! [`Outcome`](engine::Outcome) and the business action proceeds.

pub mod activity;
pub mod badges;
pub mod clock;
pub mod config;
pub mod engine;
pub mod levels;
pub mod models;
pub mod notify;
pub mod rewards;
pub mod store;

pub use engine::{EngineSettings, Outcome, RewardEngine, TimedEngine};
pub use models::*;
pub use store::{MemoryStore, ProgressionStore, SqliteStore, StoreError};
