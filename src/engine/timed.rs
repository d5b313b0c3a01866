//! Async facade with a deadline
//!
//! Runs engine operations on tokio's blocking pool so async request handlers
//! can await them. An operation that overruns the deadline resolves to a
//! failed [`Outcome`]; the blocking work itself is not cancelled, so a write
//! in flight may still land after the caller has moved on.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;

use super::{
    BadgeReport, EngineSettings, Enrollment, Grant, Outcome, ProgressReport, RewardEngine,
    StreakTouch,
};
use crate::config::Config;

/// [`RewardEngine`] wrapper for async callers
#[derive(Clone)]
pub struct TimedEngine {
    engine: Arc<RewardEngine>,
    timeout: Duration,
}

impl TimedEngine {
    pub fn new(engine: RewardEngine, timeout: Duration) -> Self {
        Self {
            engine: Arc::new(engine),
            timeout,
        }
    }

    /// Apply the config's engine settings and `[engine] timeout_ms` deadline
    pub fn from_config(engine: RewardEngine, config: &Config) -> Self {
        Self::new(
            engine.with_settings(EngineSettings::from(config)),
            config.engine_timeout(),
        )
    }

    pub fn engine(&self) -> &RewardEngine {
        &self.engine
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn award_reward(
        &self,
        user_id: &str,
        kind: &str,
        reference_id: Option<&str>,
        description: Option<&str>,
    ) -> Outcome<Grant> {
        let (kind, reference_id, description) = (
            kind.to_string(),
            reference_id.map(str::to_string),
            description.map(str::to_string),
        );
        self.run("award_reward", user_id, move |engine, user| {
            engine.award_reward(user, &kind, reference_id.as_deref(), description.as_deref())
        })
        .await
    }

    pub async fn touch_streak(&self, user_id: &str, today: NaiveDate) -> Outcome<StreakTouch> {
        self.run("touch_streak", user_id, move |engine, user| engine.touch_streak(user, today))
            .await
    }

    /// Streak touch for the engine clock's current day
    pub async fn touch_streak_today(&self, user_id: &str) -> Outcome<StreakTouch> {
        self.run("touch_streak", user_id, |engine, user| engine.touch_streak_today(user))
            .await
    }

    pub async fn evaluate_badges(&self, user_id: &str) -> Outcome<BadgeReport> {
        self.run("evaluate_badges", user_id, |engine, user| engine.evaluate_badges(user))
            .await
    }

    pub async fn auto_enroll(&self, user_id: &str) -> Outcome<Enrollment> {
        self.run("auto_enroll", user_id, |engine, user| engine.auto_enroll(user))
            .await
    }

    pub async fn record_progress(&self, user_id: &str, kind: &str) -> Outcome<ProgressReport> {
        let kind = kind.to_string();
        self.run("record_progress", user_id, move |engine, user| {
            engine.record_progress(user, &kind)
        })
        .await
    }

    async fn run<T, F>(&self, operation: &'static str, user_id: &str, op: F) -> Outcome<T>
    where
        T: Default + Send + 'static,
        F: FnOnce(&RewardEngine, &str) -> Outcome<T> + Send + 'static,
    {
        let engine = Arc::clone(&self.engine);
        let user = user_id.to_string();
        let task = tokio::task::spawn_blocking(move || op(&engine, &user));

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(join_error)) => Outcome::failed(operation, user_id, join_error),
            Err(_) => Outcome::failed(
                operation,
                user_id,
                format!("timed out after {}ms", self.timeout.as_millis()),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NullNotifier;
    use crate::store::MemoryStore;

    fn timed(timeout: Duration) -> TimedEngine {
        let engine =
            RewardEngine::new(Arc::new(MemoryStore::new())).with_notifier(Arc::new(NullNotifier));
        TimedEngine::new(engine, timeout)
    }

    #[test]
    fn test_from_config_applies_deadline_and_settings() {
        let config: Config = toml::from_str(
            r#"
[notifications]
enabled = false

[streaks]
bonus_interval = 3

[engine]
timeout_ms = 250
"#,
        )
        .unwrap();

        let engine = RewardEngine::new(Arc::new(MemoryStore::new()));
        let timed = TimedEngine::from_config(engine, &config);

        assert_eq!(timed.timeout(), Duration::from_millis(250));
        assert_eq!(timed.engine().settings().streak_bonus_interval, 3);
        assert!(!timed.engine().settings().notifications);
    }

    #[tokio::test]
    async fn test_configured_deadline_is_enforced() {
        let config: Config = toml::from_str("[engine]\ntimeout_ms = 10\n").unwrap();
        let engine = RewardEngine::new(Arc::new(MemoryStore::new()));
        let timed = TimedEngine::from_config(engine, &config);

        let outcome: Outcome<Grant> = timed
            .run("slow", "u1", |_, _| {
                std::thread::sleep(Duration::from_millis(200));
                Outcome::ok(Grant::default())
            })
            .await;
        assert_eq!(outcome.error.as_deref(), Some("timed out after 10ms"));
    }

    #[tokio::test]
    async fn test_award_through_blocking_pool() {
        let timed = timed(Duration::from_secs(5));
        let outcome = timed.award_reward("u1", "quiz_completed", None, None).await;
        assert!(outcome.is_success());
        assert_eq!((outcome.value.xp, outcome.value.coins), (20, 5));
    }

    #[tokio::test]
    async fn test_overrun_becomes_failed_outcome() {
        let timed = timed(Duration::from_millis(10));
        let outcome: Outcome<Grant> = timed
            .run("slow", "u1", |_, _| {
                std::thread::sleep(Duration::from_millis(200));
                Outcome::ok(Grant::default())
            })
            .await;
        assert!(!outcome.is_success());
        assert!(outcome.error.unwrap().contains("timed out"));
    }
}
