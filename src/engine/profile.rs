//! Read-side views and catalog management

use tracing::info;

use super::{Outcome, Profile, RewardEngine};
use crate::levels::{Level, progress_to_next};
use crate::models::{Challenge, NewChallenge};
use crate::store::StoreResult;

impl RewardEngine {
    /// Aggregate, streak, badges, challenges and the `recent_limit` newest
    /// ledger entries for one user
    pub fn profile(&self, user_id: &str, recent_limit: usize) -> Outcome<Profile> {
        Outcome::from_result("profile", user_id, self.load_profile(user_id, recent_limit))
    }

    /// Add a challenge definition. Enrollment happens through
    /// [`auto_enroll`](Self::auto_enroll).
    pub fn create_challenge(&self, challenge: &NewChallenge) -> Outcome<Option<Challenge>> {
        let created = self.store.insert_challenge(challenge).map(|c| {
            info!(challenge_id = c.id, kind = c.kind.as_str(), "Challenge created: {}", c.title);
            Some(c)
        });
        Outcome::from_result("create_challenge", "*", created)
    }

    fn load_profile(&self, user_id: &str, recent_limit: usize) -> StoreResult<Profile> {
        let aggregate = self.store.aggregate(user_id)?;
        let total_xp = aggregate.as_ref().map(|a| a.total_xp).unwrap_or(0);

        Ok(Profile {
            title: Level::for_xp(total_xp).title.to_string(),
            progress_to_next: progress_to_next(total_xp),
            aggregate,
            streak: self.store.streak(user_id)?,
            badges: self.store.held_badges(user_id)?,
            challenges: self.store.user_challenges(user_id)?,
            recent: self.store.ledger(user_id, recent_limit)?,
        })
    }
}
