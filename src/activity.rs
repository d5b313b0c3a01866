//! Business activity counters used for badge snapshots
//!
//! These reads are the engine's only coupling to data outside its own tables.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::rewards::EventKind;
use crate::store::{ProgressionStore, StoreResult};

/// Counters owned by the business side of the application
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ActivityCounts {
    pub lessons_completed: u64,
    pub reviews_written: u64,
    pub quizzes_completed: u64,
    pub lessons_delivered: u64,
    pub reviews_received: u64,
    pub average_rating: f64,
}

/// Source of [`ActivityCounts`] for a user
pub trait ActivitySource: Send + Sync {
    fn activity(&self, user_id: &str) -> StoreResult<ActivityCounts>;
}

/// Derives counts from the user's reward ledger.
///
/// Ratings are not recorded in the ledger, so `average_rating` is always 0.0.
pub struct LedgerActivity {
    store: Arc<dyn ProgressionStore>,
}

impl LedgerActivity {
    pub fn new(store: Arc<dyn ProgressionStore>) -> Self {
        Self { store }
    }

    fn count(&self, user_id: &str, kind: EventKind) -> StoreResult<u64> {
        self.store.count_entries(user_id, kind.as_str())
    }
}

impl ActivitySource for LedgerActivity {
    fn activity(&self, user_id: &str) -> StoreResult<ActivityCounts> {
        Ok(ActivityCounts {
            lessons_completed: self.count(user_id, EventKind::LessonCompleted)?,
            reviews_written: self.count(user_id, EventKind::ReviewWritten)?,
            quizzes_completed: self.count(user_id, EventKind::QuizCompleted)?,
            lessons_delivered: self.count(user_id, EventKind::LessonDelivered)?,
            reviews_received: self.count(user_id, EventKind::StudentReviewReceived)?,
            average_rating: 0.0,
        })
    }
}

/// Fixed counts, for embedders that compute them elsewhere and for tests
#[derive(Debug, Default)]
pub struct StaticActivity {
    counts: Mutex<HashMap<String, ActivityCounts>>,
}

impl StaticActivity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, user_id: &str, counts: ActivityCounts) {
        self.counts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(user_id.to_string(), counts);
    }
}

impl ActivitySource for StaticActivity {
    fn activity(&self, user_id: &str) -> StoreResult<ActivityCounts> {
        Ok(self
            .counts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }
}
