//! Rebuild an aggregate from the ledger
//!
//! The ledger is the source of truth. Reconciliation overwrites the aggregate
//! when its totals disagree with the ledger sums.

use tracing::{info, warn};

use super::{Outcome, Reconciliation, RewardEngine};
use crate::levels::Level;
use crate::models::ProgressionAggregate;
use crate::store::StoreResult;

impl RewardEngine {
    /// Recompute `user_id`'s aggregate from their ledger entries.
    ///
    /// Concurrent grants during a reconcile can make it report drift that a
    /// second run would not; the written aggregate is still a ledger sum.
    pub fn reconcile(&self, user_id: &str) -> Outcome<Reconciliation> {
        Outcome::from_result("reconcile", user_id, self.rebuild_aggregate(user_id))
    }

    fn rebuild_aggregate(&self, user_id: &str) -> StoreResult<Reconciliation> {
        let before = self.store.aggregate(user_id)?;
        let totals = self.store.ledger_totals(user_id)?;

        let drifted = match &before {
            Some(agg) => {
                agg.total_xp != totals.xp
                    || agg.coins != totals.coins
                    || agg.level != Level::for_xp(totals.xp).level
            }
            None => totals.entries > 0,
        };

        if !drifted {
            return Ok(Reconciliation {
                after: before.clone(),
                before,
                drifted: false,
            });
        }

        let after = ProgressionAggregate {
            user_id: user_id.to_string(),
            total_xp: totals.xp,
            coins: totals.coins,
            level: Level::for_xp(totals.xp).level,
            updated_at: self.clock.now(),
        };
        self.store.replace_aggregate(&after)?;

        if let Some(agg) = &before {
            warn!(
                user_id,
                stored_xp = agg.total_xp,
                ledger_xp = totals.xp,
                stored_coins = agg.coins,
                ledger_coins = totals.coins,
                "Aggregate drifted from ledger"
            );
        }
        info!(user_id, total_xp = after.total_xp, coins = after.coins, "Aggregate rebuilt");

        Ok(Reconciliation {
            before,
            after: Some(after),
            drifted: true,
        })
    }
}
