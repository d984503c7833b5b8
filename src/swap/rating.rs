//! Rating aggregation engine
//!
//! Keeps each user's derived reputation (`rating.average` / `rating.count`)
//! consistent with the set of ratings they have *received* across their
//! completed, rated swaps. The score is recomputed from full history rather
//! than maintained incrementally, so a re-run against the same snapshot is
//! idempotent and the summary self-heals after any missed trigger.
//!
//! ## Semantics
//!
//! The value counted for a user is the one authored by their counterparty:
//! when the user was the requester of a swap, the recipient's rating of them
//! (`recipient_rating`) contributes, and symmetrically. A user with no
//! qualifying values keeps their current summary; the engine never resets a
//! score to zero.
//!
//! Recomputations for the same user serialize through a per-user lock, so
//! two overlapping triggers cannot publish a summary computed from stale
//! history.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::directory::{RatingSummary, UserDirectory};
use crate::store::{StoreError, SwapStore};
use crate::swap::models::{Swap, UserId};

/// Recomputes derived reputation summaries from swap history.
pub struct RatingAggregator {
    swaps: Arc<dyn SwapStore>,
    users: Arc<dyn UserDirectory>,
    /// Per-user recomputation locks, created on first use.
    locks: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl RatingAggregator {
    pub fn new(swaps: Arc<dyn SwapStore>, users: Arc<dyn UserDirectory>) -> Self {
        Self {
            swaps,
            users,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Recompute the summaries of several users, one at a time.
    pub async fn recompute_for(&self, users: &[UserId]) -> Result<(), StoreError> {
        for user in users {
            self.recompute_user(*user).await?;
        }
        Ok(())
    }

    /// Recompute one user's summary from their full swap history. Returns
    /// the published summary, or `None` when no qualifying values exist and
    /// the stored summary was left unchanged.
    pub async fn recompute_user(&self, user: UserId) -> Result<Option<RatingSummary>, StoreError> {
        let guard = self.user_lock(user).await;
        let _held = guard.lock().await;

        let history = self.swaps.completed_rated_for_user(user).await?;
        let values: Vec<u8> = history
            .iter()
            .filter_map(|swap| received_value(swap, user))
            .collect();

        if values.is_empty() {
            debug!(user = %user, "no received ratings, summary unchanged");
            return Ok(None);
        }

        let count = values.len() as u32;
        let average = values.iter().map(|v| *v as f64).sum::<f64>() / values.len() as f64;
        let summary = RatingSummary { average, count };
        self.users.update_rating(user, summary).await?;
        info!(user = %user, average, count, "reputation recomputed");
        Ok(Some(summary))
    }

    async fn user_lock(&self, user: UserId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(user).or_default().clone()
    }
}

/// The rating this user received in a swap: the value authored by the
/// counterparty, if that slot is populated.
fn received_value(swap: &Swap, user: UserId) -> Option<u8> {
    if swap.requester == user {
        swap.recipient_rating.as_ref().map(|r| r.value)
    } else if swap.recipient == user {
        swap.requester_rating.as_ref().map(|r| r.value)
    } else {
        None
    }
}
