//! Swap lifecycle engine
//!
//! Owns the state machine governing a swap from creation to a terminal
//! state. Every operation follows the same shape: read the current record,
//! run the table-driven authorization check, validate the source state, then
//! apply the mutation through a conditional store operation so concurrent
//! callers cannot both win.
//!
//! ## Transition table
//!
//! | From     | Operation | Actor                  | To          |
//! |----------|-----------|------------------------|-------------|
//! | (none)   | create    | requester              | `pending`   |
//! | pending  | accept    | recipient              | `accepted`  |
//! | pending  | reject    | recipient              | `rejected`  |
//! | pending  | cancel    | requester              | `cancelled` |
//! | accepted | complete  | either participant     | `completed` |
//! | pending  | delete    | requester              | (removed)   |
//!
//! Rating is a sub-operation gated on `completed`; the second rating of a
//! swap triggers reputation recomputation for both participants.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::directory::UserDirectory;
use crate::store::{InsertOutcome, SwapStore};
use crate::swap::error::SwapError;
use crate::swap::models::{NewSwap, Swap, SwapId, SwapRating, SwapStatus, UserId};
use crate::swap::rating::RatingAggregator;

/// Lowest accepted rating value.
pub const MIN_RATING: u8 = 1;

/// Highest accepted rating value.
pub const MAX_RATING: u8 = 5;

/// Operations a caller can invoke against an existing swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapOperation {
    Accept,
    Reject,
    Cancel,
    Complete,
    Delete,
    Rate,
}

impl SwapOperation {
    /// Lifecycle state the swap must be in for this operation.
    pub fn required_state(&self) -> SwapStatus {
        match self {
            SwapOperation::Accept
            | SwapOperation::Reject
            | SwapOperation::Cancel
            | SwapOperation::Delete => SwapStatus::Pending,
            SwapOperation::Complete => SwapStatus::Accepted,
            SwapOperation::Rate => SwapStatus::Completed,
        }
    }
}

/// Table-driven permission check, independent of any transport layer.
pub fn authorize(swap: &Swap, actor: UserId, op: SwapOperation) -> Result<(), SwapError> {
    let allowed = match op {
        SwapOperation::Accept | SwapOperation::Reject => actor == swap.recipient,
        SwapOperation::Cancel | SwapOperation::Delete => actor == swap.requester,
        SwapOperation::Complete | SwapOperation::Rate => swap.is_participant(actor),
    };
    if allowed {
        Ok(())
    } else {
        let who = match op {
            SwapOperation::Accept | SwapOperation::Reject => "only the recipient",
            SwapOperation::Cancel | SwapOperation::Delete => "only the requester",
            SwapOperation::Complete | SwapOperation::Rate => "only a participant",
        };
        Err(SwapError::Forbidden(format!(
            "{} may {:?} this swap",
            who, op
        )))
    }
}

/// The lifecycle engine. Stateless between calls; every operation re-reads
/// the current record from the store.
pub struct LifecycleEngine {
    swaps: Arc<dyn SwapStore>,
    users: Arc<dyn UserDirectory>,
    aggregator: RatingAggregator,
}

impl LifecycleEngine {
    pub fn new(swaps: Arc<dyn SwapStore>, users: Arc<dyn UserDirectory>) -> Self {
        let aggregator = RatingAggregator::new(swaps.clone(), users.clone());
        Self {
            swaps,
            users,
            aggregator,
        }
    }

    /// Create a new pending swap.
    ///
    /// Guards: recipient exists, is public, is not banned; no pending swap
    /// already links the pair in either direction. The duplicate check and
    /// the insert are one atomic store operation.
    pub async fn create_swap(&self, request: NewSwap) -> Result<Swap, SwapError> {
        request.validate()?;

        let recipient = self
            .users
            .find_by_id(request.recipient)
            .await?
            .ok_or(SwapError::NotFound("recipient"))?;
        if !recipient.is_public {
            return Err(SwapError::Forbidden(
                "cannot send a request to a private profile".to_string(),
            ));
        }
        if recipient.is_banned {
            return Err(SwapError::Forbidden(
                "cannot send a request to a banned user".to_string(),
            ));
        }

        let swap = Swap::from_request(request);
        match self.swaps.insert_pending(swap).await? {
            InsertOutcome::Created(swap) => {
                info!(swap_id = %swap.id, requester = %swap.requester, recipient = %swap.recipient, "swap created");
                Ok(swap)
            }
            InsertOutcome::DuplicatePending => Err(SwapError::Conflict(
                "a pending swap already exists between these users".to_string(),
            )),
        }
    }

    /// Recipient accepts a pending swap.
    pub async fn accept_swap(&self, id: SwapId, actor: UserId) -> Result<Swap, SwapError> {
        self.transition_op(id, actor, SwapOperation::Accept, SwapStatus::Accepted)
            .await
    }

    /// Recipient rejects a pending swap.
    pub async fn reject_swap(&self, id: SwapId, actor: UserId) -> Result<Swap, SwapError> {
        self.transition_op(id, actor, SwapOperation::Reject, SwapStatus::Rejected)
            .await
    }

    /// Requester cancels a pending swap.
    pub async fn cancel_swap(&self, id: SwapId, actor: UserId) -> Result<Swap, SwapError> {
        self.transition_op(id, actor, SwapOperation::Cancel, SwapStatus::Cancelled)
            .await
    }

    /// Either participant marks an accepted swap as completed. Sets
    /// `completed_date` exactly once.
    pub async fn complete_swap(&self, id: SwapId, actor: UserId) -> Result<Swap, SwapError> {
        let swap = self.load(id).await?;
        authorize(&swap, actor, SwapOperation::Complete)?;
        self.require_state(&swap, SwapOperation::Complete)?;

        let updated = self
            .swaps
            .transition(
                id,
                SwapStatus::Accepted,
                SwapStatus::Completed,
                Some(Utc::now()),
            )
            .await?;
        match updated {
            Some(swap) => {
                info!(swap_id = %id, "swap completed");
                Ok(swap)
            }
            None => Err(self.classify_missed_cas(id, SwapOperation::Complete).await?),
        }
    }

    /// Requester removes a pending swap entirely.
    pub async fn delete_swap(&self, id: SwapId, actor: UserId) -> Result<(), SwapError> {
        let swap = self.load(id).await?;
        authorize(&swap, actor, SwapOperation::Delete)?;
        self.require_state(&swap, SwapOperation::Delete)?;

        if self.swaps.delete_pending(id).await? {
            info!(swap_id = %id, "swap deleted");
            Ok(())
        } else {
            Err(self.classify_missed_cas(id, SwapOperation::Delete).await?)
        }
    }

    /// Rate a completed swap. Only the requester may write the requester
    /// slot and only the recipient the recipient slot; each slot is
    /// write-once. Filling the second slot triggers reputation
    /// recomputation for both participants.
    pub async fn rate_swap(
        &self,
        id: SwapId,
        actor: UserId,
        value: u8,
        comment: &str,
    ) -> Result<Swap, SwapError> {
        if !(MIN_RATING..=MAX_RATING).contains(&value) {
            return Err(SwapError::Validation(format!(
                "rating must be between {} and {}",
                MIN_RATING, MAX_RATING
            )));
        }
        if comment.trim().is_empty() {
            return Err(SwapError::Validation("comment is required".to_string()));
        }

        let swap = self.load(id).await?;
        self.require_state(&swap, SwapOperation::Rate)?;
        authorize(&swap, actor, SwapOperation::Rate)?;
        let slot = swap
            .slot_for(actor)
            .ok_or_else(|| SwapError::Forbidden("only a participant may rate".to_string()))?;
        if swap.rating_in(slot).is_some() {
            return Err(SwapError::Conflict(
                "you have already rated this swap".to_string(),
            ));
        }

        let rating = SwapRating {
            value,
            comment: comment.trim().to_string(),
            rated_at: Utc::now(),
        };
        let updated = self.swaps.write_rating(id, slot, rating).await?;
        let swap = match updated {
            Some(swap) => swap,
            // Lost a race: either a concurrent write filled the slot or the
            // record changed underneath us. Re-read and classify.
            None => {
                let current = self.load(id).await?;
                if current.status != SwapStatus::Completed {
                    return Err(SwapError::InvalidState {
                        required: SwapStatus::Completed,
                        actual: current.status,
                    });
                }
                return Err(SwapError::Conflict(
                    "you have already rated this swap".to_string(),
                ));
            }
        };
        debug!(swap_id = %id, actor = %actor, value, "rating recorded");

        // The trigger is evaluated on the row returned by the write itself,
        // so a consistent post-write snapshot decides it.
        if swap.fully_rated() {
            self.aggregator
                .recompute_for(&[swap.requester, swap.recipient])
                .await?;
        }
        Ok(swap)
    }

    /// All swaps involving the user, newest first.
    pub async fn swaps_for_user(&self, user: UserId) -> Result<Vec<Swap>, SwapError> {
        Ok(self.swaps.list_for_user(user).await?)
    }

    /// Pending requests addressed to the user, newest first.
    pub async fn pending_for_recipient(&self, user: UserId) -> Result<Vec<Swap>, SwapError> {
        Ok(self.swaps.list_pending_for_recipient(user).await?)
    }

    /// Direct access to the aggregation engine, for reconciliation callers.
    pub fn aggregator(&self) -> &RatingAggregator {
        &self.aggregator
    }

    async fn transition_op(
        &self,
        id: SwapId,
        actor: UserId,
        op: SwapOperation,
        next: SwapStatus,
    ) -> Result<Swap, SwapError> {
        let swap = self.load(id).await?;
        authorize(&swap, actor, op)?;
        self.require_state(&swap, op)?;

        let updated = self
            .swaps
            .transition(id, op.required_state(), next, None)
            .await?;
        match updated {
            Some(swap) => {
                info!(swap_id = %id, status = %swap.status, "swap transitioned");
                Ok(swap)
            }
            None => Err(self.classify_missed_cas(id, op).await?),
        }
    }

    async fn load(&self, id: SwapId) -> Result<Swap, SwapError> {
        self.swaps
            .find_by_id(id)
            .await?
            .ok_or(SwapError::NotFound("swap"))
    }

    fn require_state(&self, swap: &Swap, op: SwapOperation) -> Result<(), SwapError> {
        let required = op.required_state();
        if swap.status == required {
            Ok(())
        } else {
            Err(SwapError::InvalidState {
                required,
                actual: swap.status,
            })
        }
    }

    /// A conditional mutation matched no row even though the pre-checks
    /// passed: the record was deleted or transitioned concurrently.
    async fn classify_missed_cas(
        &self,
        id: SwapId,
        op: SwapOperation,
    ) -> Result<SwapError, SwapError> {
        match self.swaps.find_by_id(id).await? {
            None => Ok(SwapError::NotFound("swap")),
            Some(current) => Ok(SwapError::InvalidState {
                required: op.required_state(),
                actual: current.status,
            }),
        }
    }
}
