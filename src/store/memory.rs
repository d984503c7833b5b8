//! In-memory store backends
//!
//! Used by the test suites and as the runtime fallback when PostgreSQL is
//! disabled in configuration. Each guarded mutation runs under a single write
//! lock, which gives the same atomicity the PostgreSQL backend gets from
//! conditional statements.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::directory::{
    matches_filter, ProfileUpdate, RatingSummary, SearchFilter, UserDirectory, UserProfile,
    SEARCH_LIMIT,
};
use crate::store::{InsertOutcome, StoreError, SwapStore};
use crate::swap::models::{RatingSlot, Swap, SwapId, SwapRating, SwapStatus, UserId};

/// Swap record store over a locked map.
#[derive(Default)]
pub struct MemorySwapStore {
    swaps: RwLock<HashMap<SwapId, Swap>>,
}

impl MemorySwapStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SwapStore for MemorySwapStore {
    async fn find_by_id(&self, id: SwapId) -> Result<Option<Swap>, StoreError> {
        Ok(self.swaps.read().await.get(&id).cloned())
    }

    async fn insert_pending(&self, swap: Swap) -> Result<InsertOutcome, StoreError> {
        let mut swaps = self.swaps.write().await;
        // Duplicate check and insert under the same write lock.
        let duplicate = swaps.values().any(|existing| {
            existing.status == SwapStatus::Pending
                && ((existing.requester == swap.requester && existing.recipient == swap.recipient)
                    || (existing.requester == swap.recipient
                        && existing.recipient == swap.requester))
        });
        if duplicate {
            return Ok(InsertOutcome::DuplicatePending);
        }
        swaps.insert(swap.id, swap.clone());
        Ok(InsertOutcome::Created(swap))
    }

    async fn transition(
        &self,
        id: SwapId,
        expected: SwapStatus,
        next: SwapStatus,
        completed: Option<DateTime<Utc>>,
    ) -> Result<Option<Swap>, StoreError> {
        let mut swaps = self.swaps.write().await;
        match swaps.get_mut(&id) {
            Some(swap) if swap.status == expected => {
                swap.status = next;
                if completed.is_some() {
                    swap.completed_date = completed;
                }
                swap.updated_at = Utc::now();
                Ok(Some(swap.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn write_rating(
        &self,
        id: SwapId,
        slot: RatingSlot,
        rating: SwapRating,
    ) -> Result<Option<Swap>, StoreError> {
        let mut swaps = self.swaps.write().await;
        match swaps.get_mut(&id) {
            Some(swap) if swap.status == SwapStatus::Completed => {
                let target = match slot {
                    RatingSlot::Requester => &mut swap.requester_rating,
                    RatingSlot::Recipient => &mut swap.recipient_rating,
                };
                if target.is_some() {
                    return Ok(None);
                }
                *target = Some(rating);
                swap.updated_at = Utc::now();
                Ok(Some(swap.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_pending(&self, id: SwapId) -> Result<bool, StoreError> {
        let mut swaps = self.swaps.write().await;
        match swaps.get(&id) {
            Some(swap) if swap.status == SwapStatus::Pending => {
                swaps.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn completed_rated_for_user(&self, user: UserId) -> Result<Vec<Swap>, StoreError> {
        let swaps = self.swaps.read().await;
        Ok(swaps
            .values()
            .filter(|s| {
                s.is_participant(user)
                    && s.status == SwapStatus::Completed
                    && (s.requester_rating.is_some() || s.recipient_rating.is_some())
            })
            .cloned()
            .collect())
    }

    async fn list_for_user(&self, user: UserId) -> Result<Vec<Swap>, StoreError> {
        let swaps = self.swaps.read().await;
        let mut result: Vec<Swap> = swaps
            .values()
            .filter(|s| s.is_participant(user))
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    async fn list_pending_for_recipient(&self, user: UserId) -> Result<Vec<Swap>, StoreError> {
        let swaps = self.swaps.read().await;
        let mut result: Vec<Swap> = swaps
            .values()
            .filter(|s| s.recipient == user && s.status == SwapStatus::Pending)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    async fn list_all(&self) -> Result<Vec<Swap>, StoreError> {
        let swaps = self.swaps.read().await;
        let mut result: Vec<Swap> = swaps.values().cloned().collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }
}

/// User directory over a locked map.
#[derive(Default)]
pub struct MemoryDirectory {
    users: RwLock<HashMap<UserId, UserProfile>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDirectory for MemoryDirectory {
    async fn find_by_id(&self, id: UserId) -> Result<Option<UserProfile>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn insert(&self, profile: UserProfile) -> Result<(), StoreError> {
        self.users.write().await.insert(profile.id, profile);
        Ok(())
    }

    async fn search(&self, filter: &SearchFilter) -> Result<Vec<UserProfile>, StoreError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .filter(|p| matches_filter(p, filter))
            .take(SEARCH_LIMIT)
            .cloned()
            .collect())
    }

    async fn update_profile(
        &self,
        id: UserId,
        update: &ProfileUpdate,
    ) -> Result<Option<UserProfile>, StoreError> {
        let mut users = self.users.write().await;
        match users.get_mut(&id) {
            Some(profile) => {
                update.apply_to(profile);
                Ok(Some(profile.clone()))
            }
            None => Ok(None),
        }
    }

    async fn update_rating(&self, id: UserId, summary: RatingSummary) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if let Some(profile) = users.get_mut(&id) {
            profile.rating = summary;
            profile.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn set_banned(&self, id: UserId, banned: bool) -> Result<bool, StoreError> {
        let mut users = self.users.write().await;
        match users.get_mut(&id) {
            Some(profile) => {
                profile.is_banned = banned;
                profile.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_all(&self) -> Result<Vec<UserProfile>, StoreError> {
        Ok(self.users.read().await.values().cloned().collect())
    }
}
