//! Swap record store contract and backends
//!
//! The lifecycle engine talks to storage exclusively through [`SwapStore`].
//! Every mutation that carries a business guard (duplicate-pending check,
//! status transition, rating slot write, pending-only delete) is expressed as
//! a single conditional operation so that backends can make it atomic: the
//! in-memory backend scopes it under one write lock, the PostgreSQL backend
//! uses conditional single-statement updates and a partial unique index.
//!
//! Backends report only infrastructure failures through [`StoreError`];
//! business outcomes (row missing, guard not satisfied, duplicate) travel
//! through the typed results so the engine can classify them.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::swap::models::{RatingSlot, Swap, SwapId, SwapRating, SwapStatus, UserId};

pub use memory::{MemoryDirectory, MemorySwapStore};
pub use postgres::{DatabasePool, PgSwapStore, PgUserDirectory};

/// Infrastructure failure in a backing store (connectivity, timeout, bad row).
/// Business-rule violations are never reported through this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError(pub String);

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for StoreError {}

/// Result of an atomic pending-swap insert.
#[derive(Debug, Clone)]
pub enum InsertOutcome {
    Created(Swap),
    /// A pending swap already links the two participants, in either direction.
    DuplicatePending,
}

/// Durable storage for swap records.
#[async_trait]
pub trait SwapStore: Send + Sync {
    async fn find_by_id(&self, id: SwapId) -> Result<Option<Swap>, StoreError>;

    /// Insert a new pending swap, atomically failing with
    /// [`InsertOutcome::DuplicatePending`] when a pending swap already exists
    /// between the pair (checked across both directions).
    async fn insert_pending(&self, swap: Swap) -> Result<InsertOutcome, StoreError>;

    /// Compare-and-swap on status. `completed` is written together with the
    /// status when provided. Returns `None` when no row matched, i.e. the id
    /// is unknown or the status no longer equals `expected`; the caller
    /// re-reads to classify.
    async fn transition(
        &self,
        id: SwapId,
        expected: SwapStatus,
        next: SwapStatus,
        completed: Option<DateTime<Utc>>,
    ) -> Result<Option<Swap>, StoreError>;

    /// Write-once rating slot, conditional on the swap being completed and
    /// the slot being empty. `None` when no row matched.
    async fn write_rating(
        &self,
        id: SwapId,
        slot: RatingSlot,
        rating: SwapRating,
    ) -> Result<Option<Swap>, StoreError>;

    /// Remove a swap, conditional on it still being pending. `false` when no
    /// pending row matched.
    async fn delete_pending(&self, id: SwapId) -> Result<bool, StoreError>;

    /// Completed swaps involving the user that carry at least one rating.
    /// Input to reputation recomputation.
    async fn completed_rated_for_user(&self, user: UserId) -> Result<Vec<Swap>, StoreError>;

    /// All swaps where the user is requester or recipient, newest first.
    async fn list_for_user(&self, user: UserId) -> Result<Vec<Swap>, StoreError>;

    /// Pending swaps addressed to the user, newest first.
    async fn list_pending_for_recipient(&self, user: UserId) -> Result<Vec<Swap>, StoreError>;

    /// Every swap in the store, newest first. Admin listing.
    async fn list_all(&self) -> Result<Vec<Swap>, StoreError>;
}
