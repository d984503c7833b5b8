//! Swap repository - PostgreSQL operations for swap records

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::debug;

use crate::store::{InsertOutcome, StoreError, SwapStore};
use crate::swap::models::{RatingSlot, Swap, SwapId, SwapRating, SwapStatus, UserId};

const SWAP_COLUMNS: &str = "id, requester, recipient, requested_skill, offered_skill, \
     message, scheduled_date, status, completed_date, requester_rating, recipient_rating, \
     created_at, updated_at";

pub struct PgSwapStore {
    pool: PgPool,
}

impl PgSwapStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn swap_from_row(row: &PgRow) -> Result<Swap, StoreError> {
    let status_text: String = row.get("status");
    let status = SwapStatus::parse(&status_text)
        .ok_or_else(|| StoreError(format!("Unknown swap status '{}'", status_text)))?;

    let requested_skill = serde_json::from_value(row.get("requested_skill"))
        .map_err(|e| StoreError(format!("Bad requested_skill column: {}", e)))?;
    let offered_skill = serde_json::from_value(row.get("offered_skill"))
        .map_err(|e| StoreError(format!("Bad offered_skill column: {}", e)))?;

    let requester_rating = row
        .get::<Option<serde_json::Value>, _>("requester_rating")
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| StoreError(format!("Bad requester_rating column: {}", e)))?;
    let recipient_rating = row
        .get::<Option<serde_json::Value>, _>("recipient_rating")
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| StoreError(format!("Bad recipient_rating column: {}", e)))?;

    Ok(Swap {
        id: row.get("id"),
        requester: row.get("requester"),
        recipient: row.get("recipient"),
        requested_skill,
        offered_skill,
        message: row.get("message"),
        scheduled_date: row.get("scheduled_date"),
        status,
        completed_date: row.get("completed_date"),
        requester_rating,
        recipient_rating,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn rating_json(rating: &SwapRating) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(rating).map_err(|e| StoreError(format!("Failed to encode rating: {}", e)))
}

#[async_trait]
impl SwapStore for PgSwapStore {
    async fn find_by_id(&self, id: SwapId) -> Result<Option<Swap>, StoreError> {
        let row = sqlx::query(&format!("SELECT {} FROM swaps WHERE id = $1", SWAP_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError(format!("Failed to get swap: {}", e)))?;

        row.as_ref().map(swap_from_row).transpose()
    }

    async fn insert_pending(&self, swap: Swap) -> Result<InsertOutcome, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO swaps
            (id, requester, recipient, requested_skill, offered_skill,
             message, scheduled_date, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(swap.id)
        .bind(swap.requester)
        .bind(swap.recipient)
        .bind(
            serde_json::to_value(&swap.requested_skill)
                .map_err(|e| StoreError(format!("Failed to encode skill: {}", e)))?,
        )
        .bind(
            serde_json::to_value(&swap.offered_skill)
                .map_err(|e| StoreError(format!("Failed to encode skill: {}", e)))?,
        )
        .bind(&swap.message)
        .bind(swap.scheduled_date)
        .bind(swap.status.as_str())
        .bind(swap.created_at)
        .bind(swap.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                debug!(swap_id = %swap.id, "swap inserted");
                Ok(InsertOutcome::Created(swap))
            }
            // The pending-pair unique index rejected the insert: another
            // pending swap already links the two participants.
            Err(e) if e.as_database_error().is_some_and(|d| d.is_unique_violation()) => {
                Ok(InsertOutcome::DuplicatePending)
            }
            Err(e) => Err(StoreError(format!("Failed to insert swap: {}", e))),
        }
    }

    async fn transition(
        &self,
        id: SwapId,
        expected: SwapStatus,
        next: SwapStatus,
        completed: Option<DateTime<Utc>>,
    ) -> Result<Option<Swap>, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE swaps
            SET status = $3, completed_date = COALESCE($4, completed_date), updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            SWAP_COLUMNS
        ))
        .bind(id)
        .bind(expected.as_str())
        .bind(next.as_str())
        .bind(completed)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError(format!("Failed to transition swap: {}", e)))?;

        row.as_ref().map(swap_from_row).transpose()
    }

    async fn write_rating(
        &self,
        id: SwapId,
        slot: RatingSlot,
        rating: SwapRating,
    ) -> Result<Option<Swap>, StoreError> {
        let column = match slot {
            RatingSlot::Requester => "requester_rating",
            RatingSlot::Recipient => "recipient_rating",
        };
        let row = sqlx::query(&format!(
            r#"
            UPDATE swaps
            SET {column} = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'completed' AND {column} IS NULL
            RETURNING {columns}
            "#,
            column = column,
            columns = SWAP_COLUMNS
        ))
        .bind(id)
        .bind(rating_json(&rating)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError(format!("Failed to write rating: {}", e)))?;

        row.as_ref().map(swap_from_row).transpose()
    }

    async fn delete_pending(&self, id: SwapId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM swaps WHERE id = $1 AND status = 'pending'")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError(format!("Failed to delete swap: {}", e)))?;
        Ok(result.rows_affected() > 0)
    }

    async fn completed_rated_for_user(&self, user: UserId) -> Result<Vec<Swap>, StoreError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM swaps
            WHERE (requester = $1 OR recipient = $1)
              AND status = 'completed'
              AND (requester_rating IS NOT NULL OR recipient_rating IS NOT NULL)
            "#,
            SWAP_COLUMNS
        ))
        .bind(user)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError(format!("Failed to load rated swaps: {}", e)))?;

        rows.iter().map(swap_from_row).collect()
    }

    async fn list_for_user(&self, user: UserId) -> Result<Vec<Swap>, StoreError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM swaps
            WHERE requester = $1 OR recipient = $1
            ORDER BY created_at DESC
            "#,
            SWAP_COLUMNS
        ))
        .bind(user)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError(format!("Failed to list swaps: {}", e)))?;

        rows.iter().map(swap_from_row).collect()
    }

    async fn list_pending_for_recipient(&self, user: UserId) -> Result<Vec<Swap>, StoreError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM swaps
            WHERE recipient = $1 AND status = 'pending'
            ORDER BY created_at DESC
            "#,
            SWAP_COLUMNS
        ))
        .bind(user)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError(format!("Failed to list pending swaps: {}", e)))?;

        rows.iter().map(swap_from_row).collect()
    }

    async fn list_all(&self) -> Result<Vec<Swap>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM swaps ORDER BY created_at DESC",
            SWAP_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError(format!("Failed to list swaps: {}", e)))?;

        rows.iter().map(swap_from_row).collect()
    }
}
