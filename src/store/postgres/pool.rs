//! Database connection pool using sqlx

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use crate::store::postgres::{PgSwapStore, PgUserDirectory};
use crate::store::StoreError;

pub struct DatabasePool {
    pool: PgPool,
}

impl DatabasePool {
    pub async fn new(connection_string: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(connection_string)
            .await
            .map_err(|e| StoreError(format!("Failed to connect to PostgreSQL: {}", e)))?;

        info!("Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Create tables and indexes if they do not exist yet.
    pub async fn init_schema(&self) -> Result<(), StoreError> {
        info!("Initializing database schema...");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id UUID PRIMARY KEY,
                name TEXT NOT NULL,
                location TEXT,
                profile_photo TEXT,
                skills_offered JSONB NOT NULL DEFAULT '[]'::jsonb,
                skills_wanted JSONB NOT NULL DEFAULT '[]'::jsonb,
                availability JSONB NOT NULL DEFAULT '{}'::jsonb,
                is_public BOOLEAN NOT NULL DEFAULT TRUE,
                role TEXT NOT NULL DEFAULT 'user',
                rating_average DOUBLE PRECISION NOT NULL DEFAULT 0,
                rating_count INTEGER NOT NULL DEFAULT 0,
                is_banned BOOLEAN NOT NULL DEFAULT FALSE,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError(format!("Failed to create users table: {}", e)))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS swaps (
                id UUID PRIMARY KEY,
                requester UUID NOT NULL,
                recipient UUID NOT NULL,
                requested_skill JSONB NOT NULL,
                offered_skill JSONB NOT NULL,
                message TEXT,
                scheduled_date TIMESTAMPTZ,
                status TEXT NOT NULL,
                completed_date TIMESTAMPTZ,
                requester_rating JSONB,
                recipient_rating JSONB,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError(format!("Failed to create swaps table: {}", e)))?;

        // One pending swap per unordered participant pair. Concurrent
        // creations race against this index instead of a read-then-write.
        sqlx::query(
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_swaps_pending_pair
            ON swaps (LEAST(requester, recipient), GREATEST(requester, recipient))
            WHERE status = 'pending'
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError(format!("Failed to create pending-pair index: {}", e)))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_swaps_requester ON swaps (requester, created_at DESC)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError(format!("Failed to create requester index: {}", e)))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_swaps_recipient ON swaps (recipient, created_at DESC)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError(format!("Failed to create recipient index: {}", e)))?;

        info!("Database schema initialized");
        Ok(())
    }

    pub fn swap_store(&self) -> PgSwapStore {
        PgSwapStore::new(self.pool.clone())
    }

    pub fn user_directory(&self) -> PgUserDirectory {
        PgUserDirectory::new(self.pool.clone())
    }

    pub fn inner(&self) -> &PgPool {
        &self.pool
    }
}
