//! User repository - PostgreSQL operations for the user directory

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::debug;

use crate::directory::{
    ProfileUpdate, RatingSummary, SearchFilter, UserDirectory, UserProfile, UserRole, SEARCH_LIMIT,
};
use crate::store::StoreError;
use crate::swap::models::UserId;

const USER_COLUMNS: &str = "id, name, location, profile_photo, skills_offered, skills_wanted, \
     availability, is_public, role, rating_average, rating_count, is_banned, created_at, updated_at";

pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn write_profile(&self, profile: &UserProfile) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE users
            SET name = $2, location = $3, profile_photo = $4, skills_offered = $5,
                skills_wanted = $6, availability = $7, is_public = $8, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(profile.id)
        .bind(&profile.name)
        .bind(&profile.location)
        .bind(&profile.profile_photo)
        .bind(encode(&profile.skills_offered)?)
        .bind(encode(&profile.skills_wanted)?)
        .bind(encode(&profile.availability)?)
        .bind(profile.is_public)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError(format!("Failed to update profile: {}", e)))?;
        Ok(())
    }
}

fn encode<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(value).map_err(|e| StoreError(format!("Failed to encode field: {}", e)))
}

fn role_as_str(role: UserRole) -> &'static str {
    match role {
        UserRole::User => "user",
        UserRole::Admin => "admin",
    }
}

fn role_from_str(s: &str) -> UserRole {
    match s {
        "admin" => UserRole::Admin,
        _ => UserRole::User,
    }
}

fn profile_from_row(row: &PgRow) -> Result<UserProfile, StoreError> {
    let skills_offered = serde_json::from_value(row.get("skills_offered"))
        .map_err(|e| StoreError(format!("Bad skills_offered column: {}", e)))?;
    let skills_wanted = serde_json::from_value(row.get("skills_wanted"))
        .map_err(|e| StoreError(format!("Bad skills_wanted column: {}", e)))?;
    let availability = serde_json::from_value(row.get("availability"))
        .map_err(|e| StoreError(format!("Bad availability column: {}", e)))?;
    let role: String = row.get("role");

    Ok(UserProfile {
        id: row.get("id"),
        name: row.get("name"),
        location: row.get("location"),
        profile_photo: row.get("profile_photo"),
        skills_offered,
        skills_wanted,
        availability,
        is_public: row.get("is_public"),
        role: role_from_str(&role),
        rating: RatingSummary {
            average: row.get("rating_average"),
            count: row.get::<i32, _>("rating_count") as u32,
        },
        is_banned: row.get("is_banned"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_by_id(&self, id: UserId) -> Result<Option<UserProfile>, StoreError> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError(format!("Failed to get user: {}", e)))?;

        row.as_ref().map(profile_from_row).transpose()
    }

    async fn insert(&self, profile: UserProfile) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users
            (id, name, location, profile_photo, skills_offered, skills_wanted,
             availability, is_public, role, rating_average, rating_count, is_banned,
             created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(profile.id)
        .bind(&profile.name)
        .bind(&profile.location)
        .bind(&profile.profile_photo)
        .bind(encode(&profile.skills_offered)?)
        .bind(encode(&profile.skills_wanted)?)
        .bind(encode(&profile.availability)?)
        .bind(profile.is_public)
        .bind(role_as_str(profile.role))
        .bind(profile.rating.average)
        .bind(profile.rating.count as i32)
        .bind(profile.is_banned)
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError(format!("Failed to insert user: {}", e)))?;

        debug!(user_id = %profile.id, "user inserted");
        Ok(())
    }

    async fn search(&self, filter: &SearchFilter) -> Result<Vec<UserProfile>, StoreError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM users
            WHERE is_public AND NOT is_banned
              AND ($1::text IS NULL OR EXISTS (
                    SELECT 1 FROM jsonb_array_elements(skills_offered || skills_wanted) AS s
                    WHERE s->>'name' ILIKE '%' || $1 || '%'))
              AND ($2::text IS NULL OR location ILIKE '%' || $2 || '%')
            LIMIT {}
            "#,
            USER_COLUMNS, SEARCH_LIMIT
        ))
        .bind(&filter.skill)
        .bind(&filter.location)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError(format!("Failed to search users: {}", e)))?;

        rows.iter().map(profile_from_row).collect()
    }

    async fn update_profile(
        &self,
        id: UserId,
        update: &ProfileUpdate,
    ) -> Result<Option<UserProfile>, StoreError> {
        let Some(mut profile) = self.find_by_id(id).await? else {
            return Ok(None);
        };
        update.apply_to(&mut profile);
        self.write_profile(&profile).await?;
        Ok(Some(profile))
    }

    async fn update_rating(&self, id: UserId, summary: RatingSummary) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE users SET rating_average = $2, rating_count = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(summary.average)
        .bind(summary.count as i32)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError(format!("Failed to update rating: {}", e)))?;
        Ok(())
    }

    async fn set_banned(&self, id: UserId, banned: bool) -> Result<bool, StoreError> {
        let result =
            sqlx::query("UPDATE users SET is_banned = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(banned)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError(format!("Failed to set ban flag: {}", e)))?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_all(&self) -> Result<Vec<UserProfile>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM users ORDER BY created_at DESC",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError(format!("Failed to list users: {}", e)))?;

        rows.iter().map(profile_from_row).collect()
    }
}
