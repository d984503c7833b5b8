//! User API endpoints
//!
//! Endpoints:
//!   GET /search   -> public directory search by skill and/or location
//!   GET /:id      -> public profile by id (403 when private)
//!   PUT /profile  -> partial update of the caller's own profile

use axum::{
    extract::{Path, Query, State},
    routing::{get, put},
    Json, Router,
};

use crate::api::{Actor, ApiError, ApiState};
use crate::directory::{ProfileUpdate, SearchFilter, UserProfile};
use crate::swap::{SwapError, UserId};

async fn search_users(
    State(state): State<ApiState>,
    Query(filter): Query<SearchFilter>,
) -> Result<Json<Vec<UserProfile>>, ApiError> {
    Ok(Json(state.users.search(&filter).await?))
}

async fn get_user(
    State(state): State<ApiState>,
    Path(id): Path<UserId>,
) -> Result<Json<UserProfile>, ApiError> {
    let profile = state
        .users
        .find_by_id(id)
        .await?
        .ok_or(SwapError::NotFound("user"))?;
    if !profile.is_public {
        return Err(SwapError::Forbidden("profile is private".to_string()).into());
    }
    Ok(Json(profile))
}

async fn update_profile(
    State(state): State<ApiState>,
    Actor(actor): Actor,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<UserProfile>, ApiError> {
    if update.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(SwapError::Validation("name is required".to_string()).into());
    }
    let profile = state
        .users
        .update_profile(actor, &update)
        .await?
        .ok_or(SwapError::NotFound("user"))?;
    Ok(Json(profile))
}

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/search", get(search_users))
        .route("/profile", put(update_profile))
        .route("/:id", get(get_user))
        .with_state(state)
}
