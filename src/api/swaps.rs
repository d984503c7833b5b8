//! Swap API endpoints
//!
//! Endpoints:
//!   POST   /                -> create a swap request
//!   GET    /my-swaps        -> caller's swaps, both roles
//!   GET    /pending         -> pending requests addressed to the caller
//!   PUT    /:id/accept      -> recipient accepts
//!   PUT    /:id/reject      -> recipient rejects
//!   PUT    /:id/cancel      -> requester cancels
//!   PUT    /:id/complete    -> either participant completes
//!   POST   /:id/rate        -> rate a completed swap
//!   DELETE /:id             -> requester removes a pending request

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::api::{Actor, ApiError, ApiState};
use crate::swap::{NewSwap, SkillDescriptor, Swap, SwapId, UserId};

#[derive(Debug, Deserialize)]
pub struct CreateSwapRequest {
    pub recipient_id: UserId,
    pub requested_skill: SkillDescriptor,
    pub offered_skill: SkillDescriptor,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub scheduled_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct RateSwapRequest {
    pub rating: u8,
    pub comment: String,
}

async fn create_swap(
    State(state): State<ApiState>,
    Actor(actor): Actor,
    Json(body): Json<CreateSwapRequest>,
) -> Result<Json<Swap>, ApiError> {
    let swap = state
        .engine
        .create_swap(NewSwap {
            requester: actor,
            recipient: body.recipient_id,
            requested_skill: body.requested_skill,
            offered_skill: body.offered_skill,
            message: body.message,
            scheduled_date: body.scheduled_date,
        })
        .await?;
    Ok(Json(swap))
}

async fn my_swaps(
    State(state): State<ApiState>,
    Actor(actor): Actor,
) -> Result<Json<Vec<Swap>>, ApiError> {
    Ok(Json(state.engine.swaps_for_user(actor).await?))
}

async fn pending_swaps(
    State(state): State<ApiState>,
    Actor(actor): Actor,
) -> Result<Json<Vec<Swap>>, ApiError> {
    Ok(Json(state.engine.pending_for_recipient(actor).await?))
}

async fn accept_swap(
    State(state): State<ApiState>,
    Actor(actor): Actor,
    Path(id): Path<SwapId>,
) -> Result<Json<Swap>, ApiError> {
    Ok(Json(state.engine.accept_swap(id, actor).await?))
}

async fn reject_swap(
    State(state): State<ApiState>,
    Actor(actor): Actor,
    Path(id): Path<SwapId>,
) -> Result<Json<Swap>, ApiError> {
    Ok(Json(state.engine.reject_swap(id, actor).await?))
}

async fn cancel_swap(
    State(state): State<ApiState>,
    Actor(actor): Actor,
    Path(id): Path<SwapId>,
) -> Result<Json<Swap>, ApiError> {
    Ok(Json(state.engine.cancel_swap(id, actor).await?))
}

async fn complete_swap(
    State(state): State<ApiState>,
    Actor(actor): Actor,
    Path(id): Path<SwapId>,
) -> Result<Json<Swap>, ApiError> {
    Ok(Json(state.engine.complete_swap(id, actor).await?))
}

async fn rate_swap(
    State(state): State<ApiState>,
    Actor(actor): Actor,
    Path(id): Path<SwapId>,
    Json(body): Json<RateSwapRequest>,
) -> Result<Json<Swap>, ApiError> {
    let swap = state
        .engine
        .rate_swap(id, actor, body.rating, &body.comment)
        .await?;
    Ok(Json(swap))
}

async fn delete_swap(
    State(state): State<ApiState>,
    Actor(actor): Actor,
    Path(id): Path<SwapId>,
) -> Result<StatusCode, ApiError> {
    state.engine.delete_swap(id, actor).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/", post(create_swap))
        .route("/my-swaps", get(my_swaps))
        .route("/pending", get(pending_swaps))
        .route("/:id/accept", put(accept_swap))
        .route("/:id/reject", put(reject_swap))
        .route("/:id/cancel", put(cancel_swap))
        .route("/:id/complete", put(complete_swap))
        .route("/:id/rate", post(rate_swap))
        .route("/:id", delete(delete_swap))
        .with_state(state)
}
