//! HTTP API endpoints
//!
//! Thin axum surface over the swap core and the user directory. The service
//! sits behind an authenticating gateway; the caller's identity arrives as a
//! UUID in the `x-user-id` header and is extracted by [`Actor`].
//!
//! Error mapping: `NotFound` 404, `Forbidden` 403, `Validation` 400,
//! `InvalidState`/`Conflict` 409, storage failure 500. Bodies carry a
//! machine-readable `error` kind plus a human message so callers can
//! distinguish kinds without parsing text.

pub mod admin;
pub mod skills;
pub mod swaps;
pub mod users;

use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::error;
use uuid::Uuid;

use crate::directory::UserDirectory;
use crate::store::SwapStore;
use crate::swap::{LifecycleEngine, SwapError, UserId};

/// Shared state handed to every route.
#[derive(Clone)]
pub struct ApiState {
    pub engine: Arc<LifecycleEngine>,
    pub users: Arc<dyn UserDirectory>,
    pub swaps: Arc<dyn SwapStore>,
}

/// Wire shape of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

/// Core error carried into a response.
pub struct ApiError(pub SwapError);

impl From<SwapError> for ApiError {
    fn from(err: SwapError) -> Self {
        ApiError(err)
    }
}

impl From<crate::store::StoreError> for ApiError {
    fn from(err: crate::store::StoreError) -> Self {
        ApiError(SwapError::from(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match &self.0 {
            SwapError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found", self.0.to_string()),
            SwapError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden", self.0.to_string()),
            SwapError::Validation(_) => (StatusCode::BAD_REQUEST, "validation", self.0.to_string()),
            SwapError::InvalidState { .. } => {
                (StatusCode::CONFLICT, "invalid_state", self.0.to_string())
            }
            SwapError::Conflict(_) => (StatusCode::CONFLICT, "conflict", self.0.to_string()),
            SwapError::Store(reason) => {
                error!(%reason, "storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "storage",
                    "server error".to_string(),
                )
            }
        };
        (status, Json(ErrorBody { error: kind, message })).into_response()
    }
}

/// Authenticated caller identity, forwarded by the gateway in `x-user-id`.
#[derive(Debug, Clone, Copy)]
pub struct Actor(pub UserId);

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v).ok());
        match id {
            Some(id) => Ok(Actor(id)),
            None => Err((
                StatusCode::UNAUTHORIZED,
                Json(ErrorBody {
                    error: "unauthorized",
                    message: "missing or malformed x-user-id header".to_string(),
                }),
            )
                .into_response()),
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Assemble the full application router.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/swaps", swaps::create_router(state.clone()))
        .nest("/api/users", users::create_router(state.clone()))
        .nest("/api/skills", skills::create_router(state.clone()))
        .nest("/api/admin", admin::create_router(state))
}
