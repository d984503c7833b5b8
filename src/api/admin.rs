//! Admin API endpoints
//!
//! Every route requires the caller's directory entry to carry the `admin`
//! role. Admin accounts themselves cannot be banned.
//!
//! Endpoints:
//!   GET /users           -> every profile
//!   GET /swaps           -> every swap record
//!   GET /stats           -> platform-wide counts
//!   PUT /users/:id/ban   -> set the ban flag
//!   PUT /users/:id/unban -> clear the ban flag

use axum::{
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};
use serde::Serialize;

use crate::api::{Actor, ApiError, ApiState};
use crate::directory::{UserProfile, UserRole};
use crate::swap::{Swap, SwapError, SwapStatus, UserId};

/// Resolve the actor and require the admin role.
async fn require_admin(state: &ApiState, actor: UserId) -> Result<(), ApiError> {
    let profile = state
        .users
        .find_by_id(actor)
        .await?
        .ok_or(SwapError::NotFound("user"))?;
    if profile.role != UserRole::Admin {
        return Err(SwapError::Forbidden("admin role required".to_string()).into());
    }
    Ok(())
}

async fn list_users(
    State(state): State<ApiState>,
    Actor(actor): Actor,
) -> Result<Json<Vec<UserProfile>>, ApiError> {
    require_admin(&state, actor).await?;
    Ok(Json(state.users.list_all().await?))
}

async fn list_swaps(
    State(state): State<ApiState>,
    Actor(actor): Actor,
) -> Result<Json<Vec<Swap>>, ApiError> {
    require_admin(&state, actor).await?;
    Ok(Json(state.swaps.list_all().await?))
}

/// Platform-wide counts for the admin dashboard. `completion_rate` is a
/// percentage of all swaps, rounded to two decimals, zero when no swaps exist.
#[derive(Debug, Serialize, PartialEq)]
pub struct PlatformStats {
    pub total_users: usize,
    pub total_swaps: usize,
    pub pending_swaps: usize,
    pub completed_swaps: usize,
    pub banned_users: usize,
    pub completion_rate: f64,
}

fn compute_stats(users: &[UserProfile], swaps: &[Swap]) -> PlatformStats {
    let total_swaps = swaps.len();
    let completed_swaps = swaps
        .iter()
        .filter(|s| s.status == SwapStatus::Completed)
        .count();
    let completion_rate = if total_swaps > 0 {
        (completed_swaps as f64 / total_swaps as f64 * 10000.0).round() / 100.0
    } else {
        0.0
    };
    PlatformStats {
        total_users: users.len(),
        total_swaps,
        pending_swaps: swaps
            .iter()
            .filter(|s| s.status == SwapStatus::Pending)
            .count(),
        completed_swaps,
        banned_users: users.iter().filter(|u| u.is_banned).count(),
        completion_rate,
    }
}

async fn stats(
    State(state): State<ApiState>,
    Actor(actor): Actor,
) -> Result<Json<PlatformStats>, ApiError> {
    require_admin(&state, actor).await?;
    let users = state.users.list_all().await?;
    let swaps = state.swaps.list_all().await?;
    Ok(Json(compute_stats(&users, &swaps)))
}

async fn ban_user(
    State(state): State<ApiState>,
    Actor(actor): Actor,
    Path(id): Path<UserId>,
) -> Result<Json<UserProfile>, ApiError> {
    require_admin(&state, actor).await?;
    let target = state
        .users
        .find_by_id(id)
        .await?
        .ok_or(SwapError::NotFound("user"))?;
    if target.role == UserRole::Admin {
        return Err(SwapError::Forbidden("cannot ban admin users".to_string()).into());
    }
    if !state.users.set_banned(id, true).await? {
        return Err(SwapError::NotFound("user").into());
    }
    let profile = state
        .users
        .find_by_id(id)
        .await?
        .ok_or(SwapError::NotFound("user"))?;
    Ok(Json(profile))
}

async fn unban_user(
    State(state): State<ApiState>,
    Actor(actor): Actor,
    Path(id): Path<UserId>,
) -> Result<Json<UserProfile>, ApiError> {
    require_admin(&state, actor).await?;
    if !state.users.set_banned(id, false).await? {
        return Err(SwapError::NotFound("user").into());
    }
    let profile = state
        .users
        .find_by_id(id)
        .await?
        .ok_or(SwapError::NotFound("user"))?;
    Ok(Json(profile))
}

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/users", get(list_users))
        .route("/swaps", get(list_swaps))
        .route("/stats", get(stats))
        .route("/users/:id/ban", put(ban_user))
        .route("/users/:id/unban", put(unban_user))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::swap::{NewSwap, SkillDescriptor};
    use uuid::Uuid;

    fn swap_with_status(status: SwapStatus) -> Swap {
        let mut swap = Swap::from_request(NewSwap {
            requester: Uuid::new_v4(),
            recipient: Uuid::new_v4(),
            requested_skill: SkillDescriptor::named("Guitar"),
            offered_skill: SkillDescriptor::named("Baking"),
            message: None,
            scheduled_date: None,
        });
        swap.status = status;
        swap
    }

    #[test]
    fn stats_count_statuses_and_bans() {
        let mut banned = UserProfile::new("Ben");
        banned.is_banned = true;
        let users = vec![UserProfile::new("Ana"), banned];
        let swaps = vec![
            swap_with_status(SwapStatus::Pending),
            swap_with_status(SwapStatus::Completed),
            swap_with_status(SwapStatus::Completed),
            swap_with_status(SwapStatus::Rejected),
        ];

        let stats = compute_stats(&users, &swaps);
        assert_eq!(stats.total_users, 2);
        assert_eq!(stats.banned_users, 1);
        assert_eq!(stats.total_swaps, 4);
        assert_eq!(stats.pending_swaps, 1);
        assert_eq!(stats.completed_swaps, 2);
        assert_eq!(stats.completion_rate, 50.0);
    }

    #[test]
    fn completion_rate_is_zero_without_swaps() {
        let stats = compute_stats(&[], &[]);
        assert_eq!(stats.completion_rate, 0.0);
        assert_eq!(stats.total_swaps, 0);
    }
}
