//! Integration tests for the swap core
//!
//! These tests drive the lifecycle engine and the rating aggregation engine
//! end to end against the in-memory backends: creation guards, the full
//! transition table, authorization, rating slots, reputation recomputation,
//! and the concurrency contract on guarded mutations.

use std::sync::Arc;

use skillswap::{
    LifecycleEngine, MemoryDirectory, MemorySwapStore, NewSwap, SkillDescriptor, SwapError,
    SwapStatus, UserDirectory, UserId, UserProfile,
};

// ============================================================================
// Test Helpers
// ============================================================================

struct TestContext {
    engine: LifecycleEngine,
    users: Arc<MemoryDirectory>,
}

async fn setup() -> TestContext {
    let swaps = Arc::new(MemorySwapStore::new());
    let users = Arc::new(MemoryDirectory::new());
    let engine = LifecycleEngine::new(swaps, users.clone());
    TestContext { engine, users }
}

async fn add_user(ctx: &TestContext, name: &str) -> UserId {
    let profile = UserProfile::new(name);
    let id = profile.id;
    ctx.users.insert(profile).await.unwrap();
    id
}

async fn add_private_user(ctx: &TestContext, name: &str) -> UserId {
    let mut profile = UserProfile::new(name);
    profile.is_public = false;
    let id = profile.id;
    ctx.users.insert(profile).await.unwrap();
    id
}

async fn add_banned_user(ctx: &TestContext, name: &str) -> UserId {
    let mut profile = UserProfile::new(name);
    profile.is_banned = true;
    let id = profile.id;
    ctx.users.insert(profile).await.unwrap();
    id
}

fn request(requester: UserId, recipient: UserId) -> NewSwap {
    NewSwap {
        requester,
        recipient,
        requested_skill: SkillDescriptor::named("Piano"),
        offered_skill: SkillDescriptor::named("Spanish"),
        message: Some("trade?".to_string()),
        scheduled_date: None,
    }
}

// ============================================================================
// Creation Guards
// ============================================================================

mod creation {
    use super::*;

    #[tokio::test]
    async fn create_starts_pending() {
        let ctx = setup().await;
        let a = add_user(&ctx, "Ana").await;
        let b = add_user(&ctx, "Ben").await;

        let swap = ctx.engine.create_swap(request(a, b)).await.unwrap();
        assert_eq!(swap.status, SwapStatus::Pending);
        assert_eq!(swap.requester, a);
        assert_eq!(swap.recipient, b);
        assert!(swap.completed_date.is_none());
    }

    #[tokio::test]
    async fn unknown_recipient_is_not_found() {
        let ctx = setup().await;
        let a = add_user(&ctx, "Ana").await;
        let ghost = uuid::Uuid::new_v4();

        let err = ctx.engine.create_swap(request(a, ghost)).await.unwrap_err();
        assert_eq!(err, SwapError::NotFound("recipient"));
    }

    #[tokio::test]
    async fn private_recipient_is_forbidden() {
        let ctx = setup().await;
        let a = add_user(&ctx, "Ana").await;
        let b = add_private_user(&ctx, "Ben").await;

        let err = ctx.engine.create_swap(request(a, b)).await.unwrap_err();
        assert!(matches!(err, SwapError::Forbidden(_)));
    }

    #[tokio::test]
    async fn banned_recipient_is_forbidden() {
        let ctx = setup().await;
        let a = add_user(&ctx, "Ana").await;
        let b = add_banned_user(&ctx, "Ben").await;

        let err = ctx.engine.create_swap(request(a, b)).await.unwrap_err();
        assert!(matches!(err, SwapError::Forbidden(_)));
    }

    #[tokio::test]
    async fn missing_skill_name_is_rejected() {
        let ctx = setup().await;
        let a = add_user(&ctx, "Ana").await;
        let b = add_user(&ctx, "Ben").await;

        let mut req = request(a, b);
        req.requested_skill.name = String::new();
        let err = ctx.engine.create_swap(req).await.unwrap_err();
        assert!(matches!(err, SwapError::Validation(_)));
    }

    #[tokio::test]
    async fn duplicate_pending_conflicts_in_either_direction() {
        let ctx = setup().await;
        let a = add_user(&ctx, "Ana").await;
        let b = add_user(&ctx, "Ben").await;

        ctx.engine.create_swap(request(a, b)).await.unwrap();

        // Same direction.
        let err = ctx.engine.create_swap(request(a, b)).await.unwrap_err();
        assert!(matches!(err, SwapError::Conflict(_)));

        // Reversed direction is still the same unordered pair.
        let err = ctx.engine.create_swap(request(b, a)).await.unwrap_err();
        assert!(matches!(err, SwapError::Conflict(_)));
    }

    #[tokio::test]
    async fn resolved_swap_frees_the_pair_for_a_new_request() {
        let ctx = setup().await;
        let a = add_user(&ctx, "Ana").await;
        let b = add_user(&ctx, "Ben").await;

        let swap = ctx.engine.create_swap(request(a, b)).await.unwrap();
        ctx.engine.reject_swap(swap.id, b).await.unwrap();

        // The rejected swap no longer blocks the pair.
        ctx.engine.create_swap(request(b, a)).await.unwrap();
    }
}

// ============================================================================
// Transition Table
// ============================================================================

mod transitions {
    use super::*;

    #[tokio::test]
    async fn full_happy_path() {
        let ctx = setup().await;
        let a = add_user(&ctx, "Ana").await;
        let b = add_user(&ctx, "Ben").await;

        let swap = ctx.engine.create_swap(request(a, b)).await.unwrap();
        let swap = ctx.engine.accept_swap(swap.id, b).await.unwrap();
        assert_eq!(swap.status, SwapStatus::Accepted);

        let swap = ctx.engine.complete_swap(swap.id, a).await.unwrap();
        assert_eq!(swap.status, SwapStatus::Completed);
        assert!(swap.completed_date.is_some());
    }

    #[tokio::test]
    async fn reject_and_cancel_are_terminal() {
        let ctx = setup().await;
        let a = add_user(&ctx, "Ana").await;
        let b = add_user(&ctx, "Ben").await;

        let rejected = ctx.engine.create_swap(request(a, b)).await.unwrap();
        let rejected = ctx.engine.reject_swap(rejected.id, b).await.unwrap();
        assert_eq!(rejected.status, SwapStatus::Rejected);

        // No further transitions from a terminal state.
        let err = ctx.engine.accept_swap(rejected.id, b).await.unwrap_err();
        assert!(matches!(err, SwapError::InvalidState { .. }));

        let cancelled = ctx.engine.create_swap(request(a, b)).await.unwrap();
        let cancelled = ctx.engine.cancel_swap(cancelled.id, a).await.unwrap();
        assert_eq!(cancelled.status, SwapStatus::Cancelled);

        let err = ctx.engine.complete_swap(cancelled.id, a).await.unwrap_err();
        assert!(matches!(err, SwapError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn complete_from_pending_is_invalid_and_leaves_status() {
        let ctx = setup().await;
        let a = add_user(&ctx, "Ana").await;
        let b = add_user(&ctx, "Ben").await;

        let swap = ctx.engine.create_swap(request(a, b)).await.unwrap();
        let err = ctx.engine.complete_swap(swap.id, b).await.unwrap_err();
        assert_eq!(
            err,
            SwapError::InvalidState {
                required: SwapStatus::Accepted,
                actual: SwapStatus::Pending,
            }
        );

        let unchanged = &ctx.engine.swaps_for_user(a).await.unwrap()[0];
        assert_eq!(unchanged.status, SwapStatus::Pending);
    }

    #[tokio::test]
    async fn delete_removes_only_pending_records() {
        let ctx = setup().await;
        let a = add_user(&ctx, "Ana").await;
        let b = add_user(&ctx, "Ben").await;

        let swap = ctx.engine.create_swap(request(a, b)).await.unwrap();
        ctx.engine.delete_swap(swap.id, a).await.unwrap();
        assert!(ctx.engine.swaps_for_user(a).await.unwrap().is_empty());

        // Accepted swaps cannot be deleted; the record stays.
        let swap = ctx.engine.create_swap(request(a, b)).await.unwrap();
        ctx.engine.accept_swap(swap.id, b).await.unwrap();
        let err = ctx.engine.delete_swap(swap.id, a).await.unwrap_err();
        assert!(matches!(err, SwapError::InvalidState { .. }));
        assert_eq!(ctx.engine.swaps_for_user(a).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_swap_is_not_found() {
        let ctx = setup().await;
        let a = add_user(&ctx, "Ana").await;
        let err = ctx
            .engine
            .accept_swap(uuid::Uuid::new_v4(), a)
            .await
            .unwrap_err();
        assert_eq!(err, SwapError::NotFound("swap"));
    }
}

// ============================================================================
// Authorization
// ============================================================================

mod authorization {
    use super::*;

    #[tokio::test]
    async fn only_recipient_accepts_or_rejects() {
        let ctx = setup().await;
        let a = add_user(&ctx, "Ana").await;
        let b = add_user(&ctx, "Ben").await;
        let outsider = add_user(&ctx, "Eve").await;

        let swap = ctx.engine.create_swap(request(a, b)).await.unwrap();
        for actor in [a, outsider] {
            let err = ctx.engine.accept_swap(swap.id, actor).await.unwrap_err();
            assert!(matches!(err, SwapError::Forbidden(_)));
            let err = ctx.engine.reject_swap(swap.id, actor).await.unwrap_err();
            assert!(matches!(err, SwapError::Forbidden(_)));
        }
        // Status never moved.
        assert_eq!(
            ctx.engine.swaps_for_user(a).await.unwrap()[0].status,
            SwapStatus::Pending
        );
    }

    #[tokio::test]
    async fn only_requester_cancels_or_deletes() {
        let ctx = setup().await;
        let a = add_user(&ctx, "Ana").await;
        let b = add_user(&ctx, "Ben").await;

        let swap = ctx.engine.create_swap(request(a, b)).await.unwrap();
        let err = ctx.engine.cancel_swap(swap.id, b).await.unwrap_err();
        assert!(matches!(err, SwapError::Forbidden(_)));
        let err = ctx.engine.delete_swap(swap.id, b).await.unwrap_err();
        assert!(matches!(err, SwapError::Forbidden(_)));
    }

    #[tokio::test]
    async fn either_participant_completes() {
        let ctx = setup().await;
        let a = add_user(&ctx, "Ana").await;
        let b = add_user(&ctx, "Ben").await;

        let swap = ctx.engine.create_swap(request(a, b)).await.unwrap();
        ctx.engine.accept_swap(swap.id, b).await.unwrap();
        // Recipient completes this one.
        let done = ctx.engine.complete_swap(swap.id, b).await.unwrap();
        assert_eq!(done.status, SwapStatus::Completed);
    }
}

// ============================================================================
// Ratings and Reputation
// ============================================================================

mod ratings {
    use super::*;

    async fn completed_swap(ctx: &TestContext, a: UserId, b: UserId) -> skillswap::SwapId {
        let swap = ctx.engine.create_swap(request(a, b)).await.unwrap();
        ctx.engine.accept_swap(swap.id, b).await.unwrap();
        ctx.engine.complete_swap(swap.id, a).await.unwrap();
        swap.id
    }

    #[tokio::test]
    async fn round_trip_updates_both_reputations() {
        let ctx = setup().await;
        let a = add_user(&ctx, "Ana").await;
        let b = add_user(&ctx, "Ben").await;
        let id = completed_swap(&ctx, a, b).await;

        ctx.engine.rate_swap(id, a, 5, "great").await.unwrap();
        // One-sided rating must not touch either summary yet.
        assert_eq!(ctx.users.find_by_id(a).await.unwrap().unwrap().rating.count, 0);
        assert_eq!(ctx.users.find_by_id(b).await.unwrap().unwrap().rating.count, 0);

        ctx.engine.rate_swap(id, b, 4, "good").await.unwrap();

        // Ratings received: Ana got Ben's 4, Ben got Ana's 5.
        let ana = ctx.users.find_by_id(a).await.unwrap().unwrap();
        let ben = ctx.users.find_by_id(b).await.unwrap().unwrap();
        assert_eq!(ana.rating.count, 1);
        assert_eq!(ana.rating.average, 4.0);
        assert_eq!(ben.rating.count, 1);
        assert_eq!(ben.rating.average, 5.0);
    }

    #[tokio::test]
    async fn rating_requires_completed_state() {
        let ctx = setup().await;
        let a = add_user(&ctx, "Ana").await;
        let b = add_user(&ctx, "Ben").await;

        let swap = ctx.engine.create_swap(request(a, b)).await.unwrap();
        let err = ctx.engine.rate_swap(swap.id, a, 5, "nice").await.unwrap_err();
        assert!(matches!(err, SwapError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn out_of_range_value_and_empty_comment_are_rejected() {
        let ctx = setup().await;
        let a = add_user(&ctx, "Ana").await;
        let b = add_user(&ctx, "Ben").await;
        let id = completed_swap(&ctx, a, b).await;

        let err = ctx.engine.rate_swap(id, b, 6, "too high").await.unwrap_err();
        assert!(matches!(err, SwapError::Validation(_)));
        let err = ctx.engine.rate_swap(id, b, 0, "too low").await.unwrap_err();
        assert!(matches!(err, SwapError::Validation(_)));
        let err = ctx.engine.rate_swap(id, b, 3, "   ").await.unwrap_err();
        assert!(matches!(err, SwapError::Validation(_)));

        // Nothing was written.
        let swap = &ctx.engine.swaps_for_user(a).await.unwrap()[0];
        assert!(swap.recipient_rating.is_none());
    }

    #[tokio::test]
    async fn each_slot_is_write_once() {
        let ctx = setup().await;
        let a = add_user(&ctx, "Ana").await;
        let b = add_user(&ctx, "Ben").await;
        let id = completed_swap(&ctx, a, b).await;

        ctx.engine.rate_swap(id, a, 5, "first").await.unwrap();
        let err = ctx.engine.rate_swap(id, a, 1, "second").await.unwrap_err();
        assert!(matches!(err, SwapError::Conflict(_)));

        // First write survives.
        let swap = &ctx.engine.swaps_for_user(a).await.unwrap()[0];
        assert_eq!(swap.requester_rating.as_ref().unwrap().value, 5);
        assert_eq!(swap.requester_rating.as_ref().unwrap().comment, "first");
    }

    #[tokio::test]
    async fn outsider_cannot_rate() {
        let ctx = setup().await;
        let a = add_user(&ctx, "Ana").await;
        let b = add_user(&ctx, "Ben").await;
        let eve = add_user(&ctx, "Eve").await;
        let id = completed_swap(&ctx, a, b).await;

        let err = ctx.engine.rate_swap(id, eve, 5, "nope").await.unwrap_err();
        assert!(matches!(err, SwapError::Forbidden(_)));
    }

    #[tokio::test]
    async fn reputation_accumulates_across_swaps() {
        let ctx = setup().await;
        let a = add_user(&ctx, "Ana").await;
        let b = add_user(&ctx, "Ben").await;
        let c = add_user(&ctx, "Cam").await;

        let first = completed_swap(&ctx, a, b).await;
        ctx.engine.rate_swap(first, a, 5, "great").await.unwrap();
        ctx.engine.rate_swap(first, b, 2, "meh").await.unwrap();

        let second = completed_swap(&ctx, c, a).await;
        ctx.engine.rate_swap(second, c, 5, "solid").await.unwrap();
        ctx.engine.rate_swap(second, a, 3, "fine").await.unwrap();

        // Ana received 2 (from Ben) and 5 (from Cam).
        let ana = ctx.users.find_by_id(a).await.unwrap().unwrap();
        assert_eq!(ana.rating.count, 2);
        assert_eq!(ana.rating.average, 3.5);
    }

    #[tokio::test]
    async fn recomputation_is_idempotent_on_unchanged_history() {
        let ctx = setup().await;
        let a = add_user(&ctx, "Ana").await;
        let b = add_user(&ctx, "Ben").await;
        let id = completed_swap(&ctx, a, b).await;
        ctx.engine.rate_swap(id, a, 5, "great").await.unwrap();
        ctx.engine.rate_swap(id, b, 4, "good").await.unwrap();

        let before = ctx.users.find_by_id(a).await.unwrap().unwrap().rating;
        ctx.engine.aggregator().recompute_user(a).await.unwrap();
        let after = ctx.users.find_by_id(a).await.unwrap().unwrap().rating;
        assert_eq!(before.average, after.average);
        assert_eq!(before.count, after.count);
    }
}

// ============================================================================
// Concurrency Contract
// ============================================================================

mod concurrency {
    use super::*;

    #[tokio::test]
    async fn concurrent_creations_yield_one_pending() {
        let ctx = setup().await;
        let a = add_user(&ctx, "Ana").await;
        let b = add_user(&ctx, "Ben").await;

        let (first, second) = tokio::join!(
            ctx.engine.create_swap(request(a, b)),
            ctx.engine.create_swap(request(b, a)),
        );

        let successes = [first.is_ok(), second.is_ok()]
            .iter()
            .filter(|ok| **ok)
            .count();
        assert_eq!(successes, 1);
        assert_eq!(ctx.engine.swaps_for_user(a).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_accept_and_reject_have_one_winner() {
        let ctx = setup().await;
        let a = add_user(&ctx, "Ana").await;
        let b = add_user(&ctx, "Ben").await;
        let swap = ctx.engine.create_swap(request(a, b)).await.unwrap();

        let (accepted, rejected) = tokio::join!(
            ctx.engine.accept_swap(swap.id, b),
            ctx.engine.reject_swap(swap.id, b),
        );

        assert!(accepted.is_ok() != rejected.is_ok());
        let status = ctx.engine.swaps_for_user(a).await.unwrap()[0].status;
        assert!(matches!(
            status,
            SwapStatus::Accepted | SwapStatus::Rejected
        ));
    }
}

// ============================================================================
// Listings
// ============================================================================

mod listings {
    use super::*;

    #[tokio::test]
    async fn pending_inbox_only_shows_requests_addressed_to_the_user() {
        let ctx = setup().await;
        let a = add_user(&ctx, "Ana").await;
        let b = add_user(&ctx, "Ben").await;
        let c = add_user(&ctx, "Cam").await;

        ctx.engine.create_swap(request(a, b)).await.unwrap();
        ctx.engine.create_swap(request(c, a)).await.unwrap();

        let inbox = ctx.engine.pending_for_recipient(a).await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].requester, c);

        // my-swaps shows both roles.
        assert_eq!(ctx.engine.swaps_for_user(a).await.unwrap().len(), 2);
    }
}
