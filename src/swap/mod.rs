//! Swap core: lifecycle state machine and rating aggregation
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌─────────────────┐     ┌──────────────────┐
//! │ NewSwap      │────►│ LifecycleEngine  │────►│ SwapStore        │
//! │ (creation)   │     │ (state machine,  │     │ (atomic guarded  │
//! └──────────────┘     │  authorization)  │     │  mutations)      │
//!                      └─────────────────┘     └──────────────────┘
//!                               │ second rating fills
//!                               ▼
//!                      ┌─────────────────┐     ┌──────────────────┐
//!                      │ RatingAggregator │────►│ UserDirectory    │
//!                      │ (full-history    │     │ (derived rating  │
//!                      │  recompute)      │     │  summary)        │
//!                      └─────────────────┘     └──────────────────┘
//! ```
//!
//! The engines hold no state of their own between calls; all durable state
//! lives in the two collaborators.

pub mod error;
pub mod lifecycle;
pub mod models;
pub mod rating;

pub use error::SwapError;
pub use lifecycle::{authorize, LifecycleEngine, SwapOperation, MAX_RATING, MIN_RATING};
pub use models::{
    NewSwap, RatingSlot, SkillDescriptor, SkillLevel, Swap, SwapId, SwapRating, SwapStatus, UserId,
};
pub use rating::RatingAggregator;
