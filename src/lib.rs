//! SkillSwap
//!
//! Peer-to-peer skill-exchange marketplace: users advertise skills they
//! offer and want, discover each other, and negotiate swaps. The core of the
//! crate is the swap lifecycle state machine and the two-sided rating
//! aggregation engine; the rest is plumbing over the stores.
//!
//! ## Module Structure
//!
//! ```text
//! src/
//! ├── lib.rs       - Crate root with re-exports
//! ├── main.rs      - Server entrypoint
//! ├── config.rs    - Configuration management
//! ├── swap/        - Core domain
//! │   ├── models.rs    - Swap entity, status, ratings, skills
//! │   ├── error.rs     - SwapError taxonomy
//! │   ├── lifecycle.rs - State machine and table-driven authorization
//! │   └── rating.rs    - Reputation recomputation from swap history
//! ├── directory/   - User directory contract and profile model
//! ├── store/       - Swap record store contract
//! │   ├── memory.rs    - In-memory backend (tests, dev fallback)
//! │   └── postgres/    - PostgreSQL backend (pool, swaps, users)
//! └── api/         - HTTP endpoints (swaps, users, skills, admin)
//! ```

pub mod api;
pub mod config;
pub mod directory;
pub mod store;
pub mod swap;

// Re-export main types for convenience
pub use config::AppConfig;
pub use directory::{
    Availability, ProfileUpdate, RatingSummary, SearchFilter, Skill, UserDirectory, UserProfile,
    UserRole,
};
pub use store::{
    DatabasePool, InsertOutcome, MemoryDirectory, MemorySwapStore, StoreError, SwapStore,
};
pub use swap::{
    authorize, LifecycleEngine, NewSwap, RatingAggregator, RatingSlot, SkillDescriptor,
    SkillLevel, Swap, SwapError, SwapId, SwapOperation, SwapRating, SwapStatus, UserId,
};
