//! PostgreSQL backend for the swap record store and user directory
//!
//! Hand-written SQL over a shared connection pool. The business guards ride
//! on the statements themselves: a partial unique index enforces the
//! single-pending-swap-per-pair rule, status transitions are predicated
//! updates, and rating slots are written only where still null.

pub mod pool;
pub mod swaps;
pub mod users;

pub use pool::DatabasePool;
pub use swaps::PgSwapStore;
pub use users::PgUserDirectory;
