//! # Request Coalescing
//!
//! Primitives that collapse concurrent calls for the same key into one execution.
//!
//! ## Modules
//!
//! - **`flight_group`**: `FlightGroup`, the thread-blocking group. Followers park on a
//!   per-call `CompletionLatch` while the leader runs the operation.
//! - **`async_flight_group`**: `AsyncFlightGroup`, the same contract for tokio tasks.
//! - **`completion_latch`**: a broadcast-once latch carrying the call's result.
//! - **`flight_stats`**: leader/follower/completion counters shared by both groups.

pub mod async_flight_group;
pub mod completion_latch;
pub mod flight_group;
pub mod flight_stats;

pub use async_flight_group::AsyncFlightGroup;
pub use completion_latch::CompletionLatch;
pub use flight_group::FlightGroup;
pub use flight_stats::{FlightStats, FlightStatsSnapshot};
