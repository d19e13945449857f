//! Single-flight request coalescing.
//!
//! [`concurrency::FlightGroup`] makes sure that, for any key, at most one execution of an
//! operation is in flight and that every concurrent caller for that key receives the
//! result of that one execution. [`concurrency::AsyncFlightGroup`] offers the same for
//! tokio tasks. The [`network`] module carries the call codec a remote-call client would
//! encode requests with.

pub mod common;
pub mod concurrency;
pub mod network;
