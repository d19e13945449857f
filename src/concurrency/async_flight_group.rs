//! # Async Flight Group
//!
//! The tokio counterpart of [`FlightGroup`](super::flight_group::FlightGroup). Same
//! contract: one execution per key per burst, every caller in the burst receives a copy
//! of the same result, the key is removed as soon as the leader finishes.
//!
//! ## Completion Signal
//!
//! ```text
//!   leader                              followers
//!   ══════════════════════════════════════════════════════════════════
//!   watch::channel(None) ──► map["x"] = Receiver ──► clone Receiver
//!        │                                                │
//!        │ operation().await                               │ wait_for(Option::is_some)
//!        ▼                                                │
//!   send_replace(Some(result)) ─────────────────────────► ▼
//!        │                                           Some(result).clone()
//!        ▼
//!   remove "x", drop Sender
//! ```
//!
//! The watch channel keeps its last value, so a follower that attaches after the
//! leader sent but before it removed the entry still sees the result immediately.
//!
//! ## Cancellation
//!
//! Dropping the leader's future mid-operation drops its `Sender` and removes the
//! key. Followers observe the closed channel and re-register; one of them becomes the
//! next leader. The map lock is a synchronous mutex and is never held across `.await`.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;

use log::{debug, trace};
use parking_lot::Mutex;
use tokio::sync::watch;

use crate::concurrency::flight_stats::{FlightStats, FlightStatsSnapshot};

type Outcome<T, E> = Option<Result<T, E>>;

/// Coalesces concurrent async calls for the same key into a single execution.
#[derive(Debug)]
pub struct AsyncFlightGroup<K, T, E> {
    calls: Mutex<HashMap<K, watch::Receiver<Outcome<T, E>>>>,
    stats: FlightStats,
}

enum Registration<T, E> {
    Leader(watch::Sender<Outcome<T, E>>),
    Follower(watch::Receiver<Outcome<T, E>>),
}

impl<K, T, E> AsyncFlightGroup<K, T, E>
where
    K: Eq + Hash + Clone,
    T: Clone,
    E: Clone,
{
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
            stats: FlightStats::new(),
        }
    }

    /// Awaits `operation()` for `key`, or the in-flight call for `key` if there is one.
    pub async fn do_call<F, Fut>(&self, key: K, operation: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        loop {
            match self.register(&key) {
                Registration::Follower(mut receiver) => {
                    self.stats.record_follower();
                    trace!("Following in-flight async call");
                    let outcome = match receiver.wait_for(Option::is_some).await {
                        Ok(value) => (*value).clone(),
                        Err(_) => None,
                    };
                    match outcome {
                        Some(result) => return result,
                        None => {
                            debug!("In-flight async call was dropped; retrying registration");
                            continue;
                        }
                    }
                }
                Registration::Leader(sender) => {
                    self.stats.record_leader();
                    trace!("Leading new async call");

                    let mut guard = AsyncLeaderGuard {
                        group: self,
                        key: &key,
                        sender: Some(sender),
                        completed: false,
                    };
                    let result = operation().await;
                    guard.complete(result.clone());
                    drop(guard);

                    return result;
                }
            }
        }
    }

    pub fn in_flight(&self, key: &K) -> bool {
        self.calls.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.lock().is_empty()
    }

    pub fn stats(&self) -> FlightStatsSnapshot {
        self.stats.snapshot()
    }

    fn register(&self, key: &K) -> Registration<T, E> {
        let mut calls = self.calls.lock();
        if let Some(receiver) = calls.get(key) {
            return Registration::Follower(receiver.clone());
        }
        let (sender, receiver) = watch::channel(None);
        calls.insert(key.clone(), receiver);
        Registration::Leader(sender)
    }
}

impl<K, T, E> Default for AsyncFlightGroup<K, T, E>
where
    K: Eq + Hash + Clone,
    T: Clone,
    E: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

struct AsyncLeaderGuard<'a, K, T, E>
where
    K: Eq + Hash,
{
    group: &'a AsyncFlightGroup<K, T, E>,
    key: &'a K,
    sender: Option<watch::Sender<Outcome<T, E>>>,
    completed: bool,
}

impl<K, T, E> AsyncLeaderGuard<'_, K, T, E>
where
    K: Eq + Hash,
{
    fn complete(&mut self, result: Result<T, E>) {
        if let Some(sender) = &self.sender {
            sender.send_replace(Some(result));
            self.completed = true;
        }
    }
}

impl<K, T, E> Drop for AsyncLeaderGuard<'_, K, T, E>
where
    K: Eq + Hash,
{
    fn drop(&mut self) {
        if self.completed {
            self.group.stats.record_completed();
        } else {
            debug!("Async leader dropped before producing a result; abandoning call");
            self.group.stats.record_abandoned();
        }
        self.group.calls.lock().remove(self.key);
        // Closing the channel after removal wakes followers of an abandoned call
        // into a fresh registration.
        self.sender.take();
    }
}
