//! # Flight Group
//!
//! `FlightGroup` coalesces concurrent calls that share a key: the first caller (the
//! *leader*) runs the operation, every caller that arrives while it is running (a
//! *follower*) blocks until the leader finishes and receives a copy of the same result.
//!
//! ## Architecture
//!
//! ```text
//!   Caller A (leader)        Caller B (follower)        Caller C (follower)
//!   ═══════════════════════════════════════════════════════════════════════════
//!        │                         │                          │
//!        │ do_call("x", op)        │ do_call("x", op)         │ do_call("x", op)
//!        ▼                         ▼                          ▼
//!   ┌────────────────────────────────────────────────────────────────────────┐
//!   │  calls: Mutex<HashMap<K, Arc<Call>>>   (membership only, O(1) holds)  │
//!   │                                                                        │
//!   │   "x" ──► Call { latch: CompletionLatch<Result<T, E>> }                │
//!   └────────────────────────────────────────────────────────────────────────┘
//!        │                         │                          │
//!        │ op() (no lock held)     │ latch.wait()             │ latch.wait()
//!        ▼                         │                          │
//!   latch.complete(result) ───────►├─────────────────────────►│
//!        │                         ▼                          ▼
//!        │ remove "x"           Ok(42)                     Ok(42)
//!        ▼
//!     Ok(42)
//! ```
//!
//! ## Burst Lifecycle
//!
//! ```text
//!   absent ──(leader inserts)──► in flight ──(latch signaled)──► signaled ──(leader removes)──► absent
//!                                    ▲                              ▲
//!                            followers attach               late followers still
//!                                                           return immediately
//! ```
//!
//! A key's entry lives from the leader's registration until the leader removes it
//! right after signaling. The next call for the key after removal starts a brand-new
//! burst; nothing is cached across bursts. A follower that looked the entry up just
//! before removal holds its own `Arc` to the call and is unaffected.
//!
//! ## Errors and Panics
//!
//! The operation's `Err` is stored and handed out exactly like an `Ok`; the group has
//! no error of its own and never inspects the value. If the leader's operation panics,
//! the call is abandoned: the key is removed, then its latch is signaled without a
//! value, and the panic continues on the leader's thread. Followers of an abandoned call
//! start over and one of them becomes the next leader.
//!
//! ## Example Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use std::thread;
//! use flightgroup::concurrency::FlightGroup;
//!
//! let group: Arc<FlightGroup<String, u64, String>> = Arc::new(FlightGroup::new());
//!
//! let handles: Vec<_> = (0..4)
//!     .map(|_| {
//!         let group = Arc::clone(&group);
//!         thread::spawn(move || group.do_call("answer".to_string(), || Ok(42)))
//!     })
//!     .collect();
//!
//! for handle in handles {
//!     assert_eq!(handle.join().unwrap(), Ok(42));
//! }
//! ```

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use log::{debug, trace};
use parking_lot::Mutex;

use crate::concurrency::completion_latch::CompletionLatch;
use crate::concurrency::flight_stats::{FlightStats, FlightStatsSnapshot};

/// One in-flight execution. Never reused across bursts.
#[derive(Debug)]
struct Call<T, E> {
    latch: CompletionLatch<Result<T, E>>,
}

impl<T, E> Call<T, E> {
    fn new() -> Self {
        Self {
            latch: CompletionLatch::new(),
        }
    }
}

/// Coalesces concurrent calls for the same key into a single execution.
#[derive(Debug)]
pub struct FlightGroup<K, T, E> {
    calls: Mutex<HashMap<K, Arc<Call<T, E>>>>,
    stats: FlightStats,
    /// Parks the next leader between signaling its latch and removing its key.
    #[cfg(test)]
    hold_before_remove: Mutex<Option<(Arc<std::sync::Barrier>, Arc<std::sync::Barrier>)>>,
}

enum Registration<T, E> {
    Leader(Arc<Call<T, E>>),
    Follower(Arc<Call<T, E>>),
}

impl<K, T, E> FlightGroup<K, T, E>
where
    K: Eq + Hash + Clone,
    T: Clone,
    E: Clone,
{
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
            stats: FlightStats::new(),
            #[cfg(test)]
            hold_before_remove: Mutex::new(None),
        }
    }

    /// Runs `operation` for `key`, unless a call for `key` is already in flight,
    /// in which case waits for that call and returns a copy of its result.
    ///
    /// Leaders and followers get identical results; a caller cannot tell which
    /// role it played.
    pub fn do_call<F>(&self, key: K, operation: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        loop {
            match self.register(&key) {
                Registration::Follower(call) => {
                    self.stats.record_follower();
                    trace!("Following in-flight call");
                    match call.latch.wait() {
                        Some(result) => return result,
                        None => {
                            debug!("In-flight call was abandoned; retrying registration");
                            continue;
                        }
                    }
                }
                Registration::Leader(call) => {
                    self.stats.record_leader();
                    trace!("Leading new call");

                    let guard = LeaderGuard {
                        group: self,
                        key: &key,
                        call: &call,
                    };
                    let result = operation();
                    call.latch.complete(result.clone());
                    drop(guard);

                    return result;
                }
            }
        }
    }

    /// Returns true if a call for `key` is currently in flight.
    pub fn in_flight(&self, key: &K) -> bool {
        self.calls.lock().contains_key(key)
    }

    /// Number of keys with a call in flight.
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
        if let Some(call) = calls.get(key) {
            return Registration::Follower(Arc::clone(call));
        }
        let call = Arc::new(Call::new());
        calls.insert(key.clone(), Arc::clone(&call));
        Registration::Leader(call)
    }
}

#[cfg(test)]
impl<K, T, E> FlightGroup<K, T, E> {
    fn hold_next_removal(
        &self,
        reached: Arc<std::sync::Barrier>,
        release: Arc<std::sync::Barrier>,
    ) {
        *self.hold_before_remove.lock() = Some((reached, release));
    }

    fn pause_before_remove(&self) {
        let hold = self.hold_before_remove.lock().take();
        if let Some((reached, release)) = hold {
            reached.wait();
            release.wait();
        }
    }
}

impl<K, T, E> Default for FlightGroup<K, T, E>
where
    K: Eq + Hash + Clone,
    T: Clone,
    E: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Removes the leader's entry once the call is over, however it ended.
///
/// A completed call is removed after its latch was signaled. On unwind the
/// latch is still pending: the key is removed first and the latch abandoned
/// after, so released followers re-register against an empty slot.
struct LeaderGuard<'a, K, T, E>
where
    K: Eq + Hash,
{
    group: &'a FlightGroup<K, T, E>,
    key: &'a K,
    call: &'a Call<T, E>,
}

impl<K, T, E> Drop for LeaderGuard<'_, K, T, E>
where
    K: Eq + Hash,
{
    fn drop(&mut self) {
        // Only the leader signals this latch, so the check cannot race.
        if self.call.latch.is_complete() {
            self.group.stats.record_completed();
            #[cfg(test)]
            self.group.pause_before_remove();
            self.group.calls.lock().remove(self.key);
        } else {
            debug!("Leader did not produce a result; abandoning call");
            self.group.calls.lock().remove(self.key);
            self.call.latch.abandon();
            self.group.stats.record_abandoned();
        }
    }
}
