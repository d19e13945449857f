use std::sync::atomic::{AtomicU64, Ordering};

/// Counters describing how much work a flight group coalesced.
#[derive(Debug, Default)]
pub struct FlightStats {
    /// Callers that registered a call and ran the operation.
    leaders: AtomicU64,
    /// Callers that attached to an in-flight call instead of running it.
    followers: AtomicU64,
    /// Bursts whose operation produced a result.
    completed: AtomicU64,
    /// Bursts whose leader panicked or was cancelled before producing a result.
    abandoned: AtomicU64,
}

/// Point-in-time copy of [`FlightStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlightStatsSnapshot {
    pub leaders: u64,
    pub followers: u64,
    pub completed: u64,
    pub abandoned: u64,
}

impl FlightStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_leader(&self) {
        self.leaders.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_follower(&self) {
        self.followers.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_completed(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_abandoned(&self) {
        self.abandoned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> FlightStatsSnapshot {
        FlightStatsSnapshot {
            leaders: self.leaders.load(Ordering::Relaxed),
            followers: self.followers.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            abandoned: self.abandoned.load(Ordering::Relaxed),
        }
    }
}

impl FlightStatsSnapshot {
    /// Fraction of callers that were served by someone else's execution.
    pub fn dedup_ratio(&self) -> f64 {
        let total = self.leaders + self.followers;
        if total == 0 {
            0.0
        } else {
            self.followers as f64 / total as f64
        }
    }
}
