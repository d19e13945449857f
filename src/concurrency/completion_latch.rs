use log::warn;
use parking_lot::{Condvar, Mutex};

#[derive(Debug)]
enum LatchState<R> {
    Pending,
    Completed(R),
    /// Signaled without a value: the producer went away before finishing.
    Abandoned,
}

/// A broadcast-once latch carrying a value.
///
/// The latch moves from pending to signaled exactly once. Every waiter,
/// whether it arrives before or after the signal, observes the same value.
/// The value is stored under the same mutex the waiters re-check after
/// waking, so anything written before [`complete`](Self::complete) is
/// visible to every [`wait`](Self::wait) that returns it.
#[derive(Debug)]
pub struct CompletionLatch<R> {
    state: Mutex<LatchState<R>>,
    signal: Condvar,
}

impl<R> CompletionLatch<R> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LatchState::Pending),
            signal: Condvar::new(),
        }
    }

    /// Stores `value` and wakes all waiters.
    ///
    /// Returns `false` (and drops `value`) if the latch was already signaled.
    pub fn complete(&self, value: R) -> bool {
        self.signal_with(LatchState::Completed(value))
    }

    /// Signals the latch without a value. Waiters get `None`.
    pub fn abandon(&self) -> bool {
        self.signal_with(LatchState::Abandoned)
    }

    pub fn is_complete(&self) -> bool {
        !matches!(*self.state.lock(), LatchState::Pending)
    }

    fn signal_with(&self, next: LatchState<R>) -> bool {
        let mut state = self.state.lock();
        if !matches!(*state, LatchState::Pending) {
            warn!("Completion latch signaled more than once; ignoring");
            return false;
        }
        *state = next;
        self.signal.notify_all();
        true
    }
}

impl<R: Clone> CompletionLatch<R> {
    /// Blocks until the latch is signaled and returns a copy of its value,
    /// or `None` if it was abandoned.
    pub fn wait(&self) -> Option<R> {
        let mut state = self.state.lock();
        while matches!(*state, LatchState::Pending) {
            self.signal.wait(&mut state);
        }
        match &*state {
            LatchState::Completed(value) => Some(value.clone()),
            _ => None,
        }
    }
}

impl<R> Default for CompletionLatch<R> {
    fn default() -> Self {
        Self::new()
    }
}
