//! Pending Rebalance Entry
//!
//! One burst of triggers for one list. The entry's mutex guards its
//! deadlines, the executed flag and the timer handles; nothing else.

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

struct PendingState {
    debounce_deadline: Instant,
    max_wait_deadline: Instant,
    executed: bool,
    timers: Vec<JoinHandle<()>>,
}

pub(super) struct PendingRebalance {
    state: Mutex<PendingState>,
}

impl PendingRebalance {
    pub(super) fn new(debounce_deadline: Instant, max_wait_deadline: Instant) -> Self {
        Self {
            state: Mutex::new(PendingState {
                debounce_deadline,
                max_wait_deadline,
                executed: false,
                timers: Vec::new(),
            }),
        }
    }

    /// Push the debounce deadline out. Returns false once executed.
    pub(super) fn extend_debounce(&self, deadline: Instant) -> bool {
        let mut state = self.state.lock();
        if state.executed {
            return false;
        }
        // Never past max-wait; that timer fires first anyway.
        state.debounce_deadline = deadline.min(state.max_wait_deadline);
        true
    }

    /// Current debounce deadline, `None` once executed
    pub(super) fn debounce_deadline(&self) -> Option<Instant> {
        let state = self.state.lock();
        (!state.executed).then_some(state.debounce_deadline)
    }

    pub(super) fn max_wait_deadline(&self) -> Instant {
        self.state.lock().max_wait_deadline
    }

    /// Mark executed and stop the timers. Only the first caller gets `true`.
    ///
    /// The timer that calls this is among the aborted handles; it must not
    /// await after claiming.
    pub(super) fn claim(&self) -> bool {
        let mut state = self.state.lock();
        if state.executed {
            return false;
        }
        state.executed = true;
        for timer in state.timers.drain(..) {
            timer.abort();
        }
        true
    }

    pub(super) fn attach_timers(&self, timers: Vec<JoinHandle<()>>) {
        let mut state = self.state.lock();
        if state.executed {
            for timer in timers {
                timer.abort();
            }
        } else {
            state.timers.extend(timers);
        }
    }
}
