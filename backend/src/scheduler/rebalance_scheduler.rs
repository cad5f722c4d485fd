//! Rebalance Scheduler
//!
//! Per list: `Idle -> PendingDebounce -> Executing -> removed`.
//!
//! The first trigger for a list starts two timers, a debounce timer that is
//! pushed out by every further trigger and a max-wait timer that is not.
//! Whichever fires first claims the entry and spawns the rebalance job; the
//! other is aborted. A trigger that finds an already claimed entry replaces it
//! and starts a new burst.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::{sleep_until, Instant};

use crate::config::RebalanceConfig;
use crate::domain::{DomainError, DomainResult, ListId};
use super::pending::PendingRebalance;
use super::Rebalancer;

#[derive(Clone)]
pub struct RebalanceScheduler {
    inner: Arc<SchedulerInner>,
}

struct SchedulerInner {
    pending: DashMap<ListId, Arc<PendingRebalance>>,
    debounce: Duration,
    max_wait: Duration,
    rebalancer: Arc<dyn Rebalancer>,
    runtime: Handle,
    executions: AtomicU64,
}

impl RebalanceScheduler {
    /// Scheduler bound to the tokio runtime it is created on
    pub fn new(config: &RebalanceConfig, rebalancer: Arc<dyn Rebalancer>) -> DomainResult<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| {
                DomainError::Internal(format!("Rebalance scheduler needs a tokio runtime: {}", e))
            })?;
        Ok(Self::with_handle(config, rebalancer, runtime))
    }

    pub fn with_handle(
        config: &RebalanceConfig,
        rebalancer: Arc<dyn Rebalancer>,
        runtime: Handle,
    ) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                pending: DashMap::new(),
                debounce: config.debounce(),
                max_wait: config.max_wait(),
                rebalancer,
                runtime,
                executions: AtomicU64::new(0),
            }),
        }
    }

    /// Signal that `list_id` needs a rebalance. Never blocks on the job.
    pub fn trigger(&self, list_id: ListId) {
        self.inner.trigger(list_id);
    }

    /// Run the pending rebalance of `list_id` now, unless a timer already did.
    ///
    /// Returns whether this call started the job.
    pub fn execute_once(&self, list_id: ListId) -> bool {
        let entry = self.inner.pending.get(&list_id).map(|e| Arc::clone(e.value()));
        match entry {
            Some(entry) => self.inner.execute_entry(list_id, &entry),
            None => false,
        }
    }

    /// Whether a burst is waiting or running for `list_id`
    pub fn is_pending(&self, list_id: ListId) -> bool {
        self.inner.pending.contains_key(&list_id)
    }

    pub fn pending_count(&self) -> usize {
        self.inner.pending.len()
    }

    /// Rebalance jobs started since creation
    pub fn executions(&self) -> u64 {
        self.inner.executions.load(Ordering::Relaxed)
    }
}

impl SchedulerInner {
    fn trigger(self: &Arc<Self>, list_id: ListId) {
        let now = Instant::now();
        loop {
            match self.pending.entry(list_id) {
                Entry::Occupied(occupied) => {
                    let entry = Arc::clone(occupied.get());
                    if entry.extend_debounce(now + self.debounce) {
                        log::trace!("Rebalance of list {} pushed back", list_id);
                        return;
                    }
                    // Claimed by a timer already; this trigger starts a new burst
                    occupied.remove();
                }
                Entry::Vacant(vacant) => {
                    let entry = Arc::new(PendingRebalance::new(
                        now + self.debounce,
                        now + self.max_wait,
                    ));
                    vacant.insert(Arc::clone(&entry));
                    self.start_timers(list_id, entry);
                    log::debug!("Rebalance of list {} scheduled", list_id);
                    return;
                }
            }
        }
    }

    fn start_timers(self: &Arc<Self>, list_id: ListId, entry: Arc<PendingRebalance>) {
        let debounce = self
            .runtime
            .spawn(Arc::clone(self).debounce_timer(list_id, Arc::clone(&entry)));
        let max_wait = self
            .runtime
            .spawn(Arc::clone(self).max_wait_timer(list_id, Arc::clone(&entry)));
        entry.attach_timers(vec![debounce, max_wait]);
    }

    async fn debounce_timer(self: Arc<Self>, list_id: ListId, entry: Arc<PendingRebalance>) {
        while let Some(deadline) = entry.debounce_deadline() {
            if Instant::now() >= deadline {
                self.execute_entry(list_id, &entry);
                return;
            }
            sleep_until(deadline).await;
        }
    }

    async fn max_wait_timer(self: Arc<Self>, list_id: ListId, entry: Arc<PendingRebalance>) {
        sleep_until(entry.max_wait_deadline()).await;
        self.execute_entry(list_id, &entry);
    }

    /// Claim `entry` and spawn its job. The job outlives whoever called this.
    fn execute_entry(self: &Arc<Self>, list_id: ListId, entry: &Arc<PendingRebalance>) -> bool {
        if !entry.claim() {
            return false;
        }
        self.executions.fetch_add(1, Ordering::Relaxed);
        self.runtime.spawn(Arc::clone(self).run_job(list_id, Arc::clone(entry)));
        true
    }

    async fn run_job(self: Arc<Self>, list_id: ListId, entry: Arc<PendingRebalance>) {
        if let Err(e) = self.rebalancer.rebalance(list_id).await {
            log::error!("Rebalance of list {} failed: {}", list_id, e);
        }
        // A newer burst may have replaced this entry already
        self.pending.remove_if(&list_id, |_, current| Arc::ptr_eq(current, &entry));
    }
}
