//! Rebalance Scheduling
//!
//! Collapses bursts of "needs rebalance" signals per list into one run.
//! The scheduler only decides *when*; *what* runs is a [`Rebalancer`].

mod pending;
mod rebalance_scheduler;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::config::OrderingConfig;
use crate::domain::{ChecklistEvent, DomainResult, ListId};
use crate::ordering::rebalance_list;
use crate::repository::{Isolation, TransactionRetryExecutor};

pub use rebalance_scheduler::RebalanceScheduler;

/// Work executed once per coalesced burst
#[async_trait]
pub trait Rebalancer: Send + Sync {
    async fn rebalance(&self, list_id: ListId) -> DomainResult<()>;
}

/// Re-spaces the list in a strict, retried transaction
pub struct StoreRebalancer {
    executor: TransactionRetryExecutor,
    ordering: OrderingConfig,
    events: Option<broadcast::Sender<ChecklistEvent>>,
}

impl StoreRebalancer {
    pub fn new(executor: TransactionRetryExecutor, ordering: OrderingConfig) -> Self {
        Self {
            executor,
            ordering,
            events: None,
        }
    }

    /// Publish a `Rebalanced` event after each commit
    pub fn with_events(mut self, events: broadcast::Sender<ChecklistEvent>) -> Self {
        self.events = Some(events);
        self
    }
}

#[async_trait]
impl Rebalancer for StoreRebalancer {
    async fn rebalance(&self, list_id: ListId) -> DomainResult<()> {
        let ordering = &self.ordering;
        let rewritten = self
            .executor
            .run(Isolation::Strict, "rebalance", |conn| rebalance_list(conn, ordering, list_id))
            .await?;

        log::info!("Rebalanced list {} ({} rows moved)", list_id, rewritten);
        if let Some(events) = &self.events {
            // No subscribers is fine
            let _ = events.send(ChecklistEvent::Rebalanced { list_id, rewritten });
        }
        Ok(())
    }
}
