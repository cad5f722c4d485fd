//! Rebalance Body
//!
//! Re-spaces both partitions of a list to `first_position + i * gap` in
//! their current order. Rows already at their target are not rewritten, so
//! a second run over an evenly spaced list changes nothing.

use crate::config::OrderingConfig;
use crate::domain::{DomainResult, ListId};
use crate::repository::PositionStore;

/// Returns the number of rows whose position changed
pub fn rebalance_list<S>(store: &S, config: &OrderingConfig, list_id: ListId) -> DomainResult<usize>
where
    S: PositionStore + ?Sized,
{
    let rows = store.lock_list(list_id)?;
    let mut rewritten = 0;

    for completed in [false, true] {
        let partition = rows.iter().filter(|row| row.completed == completed);
        for (rank, row) in partition.enumerate() {
            let target = config.first_position + rank as f64 * config.gap;
            if row.position != target {
                store.write_position(list_id, row.item_id, target)?;
                rewritten += 1;
            }
        }
    }

    log::debug!("List {}: rebalanced {} of {} rows", list_id, rewritten, rows.len());
    Ok(rewritten)
}
