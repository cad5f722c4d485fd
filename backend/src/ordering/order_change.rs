//! Order Change
//!
//! Places an item at a 1-based rank among the other items of its partition
//! by picking a fractional position between (or beyond) its new neighbors.

use crate::config::OrderingConfig;
use crate::domain::{DomainResult, ItemId, ListId};
use crate::repository::PositionStore;

/// Result of a single move
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderChange {
    pub position: f64,
    /// Partition the item was moved in
    pub completed: bool,
    /// Smallest gap of the partition after the write
    pub min_gap: Option<f64>,
    pub rebalance_needed: bool,
}

/// Position that puts an item at `rank` among `others` (ascending).
///
/// Ranks outside `1..=others.len() + 1` clamp to the start or end.
pub fn position_for_rank(others: &[f64], rank: i64, config: &OrderingConfig) -> f64 {
    let len = others.len();
    if len == 0 {
        return config.first_position;
    }

    let idx = rank.saturating_sub(1).clamp(0, len as i64) as usize;
    if idx == 0 {
        others[0] - config.gap
    } else if idx >= len {
        others[len - 1] + config.gap
    } else {
        (others[idx - 1] + others[idx]) / 2.0
    }
}

/// Move `item_id` to `rank` within its current partition
pub fn change_order<S>(
    store: &S,
    config: &OrderingConfig,
    list_id: ListId,
    item_id: ItemId,
    rank: i64,
) -> DomainResult<OrderChange>
where
    S: PositionStore + ?Sized,
{
    let completed = store.lock_item(list_id, item_id)?;
    let others = store.list_positions(list_id, completed, item_id)?;

    let position = position_for_rank(&others, rank, config);
    store.write_position(list_id, item_id, position)?;

    let min_gap = store.min_gap(list_id, completed)?;
    let rebalance_needed = min_gap.is_some_and(|gap| gap < config.min_gap_threshold);
    if rebalance_needed {
        log::debug!(
            "List {} partition completed={} down to gap {:?}",
            list_id, completed, min_gap
        );
    }

    Ok(OrderChange {
        position,
        completed,
        min_gap,
        rebalance_needed,
    })
}
