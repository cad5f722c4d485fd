//! Commands for item ordering
//!
//! Move, toggle and rebalance requests. Moves and toggles run at strict
//! isolation and arm the rebalance scheduler when the partition got too
//! dense.

use serde::Serialize;

use crate::domain::{ChecklistEvent, DomainResult, Item, ItemId, ListId};
use crate::ordering::{change_order, toggle_completed as toggle_body};
use crate::repository::Isolation;
use crate::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MoveResult {
    pub position: f64,
    pub rebalance_needed: bool,
}

/// Move an item to a 1-based rank within its partition
pub async fn move_item(
    state: &AppState,
    list_id: ListId,
    item_id: ItemId,
    desired_rank: i64,
) -> DomainResult<MoveResult> {
    let ordering = &state.config.ordering;
    let change = state
        .executor
        .run(Isolation::Strict, "move item", |conn| {
            change_order(conn, ordering, list_id, item_id, desired_rank)
        })
        .await?;

    state.emit(ChecklistEvent::Reordered {
        list_id,
        item_id,
        position: change.position,
    });
    if change.rebalance_needed {
        trigger_rebalance(state, list_id);
    }

    Ok(MoveResult {
        position: change.position,
        rebalance_needed: change.rebalance_needed,
    })
}

/// Set an item's completion flag, moving it to the edge of its new partition
pub async fn toggle_completed(
    state: &AppState,
    list_id: ListId,
    item_id: ItemId,
    completed: bool,
) -> DomainResult<Item> {
    let ordering = &state.config.ordering;
    let outcome = state
        .executor
        .run(Isolation::Strict, "toggle item", |conn| {
            toggle_body(conn, ordering, list_id, item_id, completed)
        })
        .await?;

    state.emit(ChecklistEvent::Updated {
        list_id,
        item: outcome.item.clone(),
    });
    if outcome.rebalance_needed {
        trigger_rebalance(state, list_id);
    }

    Ok(outcome.item)
}

/// Ask for a background rebalance of `list_id`. Returns immediately.
pub fn trigger_rebalance(state: &AppState, list_id: ListId) {
    state.scheduler.trigger(list_id);
}
