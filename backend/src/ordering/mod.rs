//! Ordering Layer
//!
//! Transaction bodies that compute and persist positions:
//! - order_change: move one item to a rank within its partition
//! - toggle: flip completion and move to the edge of the new partition
//! - rebalance: re-space a whole list
//!
//! Each body takes a [`PositionStore`](crate::repository::PositionStore) and
//! expects to be run by the transaction executor.

mod order_change;
mod toggle;
mod rebalance;

pub use order_change::{change_order, position_for_rank, OrderChange};
pub use toggle::{toggle_completed, ToggleOutcome};
pub use rebalance::rebalance_list;
