//! Toggle Completion
//!
//! Flips an item's completed flag and moves it to the edge of the partition
//! it joins: the top of the completed items, or the bottom of the incomplete
//! ones. Flag and position change in the same transaction.

use crate::config::OrderingConfig;
use crate::domain::{DomainResult, Item, ItemId, ListId};
use crate::repository::PositionStore;
use super::order_change::change_order;

#[derive(Debug, Clone, PartialEq)]
pub struct ToggleOutcome {
    /// The item as stored after the toggle
    pub item: Item,
    pub rebalance_needed: bool,
}

pub fn toggle_completed<S>(
    store: &S,
    config: &OrderingConfig,
    list_id: ListId,
    item_id: ItemId,
    completed: bool,
) -> DomainResult<ToggleOutcome>
where
    S: PositionStore + ?Sized,
{
    let current = store.lock_item(list_id, item_id)?;
    if current == completed {
        return Ok(ToggleOutcome {
            item: store.load_item(list_id, item_id)?,
            rebalance_needed: false,
        });
    }

    store.set_completed(list_id, item_id, completed)?;

    let rank = if completed {
        1
    } else {
        store.count_partition(list_id, completed, item_id)? as i64 + 1
    };
    let change = change_order(store, config, list_id, item_id, rank)?;

    Ok(ToggleOutcome {
        item: store.load_item(list_id, item_id)?,
        rebalance_needed: change.rebalance_needed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DomainError, PositionedRow};
    use crate::repository::test_support::{memory_conn, seed_items};
    use rusqlite::Connection;

    fn config() -> OrderingConfig {
        OrderingConfig {
            gap: 10.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_completing_goes_above_other_completed_items() {
        let conn = memory_conn();
        let ids = seed_items(&conn, 1, &[(false, 0.0), (true, 5.0), (true, 15.0)]);

        let outcome = toggle_completed(&conn, &config(), 1, ids[0], true).unwrap();
        assert!(outcome.item.completed);
        assert!(outcome.item.position < 5.0);
        assert!(conn.list_positions(1, false, 0).unwrap().is_empty());
    }

    #[test]
    fn test_uncompleting_goes_below_other_incomplete_items() {
        let conn = memory_conn();
        let ids = seed_items(&conn, 1, &[(false, 0.0), (false, 10.0), (true, -3.0)]);

        let outcome = toggle_completed(&conn, &config(), 1, ids[2], false).unwrap();
        assert!(!outcome.item.completed);
        assert_eq!(outcome.item.position, 20.0);
    }

    #[test]
    fn test_toggle_into_empty_partition() {
        let conn = memory_conn();
        let ids = seed_items(&conn, 1, &[(false, 40.0)]);

        let outcome = toggle_completed(&conn, &config(), 1, ids[0], true).unwrap();
        assert_eq!(outcome.item.position, config().first_position);
    }

    #[test]
    fn test_toggle_to_current_state_keeps_position() {
        let conn = memory_conn();
        let ids = seed_items(&conn, 1, &[(true, 7.0), (true, 8.0)]);

        let outcome = toggle_completed(&conn, &config(), 1, ids[1], true).unwrap();
        assert!(outcome.item.completed);
        assert_eq!(outcome.item.position, 8.0);
    }

    /// Store whose position writes always fail
    struct FailingWrites<'a>(&'a Connection);

    impl PositionStore for FailingWrites<'_> {
        fn lock_item(&self, list_id: ListId, item_id: ItemId) -> DomainResult<bool> {
            self.0.lock_item(list_id, item_id)
        }

        fn list_positions(
            &self,
            list_id: ListId,
            completed: bool,
            exclude_id: ItemId,
        ) -> DomainResult<Vec<f64>> {
            self.0.list_positions(list_id, completed, exclude_id)
        }

        fn write_position(&self, _: ListId, _: ItemId, _: f64) -> DomainResult<()> {
            Err(DomainError::Storage("disk I/O error".to_string()))
        }

        fn min_gap(&self, list_id: ListId, completed: bool) -> DomainResult<Option<f64>> {
            self.0.min_gap(list_id, completed)
        }

        fn set_completed(
            &self,
            list_id: ListId,
            item_id: ItemId,
            completed: bool,
        ) -> DomainResult<()> {
            self.0.set_completed(list_id, item_id, completed)
        }

        fn count_partition(
            &self,
            list_id: ListId,
            completed: bool,
            exclude_id: ItemId,
        ) -> DomainResult<usize> {
            self.0.count_partition(list_id, completed, exclude_id)
        }

        fn lock_list(&self, list_id: ListId) -> DomainResult<Vec<PositionedRow>> {
            self.0.lock_list(list_id)
        }

        fn load_item(&self, list_id: ListId, item_id: ItemId) -> DomainResult<Item> {
            self.0.load_item(list_id, item_id)
        }
    }

    #[test]
    fn test_failed_position_write_rolls_back_flag() {
        let conn = memory_conn();
        let ids = seed_items(&conn, 1, &[(false, 0.0), (false, 10.0), (true, 5.0)]);

        let tx = conn.unchecked_transaction().unwrap();
        let err = toggle_completed(&FailingWrites(&tx), &config(), 1, ids[0], true).unwrap_err();
        assert!(matches!(err, DomainError::Storage(_)));
        // Flag was already flipped inside the transaction; dropping it undoes that
        drop(tx);

        let item = conn.load_item(1, ids[0]).unwrap();
        assert!(!item.completed);
        assert_eq!(item.position, 0.0);
        assert_eq!(conn.list_positions(1, true, 0).unwrap(), vec![5.0]);
    }

    #[test]
    fn test_toggle_missing_item() {
        let conn = memory_conn();
        assert!(toggle_completed(&conn, &config(), 1, 12, true).unwrap_err().is_not_found());
    }
}
