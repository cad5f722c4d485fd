//! Item Positioning Operations
//!
//! Read-side helpers around item positions. Moves, toggles and rebalances
//! live in the ordering layer.

use async_trait::async_trait;
use rusqlite::{params, Connection};

use crate::config::OrderingConfig;
use crate::domain::{DomainResult, Item, ListId};
use crate::repository::position_store::{row_to_item, ITEM_COLUMNS};
use crate::repository::retry::Isolation;

/// Trait for item positioning operations
#[async_trait]
pub trait ItemPositioningOperations {
    /// Position a new item would get at the end of the incomplete partition
    async fn get_next_position(&self, list_id: ListId) -> DomainResult<f64>;

    /// Items of one partition in presentation order
    async fn list_partition(&self, list_id: ListId, completed: bool) -> DomainResult<Vec<Item>>;
}

/// `last + gap`, or `first_position` for an empty partition
pub(super) fn next_position(
    conn: &Connection,
    config: &OrderingConfig,
    list_id: ListId,
) -> DomainResult<f64> {
    let last: Option<f64> = conn.query_row(
        "SELECT MAX(position) FROM items WHERE list_id = ?1 AND completed = 0",
        params![list_id],
        |row| row.get(0),
    )?;
    Ok(last.map_or(config.first_position, |p| p + config.gap))
}

#[async_trait]
impl ItemPositioningOperations for super::item_repo::ItemRepository {
    async fn get_next_position(&self, list_id: ListId) -> DomainResult<f64> {
        let config = self.ordering.clone();
        self.executor
            .run(Isolation::Weak, "next position", |conn| next_position(conn, &config, list_id))
            .await
    }

    async fn list_partition(&self, list_id: ListId, completed: bool) -> DomainResult<Vec<Item>> {
        self.executor
            .run(Isolation::Weak, "list partition", |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM items
                     WHERE list_id = ?1 AND completed = ?2
                     ORDER BY position, id",
                    ITEM_COLUMNS
                ))?;
                let items = stmt
                    .query_map(params![list_id, completed], row_to_item)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(items)
            })
            .await
    }
}
