//! Item Repository - Core CRUD Operations
//!
//! SQLite-backed implementation for Item CRUD operations. Positions are only
//! assigned here on create; afterwards the ordering layer owns them.

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};

use crate::config::OrderingConfig;
use crate::domain::{DomainError, DomainResult, Item, ItemId, ListId};
use crate::repository::position_store::{row_to_item, ITEM_COLUMNS};
use crate::repository::retry::{Isolation, TransactionRetryExecutor};
use crate::repository::traits::Repository;
use super::item_positioning::next_position;

/// SQLite implementation of Item repository
#[derive(Clone)]
pub struct ItemRepository {
    pub(super) executor: TransactionRetryExecutor,
    pub(super) ordering: OrderingConfig,
}

impl ItemRepository {
    pub fn new(executor: TransactionRetryExecutor, ordering: OrderingConfig) -> Self {
        Self { executor, ordering }
    }

    /// Items of a checklist, incomplete partition first, each in position order
    pub async fn list_by_checklist(&self, list_id: ListId) -> DomainResult<Vec<Item>> {
        self.executor
            .run(Isolation::Weak, "list items", |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM items WHERE list_id = ?1 ORDER BY completed, position, id",
                    ITEM_COLUMNS
                ))?;
                let items = stmt
                    .query_map(params![list_id], row_to_item)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(items)
            })
            .await
    }
}

#[async_trait]
impl Repository<Item> for ItemRepository {
    /// Append to the end of the incomplete partition.
    ///
    /// Reads the current last position, so it runs at strict isolation.
    async fn create(&self, entity: &Item) -> DomainResult<Item> {
        let config = self.ordering.clone();
        self.executor
            .run(Isolation::Strict, "create item", |conn| {
                let exists = conn
                    .query_row(
                        "SELECT 1 FROM checklists WHERE id = ?1",
                        params![entity.list_id],
                        |_| Ok(()),
                    )
                    .optional()?;
                if exists.is_none() {
                    return Err(DomainError::NotFound(format!(
                        "Checklist {} not found",
                        entity.list_id
                    )));
                }

                let position = next_position(conn, &config, entity.list_id)?;
                let now = chrono::Utc::now().timestamp_millis();
                conn.execute(
                    "INSERT INTO items (list_id, text, completed, position, created_at, updated_at)
                     VALUES (?1, ?2, 0, ?3, ?4, ?4)",
                    params![entity.list_id, entity.text, position, now],
                )?;

                Ok(Item {
                    id: conn.last_insert_rowid(),
                    list_id: entity.list_id,
                    text: entity.text.clone(),
                    completed: false,
                    position,
                    created_at: Some(now),
                    updated_at: Some(now),
                })
            })
            .await
    }

    async fn find_by_id(&self, id: ItemId) -> DomainResult<Option<Item>> {
        self.executor
            .run(Isolation::Weak, "find item", |conn| {
                let item = conn
                    .query_row(
                        &format!("SELECT {} FROM items WHERE id = ?1", ITEM_COLUMNS),
                        params![id],
                        row_to_item,
                    )
                    .optional()?;
                Ok(item)
            })
            .await
    }

    async fn list(&self) -> DomainResult<Vec<Item>> {
        self.executor
            .run(Isolation::Weak, "list all items", |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM items ORDER BY list_id, completed, position, id",
                    ITEM_COLUMNS
                ))?;
                let items = stmt
                    .query_map([], row_to_item)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(items)
            })
            .await
    }

    /// Update the text only. Completion and position have their own operations.
    async fn update(&self, entity: &Item) -> DomainResult<Item> {
        self.executor
            .run(Isolation::Weak, "update item", |conn| {
                let changed = conn.execute(
                    "UPDATE items SET text = ?1, updated_at = ?2 WHERE id = ?3",
                    params![entity.text, chrono::Utc::now().timestamp_millis(), entity.id],
                )?;
                if changed == 0 {
                    return Err(DomainError::NotFound(format!("Item {} not found", entity.id)));
                }
                let stored = conn.query_row(
                    &format!("SELECT {} FROM items WHERE id = ?1", ITEM_COLUMNS),
                    params![entity.id],
                    row_to_item,
                )?;
                Ok(stored)
            })
            .await
    }

    async fn delete(&self, id: ItemId) -> DomainResult<()> {
        self.executor
            .run(Isolation::Weak, "delete item", |conn| {
                conn.execute("DELETE FROM items WHERE id = ?1", params![id])?;
                Ok(())
            })
            .await
    }
}
