//! Position Store
//!
//! Row-level access to item positions. Every method runs inside the caller's
//! transaction; the SQLite implementation is on [`Connection`], which a
//! `rusqlite::Transaction` derefs to.

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::{DomainError, DomainResult, Item, ItemId, ListId, PositionedRow};

pub trait PositionStore {
    /// Write-lock one item and return its completion flag
    fn lock_item(&self, list_id: ListId, item_id: ItemId) -> DomainResult<bool>;

    /// Ascending positions of the partition, without `exclude_id`
    fn list_positions(
        &self,
        list_id: ListId,
        completed: bool,
        exclude_id: ItemId,
    ) -> DomainResult<Vec<f64>>;

    fn write_position(&self, list_id: ListId, item_id: ItemId, position: f64) -> DomainResult<()>;

    /// Smallest difference between adjacent positions, `None` below two items
    fn min_gap(&self, list_id: ListId, completed: bool) -> DomainResult<Option<f64>>;

    fn set_completed(&self, list_id: ListId, item_id: ItemId, completed: bool) -> DomainResult<()>;

    fn count_partition(
        &self,
        list_id: ListId,
        completed: bool,
        exclude_id: ItemId,
    ) -> DomainResult<usize>;

    /// Write-lock every row of the list, ordered by `(completed, position, id)`
    fn lock_list(&self, list_id: ListId) -> DomainResult<Vec<PositionedRow>>;

    fn load_item(&self, list_id: ListId, item_id: ItemId) -> DomainResult<Item>;
}

pub(crate) const ITEM_COLUMNS: &str =
    "id, list_id, text, completed, position, created_at, updated_at";

fn item_not_found(list_id: ListId, item_id: ItemId) -> DomainError {
    DomainError::NotFound(format!("Item {} not found in list {}", item_id, list_id))
}

impl PositionStore for Connection {
    fn lock_item(&self, list_id: ListId, item_id: ItemId) -> DomainResult<bool> {
        // A no-op write takes the row's write lock even in a deferred transaction
        self.query_row(
            "UPDATE items SET position = position
             WHERE list_id = ?1 AND id = ?2
             RETURNING completed",
            params![list_id, item_id],
            |row| row.get::<_, bool>(0),
        )
        .optional()?
        .ok_or_else(|| item_not_found(list_id, item_id))
    }

    fn list_positions(
        &self,
        list_id: ListId,
        completed: bool,
        exclude_id: ItemId,
    ) -> DomainResult<Vec<f64>> {
        let mut stmt = self.prepare_cached(
            "SELECT position FROM items
             WHERE list_id = ?1 AND completed = ?2 AND id != ?3
             ORDER BY position, id",
        )?;
        let positions = stmt
            .query_map(params![list_id, completed, exclude_id], |row| row.get::<_, f64>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(positions)
    }

    fn write_position(&self, list_id: ListId, item_id: ItemId, position: f64) -> DomainResult<()> {
        let changed = self.execute(
            "UPDATE items SET position = ?3, updated_at = ?4 WHERE list_id = ?1 AND id = ?2",
            params![list_id, item_id, position, chrono::Utc::now().timestamp_millis()],
        )?;
        if changed == 0 {
            return Err(item_not_found(list_id, item_id));
        }
        Ok(())
    }

    fn min_gap(&self, list_id: ListId, completed: bool) -> DomainResult<Option<f64>> {
        let gap = self.query_row(
            "SELECT MIN(position - prev) FROM (
                SELECT position, LAG(position) OVER (ORDER BY position, id) AS prev
                FROM items WHERE list_id = ?1 AND completed = ?2
             )",
            params![list_id, completed],
            |row| row.get::<_, Option<f64>>(0),
        )?;
        Ok(gap)
    }

    fn set_completed(&self, list_id: ListId, item_id: ItemId, completed: bool) -> DomainResult<()> {
        let changed = self.execute(
            "UPDATE items SET completed = ?3, updated_at = ?4 WHERE list_id = ?1 AND id = ?2",
            params![list_id, item_id, completed, chrono::Utc::now().timestamp_millis()],
        )?;
        if changed == 0 {
            return Err(item_not_found(list_id, item_id));
        }
        Ok(())
    }

    fn count_partition(
        &self,
        list_id: ListId,
        completed: bool,
        exclude_id: ItemId,
    ) -> DomainResult<usize> {
        let count: i64 = self.query_row(
            "SELECT COUNT(*) FROM items WHERE list_id = ?1 AND completed = ?2 AND id != ?3",
            params![list_id, completed, exclude_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn lock_list(&self, list_id: ListId) -> DomainResult<Vec<PositionedRow>> {
        self.execute(
            "UPDATE items SET position = position WHERE list_id = ?1",
            params![list_id],
        )?;
        let mut stmt = self.prepare_cached(
            "SELECT id, completed, position FROM items
             WHERE list_id = ?1
             ORDER BY completed, position, id",
        )?;
        let rows = stmt
            .query_map(params![list_id], |row| {
                Ok(PositionedRow {
                    item_id: row.get(0)?,
                    completed: row.get(1)?,
                    position: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn load_item(&self, list_id: ListId, item_id: ItemId) -> DomainResult<Item> {
        self.query_row(
            &format!("SELECT {} FROM items WHERE list_id = ?1 AND id = ?2", ITEM_COLUMNS),
            params![list_id, item_id],
            row_to_item,
        )
        .optional()?
        .ok_or_else(|| item_not_found(list_id, item_id))
    }
}

/// Convert a database row selected with [`ITEM_COLUMNS`] to Item
pub(crate) fn row_to_item(row: &Row<'_>) -> rusqlite::Result<Item> {
    Ok(Item {
        id: row.get(0)?,
        list_id: row.get(1)?,
        text: row.get(2)?,
        completed: row.get(3)?,
        position: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}
