//! Checklist Repository
//!
//! Plain single-row CRUD, run at weak isolation.

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension, Row};

use crate::domain::{Checklist, DomainError, DomainResult, ListId};
use super::retry::{Isolation, TransactionRetryExecutor};
use super::traits::Repository;

/// SQLite implementation of Checklist repository
#[derive(Clone)]
pub struct ChecklistRepository {
    executor: TransactionRetryExecutor,
}

impl ChecklistRepository {
    pub fn new(executor: TransactionRetryExecutor) -> Self {
        Self { executor }
    }
}

fn row_to_checklist(row: &Row<'_>) -> rusqlite::Result<Checklist> {
    Ok(Checklist {
        id: row.get(0)?,
        name: row.get(1)?,
        created_at: row.get(2)?,
        updated_at: row.get(3)?,
    })
}

#[async_trait]
impl Repository<Checklist> for ChecklistRepository {
    async fn create(&self, entity: &Checklist) -> DomainResult<Checklist> {
        let name = entity.name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::InvalidInput("Checklist name is empty".to_string()));
        }

        self.executor
            .run(Isolation::Weak, "create checklist", |conn| {
                let now = chrono::Utc::now().timestamp_millis();
                conn.execute(
                    "INSERT INTO checklists (name, created_at, updated_at) VALUES (?1, ?2, ?2)",
                    params![name, now],
                )?;
                Ok(Checklist {
                    id: conn.last_insert_rowid(),
                    name: name.clone(),
                    created_at: Some(now),
                    updated_at: Some(now),
                })
            })
            .await
    }

    async fn find_by_id(&self, id: ListId) -> DomainResult<Option<Checklist>> {
        self.executor
            .run(Isolation::Weak, "find checklist", |conn| {
                let found = conn
                    .query_row(
                        "SELECT id, name, created_at, updated_at FROM checklists WHERE id = ?1",
                        params![id],
                        row_to_checklist,
                    )
                    .optional()?;
                Ok(found)
            })
            .await
    }

    async fn list(&self) -> DomainResult<Vec<Checklist>> {
        self.executor
            .run(Isolation::Weak, "list checklists", |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, name, created_at, updated_at FROM checklists ORDER BY id",
                )?;
                let lists = stmt
                    .query_map([], row_to_checklist)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(lists)
            })
            .await
    }

    async fn update(&self, entity: &Checklist) -> DomainResult<Checklist> {
        self.executor
            .run(Isolation::Weak, "update checklist", |conn| {
                let now = chrono::Utc::now().timestamp_millis();
                let changed = conn.execute(
                    "UPDATE checklists SET name = ?1, updated_at = ?2 WHERE id = ?3",
                    params![entity.name, now, entity.id],
                )?;
                if changed == 0 {
                    return Err(DomainError::NotFound(format!("Checklist {} not found", entity.id)));
                }
                Ok(Checklist {
                    updated_at: Some(now),
                    ..entity.clone()
                })
            })
            .await
    }

    async fn delete(&self, id: ListId) -> DomainResult<()> {
        self.executor
            .run(Isolation::Weak, "delete checklist", |conn| {
                // Items go with it through ON DELETE CASCADE
                conn.execute("DELETE FROM checklists WHERE id = ?1", params![id])?;
                Ok(())
            })
            .await
    }
}
