//! Database Connection and Setup
//!
//! Manages SQLite database connection and migrations.

use rusqlite::{Connection, ErrorCode};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::config::DatabaseConfig;
use crate::domain::{DomainError, DomainResult};

/// Database state wrapper
#[derive(Clone)]
pub struct DbState {
    path: PathBuf,
    busy_timeout: Duration,
    pub(crate) conn: Arc<Mutex<Connection>>,
}

impl DbState {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Shared handle to this state's connection
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }

    /// Open a second, independent connection to the same database file.
    ///
    /// Transactions on the two states contend through SQLite's own locking.
    /// An in-memory database cannot be reopened this way.
    pub async fn reopen(&self) -> DomainResult<DbState> {
        if is_memory(&self.path) {
            return Err(DomainError::InvalidInput(
                "An in-memory database cannot be reopened".to_string(),
            ));
        }
        let conn = open_connection(&self.path, self.busy_timeout)?;
        Ok(DbState {
            path: self.path.clone(),
            busy_timeout: self.busy_timeout,
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

/// Initialize database with config
pub async fn init_db(config: &DatabaseConfig) -> DomainResult<DbState> {
    let conn = open_connection(&config.path, config.busy_timeout())?;

    // Run migrations
    run_migrations(&conn)?;

    log::info!("Database ready at {}", config.path.display());

    Ok(DbState {
        path: config.path.clone(),
        busy_timeout: config.busy_timeout(),
        conn: Arc::new(Mutex::new(conn)),
    })
}

fn is_memory(path: &Path) -> bool {
    path.as_os_str() == ":memory:"
}

fn open_connection(path: &Path, busy_timeout: Duration) -> DomainResult<Connection> {
    let conn = if is_memory(path) {
        Connection::open_in_memory()?
    } else {
        let conn = Connection::open(path)?;
        let mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        log::debug!("Opened {} (journal_mode={})", path.display(), mode);
        conn
    };

    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(busy_timeout)?;
    Ok(conn)
}

/// Run database migrations
pub(crate) fn run_migrations(conn: &Connection) -> DomainResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS checklists (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            created_at INTEGER,
            updated_at INTEGER
        );

        CREATE TABLE IF NOT EXISTS items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            list_id INTEGER NOT NULL REFERENCES checklists(id) ON DELETE CASCADE,
            text TEXT NOT NULL,
            completed INTEGER NOT NULL DEFAULT 0,
            position REAL NOT NULL,
            created_at INTEGER,
            updated_at INTEGER
        );

        CREATE INDEX IF NOT EXISTS idx_items_partition ON items(list_id, completed, position);",
    )?;

    Ok(())
}

impl From<rusqlite::Error> for DomainError {
    fn from(e: rusqlite::Error) -> Self {
        match &e {
            rusqlite::Error::QueryReturnedNoRows => DomainError::NotFound(e.to_string()),
            rusqlite::Error::SqliteFailure(err, _)
                if matches!(err.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) =>
            {
                DomainError::Conflict(e.to_string())
            }
            _ => DomainError::Storage(e.to_string()),
        }
    }
}
