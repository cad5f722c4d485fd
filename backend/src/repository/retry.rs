//! Transaction Retry Executor
//!
//! Runs a unit of work inside one SQLite transaction. Strict transactions
//! take the write lock up front (`BEGIN IMMEDIATE`) and are retried with
//! exponential backoff when SQLite reports busy/locked. Weak transactions
//! (`BEGIN DEFERRED`) run exactly once.

use rusqlite::{Connection, TransactionBehavior};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::RetryConfig;
use crate::domain::{DomainError, DomainResult};
use super::db::DbState;

/// Isolation strength requested for a unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Isolation {
    /// Serializable, write-locked from the start; conflicts are retried
    Strict,
    /// Independent single-row work; never retried
    Weak,
}

impl Isolation {
    fn behavior(self) -> TransactionBehavior {
        match self {
            Isolation::Strict => TransactionBehavior::Immediate,
            Isolation::Weak => TransactionBehavior::Deferred,
        }
    }
}

#[derive(Clone)]
pub struct TransactionRetryExecutor {
    conn: Arc<Mutex<Connection>>,
    config: RetryConfig,
}

impl TransactionRetryExecutor {
    pub fn new(db: &DbState, config: RetryConfig) -> Self {
        Self {
            conn: db.connection(),
            config,
        }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Run `work` in a transaction, committing on `Ok` and rolling back on `Err`.
    ///
    /// Not-found and invalid-input errors are returned as they are. Every
    /// other failure is wrapped in [`DomainError::Transaction`] carrying
    /// `operation` and the number of attempts made.
    pub async fn run<T, F>(
        &self,
        isolation: Isolation,
        operation: &str,
        mut work: F,
    ) -> DomainResult<T>
    where
        F: FnMut(&Connection) -> DomainResult<T> + Send,
        T: Send,
    {
        let max_attempts = match isolation {
            Isolation::Strict => self.config.max_retries.saturating_add(1),
            Isolation::Weak => 1,
        };

        let mut attempts = 0;
        loop {
            attempts += 1;
            let result = self.attempt(isolation, &mut work).await;
            match result {
                Ok(value) => {
                    if attempts > 1 {
                        log::debug!("{} committed after {} attempts", operation, attempts);
                    }
                    return Ok(value);
                }
                Err(e) if e.is_retryable() && attempts < max_attempts => {
                    let delay = self.config.backoff(attempts - 1);
                    log::debug!(
                        "{} conflicted (attempt {}/{}), retrying in {:?}: {}",
                        operation, attempts, max_attempts, delay, e
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(classify(operation, attempts, e)),
            }
        }
    }

    async fn attempt<T, F>(&self, isolation: Isolation, work: &mut F) -> DomainResult<T>
    where
        F: FnMut(&Connection) -> DomainResult<T>,
    {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction_with_behavior(isolation.behavior())?;
        // Dropping `tx` on the error path rolls back.
        let value = work(&tx)?;
        tx.commit()?;
        Ok(value)
    }
}

fn classify(operation: &str, attempts: u32, e: DomainError) -> DomainError {
    match e {
        DomainError::NotFound(_) | DomainError::InvalidInput(_) => e,
        other => {
            if other.is_retryable() {
                log::warn!("{} gave up after {} attempts: {}", operation, attempts, other);
            }
            DomainError::Transaction {
                operation: operation.to_string(),
                attempts,
                source: Box::new(other),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::repository::init_db;

    fn fast_retry() -> RetryConfig {
        RetryConfig {
            max_retries: 3,
            base_backoff_ms: 1,
        }
    }

    async fn memory_executor() -> TransactionRetryExecutor {
        let db = init_db(&DatabaseConfig::in_memory()).await.unwrap();
        TransactionRetryExecutor::new(&db, fast_retry())
    }

    #[tokio::test]
    async fn test_always_conflicting_work_runs_n_plus_one_times() {
        let executor = memory_executor().await;
        let mut calls = 0u32;

        let err = executor
            .run(Isolation::Strict, "always conflicts", |_| -> DomainResult<()> {
                calls += 1;
                Err(DomainError::Conflict("simulated serialization failure".to_string()))
            })
            .await
            .unwrap_err();

        assert_eq!(calls, 4);
        assert!(err.is_terminal());
        assert!(matches!(err, DomainError::Transaction { attempts: 4, .. }));
        assert!(matches!(
            err.root_cause(),
            DomainError::Conflict(msg) if msg == "simulated serialization failure"
        ));
    }

    #[tokio::test]
    async fn test_conflict_then_success_commits() {
        let executor = memory_executor().await;
        let mut calls = 0u32;

        let value = executor
            .run(Isolation::Strict, "flaky", |conn| {
                calls += 1;
                conn.execute("INSERT INTO checklists (name) VALUES ('flaky')", [])?;
                if calls < 3 {
                    return Err(DomainError::Conflict("try again".to_string()));
                }
                Ok(calls)
            })
            .await
            .unwrap();
        assert_eq!(value, 3);

        // Rolled-back attempts left nothing behind
        let count: i64 = executor
            .run(Isolation::Weak, "count", |conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM checklists", [], |row| row.get(0))?)
            })
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_weak_isolation_is_never_retried() {
        let executor = memory_executor().await;
        let mut calls = 0u32;

        let err = executor
            .run(Isolation::Weak, "single row", |_| -> DomainResult<()> {
                calls += 1;
                Err(DomainError::Conflict("busy".to_string()))
            })
            .await
            .unwrap_err();

        assert_eq!(calls, 1);
        assert!(matches!(err, DomainError::Transaction { attempts: 1, .. }));
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried_or_wrapped() {
        let executor = memory_executor().await;
        let mut calls = 0u32;

        let err = executor
            .run(Isolation::Strict, "lookup", |_| -> DomainResult<()> {
                calls += 1;
                Err(DomainError::NotFound("Item 9".to_string()))
            })
            .await
            .unwrap_err();

        assert_eq!(calls, 1);
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_locked_database_exhausts_retries() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            path: dir.path().join("locked.db"),
            busy_timeout_ms: 0,
        };
        let first = init_db(&config).await.unwrap();
        let second = first.reopen().await.unwrap();

        // Hold the write lock on the first connection
        let holder = first.connection();
        let guard = holder.lock().await;
        guard.execute_batch("BEGIN IMMEDIATE;").unwrap();

        let executor = TransactionRetryExecutor::new(&second, fast_retry());
        let mut calls = 0u32;
        let err = executor
            .run(Isolation::Strict, "write while locked", |_| -> DomainResult<()> {
                calls += 1;
                Ok(())
            })
            .await
            .unwrap_err();

        // BEGIN IMMEDIATE itself fails, so the work never runs
        assert_eq!(calls, 0);
        assert!(matches!(err, DomainError::Transaction { attempts: 4, .. }));
        assert!(err.root_cause().is_retryable());

        guard.execute_batch("COMMIT;").unwrap();
        drop(guard);

        executor
            .run(Isolation::Strict, "write after unlock", |conn| {
                conn.execute("INSERT INTO checklists (name) VALUES ('ok')", [])?;
                Ok(())
            })
            .await
            .unwrap();
    }
}
