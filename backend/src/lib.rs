//! Checklist Ordering Backend
//!
//! Layered architecture:
//! - domain: Core entities and errors
//! - repository: SQLite storage, the position store and the transaction executor
//! - ordering: Move, toggle and rebalance transaction bodies
//! - scheduler: Debounced background rebalancing
//! - commands: Operations exposed to the surrounding service

use std::sync::Arc;
use tokio::sync::broadcast;

pub mod config;
pub mod domain;
pub mod repository;
pub mod ordering;
pub mod scheduler;
pub mod commands;

use config::{Config, LoggingConfig};
use domain::{ChecklistEvent, DomainError, DomainResult};
use repository::{init_db, ChecklistRepository, DbState, ItemRepository, TransactionRetryExecutor};
use scheduler::{RebalanceScheduler, StoreRebalancer};

const EVENT_CAPACITY: usize = 256;

/// Application state shared across commands
pub struct AppState {
    pub db_state: DbState,
    pub config: Config,
    pub executor: TransactionRetryExecutor,
    pub scheduler: RebalanceScheduler,
    pub checklists: ChecklistRepository,
    pub items: ItemRepository,
    events: broadcast::Sender<ChecklistEvent>,
}

impl AppState {
    /// Wire up the state. Must be called from within a tokio runtime.
    pub fn new(db_state: DbState, config: Config) -> DomainResult<Self> {
        config.validate()?;

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let executor = TransactionRetryExecutor::new(&db_state, config.retry.clone());
        let rebalancer = StoreRebalancer::new(executor.clone(), config.ordering.clone())
            .with_events(events.clone());
        let scheduler = RebalanceScheduler::new(&config.rebalance, Arc::new(rebalancer))?;

        Ok(Self {
            checklists: ChecklistRepository::new(executor.clone()),
            items: ItemRepository::new(executor.clone(), config.ordering.clone()),
            db_state,
            config,
            executor,
            scheduler,
            events,
        })
    }

    /// Receive every event published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<ChecklistEvent> {
        self.events.subscribe()
    }

    pub(crate) fn emit(&self, event: ChecklistEvent) {
        // Nobody listening is not an error
        let _ = self.events.send(event);
    }
}

/// Install the logger, open the database from `config` and build the state on top of it
pub async fn setup(config: Config) -> DomainResult<AppState> {
    config.validate()?;
    init_logging(&config.logging)?;

    let db_state = match init_db(&config.database).await {
        Ok(db_state) => db_state,
        Err(e) => {
            let _ = rolling_logger::error(&format!("DB init failed: {}", e));
            return Err(e);
        }
    };
    let state = AppState::new(db_state, config)?;

    let _ = rolling_logger::info("Checklist backend ready");
    if let Some(file) = rolling_logger::current_log_file() {
        log::debug!("Logging to {}", file.display());
    }
    Ok(state)
}

/// Install the rolling file logger. A logger installed earlier is kept.
pub fn init_logging(config: &LoggingConfig) -> DomainResult<()> {
    match rolling_logger::init_logger(config.dir.clone(), &config.app_name) {
        Ok(()) | Err(rolling_logger::LoggerError::AlreadyInitialized) => Ok(()),
        Err(e) => Err(DomainError::Internal(format!("Failed to init logger: {}", e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;

    #[tokio::test]
    async fn test_setup_with_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.database = DatabaseConfig {
            path: dir.path().join("app.db"),
            ..Default::default()
        };
        config.logging.dir = dir.path().join("logs");

        let state = setup(config).await.unwrap();
        let list = commands::create_checklist(&state, "Chores".to_string()).await.unwrap();
        let item = commands::create_item(&state, list.id, "Dishes".to_string()).await.unwrap();
        assert_eq!(item.position, state.config.ordering.first_position);
        assert_eq!(state.db_state.path(), dir.path().join("app.db"));

        // The logger is process wide, so another test may have installed it first
        assert!(rolling_logger::info("after setup").is_ok());
        assert!(rolling_logger::current_log_file().is_some());
    }

    #[test]
    fn test_init_logging_twice_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggingConfig {
            dir: dir.path().join("logs"),
            app_name: "Checklists".to_string(),
        };
        assert!(init_logging(&config).is_ok());
        assert!(init_logging(&config).is_ok());
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let mut config = Config::default();
        config.database = DatabaseConfig::in_memory();
        config.ordering.gap = -1.0;
        assert!(setup(config).await.is_err());
    }
}
