//! Repository Layer
//!
//! Data access abstractions and implementations.

mod traits;
mod db;
mod retry;
mod position_store;
mod checklist_repo;
mod item;

#[cfg(test)]
mod tests;

pub use traits::Repository;
pub use db::{init_db, DbState};
pub use retry::{Isolation, TransactionRetryExecutor};
pub use position_store::PositionStore;
pub use checklist_repo::ChecklistRepository;
pub use item::{ItemPositioningOperations, ItemRepository};
