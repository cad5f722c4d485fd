//! Item Repository Module
//!
//! - item_repo: Core CRUD operations
//! - item_positioning: Append positions and partition reads

mod item_repo;
mod item_positioning;

pub use item_repo::ItemRepository;
pub use item_positioning::ItemPositioningOperations;
