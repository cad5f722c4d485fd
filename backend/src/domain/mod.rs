//! Domain Layer
//!
//! Contains all domain entities and core abstractions.
//! This layer has NO storage dependencies.

mod entity;
mod item;
mod checklist;
mod event;

pub use entity::{Entity, DomainError, DomainResult};
pub use item::{Item, ItemId, ListId, PositionedRow};
pub use checklist::Checklist;
pub use event::ChecklistEvent;
