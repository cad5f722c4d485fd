//! Item Entity
//!
//! A checklist item. Items of one checklist are split into two partitions by
//! `completed`, and each partition is ordered by `position` ascending.

use serde::{Deserialize, Serialize};
use super::entity::Entity;

pub type ListId = i64;
pub type ItemId = i64;

/// A checklist item with its fractional sort key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Unique identifier
    pub id: ItemId,
    /// Owning checklist
    pub list_id: ListId,
    /// Item text content
    pub text: String,
    /// Completion status, selects the partition
    pub completed: bool,
    /// Sort key within the partition. Only relative order is meaningful.
    pub position: f64,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

impl Item {
    /// Create a new, not yet persisted, incomplete item
    pub fn new(list_id: ListId, text: String) -> Self {
        Self {
            id: 0,
            list_id,
            text,
            completed: false,
            position: 0.0,
            created_at: None,
            updated_at: None,
        }
    }
}

impl Entity for Item {
    type Id = ItemId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// Position of one row as seen by a list-wide lock
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionedRow {
    pub item_id: ItemId,
    pub completed: bool,
    pub position: f64,
}
