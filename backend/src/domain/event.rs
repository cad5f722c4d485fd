//! Change Notifications
//!
//! Emitted by the commands layer after a successful commit. Delivery to
//! clients happens outside this crate.

use serde::Serialize;

use super::entity::{DomainError, DomainResult};
use super::item::{Item, ItemId, ListId};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChecklistEvent {
    /// An item got a new position within its partition
    Reordered {
        list_id: ListId,
        item_id: ItemId,
        position: f64,
    },
    /// An item changed, e.g. its completion flag
    Updated { list_id: ListId, item: Item },
    /// A list was re-spaced by the background rebalance
    Rebalanced { list_id: ListId, rewritten: usize },
}

impl ChecklistEvent {
    pub fn list_id(&self) -> ListId {
        match self {
            ChecklistEvent::Reordered { list_id, .. }
            | ChecklistEvent::Updated { list_id, .. }
            | ChecklistEvent::Rebalanced { list_id, .. } => *list_id,
        }
    }

    pub fn to_json(&self) -> DomainResult<String> {
        serde_json::to_string(self).map_err(|e| DomainError::Internal(e.to_string()))
    }
}
