//! Checklist Entity

use serde::{Deserialize, Serialize};
use super::entity::Entity;
use super::item::ListId;

/// A named list owning ordered items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checklist {
    pub id: ListId,
    pub name: String,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

impl Checklist {
    pub fn new(name: String) -> Self {
        Self {
            id: 0,
            name,
            created_at: None,
            updated_at: None,
        }
    }
}

impl Entity for Checklist {
    type Id = ListId;

    fn id(&self) -> Self::Id {
        self.id
    }
}
