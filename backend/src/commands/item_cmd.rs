//! Commands for checklist and item CRUD
//!
//! Only what is needed to give items their initial position and to read a
//! list back in presentation order.

use crate::domain::{Checklist, DomainResult, Item, ListId};
use crate::repository::Repository;
use crate::AppState;

/// Create a new checklist
pub async fn create_checklist(state: &AppState, name: String) -> DomainResult<Checklist> {
    state.checklists.create(&Checklist::new(name)).await
}

/// Create an item at the end of the list's incomplete section
pub async fn create_item(state: &AppState, list_id: ListId, text: String) -> DomainResult<Item> {
    state.items.create(&Item::new(list_id, text)).await
}

/// Items of a checklist, incomplete first, each section in position order
pub async fn list_items(state: &AppState, list_id: ListId) -> DomainResult<Vec<Item>> {
    state.items.list_by_checklist(list_id).await
}
