//! Commands Layer
//!
//! Operations exposed to the surrounding service. Each one runs its own
//! transaction, then publishes a [`ChecklistEvent`](crate::domain::ChecklistEvent)
//! on success.

mod order_cmd;
mod item_cmd;

pub use order_cmd::*;
pub use item_cmd::*;
