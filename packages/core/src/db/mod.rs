//! Cell Store Layer
//!
//! This module holds the boundary between the engine and the external cell store:
//!
//! - `CellStore` - the port the engine depends on (reads, writes, subscriptions)
//! - `MemoryCellStore` - in-memory reference adapter
//! - `CellEvent` - change notifications (`node:added`, `node:changed`, …)
//!
//! The real-time replication layer that merges concurrent field writes lives on the
//! other side of this port. The engine assumes it delivers sequential,
//! already-merged updates.

mod cell_store;
mod error;
pub mod events;
mod memory_store;

pub use cell_store::CellStore;
pub use error::StoreError;
pub use events::CellEvent;
pub use memory_store::{MemoryCellStore, DEFAULT_EVENT_CAPACITY};
