//! MindGraph Core: hierarchical graph state engine
//!
//! This crate keeps a loosely-typed graph of nodes and edges behaving like one
//! consistent ordered tree across several simultaneous views (canvas, outline,
//! breadcrumbs), with collapse/expand, keyboard traversal, drag-and-drop
//! reordering and drill-down subgraph isolation.
//!
//! # Architecture
//!
//! - **Edges are ground truth**: a node's parent is derived from its incoming
//!   hierarchical edge, never stored on the node
//! - **Ports and adapters**: the engine talks to the external cell store only
//!   through `db::CellStore` and re-derives state from its change events
//! - **Synchronous**: every operation runs to completion on the caller's thread
//! - **View-local state stays local**: drill path, outline collapse set and
//!   selection never enter the shared document
//!
//! # Modules
//!
//! - [`models`] - Data structures (Node, Edge, DrillPath, Selection)
//! - [`db`] - Cell store port, in-memory adapter and change events
//! - [`operations`] - Order manager and operation errors
//! - [`services`] - Hierarchy index, visibility, navigation, drill path, outline, canvas
//! - [`config`] - Engine configuration

pub mod config;
pub mod db;
pub mod models;
pub mod operations;
pub mod services;

// Re-export commonly used types
pub use config::{EngineConfig, LayoutMode};
pub use db::{CellEvent, CellStore, MemoryCellStore};
pub use models::*;
pub use operations::{OperationError, OrderManager};
pub use services::*;
