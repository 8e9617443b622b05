//! Cell Change Events
//!
//! This module defines the change events emitted by a cell store when data changes.
//! Events follow the observer pattern: the canvas session and the outline projection
//! subscribe independently and re-derive their state from the store instead of
//! caching authoritative copies.
//!
//! # Architecture
//!
//! Events are emitted through tokio's broadcast channel so that any number of views
//! can subscribe. Everything runs on one UI thread, so subscribers drain their
//! receiver synchronously with `try_recv` rather than awaiting it.
//!
//! # Event Flow
//!
//! 1. The store applies a mutation (add, change, remove)
//! 2. Exactly one event is emitted, after the mutation is visible to readers
//! 3. Each view drains its receiver on its next `sync`/`refresh`

use crate::models::{Edge, Node};

/// Change events emitted by a cell store
#[derive(Debug, Clone)]
pub enum CellEvent {
    /// A new node was added
    NodeAdded(Node),

    /// A node's fields changed (carries the new state)
    NodeChanged(Node),

    /// A node was removed
    NodeRemoved { id: String },

    /// A new edge was added
    EdgeAdded(Edge),

    /// An edge was removed
    EdgeRemoved { id: String },
}

impl CellEvent {
    /// Event name as exposed to hosts (`node:added`, `edge:removed`, …)
    pub fn event_type(&self) -> &'static str {
        match self {
            CellEvent::NodeAdded(_) => "node:added",
            CellEvent::NodeChanged(_) => "node:changed",
            CellEvent::NodeRemoved { .. } => "node:removed",
            CellEvent::EdgeAdded(_) => "edge:added",
            CellEvent::EdgeRemoved { .. } => "edge:removed",
        }
    }

    /// Id of the cell the event is about
    pub fn cell_id(&self) -> &str {
        match self {
            CellEvent::NodeAdded(node) | CellEvent::NodeChanged(node) => &node.id,
            CellEvent::EdgeAdded(edge) => &edge.id,
            CellEvent::NodeRemoved { id } | CellEvent::EdgeRemoved { id } => id,
        }
    }
}
