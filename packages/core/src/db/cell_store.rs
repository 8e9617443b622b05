//! CellStore Trait - Cell Store Abstraction Layer
//!
//! This module defines the `CellStore` trait: the narrow port through which the
//! engine reads and mutates graph cells. The concrete graph/rendering library and
//! its replication layer sit behind this trait, so they can be swapped without
//! touching ordering, visibility, navigation or outline logic.
//!
//! # Design Decisions
//!
//! 1. **Synchronous**: every engine operation runs to completion on the UI thread.
//! 2. **No exclusive ownership**: other subsystems may mutate the store between
//!    engine calls. The engine re-reads through this trait on every operation.
//! 3. **Error Handling**: uses `anyhow::Result` so adapters can attach their own
//!    context.
//! 4. **Edges are ground truth**: hierarchy is expressed only through
//!    `EdgeKind::Hierarchical` edges. Nodes carry no parent field.
//!
//! # Examples
//!
//! ```rust
//! use mindgraph_core::db::{CellStore, MemoryCellStore};
//! use mindgraph_core::models::{Edge, Node, NodeKind};
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut store = MemoryCellStore::new();
//! store.add_node(Node::new_with_id("root", NodeKind::Root, "Plan"))?;
//! store.add_node(Node::new_with_id("a", NodeKind::Topic, "A").with_order(0))?;
//! store.add_edge(Edge::hierarchical("root", "a"))?;
//!
//! assert_eq!(store.get_children("root"), vec!["a".to_string()]);
//! # Ok(())
//! # }
//! ```

use crate::db::CellEvent;
use crate::models::{Edge, Node, NodeUpdate};
use anyhow::Result;
use tokio::sync::broadcast;

/// Abstraction over the external cell store
///
/// # Method Categories
///
/// - **Reads**: `get_node`, `nodes`, `edges`, `get_children`
/// - **Node writes**: `add_node`, `update_node`, `remove_node`
/// - **Edge writes**: `add_edge`, `remove_edge`
/// - **Notifications**: `subscribe`
pub trait CellStore {
    /// Get node by ID
    ///
    /// Returns `None` if the node doesn't exist (not an error).
    fn get_node(&self, id: &str) -> Option<Node>;

    /// All nodes, in store order
    fn nodes(&self) -> Vec<Node>;

    /// All edges (hierarchical and dependency), in store order
    fn edges(&self) -> Vec<Edge>;

    /// Ids of nodes targeted by hierarchical edges from `parent_id`, in edge order
    ///
    /// The result is unsorted; sibling ordering is the hierarchy index's job.
    fn get_children(&self, parent_id: &str) -> Vec<String> {
        let mut children: Vec<String> = Vec::new();
        for edge in self.edges() {
            if edge.is_hierarchical() && edge.source == parent_id && !children.contains(&edge.target)
            {
                children.push(edge.target);
            }
        }
        children
    }

    /// Insert a new node
    ///
    /// # Errors
    ///
    /// Returns error if the id already exists or the node fails validation.
    fn add_node(&mut self, node: Node) -> Result<Node>;

    /// Apply a sparse update and return the resulting node
    ///
    /// An update that changes nothing must not emit an event.
    fn update_node(&mut self, id: &str, update: NodeUpdate) -> Result<Node>;

    /// Remove a node and every edge touching it
    ///
    /// Returns `false` when the node did not exist (idempotent).
    fn remove_node(&mut self, id: &str) -> Result<bool>;

    /// Insert a new edge
    ///
    /// # Errors
    ///
    /// Returns error if the id already exists or an endpoint is missing.
    fn add_edge(&mut self, edge: Edge) -> Result<Edge>;

    /// Remove an edge. Returns `false` when it did not exist.
    fn remove_edge(&mut self, id: &str) -> Result<bool>;

    /// Subscribe to change notifications
    fn subscribe(&self) -> broadcast::Receiver<CellEvent>;
}
