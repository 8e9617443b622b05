//! Sibling order management
//!
//! The `OrderManager` owns every write to `order` and to hierarchical edges. It keeps
//! each sibling group densely numbered `0..n-1`:
//!
//! - `insert_child` appends after the current maximum and never renumbers
//! - `insert_sibling_after` shifts the tail of the group by one
//! - `reorder` closes the gap in the old group and renumbers the destination group
//!
//! Orders written by other actors (replication, scripts) may arrive duplicated,
//! gapped or missing. Before an operation relies on positions it repairs such a group
//! with a full renumber pass in current sibling order.
//!
//! # Examples
//!
//! ```rust
//! use mindgraph_core::db::{CellStore, MemoryCellStore};
//! use mindgraph_core::models::{Node, NodeKind};
//! use mindgraph_core::operations::OrderManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut store = MemoryCellStore::new();
//! store.add_node(Node::new_with_id("root", NodeKind::Root, "Plan"))?;
//!
//! let orders = OrderManager::default();
//! let a = orders.add_child(&mut store, "root", "A")?;
//! let b = orders.add_child(&mut store, "root", "B")?;
//! assert_eq!((a.order, b.order), (Some(0), Some(1)));
//! # Ok(())
//! # }
//! ```

use crate::config::LayoutMode;
use crate::db::CellStore;
use crate::models::{Edge, Node, NodeKind, NodeUpdate};
use crate::operations::OperationError;
use crate::services::HierarchyIndex;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Default)]
pub struct OrderManager {
    layout: LayoutMode,
}

impl OrderManager {
    /// The layout decides how legacy unordered siblings are sorted before repair
    pub fn new(layout: LayoutMode) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> LayoutMode {
        self.layout
    }

    fn index(&self, store: &dyn CellStore) -> HierarchyIndex {
        HierarchyIndex::from_store_with_layout(store, self.layout)
    }

    /// Order for a new last child of `parent_id`
    ///
    /// Existing children keep their orders unless the group needs repair.
    pub fn insert_child(
        &self,
        store: &mut dyn CellStore,
        parent_id: &str,
    ) -> Result<u32, OperationError> {
        let index = self.index(store);
        if !index.contains(parent_id) {
            return Err(OperationError::node_not_found(parent_id));
        }

        let children = index.children(parent_id);
        self.repair_group(store, &index, children)?;

        // A dense group's maximum is len - 1
        Ok(children.len() as u32)
    }

    /// Order for a new node placed directly after `node_id`, shifting later siblings
    ///
    /// # Errors
    ///
    /// - `NodeNotFound` if `node_id` does not exist
    /// - `InvalidOperation` if `node_id` has no parent (the root or an orphan)
    pub fn insert_sibling_after(
        &self,
        store: &mut dyn CellStore,
        node_id: &str,
    ) -> Result<u32, OperationError> {
        let index = self.index(store);
        if !index.contains(node_id) {
            return Err(OperationError::node_not_found(node_id));
        }
        if index.parent(node_id).is_none() {
            return Err(OperationError::invalid_operation(format!(
                "Node '{}' has no parent to insert a sibling under",
                node_id
            )));
        }

        let group = index.siblings(node_id);
        self.repair_group(store, &index, group)?;

        let position = group.iter().position(|id| id == node_id).unwrap_or(0);
        let new_order = position as u32 + 1;

        // Shift from the tail so no two siblings share an order at any point
        for (i, id) in group.iter().enumerate().skip(position + 1).rev() {
            store.update_node(id, NodeUpdate::new().with_order(i as u32 + 1))?;
        }

        Ok(new_order)
    }

    /// Move `node_id` to position `new_index` among `new_parent_id`'s children
    ///
    /// `new_index` counts the destination siblings without the moved node and is
    /// clamped to the group length. Same-parent moves are pure reorders; a different
    /// parent also swaps the node's hierarchical edge.
    ///
    /// # Errors
    ///
    /// - `InvalidOperation` when moving the document root
    /// - `NodeNotFound` when the node or the new parent is missing
    /// - `CircularReference` when the new parent is the node or one of its descendants
    pub fn reorder(
        &self,
        store: &mut dyn CellStore,
        node_id: &str,
        new_parent_id: &str,
        new_index: usize,
    ) -> Result<(), OperationError> {
        let index = self.index(store);
        if !index.contains(node_id) {
            return Err(OperationError::node_not_found(node_id));
        }
        if index.is_root(node_id) {
            warn!(node_id, "Rejected attempt to move the root node");
            return Err(OperationError::invalid_operation("Cannot move the root node"));
        }
        if !index.contains(new_parent_id) {
            return Err(OperationError::node_not_found(new_parent_id));
        }
        if new_parent_id == node_id || index.is_descendant(new_parent_id, node_id) {
            return Err(OperationError::circular_reference(node_id, new_parent_id));
        }

        let old_parent = index.parent(node_id);
        let reparenting = old_parent != Some(new_parent_id);

        if let Some(old_parent) = old_parent.filter(|_| reparenting) {
            let remaining = without(index.children(old_parent), node_id);
            renumber(store, &index, &remaining)?;
        }

        if reparenting {
            for edge in index.incoming_hierarchical_edges(node_id) {
                store.remove_edge(&edge.id)?;
            }
            store.add_edge(Edge::hierarchical(new_parent_id, node_id))?;
            debug!(node_id, new_parent_id, "Reparented node");
        }

        let mut destination = without(index.children(new_parent_id), node_id);
        let at = new_index.min(destination.len());
        destination.insert(at, node_id.to_string());
        renumber(store, &index, &destination)?;

        Ok(())
    }

    /// Create a node as the last child of `parent_id`
    pub fn add_child(
        &self,
        store: &mut dyn CellStore,
        parent_id: &str,
        label: impl Into<String>,
    ) -> Result<Node, OperationError> {
        let parent = store
            .get_node(parent_id)
            .ok_or_else(|| OperationError::node_not_found(parent_id))?;
        let kind = if parent.is_root_kind() {
            NodeKind::Topic
        } else {
            NodeKind::Subtopic
        };
        self.attach_child(store, parent_id, Node::new(kind, label))
    }

    /// Insert a caller-built node as the last child of `parent_id`
    ///
    /// The node's `order` is overwritten.
    pub fn attach_child(
        &self,
        store: &mut dyn CellStore,
        parent_id: &str,
        node: Node,
    ) -> Result<Node, OperationError> {
        let order = self.insert_child(store, parent_id)?;
        let node = store.add_node(node.with_order(order))?;
        store.add_edge(Edge::hierarchical(parent_id, &node.id))?;
        Ok(node)
    }

    /// Create a node directly after `node_id`
    ///
    /// A sibling of the document root becomes a child of the root instead.
    pub fn add_sibling_after(
        &self,
        store: &mut dyn CellStore,
        node_id: &str,
        label: impl Into<String>,
    ) -> Result<Node, OperationError> {
        let node = store
            .get_node(node_id)
            .ok_or_else(|| OperationError::node_not_found(node_id))?;
        let kind = if node.is_root_kind() {
            NodeKind::Topic
        } else {
            node.kind
        };
        self.attach_sibling_after(store, node_id, Node::new(kind, label))
    }

    /// Insert a caller-built node directly after `node_id`
    pub fn attach_sibling_after(
        &self,
        store: &mut dyn CellStore,
        node_id: &str,
        node: Node,
    ) -> Result<Node, OperationError> {
        let index = self.index(store);
        if index.is_root(node_id) {
            return self.attach_child(store, node_id, node);
        }
        let parent_id = index
            .parent(node_id)
            .ok_or_else(|| {
                OperationError::invalid_operation(format!(
                    "Node '{}' has no parent to insert a sibling under",
                    node_id
                ))
            })?
            .to_string();

        let order = self.insert_sibling_after(store, node_id)?;
        let node = store.add_node(node.with_order(order))?;
        store.add_edge(Edge::hierarchical(&parent_id, &node.id))?;
        Ok(node)
    }

    /// Renumber `parent_id`'s children to `0..n-1` in current sibling order
    ///
    /// Returns `true` when any order was rewritten.
    pub fn repair(&self, store: &mut dyn CellStore, parent_id: &str) -> Result<bool, OperationError> {
        let index = self.index(store);
        if !index.contains(parent_id) {
            return Err(OperationError::node_not_found(parent_id));
        }
        self.repair_group(store, &index, index.children(parent_id))
    }

    /// Delete `node_id` with its whole subtree and renumber its former siblings
    ///
    /// Returns the removed ids, the subject first.
    pub fn delete_subtree(
        &self,
        store: &mut dyn CellStore,
        node_id: &str,
    ) -> Result<Vec<String>, OperationError> {
        let index = self.index(store);
        if !index.contains(node_id) {
            return Err(OperationError::node_not_found(node_id));
        }
        if index.is_root(node_id) {
            warn!(node_id, "Rejected attempt to delete the root node");
            return Err(OperationError::invalid_operation("Cannot delete the root node"));
        }

        let mut removed = vec![node_id.to_string()];
        removed.extend(index.descendants(node_id));

        for id in removed.iter().rev() {
            store.remove_node(id)?;
        }

        if let Some(parent) = index.parent(node_id) {
            let remaining = without(index.children(parent), node_id);
            renumber(store, &index, &remaining)?;
        }

        debug!(node_id, removed = removed.len(), "Deleted subtree");
        Ok(removed)
    }

    fn repair_group(
        &self,
        store: &mut dyn CellStore,
        index: &HierarchyIndex,
        group: &[String],
    ) -> Result<bool, OperationError> {
        if index.is_dense(group) {
            return Ok(false);
        }
        let rewritten = renumber(store, index, group)?;
        debug!(siblings = group.len(), rewritten, "Repaired non-dense sibling group");
        Ok(rewritten > 0)
    }
}

/// Write `order = position` for every node in `group` whose order differs
fn renumber(
    store: &mut dyn CellStore,
    index: &HierarchyIndex,
    group: &[String],
) -> Result<usize, OperationError> {
    let mut rewritten = 0;
    for (i, id) in group.iter().enumerate() {
        let current = index.get(id).and_then(|node| node.order);
        if current != Some(i as u32) {
            store.update_node(id, NodeUpdate::new().with_order(i as u32))?;
            rewritten += 1;
        }
    }
    Ok(rewritten)
}

fn without(group: &[String], node_id: &str) -> Vec<String> {
    group.iter().filter(|id| *id != node_id).cloned().collect()
}
