//! Outline Projection
//!
//! A second tree view over the same cells as the canvas. The outline keeps its own
//! collapse set and never reads or writes the canvas `collapsed` flag. It does not
//! own node data either: it listens to the store's change events and rebuilds its
//! tree from the store when something changed.
//!
//! # Drag and drop
//!
//! A drag is a sequence of synchronous callbacks (`begin_drag`, `drag_over`…,
//! then `drop` or `cancel_drag`). Nothing is written until `drop`, which performs a
//! single `OrderManager::reorder`, so an abandoned gesture leaves the store untouched.

use crate::config::LayoutMode;
use crate::db::{CellEvent, CellStore};
use crate::models::{NodeKind, Selection};
use crate::operations::{OperationError, OrderManager};
use crate::services::HierarchyIndex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, warn};

/// Pointer fraction (0.0 top, 1.0 bottom of the row) below which a drop goes above
const ABOVE_THRESHOLD: f64 = 0.25;

/// Pointer fraction above which a drop goes below
const BELOW_THRESHOLD: f64 = 0.75;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlineNode {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
    pub depth: usize,
    pub has_children: bool,
    pub children: Vec<OutlineNode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DropPosition {
    /// Become the sibling just before the target
    Above,
    /// Become the sibling just after the target
    Below,
    /// Become the target's last child
    Onto,
}

impl DropPosition {
    pub fn from_pointer_fraction(fraction: f64) -> Self {
        if fraction < ABOVE_THRESHOLD {
            DropPosition::Above
        } else if fraction > BELOW_THRESHOLD {
            DropPosition::Below
        } else {
            DropPosition::Onto
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DragState {
    pub dragged_id: String,
    pub target: Option<(String, DropPosition)>,
}

pub struct OutlineProjection {
    tree: Vec<OutlineNode>,
    collapsed: HashSet<String>,
    events: broadcast::Receiver<CellEvent>,
    stale: bool,
    drag: Option<DragState>,
    orders: OrderManager,
}

impl OutlineProjection {
    /// Subscribe to `store` and build the initial tree
    pub fn new(store: &dyn CellStore, layout: LayoutMode) -> Self {
        let mut outline = Self {
            tree: Vec::new(),
            collapsed: HashSet::new(),
            events: store.subscribe(),
            stale: true,
            drag: None,
            orders: OrderManager::new(layout),
        };
        outline.rebuild(store);
        outline
    }

    pub fn tree(&self) -> &[OutlineNode] {
        &self.tree
    }

    /// Drain pending change events and rebuild if any arrived
    ///
    /// Returns whether the tree was rebuilt.
    pub fn refresh(&mut self, store: &dyn CellStore) -> bool {
        loop {
            match self.events.try_recv() {
                Ok(_) => self.stale = true,
                Err(TryRecvError::Lagged(missed)) => {
                    warn!(missed, "Outline fell behind the cell store, rebuilding");
                    self.stale = true;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        if !self.stale {
            return false;
        }
        self.rebuild(store);
        true
    }

    fn rebuild(&mut self, store: &dyn CellStore) {
        let index = HierarchyIndex::from_store_with_layout(store, self.orders.layout());
        let mut seen = HashSet::new();
        self.tree = index
            .roots()
            .iter()
            .filter_map(|id| build_node(&index, id, 0, &mut seen))
            .collect();
        self.collapsed.retain(|id| index.contains(id));
        self.stale = false;
        debug!(nodes = seen.len(), "Rebuilt outline");
    }

    pub fn is_collapsed(&self, node_id: &str) -> bool {
        self.collapsed.contains(node_id)
    }

    /// Outline-local collapse; the canvas is unaffected
    pub fn set_collapsed(&mut self, node_id: &str, collapsed: bool) -> bool {
        if collapsed {
            self.collapsed.insert(node_id.to_string())
        } else {
            self.collapsed.remove(node_id)
        }
    }

    /// Returns the new collapsed state
    pub fn toggle_collapsed(&mut self, node_id: &str) -> bool {
        let collapsed = !self.is_collapsed(node_id);
        self.set_collapsed(node_id, collapsed);
        collapsed
    }

    /// Rows to render, depth first, skipping children of outline-collapsed nodes
    pub fn visible_rows(&self) -> Vec<&OutlineNode> {
        let mut rows = Vec::new();
        let mut stack: Vec<&OutlineNode> = self.tree.iter().rev().collect();
        while let Some(node) = stack.pop() {
            rows.push(node);
            if !self.is_collapsed(&node.id) {
                stack.extend(node.children.iter().rev());
            }
        }
        rows
    }

    /// Set the shared selection without touching drill path or collapse state
    pub fn select_from_outline(&self, selection: &mut Selection, node_id: &str) {
        selection.select(node_id);
    }

    /// Move `dragged_id` relative to `target_id` and select it
    ///
    /// # Errors
    ///
    /// - `InvalidOperation` for a drop onto itself or beside the document root
    /// - any error of `OrderManager::reorder` (root subject, cycles, missing nodes)
    pub fn reorder_in_outline(
        &mut self,
        store: &mut dyn CellStore,
        selection: &mut Selection,
        dragged_id: &str,
        target_id: &str,
        position: DropPosition,
    ) -> Result<(), OperationError> {
        if dragged_id == target_id {
            return Err(OperationError::invalid_operation("Cannot drop a node onto itself"));
        }
        let index = HierarchyIndex::from_store_with_layout(store, self.orders.layout());
        if !index.contains(target_id) {
            return Err(OperationError::node_not_found(target_id));
        }

        let (parent_id, new_index) = match position {
            DropPosition::Onto => {
                let count = index
                    .children(target_id)
                    .iter()
                    .filter(|id| *id != dragged_id)
                    .count();
                (target_id.to_string(), count)
            }
            DropPosition::Above | DropPosition::Below => {
                let parent_id = index.parent(target_id).ok_or_else(|| {
                    OperationError::invalid_operation(format!(
                        "Cannot drop beside parentless node '{}'",
                        target_id
                    ))
                })?;
                let at = index
                    .children(parent_id)
                    .iter()
                    .filter(|id| *id != dragged_id)
                    .position(|id| id == target_id)
                    .unwrap_or(0);
                let at = if position == DropPosition::Below { at + 1 } else { at };
                (parent_id.to_string(), at)
            }
        };

        self.orders.reorder(store, dragged_id, &parent_id, new_index)?;
        selection.select(dragged_id);
        self.stale = true;
        Ok(())
    }

    pub fn begin_drag(&mut self, node_id: &str) {
        self.drag = Some(DragState {
            dragged_id: node_id.to_string(),
            target: None,
        });
    }

    /// Update the hovered target; `pointer_fraction` is the vertical pointer
    /// position within the target row
    pub fn drag_over(&mut self, target_id: &str, pointer_fraction: f64) -> Option<DropPosition> {
        let drag = self.drag.as_mut()?;
        let position = DropPosition::from_pointer_fraction(pointer_fraction);
        drag.target = Some((target_id.to_string(), position));
        Some(position)
    }

    pub fn drag_state(&self) -> Option<&DragState> {
        self.drag.as_ref()
    }

    /// Finish the gesture. Returns `Ok(false)` when there was nothing to drop.
    pub fn drop(
        &mut self,
        store: &mut dyn CellStore,
        selection: &mut Selection,
    ) -> Result<bool, OperationError> {
        let Some(DragState {
            dragged_id,
            target: Some((target_id, position)),
        }) = self.drag.take()
        else {
            return Ok(false);
        };
        self.reorder_in_outline(store, selection, &dragged_id, &target_id, position)?;
        Ok(true)
    }

    /// Abort the gesture with no mutation
    pub fn cancel_drag(&mut self) {
        self.drag = None;
    }
}

fn build_node(
    index: &HierarchyIndex,
    id: &str,
    depth: usize,
    seen: &mut HashSet<String>,
) -> Option<OutlineNode> {
    if !seen.insert(id.to_string()) {
        return None;
    }
    let node = index.get(id)?;
    let children: Vec<OutlineNode> = index
        .children(id)
        .iter()
        .filter_map(|child| build_node(index, child, depth + 1, seen))
        .collect();

    Some(OutlineNode {
        id: node.id.clone(),
        label: node.label.clone(),
        kind: node.kind,
        depth,
        has_children: !children.is_empty(),
        children,
    })
}
