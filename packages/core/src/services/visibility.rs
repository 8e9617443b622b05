//! Visibility Propagator
//!
//! Derives what the canvas renders from collapse flags, the tree shape and the
//! current drill root. Collapse is render state only: every write here touches the
//! `collapsed` flag and nothing else, so stored positions survive any sequence of
//! collapse/expand calls unchanged.
//!
//! # Rules
//!
//! - A node is hidden iff a strict ancestor is collapsed. Collapsing a node never
//!   hides the node itself.
//! - While drilled, only the drill root and its descendants are eligible; ancestors
//!   above the drill root do not affect the drilled view.
//! - Expansion is never recursive. `collapse_subtree_recursive` is, on purpose, so
//!   that expanding its subject later reveals only the direct children.

use crate::db::CellStore;
use crate::models::NodeUpdate;
use crate::operations::OperationError;
use crate::services::HierarchyIndex;
use std::collections::{HashSet, VecDeque};
use tracing::{debug, warn};

/// Node and edge ids the canvas should render
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibleSet {
    pub nodes: HashSet<String>,
    pub edges: HashSet<String>,
}

impl VisibleSet {
    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains(id)
    }

    pub fn contains_edge(&self, id: &str) -> bool {
        self.edges.contains(id)
    }
}

pub struct VisibilityPropagator;

impl VisibilityPropagator {
    /// Set the canvas collapse flag on `node_id`
    ///
    /// Returns whether the flag changed. Collapsing a leaf is a no-op.
    pub fn set_collapsed(
        store: &mut dyn CellStore,
        node_id: &str,
        collapsed: bool,
    ) -> Result<bool, OperationError> {
        let index = HierarchyIndex::from_store(store);
        let node = index
            .get(node_id)
            .ok_or_else(|| OperationError::node_not_found(node_id))?;

        if node.collapsed == collapsed {
            return Ok(false);
        }
        if collapsed && !index.has_children(node_id) {
            debug!(node_id, "Ignoring collapse of a leaf node");
            return Ok(false);
        }

        store.update_node(node_id, NodeUpdate::new().with_collapsed(collapsed))?;
        Ok(true)
    }

    /// Flip the collapse flag and return the resulting state
    pub fn toggle_collapsed(
        store: &mut dyn CellStore,
        node_id: &str,
    ) -> Result<bool, OperationError> {
        let current = store
            .get_node(node_id)
            .ok_or_else(|| OperationError::node_not_found(node_id))?
            .collapsed;
        let changed = Self::set_collapsed(store, node_id, !current)?;
        Ok(current != changed)
    }

    /// Collapse `node_id` and every descendant that has children
    ///
    /// Returns the ids whose flag changed.
    pub fn collapse_subtree_recursive(
        store: &mut dyn CellStore,
        node_id: &str,
    ) -> Result<Vec<String>, OperationError> {
        let index = HierarchyIndex::from_store(store);
        if !index.contains(node_id) {
            return Err(OperationError::node_not_found(node_id));
        }

        let mut changed = Vec::new();
        let candidates = std::iter::once(node_id.to_string()).chain(index.descendants(node_id));
        for id in candidates {
            let already = index.get(&id).map(|node| node.collapsed).unwrap_or(true);
            if index.has_children(&id) && !already {
                store.update_node(&id, NodeUpdate::new().with_collapsed(true))?;
                changed.push(id);
            }
        }
        Ok(changed)
    }

    /// Clear `collapsed` on every ancestor of `node_id`, leaving other branches alone
    ///
    /// Returns the ids whose flag changed, nearest ancestor first.
    pub fn expand_path_to(
        store: &mut dyn CellStore,
        node_id: &str,
    ) -> Result<Vec<String>, OperationError> {
        let index = HierarchyIndex::from_store(store);
        if !index.contains(node_id) {
            return Err(OperationError::node_not_found(node_id));
        }

        let mut changed = Vec::new();
        for ancestor in index.ancestors(node_id) {
            if index.get(&ancestor).is_some_and(|node| node.collapsed) {
                store.update_node(&ancestor, NodeUpdate::new().with_collapsed(false))?;
                changed.push(ancestor);
            }
        }
        Ok(changed)
    }

    /// Whether `node_id` is rendered in the main (undrilled) view
    pub fn is_visible(index: &HierarchyIndex, node_id: &str) -> bool {
        Self::is_visible_in(index, node_id, None)
    }

    /// Whether `node_id` is rendered when `drill_root` is the current subgraph root
    ///
    /// A drill root missing from the index is ignored, matching `visible_set`.
    pub fn is_visible_in(index: &HierarchyIndex, node_id: &str, drill_root: Option<&str>) -> bool {
        if !index.contains(node_id) {
            return false;
        }
        let drill_root = drill_root.filter(|root| index.contains(root));
        if drill_root == Some(node_id) {
            return true;
        }

        for ancestor in index.ancestors(node_id) {
            if index.get(&ancestor).is_some_and(|node| node.collapsed) {
                return false;
            }
            if drill_root == Some(ancestor.as_str()) {
                return true;
            }
        }
        // Drilled but never reached the drill root: outside the subgraph
        drill_root.is_none()
    }

    /// Number of strict descendants hidden behind a collapsed node (0 when expanded)
    pub fn hidden_descendant_count(index: &HierarchyIndex, node_id: &str) -> usize {
        match index.get(node_id) {
            Some(node) if node.collapsed => index.descendants(node_id).len(),
            _ => 0,
        }
    }

    pub fn child_count(index: &HierarchyIndex, node_id: &str) -> usize {
        index.children(node_id).len()
    }

    /// Compute the rendered node and edge sets
    ///
    /// An edge of either kind is visible iff both endpoints are visible.
    pub fn visible_set(index: &HierarchyIndex, drill_root: Option<&str>) -> VisibleSet {
        let nodes = match drill_root {
            Some(root) if index.contains(root) => Self::reachable_from(index, [root]),
            Some(root) => {
                warn!(drill_root = root, "Drill root is missing, rendering the main view");
                Self::main_view(index)
            }
            None => Self::main_view(index),
        };

        let edges = index
            .edges()
            .iter()
            .filter(|edge| nodes.contains(&edge.source) && nodes.contains(&edge.target))
            .map(|edge| edge.id.clone())
            .collect();

        VisibleSet { nodes, edges }
    }

    fn main_view(index: &HierarchyIndex) -> HashSet<String> {
        let mut nodes = Self::reachable_from(index, index.roots().iter().map(String::as_str));

        // Nodes caught in a parent cycle are unreachable from any root
        if nodes.len() < index.len() {
            let stragglers: Vec<String> = index
                .nodes()
                .filter(|node| !nodes.contains(&node.id) && Self::is_visible(index, &node.id))
                .map(|node| node.id.clone())
                .collect();
            nodes.extend(stragglers);
        }
        nodes
    }

    /// Breadth-first walk that does not descend below collapsed nodes
    fn reachable_from<'a>(
        index: &'a HierarchyIndex,
        starts: impl IntoIterator<Item = &'a str>,
    ) -> HashSet<String> {
        let mut visible = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        for start in starts {
            if visible.insert(start.to_string()) {
                queue.push_back(start);
            }
        }

        while let Some(current) = queue.pop_front() {
            if index.get(current).is_some_and(|node| node.collapsed) {
                continue;
            }
            for child in index.children(current) {
                if visible.insert(child.clone()) {
                    queue.push_back(child.as_str());
                }
            }
        }
        visible
    }
}
