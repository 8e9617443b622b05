//! Hierarchy Index
//!
//! A read-only snapshot of the tree implied by a cell store's hierarchical edges.
//! Every engine operation builds a fresh index from the store, so the index is never
//! cached across store events and never disagrees with the edges it was built from.
//!
//! # Derivation rules
//!
//! - A node's parent is the source of the first hierarchical edge targeting it.
//!   Additional incoming hierarchical edges are ignored (and logged).
//! - An edge whose source is missing from the store makes its target an orphan:
//!   the node is treated as parentless instead of failing the whole build.
//! - Dependency edges never take part in parent/child/sibling relationships.
//! - Siblings are sorted by `order`; unordered (legacy) nodes come after ordered
//!   ones, sorted by their layout-axis coordinate, with the id as last tie-breaker.

use crate::config::LayoutMode;
use crate::db::CellStore;
use crate::models::{Edge, Node, NodeKind};
use crate::operations::OperationError;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::warn;

pub struct HierarchyIndex {
    nodes: HashMap<String, Node>,

    /// Node ids in store order
    node_order: Vec<String>,

    edges: Vec<Edge>,

    /// Derived parent of every non-parentless node
    parents: HashMap<String, String>,

    /// Sorted children per parent
    children: HashMap<String, Vec<String>>,

    /// Parentless nodes (the document root, orphans, detached nodes)
    roots: Vec<String>,

    /// Orphan node id to the missing parent its first dangling edge names
    orphans: HashMap<String, String>,

    root_id: Option<String>,

    layout: LayoutMode,
}

impl HierarchyIndex {
    /// Build an index using the default (logic) layout for legacy sibling sorting
    pub fn from_store(store: &dyn CellStore) -> Self {
        Self::from_store_with_layout(store, LayoutMode::default())
    }

    pub fn from_store_with_layout(store: &dyn CellStore, layout: LayoutMode) -> Self {
        Self::build(store.nodes(), store.edges(), layout)
    }

    /// Build an index from raw node and edge lists
    pub fn build(nodes: Vec<Node>, edges: Vec<Edge>, layout: LayoutMode) -> Self {
        let node_order: Vec<String> = nodes.iter().map(|node| node.id.clone()).collect();
        let nodes: HashMap<String, Node> = nodes
            .into_iter()
            .map(|node| (node.id.clone(), node))
            .collect();

        let mut parents: HashMap<String, String> = HashMap::new();
        let mut children: HashMap<String, Vec<String>> = HashMap::new();
        let mut orphans: HashMap<String, String> = HashMap::new();

        for edge in edges.iter().filter(|edge| edge.is_hierarchical()) {
            if edge.source == edge.target || !nodes.contains_key(&edge.target) {
                continue;
            }
            if !nodes.contains_key(&edge.source) {
                warn!(
                    node_id = %edge.target,
                    parent_id = %edge.source,
                    "Orphan reference: hierarchical edge points at a missing parent"
                );
                orphans
                    .entry(edge.target.clone())
                    .or_insert_with(|| edge.source.clone());
                continue;
            }
            if let Some(existing) = parents.get(&edge.target) {
                if *existing != edge.source {
                    warn!(
                        node_id = %edge.target,
                        parent_id = %existing,
                        ignored_parent_id = %edge.source,
                        "Node has more than one parent edge, keeping the first"
                    );
                }
                continue;
            }
            parents.insert(edge.target.clone(), edge.source.clone());
            children
                .entry(edge.source.clone())
                .or_default()
                .push(edge.target.clone());
        }

        // A node with a valid parent edge is not an orphan even if another edge dangles
        orphans.retain(|id, _| !parents.contains_key(id));

        for group in children.values_mut() {
            group.sort_by(|a, b| sibling_cmp(&nodes[a], &nodes[b], layout));
        }

        let mut roots: Vec<String> = node_order
            .iter()
            .filter(|id| !parents.contains_key(*id))
            .cloned()
            .collect();
        roots.sort_by(|a, b| root_cmp(&nodes[a], &nodes[b]));

        let root_id = roots
            .iter()
            .find(|id| nodes[*id].kind == NodeKind::Root)
            .or_else(|| roots.first())
            .cloned();

        Self {
            nodes,
            node_order,
            edges,
            parents,
            children,
            roots,
            orphans,
            root_id,
            layout,
        }
    }

    pub fn layout(&self) -> LayoutMode {
        self.layout
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Nodes in store order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.node_order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Every hierarchical edge targeting `id`, including ignored duplicates
    pub fn incoming_hierarchical_edges(&self, id: &str) -> Vec<&Edge> {
        self.edges
            .iter()
            .filter(|edge| edge.is_hierarchical() && edge.target == id)
            .collect()
    }

    pub fn parent(&self, id: &str) -> Option<&str> {
        self.parents.get(id).map(String::as_str)
    }

    /// Children of `id` in sibling order
    pub fn children(&self, id: &str) -> &[String] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_children(&self, id: &str) -> bool {
        !self.children(id).is_empty()
    }

    /// The sibling group containing `id` (itself included), in sibling order
    ///
    /// Parentless nodes form one group with the other parentless nodes.
    pub fn siblings(&self, id: &str) -> &[String] {
        match self.parent(id) {
            Some(parent) => self.children(parent),
            None if self.contains(id) => &self.roots,
            None => &[],
        }
    }

    /// Ancestors of `id`, nearest first
    pub fn ancestors(&self, id: &str) -> Vec<String> {
        let mut ancestors = Vec::new();
        let mut seen: HashSet<&str> = HashSet::from([id]);
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            if !seen.insert(parent) {
                warn!(node_id = %id, "Cycle detected in parent chain");
                break;
            }
            ancestors.push(parent.to_string());
            current = parent;
        }
        ancestors
    }

    /// Strict descendants of `id` in breadth-first order
    pub fn descendants(&self, id: &str) -> Vec<String> {
        let mut result = Vec::new();
        let mut seen: HashSet<&str> = HashSet::from([id]);
        let mut queue: VecDeque<&str> = VecDeque::from([id]);

        while let Some(current) = queue.pop_front() {
            for child in self.children(current) {
                if seen.insert(child.as_str()) {
                    result.push(child.clone());
                    queue.push_back(child.as_str());
                }
            }
        }
        result
    }

    /// Whether `id` is a strict descendant of `ancestor_id`
    pub fn is_descendant(&self, id: &str, ancestor_id: &str) -> bool {
        id != ancestor_id && self.ancestors(id).iter().any(|a| a == ancestor_id)
    }

    /// The document root: the `Root`-kind node, else the first parentless node
    pub fn root_id(&self) -> Option<&str> {
        self.root_id.as_deref()
    }

    pub fn is_root(&self, id: &str) -> bool {
        self.root_id() == Some(id)
    }

    /// Parentless nodes, sorted by order then label
    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    pub fn is_orphan(&self, id: &str) -> bool {
        self.orphans.contains_key(id)
    }

    /// One `OrphanReference` per orphan, sorted by node id
    ///
    /// The index itself tolerates orphans; hosts use this to surface broken
    /// documents.
    pub fn orphan_references(&self) -> Vec<OperationError> {
        let mut ids: Vec<&String> = self.orphans.keys().collect();
        ids.sort();
        ids.into_iter()
            .map(|id| OperationError::orphan_reference(id.as_str(), self.orphans[id].as_str()))
            .collect()
    }

    /// Whether the sibling group's orders are exactly `0..n` in sibling order
    pub fn is_dense(&self, group: &[String]) -> bool {
        group.iter().enumerate().all(|(i, id)| {
            self.get(id).and_then(|node| node.order) == Some(i as u32)
        })
    }
}

/// Total order between two siblings
pub fn sibling_cmp(a: &Node, b: &Node, layout: LayoutMode) -> Ordering {
    match (a.order, b.order) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.id.cmp(&b.id)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => layout_axis(a, layout)
            .total_cmp(&layout_axis(b, layout))
            .then_with(|| a.id.cmp(&b.id)),
    }
}

fn layout_axis(node: &Node, layout: LayoutMode) -> f64 {
    match layout {
        LayoutMode::Mindmap => node.position.y,
        LayoutMode::Logic | LayoutMode::Network | LayoutMode::Free => node.position.x,
    }
}

fn root_cmp(a: &Node, b: &Node) -> Ordering {
    let order = match (a.order, b.order) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    order
        .then_with(|| a.label.cmp(&b.label))
        .then_with(|| a.id.cmp(&b.id))
}
