//! Navigation Engine
//!
//! Computes keyboard cursor targets. The focused node itself is owned by the host
//! (see `CanvasSession`); every move here returns the new target id, or the input id
//! unchanged when there is nowhere to go. There is no wraparound.
//!
//! Tree layouts walk hierarchical edges only. The network layout walks dependency
//! edges, and the free layout picks the nearest node in the arrow's direction.
//!
//! Archived nodes and nodes that are not currently rendered are never targets.

use crate::config::LayoutMode;
use crate::db::CellStore;
use crate::operations::OperationError;
use crate::models::{EdgeKind, Node};
use crate::services::{HierarchyIndex, VisibilityPropagator, VisibleSet};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SiblingDirection {
    Previous,
    Next,
}

/// Move requested by a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NavDirection {
    Parent,
    FirstChild,
    Sibling(SiblingDirection),
    /// Along dependency edges: Left predecessors, Right successors, Up/Down either
    Dependency(ArrowKey),
    /// Nearest node on screen in the arrow's direction
    Spatial(ArrowKey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ArrowKey {
    Up,
    Down,
    Left,
    Right,
}

impl ArrowKey {
    /// Map an arrow key to a structural move for the given layout
    ///
    /// - Logic (top-down): Up parent, Down first child, Left/Right siblings
    /// - Mindmap (left-right): Left parent, Right first child, Up/Down siblings
    /// - Network: dependency neighbours
    /// - Free: spatial nearest neighbour
    pub fn direction(self, layout: LayoutMode) -> NavDirection {
        match (layout, self) {
            (LayoutMode::Network, arrow) => NavDirection::Dependency(arrow),
            (LayoutMode::Free, arrow) => NavDirection::Spatial(arrow),
            (LayoutMode::Logic, ArrowKey::Up) => NavDirection::Parent,
            (LayoutMode::Logic, ArrowKey::Down) => NavDirection::FirstChild,
            (LayoutMode::Logic, ArrowKey::Left) => NavDirection::Sibling(SiblingDirection::Previous),
            (LayoutMode::Logic, ArrowKey::Right) => NavDirection::Sibling(SiblingDirection::Next),
            (LayoutMode::Mindmap, ArrowKey::Left) => NavDirection::Parent,
            (LayoutMode::Mindmap, ArrowKey::Right) => NavDirection::FirstChild,
            (LayoutMode::Mindmap, ArrowKey::Up) => NavDirection::Sibling(SiblingDirection::Previous),
            (LayoutMode::Mindmap, ArrowKey::Down) => NavDirection::Sibling(SiblingDirection::Next),
        }
    }
}

/// Read-only navigator over one hierarchy snapshot
pub struct Navigator<'a> {
    index: &'a HierarchyIndex,
    visible: Option<&'a VisibleSet>,
    drill_root: Option<&'a str>,
}

impl<'a> Navigator<'a> {
    pub fn new(index: &'a HierarchyIndex) -> Self {
        Self {
            index,
            visible: None,
            drill_root: None,
        }
    }

    /// Restrict targets to an already computed visible set
    pub fn with_visible_set(mut self, visible: &'a VisibleSet) -> Self {
        self.visible = Some(visible);
        self
    }

    pub fn with_drill_root(mut self, drill_root: Option<&'a str>) -> Self {
        self.drill_root = drill_root;
        self
    }

    pub fn navigate(&self, node_id: &str, direction: NavDirection) -> String {
        match direction {
            NavDirection::Parent => self.move_to_parent(node_id),
            NavDirection::FirstChild => self.move_to_first_child(node_id),
            NavDirection::Sibling(direction) => self.move_to_sibling(node_id, direction),
            NavDirection::Dependency(arrow) => self.move_along_dependencies(node_id, arrow),
            NavDirection::Spatial(arrow) => self.move_spatially(node_id, arrow),
        }
    }

    /// Parent of `node_id`; unchanged at the document root or the drill root
    pub fn move_to_parent(&self, node_id: &str) -> String {
        if self.drill_root == Some(node_id) {
            return node_id.to_string();
        }
        match self.index.parent(node_id) {
            Some(parent) if self.is_target(parent) => parent.to_string(),
            _ => node_id.to_string(),
        }
    }

    /// Lowest-ordered visible child; unchanged when collapsed or childless
    pub fn move_to_first_child(&self, node_id: &str) -> String {
        if self.index.get(node_id).map_or(true, |node| node.collapsed) {
            return node_id.to_string();
        }
        self.index
            .children(node_id)
            .iter()
            .find(|child| self.is_target(child))
            .cloned()
            .unwrap_or_else(|| node_id.to_string())
    }

    /// Adjacent sibling in `direction`; unchanged at either end of the group
    pub fn move_to_sibling(&self, node_id: &str, direction: SiblingDirection) -> String {
        if self.index.parent(node_id).is_none() {
            return node_id.to_string();
        }
        let group = self.index.siblings(node_id);
        let Some(position) = group.iter().position(|id| id == node_id) else {
            return node_id.to_string();
        };

        let candidate = match direction {
            SiblingDirection::Previous => group[..position]
                .iter()
                .rev()
                .find(|id| self.is_target(id)),
            SiblingDirection::Next => group[position + 1..]
                .iter()
                .find(|id| self.is_target(id)),
        };
        candidate
            .cloned()
            .unwrap_or_else(|| node_id.to_string())
    }

    /// Closest dependency neighbour of `node_id`
    ///
    /// Left picks among predecessors, Right among successors. Up and Down pick among
    /// both, restricted to nodes strictly above or below. Candidates are ranked by
    /// vertical offset, then horizontal offset, then distance, then id.
    pub fn move_along_dependencies(&self, node_id: &str, arrow: ArrowKey) -> String {
        let Some(current) = self.index.get(node_id) else {
            return node_id.to_string();
        };

        let mut candidates: Vec<&Node> = Vec::new();
        for edge in self.index.edges() {
            if edge.kind != EdgeKind::Dependency {
                continue;
            }
            let neighbour = match arrow {
                ArrowKey::Left if edge.target == node_id => &edge.source,
                ArrowKey::Right if edge.source == node_id => &edge.target,
                ArrowKey::Up | ArrowKey::Down if edge.target == node_id => &edge.source,
                ArrowKey::Up | ArrowKey::Down if edge.source == node_id => &edge.target,
                _ => continue,
            };
            if neighbour == node_id || !self.is_target(neighbour) {
                continue;
            }
            if let Some(node) = self.index.get(neighbour) {
                if !candidates.iter().any(|existing| existing.id == node.id) {
                    candidates.push(node);
                }
            }
        }

        let (x, y) = (current.position.x, current.position.y);
        candidates
            .into_iter()
            .filter_map(|candidate| {
                let dx = candidate.position.x - x;
                let dy = candidate.position.y - y;
                let in_direction = match arrow {
                    ArrowKey::Up => dy < 0.0,
                    ArrowKey::Down => dy > 0.0,
                    ArrowKey::Left | ArrowKey::Right => true,
                };
                in_direction.then(|| ([dy.abs(), dx.abs(), dx.hypot(dy)], candidate))
            })
            .min_by(rank)
            .map(|(_, node)| node.id.clone())
            .unwrap_or_else(|| node_id.to_string())
    }

    /// Nearest node in the arrow's half-plane, by screen position
    ///
    /// Candidates are ranked by angle off the arrow axis, then distance along it,
    /// then straight-line distance, then id.
    pub fn move_spatially(&self, node_id: &str, arrow: ArrowKey) -> String {
        let Some(current) = self.index.get(node_id) else {
            return node_id.to_string();
        };
        let (x, y) = (current.position.x, current.position.y);

        self.index
            .nodes()
            .filter(|node| node.id != node_id && self.is_target(&node.id))
            .filter_map(|node| {
                let dx = node.position.x - x;
                let dy = node.position.y - y;
                let (parallel, perpendicular) = match arrow {
                    ArrowKey::Up => (-dy, dx.abs()),
                    ArrowKey::Down => (dy, dx.abs()),
                    ArrowKey::Left => (-dx, dy.abs()),
                    ArrowKey::Right => (dx, dy.abs()),
                };
                (parallel > 0.0)
                    .then(|| ([perpendicular / parallel, parallel, dx.hypot(dy)], node))
            })
            .min_by(rank)
            .map(|(_, node)| node.id.clone())
            .unwrap_or_else(|| node_id.to_string())
    }

    /// Expand every collapsed ancestor of `target_id` and report it as the new focus
    pub fn navigate_to(
        store: &mut dyn CellStore,
        target_id: &str,
    ) -> Result<String, OperationError> {
        VisibilityPropagator::expand_path_to(store, target_id)?;
        Ok(target_id.to_string())
    }

    fn is_target(&self, id: &str) -> bool {
        let Some(node) = self.index.get(id) else {
            return false;
        };
        if node.archived {
            return false;
        }
        match self.visible {
            Some(visible) => visible.contains_node(id),
            None => VisibilityPropagator::is_visible_in(self.index, id, self.drill_root),
        }
    }
}

/// Lexicographic comparison of score triples, ties broken by node id
fn rank(a: &([f64; 3], &Node), b: &([f64; 3], &Node)) -> Ordering {
    a.0.iter()
        .zip(b.0.iter())
        .map(|(x, y)| x.total_cmp(y))
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.1.id.cmp(&b.1.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Edge, Node, NodeKind};

    fn index_with(nodes: Vec<Node>, edges: Vec<Edge>) -> HierarchyIndex {
        HierarchyIndex::build(nodes, edges, LayoutMode::Logic)
    }

    /// root → [a, b, c], a → a1
    fn fixture() -> (Vec<Node>, Vec<Edge>) {
        let mut nodes = vec![Node::new_with_id("root", NodeKind::Root, "Root")];
        let mut edges = Vec::new();
        for (parent, id, order) in [("root", "a", 0), ("root", "b", 1), ("root", "c", 2), ("a", "a1", 0)] {
            nodes.push(Node::new_with_id(id, NodeKind::Topic, id).with_order(order));
            edges.push(Edge::hierarchical(parent, id));
        }
        (nodes, edges)
    }

    #[test]
    fn test_basic_moves() {
        let (nodes, edges) = fixture();
        let index = index_with(nodes, edges);
        let nav = Navigator::new(&index);

        assert_eq!(nav.move_to_first_child("root"), "a");
        assert_eq!(nav.move_to_sibling("a", SiblingDirection::Next), "b");
        assert_eq!(nav.move_to_sibling("b", SiblingDirection::Previous), "a");
        assert_eq!(nav.move_to_parent("a1"), "a");
        assert_eq!(nav.move_to_parent("root"), "root");
    }

    #[test]
    fn test_no_wraparound() {
        let (nodes, edges) = fixture();
        let index = index_with(nodes, edges);
        let nav = Navigator::new(&index);

        assert_eq!(nav.move_to_sibling("c", SiblingDirection::Next), "c");
        assert_eq!(nav.move_to_sibling("a", SiblingDirection::Previous), "a");
        assert_eq!(nav.move_to_sibling("root", SiblingDirection::Next), "root");
        assert_eq!(nav.move_to_first_child("b"), "b");
    }

    #[test]
    fn test_collapsed_node_has_no_child_target() {
        let (mut nodes, edges) = fixture();
        nodes[1].collapsed = true;
        let index = index_with(nodes, edges);

        assert_eq!(Navigator::new(&index).move_to_first_child("a"), "a");
    }

    #[test]
    fn test_archived_siblings_are_skipped() {
        let (mut nodes, edges) = fixture();
        nodes[2].archived = true;
        let index = index_with(nodes, edges);
        let nav = Navigator::new(&index);

        assert_eq!(nav.move_to_sibling("a", SiblingDirection::Next), "c");
        assert_eq!(nav.move_to_sibling("c", SiblingDirection::Previous), "a");
    }

    #[test]
    fn test_drill_root_is_a_ceiling() {
        let (nodes, edges) = fixture();
        let index = index_with(nodes, edges);
        let nav = Navigator::new(&index).with_drill_root(Some("a"));

        assert_eq!(nav.move_to_parent("a"), "a");
        assert_eq!(nav.move_to_parent("a1"), "a");
        assert_eq!(nav.move_to_sibling("a", SiblingDirection::Next), "a");
    }

    #[test]
    fn test_arrow_mapping_per_layout() {
        assert_eq!(ArrowKey::Up.direction(LayoutMode::Logic), NavDirection::Parent);
        assert_eq!(ArrowKey::Down.direction(LayoutMode::Logic), NavDirection::FirstChild);
        assert_eq!(
            ArrowKey::Right.direction(LayoutMode::Logic),
            NavDirection::Sibling(SiblingDirection::Next)
        );
        assert_eq!(ArrowKey::Left.direction(LayoutMode::Mindmap), NavDirection::Parent);
        assert_eq!(
            ArrowKey::Up.direction(LayoutMode::Mindmap),
            NavDirection::Sibling(SiblingDirection::Previous)
        );
        assert_eq!(
            ArrowKey::Left.direction(LayoutMode::Network),
            NavDirection::Dependency(ArrowKey::Left)
        );
        assert_eq!(
            ArrowKey::Down.direction(LayoutMode::Free),
            NavDirection::Spatial(ArrowKey::Down)
        );
    }

    #[test]
    fn test_missing_drill_root_does_not_trap_the_cursor() {
        let (nodes, edges) = fixture();
        let index = index_with(nodes, edges);
        let nav = Navigator::new(&index).with_drill_root(Some("ghost"));

        assert_eq!(nav.move_to_first_child("root"), "a");
        assert_eq!(nav.move_to_sibling("a", SiblingDirection::Next), "b");
        assert_eq!(nav.move_to_parent("a1"), "a");
    }

    /// Pipeline laid out left to right: src -> mid -> {up, down}, plus a loose node
    fn network() -> HierarchyIndex {
        let nodes = vec![
            Node::new_with_id("root", NodeKind::Root, "Root").with_position(0.0, 0.0),
            Node::new_with_id("src", NodeKind::Topic, "src").with_position(0.0, 100.0),
            Node::new_with_id("mid", NodeKind::Topic, "mid").with_position(200.0, 100.0),
            Node::new_with_id("up", NodeKind::Topic, "up").with_position(400.0, 60.0),
            Node::new_with_id("down", NodeKind::Topic, "down").with_position(400.0, 160.0),
            Node::new_with_id("loose", NodeKind::Topic, "loose").with_position(210.0, 110.0),
        ];
        let mut edges: Vec<Edge> = ["src", "mid", "up", "down", "loose"]
            .into_iter()
            .map(|id| Edge::hierarchical("root", id))
            .collect();
        edges.push(Edge::dependency("src", "mid"));
        edges.push(Edge::dependency("mid", "up"));
        edges.push(Edge::dependency("mid", "down"));
        HierarchyIndex::build(nodes, edges, LayoutMode::Network)
    }

    #[test]
    fn test_network_arrows_follow_dependency_edges() {
        let index = network();
        let nav = Navigator::new(&index);

        assert_eq!(nav.navigate("mid", ArrowKey::Left.direction(LayoutMode::Network)), "src");
        // Both successors qualify; `up` is closer vertically
        assert_eq!(nav.move_along_dependencies("mid", ArrowKey::Right), "up");
        assert_eq!(nav.move_along_dependencies("mid", ArrowKey::Down), "down");
        assert_eq!(nav.move_along_dependencies("mid", ArrowKey::Up), "up");
        // `loose` is nearby but has no dependency edge
        assert_eq!(nav.move_along_dependencies("src", ArrowKey::Right), "mid");
        assert_eq!(nav.move_along_dependencies("src", ArrowKey::Left), "src");
        assert_eq!(nav.move_along_dependencies("loose", ArrowKey::Right), "loose");
    }

    #[test]
    fn test_network_up_down_stay_put_without_candidates_in_that_direction() {
        let index = network();
        let nav = Navigator::new(&index);

        assert_eq!(nav.move_along_dependencies("up", ArrowKey::Up), "up");
        assert_eq!(nav.move_along_dependencies("up", ArrowKey::Down), "mid");
        assert_eq!(nav.move_along_dependencies("down", ArrowKey::Down), "down");
    }

    #[test]
    fn test_network_skips_archived_neighbours() {
        let mut nodes = vec![
            Node::new_with_id("root", NodeKind::Root, "Root"),
            Node::new_with_id("a", NodeKind::Topic, "a").with_position(0.0, 0.0),
            Node::new_with_id("b", NodeKind::Topic, "b").with_position(100.0, 0.0),
            Node::new_with_id("c", NodeKind::Topic, "c").with_position(100.0, 50.0),
        ];
        nodes[2].archived = true;
        let edges = vec![
            Edge::hierarchical("root", "a"),
            Edge::hierarchical("root", "b"),
            Edge::hierarchical("root", "c"),
            Edge::dependency("a", "b"),
            Edge::dependency("a", "c"),
        ];
        let index = HierarchyIndex::build(nodes, edges, LayoutMode::Network);

        assert_eq!(Navigator::new(&index).move_along_dependencies("a", ArrowKey::Right), "c");
    }

    #[test]
    fn test_free_layout_picks_nearest_in_direction() {
        let nodes = vec![
            Node::new_with_id("root", NodeKind::Root, "Root").with_position(0.0, 0.0),
            Node::new_with_id("right_far", NodeKind::Topic, "").with_position(300.0, 0.0),
            Node::new_with_id("right_diag", NodeKind::Topic, "").with_position(100.0, 90.0),
            Node::new_with_id("right_near", NodeKind::Topic, "").with_position(150.0, 10.0),
            Node::new_with_id("left", NodeKind::Topic, "").with_position(-50.0, 0.0),
            Node::new_with_id("below", NodeKind::Topic, "").with_position(5.0, 200.0),
        ];
        let edges = ["right_far", "right_diag", "right_near", "left", "below"]
            .into_iter()
            .map(|id| Edge::hierarchical("root", id))
            .collect();
        let index = HierarchyIndex::build(nodes, edges, LayoutMode::Free);
        let nav = Navigator::new(&index);

        // Smallest angle off the axis wins over raw distance
        assert_eq!(nav.move_spatially("root", ArrowKey::Right), "right_far");
        assert_eq!(nav.move_spatially("right_near", ArrowKey::Right), "right_far");
        assert_eq!(nav.move_spatially("root", ArrowKey::Left), "left");
        assert_eq!(nav.move_spatially("root", ArrowKey::Down), "below");
        assert_eq!(nav.move_spatially("root", ArrowKey::Up), "root");
        assert_eq!(nav.move_spatially("left", ArrowKey::Left), "left");
        // Same angle: the shorter distance along the axis wins
        assert_eq!(nav.move_spatially("left", ArrowKey::Right), "root");
        assert_eq!(nav.navigate("right_far", ArrowKey::Left.direction(LayoutMode::Free)), "root");
    }

    #[test]
    fn test_free_layout_ignores_hidden_nodes() {
        let mut nodes = vec![
            Node::new_with_id("root", NodeKind::Root, "Root").with_position(0.0, 0.0),
            Node::new_with_id("a", NodeKind::Topic, "").with_position(100.0, 0.0),
            Node::new_with_id("a1", NodeKind::Topic, "").with_position(50.0, 0.0),
        ];
        nodes[1].collapsed = true;
        let edges = vec![Edge::hierarchical("root", "a"), Edge::hierarchical("a", "a1")];
        let index = HierarchyIndex::build(nodes, edges, LayoutMode::Free);

        assert_eq!(Navigator::new(&index).move_spatially("root", ArrowKey::Right), "a");
    }
}
