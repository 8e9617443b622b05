//! Edge Data Structures
//!
//! Edges are the ground truth for the tree: a `Hierarchical` edge `parent → child`
//! is the only thing that makes `parent` the parent of `child`. `Dependency` edges
//! express execution order between nodes. Tree operations ignore them; only
//! network-layout navigation walks them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of relationship an edge expresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EdgeKind {
    /// Structural parent → child relationship
    Hierarchical,
    /// Execution dependency (source must happen before target)
    Dependency,
}

/// Directed edge between two node cells
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
}

impl Edge {
    /// Create a hierarchical `parent → child` edge with a generated id
    pub fn hierarchical(parent_id: impl Into<String>, child_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            source: parent_id.into(),
            target: child_id.into(),
            kind: EdgeKind::Hierarchical,
        }
    }

    /// Create a dependency edge with a generated id
    pub fn dependency(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            source: source.into(),
            target: target.into(),
            kind: EdgeKind::Dependency,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn is_hierarchical(&self) -> bool {
        self.kind == EdgeKind::Hierarchical
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_serialization_contract() {
        let edge = Edge::hierarchical("parent-1", "child-2").with_id("e-1");
        let value = serde_json::to_value(&edge).unwrap();

        assert_eq!(value["id"], "e-1");
        assert_eq!(value["source"], "parent-1");
        assert_eq!(value["target"], "child-2");
        assert_eq!(value["kind"], "hierarchical");
    }

    #[test]
    fn test_dependency_edges_are_not_hierarchical() {
        let edge = Edge::dependency("a", "b");
        assert!(!edge.is_hierarchical());
        assert!(edge.touches("a"));
        assert!(edge.touches("b"));
        assert!(!edge.touches("c"));
    }
}
