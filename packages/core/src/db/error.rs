//! Cell Store Error Types
//!
//! Errors raised by the in-memory cell store adapter. The `CellStore` port itself
//! speaks `anyhow::Result`, so other adapters are free to bring their own errors.

use thiserror::Error;

/// Cell store operation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A node with this id already exists
    #[error("Node already exists: {id}")]
    DuplicateNode { id: String },

    /// An edge with this id already exists
    #[error("Edge already exists: {id}")]
    DuplicateEdge { id: String },

    /// Node not found by id
    #[error("Node not found: {id}")]
    NodeNotFound { id: String },

    /// Edge references a node that is not in the store
    #[error("Edge '{edge_id}' references missing node '{node_id}'")]
    DanglingEdge { edge_id: String, node_id: String },

    /// Node failed validation
    #[error("Invalid node: {0}")]
    InvalidNode(String),
}

impl StoreError {
    pub fn duplicate_node(id: impl Into<String>) -> Self {
        Self::DuplicateNode { id: id.into() }
    }

    pub fn duplicate_edge(id: impl Into<String>) -> Self {
        Self::DuplicateEdge { id: id.into() }
    }

    pub fn node_not_found(id: impl Into<String>) -> Self {
        Self::NodeNotFound { id: id.into() }
    }

    pub fn dangling_edge(edge_id: impl Into<String>, node_id: impl Into<String>) -> Self {
        Self::DanglingEdge {
            edge_id: edge_id.into(),
            node_id: node_id.into(),
        }
    }

    pub fn invalid_node(msg: impl Into<String>) -> Self {
        Self::InvalidNode(msg.into())
    }
}
