//! Error types for the hierarchy engine
//!
//! This module defines all error types that can occur while ordering, moving,
//! collapsing or drilling into nodes. None of them is meant to reach the rendering
//! layer as a failure: hosts reduce them to a no-op or a transient notification.

use thiserror::Error;

/// Errors that can occur during engine operations
///
/// # Examples
///
/// ```rust
/// use mindgraph_core::operations::OperationError;
///
/// let err = OperationError::invalid_operation("Cannot move the root node");
/// assert_eq!(err.to_string(), "Invalid operation: Cannot move the root node");
///
/// let err = OperationError::node_not_found("node-123");
/// assert!(err.is_invalid_operation());
/// ```
#[derive(Error, Debug)]
pub enum OperationError {
    /// The requested operation violates a tree rule (moving or deleting the root,
    /// dropping a node onto itself, …)
    #[error("Invalid operation: {reason}")]
    InvalidOperation { reason: String },

    /// The subject or target of an operation does not exist (possibly already
    /// deleted by a concurrent actor)
    #[error("Node '{node_id}' does not exist")]
    NodeNotFound { node_id: String },

    /// Moving a node under itself or one of its own descendants
    #[error("Circular reference: node '{node_id}' cannot be moved under '{target_id}'")]
    CircularReference { node_id: String, target_id: String },

    /// A drill path in the URL fragment or session store could not be parsed
    #[error("Malformed drill path: {reason}")]
    MalformedPath { reason: String },

    /// A hierarchical edge points at a parent that is not in the store
    #[error("Node '{node_id}' references missing parent '{parent_id}'")]
    OrphanReference { node_id: String, parent_id: String },

    /// The cell store rejected a write
    #[error("Store error: {0}")]
    Store(#[from] anyhow::Error),
}

impl OperationError {
    /// Create an InvalidOperation error
    pub fn invalid_operation(reason: impl Into<String>) -> Self {
        Self::InvalidOperation {
            reason: reason.into(),
        }
    }

    /// Create a NodeNotFound error
    pub fn node_not_found(node_id: impl Into<String>) -> Self {
        Self::NodeNotFound {
            node_id: node_id.into(),
        }
    }

    /// Create a CircularReference error
    pub fn circular_reference(node_id: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self::CircularReference {
            node_id: node_id.into(),
            target_id: target_id.into(),
        }
    }

    /// Create a MalformedPath error
    pub fn malformed_path(reason: impl Into<String>) -> Self {
        Self::MalformedPath {
            reason: reason.into(),
        }
    }

    /// Create an OrphanReference error
    pub fn orphan_reference(node_id: impl Into<String>, parent_id: impl Into<String>) -> Self {
        Self::OrphanReference {
            node_id: node_id.into(),
            parent_id: parent_id.into(),
        }
    }

    /// Whether this error belongs to the `InvalidOperation` class
    ///
    /// Missing targets and cycles are invalid operations from the host's point of
    /// view: the gesture is dropped with no visible effect.
    pub fn is_invalid_operation(&self) -> bool {
        matches!(
            self,
            Self::InvalidOperation { .. } | Self::NodeNotFound { .. } | Self::CircularReference { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_operation_error() {
        let err = OperationError::invalid_operation("Cannot move the root node");
        assert!(matches!(err, OperationError::InvalidOperation { .. }));
        assert_eq!(
            format!("{}", err),
            "Invalid operation: Cannot move the root node"
        );
    }

    #[test]
    fn test_node_not_found_error() {
        let err = OperationError::node_not_found("missing-node");
        assert_eq!(format!("{}", err), "Node 'missing-node' does not exist");
        assert!(err.is_invalid_operation());
    }

    #[test]
    fn test_circular_reference_error() {
        let err = OperationError::circular_reference("a", "a-child");
        assert_eq!(
            format!("{}", err),
            "Circular reference: node 'a' cannot be moved under 'a-child'"
        );
        assert!(err.is_invalid_operation());
    }

    #[test]
    fn test_malformed_path_is_not_an_invalid_operation() {
        let err = OperationError::malformed_path("empty segment");
        assert_eq!(format!("{}", err), "Malformed drill path: empty segment");
        assert!(!err.is_invalid_operation());
    }

    #[test]
    fn test_orphan_reference_error() {
        let err = OperationError::orphan_reference("child", "gone");
        assert_eq!(
            format!("{}", err),
            "Node 'child' references missing parent 'gone'"
        );
    }

    #[test]
    fn test_store_error_wraps_anyhow() {
        let err: OperationError = anyhow::anyhow!("disk full").into();
        assert_eq!(format!("{}", err), "Store error: disk full");
    }
}
