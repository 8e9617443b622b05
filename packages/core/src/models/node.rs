//! Node Data Structures
//!
//! This module defines the `Node` cell stored by the external cell store and the
//! sparse `NodeUpdate` used to mutate it.
//!
//! # Architecture
//!
//! - **Hierarchy lives in edges**: a node carries no parent reference. Its parent is
//!   derived from the hierarchical edge that targets it (see `services::hierarchy`).
//! - **Order is sibling-relative**: `order` is only meaningful among nodes sharing
//!   the same derived parent. `None` marks a legacy node that was never ordered.
//! - **Collapse is render state**: toggling `collapsed` never touches `position`.
//!
//! # Examples
//!
//! ```rust
//! use mindgraph_core::models::{Node, NodeKind};
//!
//! let root = Node::new(NodeKind::Root, "Project plan");
//! let topic = Node::new(NodeKind::Topic, "Milestones").with_order(0);
//! assert!(root.order.is_none());
//! assert_eq!(topic.order, Some(0));
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Validation errors for Node construction
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid node ID format: {0}")]
    InvalidId(String),
}

/// Structural role of a node in the mind map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// The single document root
    Root,
    /// First-level branch
    Topic,
    /// Any deeper branch
    Subtopic,
}

/// Stored canvas coordinates of a node
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Graph vertex as seen by the engine.
///
/// # Fields
///
/// - `id`: Stable unique identifier, assigned once at creation
/// - `kind`: Root / topic / subtopic
/// - `label`: Display text
/// - `order`: Position among siblings (`None` = legacy, never ordered)
/// - `collapsed`: Canvas-local flag hiding strict descendants
/// - `archived`: Archived nodes are skipped by keyboard navigation
/// - `position`: Stored canvas coordinates (never mutated by collapse/expand)
/// - `data`: Arbitrary domain payload owned by other subsystems
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,

    pub kind: NodeKind,

    #[serde(default)]
    pub label: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,

    #[serde(default)]
    pub collapsed: bool,

    #[serde(default)]
    pub archived: bool,

    #[serde(default)]
    pub position: Position,

    /// Domain fields outside this engine's concern
    #[serde(default)]
    pub data: serde_json::Value,

    pub created_at: DateTime<Utc>,

    pub modified_at: DateTime<Utc>,
}

impl Node {
    /// Create a new Node with an auto-generated UUID
    pub fn new(kind: NodeKind, label: impl Into<String>) -> Self {
        Self::new_with_id(Uuid::new_v4().to_string(), kind, label)
    }

    /// Create a new Node with an explicit ID
    ///
    /// Hosts that pre-generate ids (optimistic UI, replication replay) use this.
    pub fn new_with_id(id: impl Into<String>, kind: NodeKind, label: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            kind,
            label: label.into(),
            order: None,
            collapsed: false,
            archived: false,
            position: Position::default(),
            data: serde_json::Value::Null,
            created_at: now,
            modified_at: now,
        }
    }

    pub fn with_order(mut self, order: u32) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.position = Position::new(x, y);
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }

    pub fn is_root_kind(&self) -> bool {
        self.kind == NodeKind::Root
    }

    /// Validate the node before it enters a store
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_empty() {
            return Err(ValidationError::MissingField("id".to_string()));
        }
        if self.id.chars().any(char::is_control) {
            return Err(ValidationError::InvalidId(self.id.clone()));
        }
        Ok(())
    }

    /// Apply a sparse update in place. Returns `true` when any field changed.
    pub fn apply(&mut self, update: &NodeUpdate) -> bool {
        let mut changed = false;

        if let Some(label) = &update.label {
            if *label != self.label {
                self.label = label.clone();
                changed = true;
            }
        }
        if let Some(order) = update.order {
            if order != self.order {
                self.order = order;
                changed = true;
            }
        }
        if let Some(collapsed) = update.collapsed {
            if collapsed != self.collapsed {
                self.collapsed = collapsed;
                changed = true;
            }
        }
        if let Some(archived) = update.archived {
            if archived != self.archived {
                self.archived = archived;
                changed = true;
            }
        }
        if let Some(position) = update.position {
            if position != self.position {
                self.position = position;
                changed = true;
            }
        }
        if let Some(data) = &update.data {
            if *data != self.data {
                self.data = data.clone();
                changed = true;
            }
        }

        if changed {
            self.modified_at = Utc::now();
        }
        changed
    }
}

/// Sparse update for a node
///
/// `order` uses the double-Option pattern:
/// - `None`: Don't change order
/// - `Some(None)`: Clear the order (mark as unordered)
/// - `Some(Some(n))`: Set order to `n`
///
/// # Examples
///
/// ```rust
/// # use mindgraph_core::models::NodeUpdate;
/// let update = NodeUpdate::new().with_order(3).with_collapsed(true);
/// assert!(!update.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_field"
    )]
    pub order: Option<Option<u32>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub collapsed: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl NodeUpdate {
    /// Create a new empty NodeUpdate
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_order(mut self, order: u32) -> Self {
        self.order = Some(Some(order));
        self
    }

    pub fn with_collapsed(mut self, collapsed: bool) -> Self {
        self.collapsed = Some(collapsed);
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    /// Check if update contains any changes
    pub fn is_empty(&self) -> bool {
        self.label.is_none()
            && self.order.is_none()
            && self.collapsed.is_none()
            && self.archived.is_none()
            && self.position.is_none()
            && self.data.is_none()
    }
}

/// Distinguishes a missing field (`None`) from an explicit `null` (`Some(None)`)
fn deserialize_optional_field<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
