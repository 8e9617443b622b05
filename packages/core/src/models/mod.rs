//! Data Models
//!
//! This module contains the core data structures used throughout MindGraph:
//!
//! - `Node` - Graph vertex with sibling order, collapse flag and stored position
//! - `Edge` - Hierarchical or dependency relationship between two nodes
//! - `DrillPath` - Immutable snapshot of the drill-down root chain
//! - `Selection` - The canvas selection shared by all views

mod drill_path;
mod edge;
mod node;
mod selection;

pub use drill_path::DrillPath;
pub use edge::{Edge, EdgeKind};
pub use node::{Node, NodeKind, NodeUpdate, Position, ValidationError};
pub use selection::Selection;
