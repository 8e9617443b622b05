//! Engine Services
//!
//! This module contains the read-side and view-side logic of the engine:
//!
//! - `HierarchyIndex` - tree derived from hierarchical edges (parents, ordered children)
//! - `VisibilityPropagator` - collapse flags, hidden counts, visible node/edge sets
//! - `Navigator` - keyboard cursor targets (parent, first child, siblings)
//! - `DrillPathStore` - tab-local drill-down path with URL and session mirroring
//! - `OutlineProjection` - secondary tree view with its own collapse set and drag-and-drop
//! - `resolve_hotkey` - shortcut resolution with the text-editing focus guard
//! - `CanvasSession` - per-view glue: selection, drill path, cached visible set
//!
//! Services re-derive everything from the cell store. Writes go through
//! `operations::OrderManager` or the visibility functions.

pub mod browser;
pub mod canvas;
pub mod drill_path;
pub mod hierarchy;
pub mod hotkeys;
pub mod navigation;
pub mod outline;
pub mod visibility;

pub use browser::{Location, MemoryLocation, MemorySessionStorage, SessionStorage};
pub use canvas::CanvasSession;
pub use drill_path::{decode_path, encode_path, Breadcrumb, DrillPathStore, SubscriptionId};
pub use hierarchy::HierarchyIndex;
pub use hotkeys::{resolve_hotkey, FocusTarget, HotkeyCommand, Key, KeyStroke};
pub use navigation::{ArrowKey, NavDirection, Navigator, SiblingDirection};
pub use outline::{DragState, DropPosition, OutlineNode, OutlineProjection};
pub use visibility::{VisibilityPropagator, VisibleSet};
