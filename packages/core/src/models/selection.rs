//! Selection
//!
//! The single selected node of a document, shared across views.

/// Canvas selection shared by every view of one document.
///
/// The host owns it; the canvas and the outline both write through it so a
/// click in either view is reflected in the other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    node_id: Option<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<&str> {
        self.node_id.as_deref()
    }

    pub fn select(&mut self, node_id: impl Into<String>) {
        self.node_id = Some(node_id.into());
    }

    pub fn clear(&mut self) {
        self.node_id = None;
    }

    pub fn is_selected(&self, node_id: &str) -> bool {
        self.node_id.as_deref() == Some(node_id)
    }
}
