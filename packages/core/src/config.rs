//! Engine configuration
//!
//! `EngineConfig` carries the few knobs an embedding host may want to change: the
//! URL fragment key and session key prefix used by the drill path store, the route
//! segment that precedes a document id, the canvas layout and the event buffer of
//! the in-memory cell store. Everything has a default matching the web editor.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default URL fragment key (`#drill=a/b`)
pub const DEFAULT_FRAGMENT_KEY: &str = "drill";

/// Default prefix of the session fallback key (`mindgraph:drillPath:<document>`)
pub const DEFAULT_SESSION_KEY_PREFIX: &str = "mindgraph:drillPath:";

/// Default route segment preceding a document id (`/mindmap/<document>`)
pub const DEFAULT_DOCUMENT_ROUTE: &str = "mindmap";

/// Configuration validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Config field '{field}' must not be empty")]
    EmptyField { field: &'static str },

    #[error("Config field '{field}' contains reserved character '{character}'")]
    ReservedCharacter { field: &'static str, character: char },

    #[error("event_capacity must be greater than zero")]
    ZeroCapacity,

    #[error("Invalid config JSON: {0}")]
    Parse(String),
}

/// Canvas layout family
///
/// The layout decides what the arrow keys walk (tree, dependency edges or screen
/// space) and which coordinate sorts legacy unordered siblings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    /// Top-down tree: parent above, siblings left to right
    #[default]
    Logic,
    /// Horizontal mind map: parent on the left, siblings top to bottom
    Mindmap,
    /// Dependency graph: arrows follow dependency edges
    Network,
    /// Free placement: arrows pick the nearest node in that direction
    Free,
}


/// Runtime configuration for one editor session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Key of the drill path parameter in the URL fragment
    pub fragment_key: String,

    /// Session storage key prefix; the document id is appended
    pub session_key_prefix: String,

    /// URL path segment that precedes the document id
    pub document_route: String,

    pub layout_mode: LayoutMode,

    /// Broadcast buffer (per subscriber) of the in-memory cell store
    pub event_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fragment_key: DEFAULT_FRAGMENT_KEY.to_string(),
            session_key_prefix: DEFAULT_SESSION_KEY_PREFIX.to_string(),
            document_route: DEFAULT_DOCUMENT_ROUTE.to_string(),
            layout_mode: LayoutMode::default(),
            event_capacity: crate::db::DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON config; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_layout_mode(mut self, layout_mode: LayoutMode) -> Self {
        self.layout_mode = layout_mode;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_key("fragment_key", &self.fragment_key)?;
        check_key("document_route", &self.document_route)?;
        if self.session_key_prefix.is_empty() {
            return Err(ConfigError::EmptyField {
                field: "session_key_prefix",
            });
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(())
    }
}

fn check_key(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::EmptyField { field });
    }
    if let Some(character) = value.chars().find(|c| matches!(c, '#' | '=' | '/')) {
        return Err(ConfigError::ReservedCharacter { field, character });
    }
    Ok(())
}
