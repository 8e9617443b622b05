//! In-memory cell store
//!
//! Reference adapter for the `CellStore` port. Embedding hosts use it as the local
//! replica that the replication layer writes into; tests use it directly.
//! Nodes and edges keep their insertion order.

use crate::config::EngineConfig;
use crate::db::{CellEvent, CellStore, StoreError};
use crate::models::{Edge, Node, NodeUpdate};
use anyhow::Result;
use std::collections::HashMap;
use tokio::sync::broadcast;

/// Default broadcast buffer for change events
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

pub struct MemoryCellStore {
    nodes: HashMap<String, Node>,

    /// Node ids in insertion order
    node_order: Vec<String>,

    edges: Vec<Edge>,

    /// Broadcast channel for change events
    event_tx: broadcast::Sender<CellEvent>,
}

impl MemoryCellStore {
    pub fn new() -> Self {
        Self::with_event_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// Create a store whose event channel buffers `capacity` events per subscriber
    pub fn with_event_capacity(capacity: usize) -> Self {
        let (event_tx, _) = broadcast::channel(capacity.max(1));
        Self {
            nodes: HashMap::new(),
            node_order: Vec::new(),
            edges: Vec::new(),
            event_tx,
        }
    }

    /// Create a store sized by `config.event_capacity`
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::with_event_capacity(config.event_capacity)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Emit a change event to all subscribers
    ///
    /// Ignores errors if no subscribers (expected in some tests).
    fn emit_event(&self, event: CellEvent) {
        let _ = self.event_tx.send(event);
    }
}

impl Default for MemoryCellStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CellStore for MemoryCellStore {
    fn get_node(&self, id: &str) -> Option<Node> {
        self.nodes.get(id).cloned()
    }

    fn nodes(&self) -> Vec<Node> {
        self.node_order
            .iter()
            .filter_map(|id| self.nodes.get(id).cloned())
            .collect()
    }

    fn edges(&self) -> Vec<Edge> {
        self.edges.clone()
    }

    fn add_node(&mut self, node: Node) -> Result<Node> {
        node.validate()
            .map_err(|e| StoreError::invalid_node(e.to_string()))?;
        if self.nodes.contains_key(&node.id) {
            return Err(StoreError::duplicate_node(&node.id).into());
        }

        self.node_order.push(node.id.clone());
        self.nodes.insert(node.id.clone(), node.clone());
        self.emit_event(CellEvent::NodeAdded(node.clone()));
        Ok(node)
    }

    fn update_node(&mut self, id: &str, update: NodeUpdate) -> Result<Node> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| StoreError::node_not_found(id))?;

        let changed = node.apply(&update);
        let node = node.clone();
        if changed {
            self.emit_event(CellEvent::NodeChanged(node.clone()));
        }
        Ok(node)
    }

    fn remove_node(&mut self, id: &str) -> Result<bool> {
        if self.nodes.remove(id).is_none() {
            return Ok(false);
        }
        self.node_order.retain(|existing| existing != id);

        let (incident, kept): (Vec<Edge>, Vec<Edge>) =
            std::mem::take(&mut self.edges)
                .into_iter()
                .partition(|edge| edge.touches(id));
        self.edges = kept;

        for edge in incident {
            self.emit_event(CellEvent::EdgeRemoved { id: edge.id });
        }
        self.emit_event(CellEvent::NodeRemoved { id: id.to_string() });
        Ok(true)
    }

    fn add_edge(&mut self, edge: Edge) -> Result<Edge> {
        if self.edges.iter().any(|existing| existing.id == edge.id) {
            return Err(StoreError::duplicate_edge(&edge.id).into());
        }
        for endpoint in [&edge.source, &edge.target] {
            if !self.nodes.contains_key(endpoint) {
                return Err(StoreError::dangling_edge(&edge.id, endpoint).into());
            }
        }

        self.edges.push(edge.clone());
        self.emit_event(CellEvent::EdgeAdded(edge.clone()));
        Ok(edge)
    }

    fn remove_edge(&mut self, id: &str) -> Result<bool> {
        let before = self.edges.len();
        self.edges.retain(|edge| edge.id != id);
        if self.edges.len() == before {
            return Ok(false);
        }
        self.emit_event(CellEvent::EdgeRemoved { id: id.to_string() });
        Ok(true)
    }

    fn subscribe(&self) -> broadcast::Receiver<CellEvent> {
        self.event_tx.subscribe()
    }
}
