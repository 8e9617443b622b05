//! Canvas session
//!
//! Glue between one canvas view and the engine. A `CanvasSession` owns the view's
//! drill path store and selection, caches the `VisibleSet` the renderer reads,
//! and re-derives that set from the cell store whenever the store reports a
//! change. It never keeps authoritative copies of node data.
//!
//! # Lifecycle
//!
//! 1. `new` subscribes to the cell store
//! 2. `mount` restores the drill path from the URL (or session storage) and
//!    computes visibility
//! 3. `sync` is called after external store changes; commands recompute on their own
//! 4. `dispose` on unmount drops the drill path subscribers

use crate::config::EngineConfig;
use crate::db::{CellEvent, CellStore};
use crate::models::Selection;
use crate::operations::{OperationError, OrderManager};
use crate::services::{
    resolve_hotkey, DrillPathStore, FocusTarget, HierarchyIndex, HotkeyCommand, KeyStroke,
    Location, NavDirection, Navigator, SessionStorage, VisibilityPropagator, VisibleSet,
};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, warn};

pub struct CanvasSession {
    config: EngineConfig,
    drill: DrillPathStore,
    selection: Selection,
    visible: VisibleSet,
    events: broadcast::Receiver<CellEvent>,
}

impl CanvasSession {
    pub fn new(
        config: EngineConfig,
        store: &dyn CellStore,
        location: impl Location + 'static,
        storage: impl SessionStorage + 'static,
    ) -> Self {
        let drill = DrillPathStore::new(&config, location, storage);
        Self {
            config,
            drill,
            selection: Selection::new(),
            visible: VisibleSet::default(),
            events: store.subscribe(),
        }
    }

    /// Restore the drill path and compute the first visible set
    ///
    /// Returns whether a drill path was restored.
    pub fn mount(&mut self, store: &dyn CellStore) -> bool {
        let restored = self.drill.restore_from_url();
        self.drain_events();
        self.recompute(store);
        restored
    }

    /// Apply pending store changes. Returns whether anything was recomputed.
    pub fn sync(&mut self, store: &dyn CellStore) -> bool {
        if !self.drain_events() {
            return false;
        }
        self.recompute(store);
        true
    }

    pub fn dispose(&mut self) {
        self.drill.dispose();
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn visible(&self) -> &VisibleSet {
        &self.visible
    }

    pub fn is_visible(&self, node_id: &str) -> bool {
        self.visible.contains_node(node_id)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Shared with other views (the outline writes through this)
    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    pub fn select(&mut self, node_id: impl Into<String>) {
        self.selection.select(node_id);
    }

    pub fn drill(&self) -> &DrillPathStore {
        &self.drill
    }

    pub fn drill_mut(&mut self) -> &mut DrillPathStore {
        &mut self.drill
    }

    pub fn index(&self, store: &dyn CellStore) -> HierarchyIndex {
        HierarchyIndex::from_store_with_layout(store, self.config.layout_mode)
    }

    /// Move the selection one step; returns the new selection
    ///
    /// Without a selection nothing happens.
    pub fn navigate(&mut self, store: &dyn CellStore, direction: NavDirection) -> Option<String> {
        let current = self.selection.get()?.to_string();
        let index = self.index(store);
        let target = Navigator::new(&index)
            .with_visible_set(&self.visible)
            .with_drill_root(self.drill.current_root())
            .navigate(&current, direction);
        self.selection.select(target.clone());
        Some(target)
    }

    /// Jump to an arbitrary node (search result, notification, cross-reference)
    ///
    /// Expands every collapsed ancestor. A target outside the drilled subtree
    /// returns the view to the document root first.
    pub fn navigate_to(
        &mut self,
        store: &mut dyn CellStore,
        target_id: &str,
    ) -> Result<String, OperationError> {
        let index = self.index(store);
        if !index.contains(target_id) {
            return Err(OperationError::node_not_found(target_id));
        }
        if let Some(root) = self.drill.current_root() {
            if root != target_id && !index.is_descendant(target_id, root) {
                debug!(target_id, drill_root = root, "Target outside drilled subtree, leaving drill-down");
                self.drill.reset();
            }
        }

        let target = Navigator::navigate_to(store, target_id)?;
        self.selection.select(target.clone());
        self.drain_events();
        self.recompute(store);
        Ok(target)
    }

    /// Resolve a key press against the session layout and run it
    ///
    /// Returns `Ok(false)` when the key is not a shortcut or had no effect.
    pub fn handle_key(
        &mut self,
        store: &mut dyn CellStore,
        stroke: &KeyStroke,
        focus: FocusTarget,
    ) -> Result<bool, OperationError> {
        match resolve_hotkey(stroke, focus, self.config.layout_mode) {
            Some(command) => self.apply_hotkey(store, command),
            None => Ok(false),
        }
    }

    /// Run a shortcut on the selected node. Returns whether anything changed.
    pub fn apply_hotkey(
        &mut self,
        store: &mut dyn CellStore,
        command: HotkeyCommand,
    ) -> Result<bool, OperationError> {
        let Some(selected) = self.selection.get().map(str::to_string) else {
            return Ok(false);
        };

        let changed = match command {
            HotkeyCommand::Collapse => VisibilityPropagator::set_collapsed(store, &selected, true)?,
            HotkeyCommand::Expand => VisibilityPropagator::set_collapsed(store, &selected, false)?,
            HotkeyCommand::CollapseDescendants => {
                !VisibilityPropagator::collapse_subtree_recursive(store, &selected)?.is_empty()
            }
            HotkeyCommand::AddChild | HotkeyCommand::AddSibling => {
                let order = OrderManager::new(self.config.layout_mode);
                let created = if command == HotkeyCommand::AddChild {
                    order.add_child(store, &selected, "")?
                } else {
                    order.add_sibling_after(store, &selected, "")?
                };
                debug!(from = %selected, id = %created.id, "created node from hotkey");
                self.selection.select(created.id);
                true
            }
            HotkeyCommand::Navigate(direction) => {
                return Ok(self.navigate(store, direction).as_deref() != Some(selected.as_str()));
            }
        };

        if changed {
            self.drain_events();
            self.recompute(store);
        }
        Ok(changed)
    }

    /// Drill into `node_id` (validated) and recompute visibility
    pub fn drill_into(&mut self, store: &dyn CellStore, node_id: &str) -> Result<(), OperationError> {
        let index = self.index(store);
        self.drill.drill_into(&index, node_id)?;
        if !self
            .selection
            .get()
            .is_some_and(|id| id == node_id || index.is_descendant(id, node_id))
        {
            self.selection.select(node_id);
        }
        self.recompute(store);
        Ok(())
    }

    /// Leave the innermost drill level. Returns `false` at the main view.
    pub fn drill_up(&mut self, store: &dyn CellStore) -> bool {
        if !self.drill.pop() {
            return false;
        }
        self.recompute(store);
        true
    }

    pub fn drill_to_root(&mut self, store: &dyn CellStore) {
        self.drill.reset();
        self.recompute(store);
    }

    /// Hidden-descendant badge for a node, from the live store
    pub fn hidden_descendant_count(&self, store: &dyn CellStore, node_id: &str) -> usize {
        VisibilityPropagator::hidden_descendant_count(&self.index(store), node_id)
    }

    /// Returns whether any event was pending
    fn drain_events(&mut self) -> bool {
        let mut pending = false;
        loop {
            match self.events.try_recv() {
                Ok(_) => pending = true,
                Err(TryRecvError::Lagged(missed)) => {
                    warn!(missed, "Canvas fell behind the cell store, recomputing");
                    pending = true;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        pending
    }

    fn recompute(&mut self, store: &dyn CellStore) {
        let index = self.index(store);

        if let Some(root) = self.drill.current_root() {
            if !index.contains(root) {
                warn!(drill_root = root, "Drill root no longer exists, returning to main view");
                self.drill.reset();
            }
        }
        if let Some(selected) = self.selection.get() {
            if !index.contains(selected) {
                self.selection.clear();
            }
        }

        self.visible = VisibilityPropagator::visible_set(&index, self.drill.current_root());
    }
}
