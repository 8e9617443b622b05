//! Drill Path Store
//!
//! Tab-local state machine holding the chain of drilled node ids. The path is not
//! part of the shared document: it lives in memory, is mirrored into the URL
//! fragment (`#drill=a/b`) and into session storage, and is rehydrated once when a
//! view mounts.
//!
//! # Architecture
//!
//! - **Explicit context object**: hosts create one store per view session and call
//!   `dispose` on unmount. There is no global path.
//! - **Immutable snapshots**: `snapshot()` hands out `DrillPath` values. A new
//!   allocation is made only when the path actually changes, so consumers can use
//!   `DrillPath::ptr_eq` for change detection.
//! - **Mutation protocol**: every mutating call updates the snapshot, rewrites the
//!   URL fragment (path and query untouched), mirrors the session key (removed when
//!   the path is empty) and notifies each subscriber exactly once.
//!
//! # Examples
//!
//! ```rust
//! use mindgraph_core::config::EngineConfig;
//! use mindgraph_core::services::{DrillPathStore, Location, MemoryLocation, MemorySessionStorage};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let location = MemoryLocation::new("https://app.test/mindmap/doc-1")?;
//! let mut store = DrillPathStore::new(
//!     &EngineConfig::default(),
//!     location.clone(),
//!     MemorySessionStorage::new(),
//! );
//!
//! store.push("topic/1");
//! assert_eq!(store.current_root(), Some("topic/1"));
//! assert_eq!(location.href().as_str(), "https://app.test/mindmap/doc-1#drill=topic%2F1");
//! # Ok(())
//! # }
//! ```

use crate::config::EngineConfig;
use crate::models::DrillPath;
use crate::operations::OperationError;
use crate::services::{HierarchyIndex, Location, SessionStorage};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

/// Characters escaped by JavaScript's `encodeURIComponent`
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode each segment independently and join with `/`
pub fn encode_path(path: &[String]) -> String {
    path.iter()
        .map(|segment| utf8_percent_encode(segment, COMPONENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Inverse of [`encode_path`]
///
/// An empty input is the empty path. Empty segments and invalid UTF-8 are
/// `MalformedPath`.
pub fn decode_path(encoded: &str) -> Result<Vec<String>, OperationError> {
    if encoded.is_empty() {
        return Ok(Vec::new());
    }
    encoded
        .split('/')
        .map(|segment| {
            if segment.is_empty() {
                return Err(OperationError::malformed_path("empty segment"));
            }
            percent_decode_str(segment)
                .decode_utf8()
                .map(|decoded| decoded.into_owned())
                .map_err(|e| OperationError::malformed_path(e.to_string()))
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&DrillPath)>;

/// One breadcrumb entry: the document root followed by each drilled node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    pub id: String,
    pub label: String,
}

pub struct DrillPathStore {
    path: DrillPath,
    location: Box<dyn Location>,
    storage: Box<dyn SessionStorage>,
    fragment_key: String,
    session_key_prefix: String,
    document_route: String,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl DrillPathStore {
    pub fn new(
        config: &EngineConfig,
        location: impl Location + 'static,
        storage: impl SessionStorage + 'static,
    ) -> Self {
        Self {
            path: DrillPath::empty(),
            location: Box::new(location),
            storage: Box::new(storage),
            fragment_key: config.fragment_key.clone(),
            session_key_prefix: config.session_key_prefix.clone(),
            document_route: config.document_route.clone(),
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn snapshot(&self) -> DrillPath {
        self.path.clone()
    }

    /// The node currently rendered as root, `None` at the main view
    pub fn current_root(&self) -> Option<&str> {
        self.path.current_root()
    }

    pub fn is_drilled(&self) -> bool {
        !self.path.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.path.len()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&DrillPath) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    /// Drop every subscriber. Later mutations still update state but notify nobody.
    pub fn dispose(&mut self) {
        self.listeners.clear();
    }

    /// Append `node_id` to the path
    ///
    /// Unchecked: callers only push nodes that have children and lie under the
    /// current root. `drill_into` performs those checks.
    pub fn push(&mut self, node_id: impl Into<String>) {
        let mut next = self.path.to_vec();
        next.push(node_id.into());
        self.commit(DrillPath::from(next));
    }

    /// Remove the last element. Returns `false` without side effects when empty.
    pub fn pop(&mut self) -> bool {
        if self.path.is_empty() {
            return false;
        }
        let mut next = self.path.to_vec();
        next.pop();
        self.commit(DrillPath::from(next));
        true
    }

    /// Replace the whole path in one step
    ///
    /// Always rewrites the URL and notifies; an identical path keeps the current
    /// snapshot allocation.
    pub fn go_to_path(&mut self, path: Vec<String>) {
        let next = if *self.path == *path {
            self.path.clone()
        } else {
            DrillPath::from(path)
        };
        self.commit(next);
    }

    /// Return to the main view. No-op when already there.
    pub fn reset(&mut self) {
        if self.path.is_empty() {
            return;
        }
        self.commit(DrillPath::empty());
    }

    /// Rehydrate the path at view mount: URL fragment first, session storage second
    ///
    /// Returns whether a non-empty path was restored. A malformed fragment is
    /// logged and treated as absent.
    pub fn restore_from_url(&mut self) -> bool {
        let href = self.location.href();

        match self.read_fragment(&href) {
            Ok(Some(path)) if !path.is_empty() => {
                debug!(depth = path.len(), "Restored drill path from URL fragment");
                self.path = DrillPath::from(path);
                self.write_session(&href);
                self.notify();
                return true;
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Ignoring malformed drill fragment"),
        }

        if let Some(path) = self.read_session(&href) {
            debug!(depth = path.len(), "Restored drill path from session storage");
            self.path = DrillPath::from(path);
            self.write_url();
            self.notify();
            return true;
        }
        false
    }

    /// Validated drill-down used by context menus and the canvas
    ///
    /// # Errors
    ///
    /// - `NodeNotFound` if the node does not exist
    /// - `InvalidOperation` if the node is a leaf, the document root, the current
    ///   drill root, or outside the current drill root's subtree
    pub fn drill_into(&mut self, index: &HierarchyIndex, node_id: &str) -> Result<(), OperationError> {
        if !index.contains(node_id) {
            return Err(OperationError::node_not_found(node_id));
        }
        if !index.has_children(node_id) {
            return Err(OperationError::invalid_operation(format!(
                "Cannot drill into leaf node '{}'",
                node_id
            )));
        }
        match self.current_root() {
            Some(root) if root == node_id || !index.is_descendant(node_id, root) => {
                return Err(OperationError::invalid_operation(format!(
                    "Node '{}' is not below the current drill root '{}'",
                    node_id, root
                )));
            }
            None if index.is_root(node_id) => {
                return Err(OperationError::invalid_operation(
                    "The document root is already the view root",
                ));
            }
            _ => {}
        }
        self.push(node_id);
        Ok(())
    }

    /// Document root followed by every drilled node, with labels
    ///
    /// Nodes deleted since they were drilled into fall back to their id as label.
    pub fn breadcrumbs(&self, index: &HierarchyIndex) -> Vec<Breadcrumb> {
        let crumb = |id: &str| Breadcrumb {
            id: id.to_string(),
            label: index
                .get(id)
                .map(|node| node.label.clone())
                .unwrap_or_else(|| id.to_string()),
        };

        index
            .root_id()
            .into_iter()
            .chain(self.path.iter().map(String::as_str))
            .map(crumb)
            .collect()
    }

    /// Handle a breadcrumb click: 0 is the document root, `i` keeps `path[..i]`
    ///
    /// Clicking the current (last) crumb or an index past the end does nothing.
    pub fn jump_to_breadcrumb(&mut self, crumb_index: usize) -> bool {
        if crumb_index >= self.depth() {
            return false;
        }
        if crumb_index == 0 {
            self.reset();
        } else {
            self.go_to_path(self.path[..crumb_index].to_vec());
        }
        true
    }

    fn commit(&mut self, next: DrillPath) {
        self.path = next;
        self.write_url();
        let href = self.location.href();
        self.write_session(&href);
        self.notify();
    }

    fn notify(&mut self) {
        let snapshot = self.path.clone();
        for (_, listener) in self.listeners.iter_mut() {
            listener(&snapshot);
        }
    }

    fn write_url(&self) {
        let mut url = self.location.href();
        if self.path.is_empty() {
            url.set_fragment(None);
        } else {
            let fragment = format!("{}={}", self.fragment_key, encode_path(&self.path));
            url.set_fragment(Some(&fragment));
        }
        self.location.replace(url);
    }

    fn write_session(&self, href: &Url) {
        let Some(key) = self.session_key(href) else {
            return;
        };
        if self.path.is_empty() {
            self.storage.remove_item(&key);
            return;
        }
        let result = serde_json::to_string(&*self.path)
            .map_err(anyhow::Error::from)
            .and_then(|json| self.storage.set_item(&key, &json));
        if let Err(e) = result {
            warn!(key = %key, error = %e, "Failed to mirror drill path into session storage");
        }
    }

    fn read_fragment(&self, href: &Url) -> Result<Option<Vec<String>>, OperationError> {
        let Some(fragment) = href.fragment() else {
            return Ok(None);
        };
        let prefix = format!("{}=", self.fragment_key);
        match fragment.strip_prefix(&prefix) {
            Some(encoded) => decode_path(encoded).map(Some),
            None => Ok(None),
        }
    }

    fn read_session(&self, href: &Url) -> Option<Vec<String>> {
        let key = self.session_key(href)?;
        let stored = self.storage.get_item(&key)?;
        match serde_json::from_str::<Vec<String>>(&stored) {
            Ok(path) if !path.is_empty() && path.iter().all(|id| !id.is_empty()) => Some(path),
            Ok(_) => None,
            Err(e) => {
                warn!(key = %key, error = %e, "Ignoring unparseable session drill path");
                None
            }
        }
    }

    fn session_key(&self, href: &Url) -> Option<String> {
        document_id(href, &self.document_route)
            .map(|document| format!("{}{}", self.session_key_prefix, document))
    }
}

/// Document id from `/…/<route>/<id>`, else the last non-empty path segment
pub fn document_id(href: &Url, route: &str) -> Option<String> {
    let segments: Vec<&str> = href
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .collect();

    let id = segments
        .windows(2)
        .find(|pair| pair[0] == route)
        .map(|pair| pair[1])
        .or_else(|| segments.last().copied())?;

    Some(id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{MemoryLocation, MemorySessionStorage};
    use std::cell::RefCell;
    use std::rc::Rc;

    const HREF: &str = "https://app.test/workspace/w1/mindmap/doc-1?view=full";

    fn store_at(href: &str) -> (DrillPathStore, MemoryLocation, MemorySessionStorage) {
        let location = MemoryLocation::new(href).unwrap();
        let storage = MemorySessionStorage::new();
        let store = DrillPathStore::new(&EngineConfig::default(), location.clone(), storage.clone());
        (store, location, storage)
    }

    fn counter(store: &mut DrillPathStore) -> Rc<RefCell<usize>> {
        let calls = Rc::new(RefCell::new(0));
        let handle = calls.clone();
        store.subscribe(move |_| *handle.borrow_mut() += 1);
        calls
    }

    #[test]
    fn test_push_pop_state_machine() {
        let (mut store, _, _) = store_at(HREF);
        assert!(!store.is_drilled());

        store.push("a");
        store.push("b");
        assert_eq!(store.current_root(), Some("b"));
        assert_eq!(store.depth(), 2);

        assert!(store.pop());
        assert!(store.pop());
        assert!(!store.is_drilled());
        assert!(!store.pop());
    }

    #[test]
    fn test_url_fragment_preserves_path_and_query() {
        let (mut store, location, _) = store_at(HREF);

        store.push("a/b");
        store.push("c#d");
        assert_eq!(
            location.href().as_str(),
            "https://app.test/workspace/w1/mindmap/doc-1?view=full#drill=a%2Fb/c%23d"
        );

        store.reset();
        assert_eq!(location.href().as_str(), HREF);
    }

    #[test]
    fn test_session_mirror_cleared_on_empty() {
        let (mut store, _, storage) = store_at(HREF);

        store.push("a");
        assert_eq!(
            storage.get_item("mindgraph:drillPath:doc-1").as_deref(),
            Some("[\"a\"]")
        );

        store.pop();
        assert_eq!(storage.get_item("mindgraph:drillPath:doc-1"), None);
    }

    #[test]
    fn test_pop_and_reset_on_empty_do_nothing() {
        let (mut store, location, _) = store_at(HREF);
        let calls = counter(&mut store);

        assert!(!store.pop());
        store.reset();

        assert_eq!(*calls.borrow(), 0);
        assert_eq!(location.replacement_count(), 0);
    }

    #[test]
    fn test_each_mutation_notifies_once() {
        let (mut store, _, _) = store_at(HREF);
        let calls = counter(&mut store);

        store.push("a");
        store.go_to_path(vec!["x".into(), "y".into()]);
        store.pop();
        store.reset();

        assert_eq!(*calls.borrow(), 4);
    }

    #[test]
    fn test_snapshots_change_identity_only_on_change() {
        let (mut store, _, _) = store_at(HREF);
        store.push("a");
        let before = store.snapshot();

        store.go_to_path(vec!["a".into()]);
        assert!(DrillPath::ptr_eq(&before, &store.snapshot()));

        store.push("b");
        assert!(!DrillPath::ptr_eq(&before, &store.snapshot()));
        assert_eq!(before.to_vec(), vec!["a".to_string()]);
    }

    #[test]
    fn test_unsubscribe_and_dispose() {
        let (mut store, _, _) = store_at(HREF);
        let calls = Rc::new(RefCell::new(0));
        let handle = calls.clone();
        let id = store.subscribe(move |_| *handle.borrow_mut() += 1);
        let other = counter(&mut store);

        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.push("a");
        assert_eq!(*calls.borrow(), 0);
        assert_eq!(*other.borrow(), 1);

        store.dispose();
        store.push("b");
        assert_eq!(*other.borrow(), 1);
        assert_eq!(store.depth(), 2);
    }

    #[test]
    fn test_restore_prefers_fragment() {
        let (mut store, _, storage) =
            store_at("https://app.test/mindmap/doc-1#drill=n%2F1/n2");
        storage
            .set_item("mindgraph:drillPath:doc-1", "[\"other\"]")
            .unwrap();

        assert!(store.restore_from_url());
        assert_eq!(store.snapshot().to_vec(), vec!["n/1", "n2"]);
    }

    #[test]
    fn test_restore_falls_back_to_session_and_resyncs_url() {
        let (mut store, location, storage) = store_at("https://app.test/mindmap/doc-1#drill=");
        storage
            .set_item("mindgraph:drillPath:doc-1", "[\"a\",\"b\"]")
            .unwrap();

        assert!(store.restore_from_url());
        assert_eq!(store.current_root(), Some("b"));
        assert_eq!(location.href().fragment(), Some("drill=a/b"));
    }

    #[test]
    fn test_malformed_fragment_is_nothing_to_restore() {
        let (mut store, _, _) = store_at("https://app.test/mindmap/doc-1#drill=a//b");
        assert!(!store.restore_from_url());
        assert!(!store.is_drilled());

        let (mut store, _, _) = store_at("https://app.test/mindmap/doc-1#drill=%FF");
        assert!(!store.restore_from_url());
    }

    #[test]
    fn test_unparseable_session_value_ignored() {
        let (mut store, _, storage) = store_at(HREF);
        storage.set_item("mindgraph:drillPath:doc-1", "{oops").unwrap();
        assert!(!store.restore_from_url());
    }

    #[test]
    fn test_document_id_extraction() {
        let url = Url::parse("https://app.test/workspace/w1/mindmap/doc-9/").unwrap();
        assert_eq!(document_id(&url, "mindmap").as_deref(), Some("doc-9"));

        let url = Url::parse("https://app.test/boards/b-7").unwrap();
        assert_eq!(document_id(&url, "mindmap").as_deref(), Some("b-7"));

        let url = Url::parse("https://app.test/").unwrap();
        assert_eq!(document_id(&url, "mindmap"), None);
    }

    #[test]
    fn test_encode_matches_encode_uri_component() {
        let path = vec!["a b".to_string(), "x(y)!*~'._-".to_string(), "é/?&=#".to_string()];
        assert_eq!(encode_path(&path), "a%20b/x(y)!*~'._-/%C3%A9%2F%3F%26%3D%23");
        assert_eq!(decode_path(&encode_path(&path)).unwrap(), path);
    }

    #[test]
    fn test_jump_to_breadcrumb() {
        let (mut store, _, _) = store_at(HREF);
        store.go_to_path(vec!["a".into(), "b".into(), "c".into()]);

        assert!(!store.jump_to_breadcrumb(3));
        assert!(store.jump_to_breadcrumb(1));
        assert_eq!(store.snapshot().to_vec(), vec!["a"]);
        assert!(store.jump_to_breadcrumb(0));
        assert!(!store.is_drilled());
    }
}
