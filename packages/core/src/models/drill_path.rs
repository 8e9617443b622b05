//! Drill path snapshot
//!
//! An immutable, cheaply cloned list of node ids from the outermost drilled node
//! to the current subgraph root. Consumers detect changes by pointer identity
//! (`DrillPath::ptr_eq`), so the store only allocates a new snapshot when the
//! path actually changes.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DrillPath(Arc<[String]>);

impl DrillPath {
    pub fn empty() -> Self {
        Self(Arc::from(Vec::<String>::new()))
    }

    /// Last element of the path: the node currently rendered as root
    pub fn current_root(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Whether both snapshots share the same allocation
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.to_vec()
    }
}

impl Default for DrillPath {
    fn default() -> Self {
        Self::empty()
    }
}

impl Deref for DrillPath {
    type Target = [String];

    fn deref(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for DrillPath {
    fn from(ids: Vec<String>) -> Self {
        Self(Arc::from(ids))
    }
}

impl<'a> From<&'a [&'a str]> for DrillPath {
    fn from(ids: &'a [&'a str]) -> Self {
        Self(ids.iter().map(|id| id.to_string()).collect())
    }
}

impl fmt::Debug for DrillPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_root_is_last_element() {
        let path = DrillPath::from(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(path.current_root(), Some("b"));
        assert_eq!(DrillPath::empty().current_root(), None);
    }

    #[test]
    fn test_clones_share_allocation() {
        let path = DrillPath::from(vec!["a".to_string()]);
        let clone = path.clone();
        assert!(DrillPath::ptr_eq(&path, &clone));

        let rebuilt = DrillPath::from(vec!["a".to_string()]);
        assert_eq!(path, rebuilt);
        assert!(!DrillPath::ptr_eq(&path, &rebuilt));
    }
}
