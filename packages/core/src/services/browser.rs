//! Browser ports used by the drill path store
//!
//! The store needs two browser facilities: the current location (read it, replace
//! it without adding a history entry) and tab-scoped session storage. Both are
//! traits so a WASM host can bind them to `window.location`/`history.replaceState`
//! and `window.sessionStorage`, while tests use the in-memory adapters below.
//!
//! The in-memory adapters are cheap handles over shared state: cloning one and
//! handing the clone to a new store simulates a page reload in the same tab.

use anyhow::Result;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use url::Url;

pub trait Location {
    fn href(&self) -> Url;

    /// Replace the current URL in place (no new history entry)
    fn replace(&self, url: Url);
}

pub trait SessionStorage {
    fn get_item(&self, key: &str) -> Option<String>;

    /// May fail when storage is full or disabled
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    fn remove_item(&self, key: &str);
}

#[derive(Debug, Clone)]
pub struct MemoryLocation {
    href: Rc<RefCell<Url>>,
    replacements: Rc<Cell<usize>>,
}

impl MemoryLocation {
    pub fn new(href: &str) -> Result<Self, url::ParseError> {
        Ok(Self::from_url(Url::parse(href)?))
    }

    pub fn from_url(url: Url) -> Self {
        Self {
            href: Rc::new(RefCell::new(url)),
            replacements: Rc::new(Cell::new(0)),
        }
    }

    /// How many times `replace` has been called through any handle
    pub fn replacement_count(&self) -> usize {
        self.replacements.get()
    }

    /// Simulate the user editing the address bar
    pub fn navigate(&self, url: Url) {
        *self.href.borrow_mut() = url;
    }
}

impl Location for MemoryLocation {
    fn href(&self) -> Url {
        self.href.borrow().clone()
    }

    fn replace(&self, url: Url) {
        *self.href.borrow_mut() = url;
        self.replacements.set(self.replacements.get() + 1);
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemorySessionStorage {
    items: Rc<RefCell<HashMap<String, String>>>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }
}

impl SessionStorage for MemorySessionStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) {
        self.items.borrow_mut().remove(key);
    }
}
