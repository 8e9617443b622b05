//! Keyboard shortcut resolution
//!
//! Maps a key press to an engine command. Resolution is pure: the host feeds in
//! the stroke, what currently has focus and the layout, and executes the returned
//! command (usually through `CanvasSession::apply_hotkey`).
//!
//! | Shortcut            | Command                |
//! |---------------------|------------------------|
//! | `Cmd/Ctrl + [`      | collapse selected      |
//! | `Cmd/Ctrl + ]`      | expand selected        |
//! | `Cmd/Ctrl + Alt + [`| collapse descendants   |
//! | `Tab`               | add child              |
//! | `Enter`             | add sibling            |
//! | arrows              | navigate (per layout)  |
//!
//! Nothing resolves while a text-editing control has focus.

use crate::config::LayoutMode;
use crate::services::{ArrowKey, NavDirection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Arrow(ArrowKey),
    BracketLeft,
    BracketRight,
    Tab,
    Enter,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyStroke {
    pub key: Key,
    pub ctrl: bool,
    pub meta: bool,
    pub alt: bool,
    pub shift: bool,
}

impl KeyStroke {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            meta: false,
            alt: false,
            shift: false,
        }
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_meta(mut self) -> Self {
        self.meta = true;
        self
    }

    pub fn with_alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    /// Cmd on macOS, Ctrl elsewhere
    fn command(&self) -> bool {
        self.ctrl || self.meta
    }

    fn is_bare(&self) -> bool {
        !(self.ctrl || self.meta || self.alt || self.shift)
    }
}

/// What holds keyboard focus when the key is pressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FocusTarget {
    Canvas,
    TextInput,
    TextArea,
    /// A `contenteditable` region such as the rich-text label editor
    RichText,
}

impl FocusTarget {
    pub fn is_text_editing(self) -> bool {
        !matches!(self, FocusTarget::Canvas)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HotkeyCommand {
    Collapse,
    Expand,
    CollapseDescendants,
    /// New empty child, appended last
    AddChild,
    /// New empty sibling right after the selection (a child when on the root)
    AddSibling,
    Navigate(NavDirection),
}

pub fn resolve_hotkey(
    stroke: &KeyStroke,
    focus: FocusTarget,
    layout: LayoutMode,
) -> Option<HotkeyCommand> {
    if focus.is_text_editing() {
        return None;
    }

    match stroke.key {
        Key::BracketLeft if stroke.command() && stroke.alt => {
            Some(HotkeyCommand::CollapseDescendants)
        }
        Key::BracketLeft if stroke.command() => Some(HotkeyCommand::Collapse),
        Key::BracketRight if stroke.command() => Some(HotkeyCommand::Expand),
        Key::Tab if stroke.is_bare() => Some(HotkeyCommand::AddChild),
        Key::Enter if stroke.is_bare() => Some(HotkeyCommand::AddSibling),
        Key::Arrow(arrow) if !stroke.command() && !stroke.alt => {
            Some(HotkeyCommand::Navigate(arrow.direction(layout)))
        }
        _ => None,
    }
}
