//! Keyboard command mapping
//!
//! Undo/redo chords work in any mode. Single keys switch the gizmo mode or
//! delete, and only while editing with a selection.

use avatar_ipc::GizmoMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Delete,
    Backspace,
    Other,
}

/// One key press with its modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    pub key: Key,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
}

impl KeyInput {
    pub fn plain(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            meta: false,
            shift: false,
        }
    }

    pub fn ctrl(key: Key) -> Self {
        Self {
            ctrl: true,
            ..Self::plain(key)
        }
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }
}

/// Editor action bound to a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorCommand {
    Undo,
    Redo,
    SetMode(GizmoMode),
    DeleteSelected,
}

/// Map a key press to a command.
///
/// `editable` is true when edit mode is on and something is selected.
pub fn resolve(input: KeyInput, editable: bool) -> Option<EditorCommand> {
    let chord = input.ctrl || input.meta;
    if chord {
        return match input.key {
            Key::Char(c) if c.eq_ignore_ascii_case(&'z') && input.shift => Some(EditorCommand::Redo),
            Key::Char(c) if c.eq_ignore_ascii_case(&'z') => Some(EditorCommand::Undo),
            Key::Char(c) if c.eq_ignore_ascii_case(&'y') => Some(EditorCommand::Redo),
            _ => None,
        };
    }

    if !editable {
        return None;
    }
    match input.key {
        Key::Char(c) => match c.to_ascii_lowercase() {
            'g' => Some(EditorCommand::SetMode(GizmoMode::Translate)),
            'r' => Some(EditorCommand::SetMode(GizmoMode::Rotate)),
            's' => Some(EditorCommand::SetMode(GizmoMode::Scale)),
            _ => None,
        },
        Key::Delete | Key::Backspace => Some(EditorCommand::DeleteSelected),
        Key::Other => None,
    }
}
