//! Hotkey handling for the wardrobe
//!
//! - Ctrl/Cmd+Z: Undo
//! - Ctrl/Cmd+Shift+Z, Ctrl/Cmd+Y: Redo
//! - G / R / S: Translate / rotate / scale gizmo (editing with a selection)
//! - Delete / Backspace: Delete the selection (editing with a selection)

use bevy::prelude::*;
use wardrobe::{Key, KeyInput, Wardrobe};

pub struct HotkeyPlugin;

impl Plugin for HotkeyPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, handle_wardrobe_hotkeys);
    }
}

fn key_for(code: KeyCode) -> Key {
    match code {
        KeyCode::KeyZ => Key::Char('z'),
        KeyCode::KeyY => Key::Char('y'),
        KeyCode::KeyG => Key::Char('g'),
        KeyCode::KeyR => Key::Char('r'),
        KeyCode::KeyS => Key::Char('s'),
        KeyCode::Delete => Key::Delete,
        KeyCode::Backspace => Key::Backspace,
        _ => Key::Other,
    }
}

/// Key press for `code` with the modifiers currently held
pub fn key_input_for(code: KeyCode, key_input: &ButtonInput<KeyCode>) -> KeyInput {
    KeyInput {
        key: key_for(code),
        ctrl: key_input.pressed(KeyCode::ControlLeft) || key_input.pressed(KeyCode::ControlRight),
        meta: key_input.pressed(KeyCode::SuperLeft) || key_input.pressed(KeyCode::SuperRight),
        shift: key_input.pressed(KeyCode::ShiftLeft) || key_input.pressed(KeyCode::ShiftRight),
    }
}

/// Feed this frame's key presses to the wardrobe.
/// Headless apps have no keyboard resource and skip this.
fn handle_wardrobe_hotkeys(key_input: Option<Res<ButtonInput<KeyCode>>>, mut wardrobe: ResMut<Wardrobe>) {
    let Some(key_input) = key_input else {
        return;
    };
    for code in key_input.get_just_pressed() {
        let input = key_input_for(*code, &key_input);
        if input.key == Key::Other {
            continue;
        }
        if let Some(command) = wardrobe.handle_key(input) {
            info!("Hotkey {:?} -> {:?}", code, command);
        }
    }
}
