mod navigate;

use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::debug;

use crate::io::task_store::TaskPersistence;

use super::app::App;
use navigate::handle_navigate;

/// Handle a key press. Configured hotkeys win over panel keys and work
/// while the panel is hidden; ctrl+c always exits.
pub fn handle_key<P: TaskPersistence>(app: &mut App<P>, key: KeyEvent, now: Instant) {
    // Ignore bare modifier key presses (Shift, Ctrl, Alt, etc.)
    if matches!(key.code, KeyCode::Modifier(_)) {
        return;
    }

    if let Some(action) = app.shortcuts.action_for(&key) {
        debug!(?action, "shortcut");
        app.handle_action(action, now);
        return;
    }

    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if !app.visible {
        return;
    }

    handle_navigate(app, normalize_key(key));
}

/// Bracketed paste: replace the checklist while the panel is showing
pub fn handle_paste<P: TaskPersistence>(app: &mut App<P>, text: &str) {
    if !app.visible {
        debug!("paste ignored while hidden");
        return;
    }
    app.paste(text);
}

/// Shift+letter → uppercase letter, so `G` matches however the terminal
/// reports it
fn normalize_key(mut key: KeyEvent) -> KeyEvent {
    if let KeyCode::Char(c) = key.code
        && key.modifiers.contains(KeyModifiers::SHIFT)
        && c.is_ascii_lowercase()
    {
        key.code = KeyCode::Char(c.to_ascii_uppercase());
    }
    key
}
