use crossterm::event::{KeyCode, KeyEvent};

use crate::io::task_store::TaskPersistence;
use crate::tui::app::App;

/// Rows to jump for PageUp / PageDown
const PAGE: isize = 10;

pub(super) fn handle_navigate<P: TaskPersistence>(app: &mut App<P>, key: KeyEvent) {
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => app.move_cursor(-1),
        KeyCode::Down | KeyCode::Char('j') => app.move_cursor(1),
        KeyCode::PageUp => app.move_cursor(-PAGE),
        KeyCode::PageDown => app.move_cursor(PAGE),
        KeyCode::Home | KeyCode::Char('g') => app.cursor_to_top(),
        KeyCode::End | KeyCode::Char('G') => app.cursor_to_bottom(),
        KeyCode::Char(' ') | KeyCode::Enter => app.toggle_selected(),
        KeyCode::Char('r') => app.reload_tasks(),
        KeyCode::Esc => app.toggle_visibility(),
        KeyCode::Char('q') => app.should_quit = true,
        _ => {}
    }
}
