pub mod status_row;
pub mod task_list;
#[cfg(test)]
pub mod test_helpers;

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::io::task_store::TaskPersistence;
use crate::model::config::{Anchor, AppConfig};
use crate::tui::app::App;
use crate::tui::shortcut::Action;
use crate::util::unicode::{display_width, truncate_to_width};

/// Rows the panel spends on its border and status line
pub const CHROME_ROWS: u16 = 3;
/// Narrowest panel drawn, whatever the config says
pub const MIN_PANEL_WIDTH: u16 = 16;

/// Draw the overlay: the task panel when visible, else a one-line hint
pub fn render<P: TaskPersistence>(frame: &mut Frame, app: &App<P>) {
    let area = frame.area();
    if !app.visible {
        render_hidden_hint(frame, app, area);
        return;
    }

    let rows = app.rows().len().max(1);
    let panel = panel_area(area, &app.config, rows);
    frame.render_widget(Clear, panel);

    let tasks = app.store.tasks();
    let title = if tasks.is_empty() {
        " Checklist ".to_string()
    } else {
        let done = tasks.iter().filter(|t| t.completed).count();
        format!(" Checklist {}/{} ", done, tasks.len())
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.accent))
        .title(title)
        .style(Style::default().bg(app.theme.background).fg(app.theme.text));
    let inner = block.inner(panel);
    frame.render_widget(block, panel);

    let chunks = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).split(inner);
    task_list::render_task_list(frame, app, chunks[0]);
    status_row::render_status_row(frame, app, chunks[1]);
}

/// Where the panel goes: pinned to the configured corner, as wide as
/// configured, and either fitted to `content_rows` or full height.
pub fn panel_area(area: Rect, config: &AppConfig, content_rows: usize) -> Rect {
    let width = config.window.width.max(MIN_PANEL_WIDTH).min(area.width);
    let height = if config.behavior.auto_shrink_to_fit_tasks {
        let rows = u16::try_from(content_rows).unwrap_or(u16::MAX);
        rows.saturating_add(CHROME_ROWS)
            .max(config.behavior.min_height_one_task)
            .min(area.height)
    } else {
        area.height
    };
    let x = match config.window.anchor {
        Anchor::TopLeft | Anchor::BottomLeft => area.x,
        Anchor::TopRight | Anchor::BottomRight => area.x + area.width - width,
    };
    let y = match config.window.anchor {
        Anchor::TopLeft | Anchor::TopRight => area.y,
        Anchor::BottomLeft | Anchor::BottomRight => area.y + area.height - height,
    };
    Rect::new(x, y, width, height)
}

fn render_hidden_hint<P: TaskPersistence>(frame: &mut Frame, app: &App<P>, area: Rect) {
    let hint = match app.shortcuts.binding_for(Action::ToggleVisibility) {
        Some(binding) => format!("[{} to show]", binding),
        None => "[hidden]".to_string(),
    };
    let hint = truncate_to_width(&hint, area.width as usize);
    let width = display_width(&hint) as u16;
    let spot = panel_area(area, &app.config, 0);
    let x = match app.config.window.anchor {
        Anchor::TopLeft | Anchor::BottomLeft => area.x,
        Anchor::TopRight | Anchor::BottomRight => area.x + area.width - width,
    };
    let y = match app.config.window.anchor {
        Anchor::TopLeft | Anchor::TopRight => spot.y,
        Anchor::BottomLeft | Anchor::BottomRight => area.y + area.height.saturating_sub(1),
    };
    let rect = Rect::new(x, y, width, area.height.min(1));
    frame.render_widget(
        Paragraph::new(hint).style(Style::default().fg(app.theme.dim)),
        rect,
    );
}
