use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::widgets::Paragraph;

use crate::io::task_store::TaskPersistence;
use crate::tui::app::App;
use crate::util::unicode::truncate_to_width;

const KEY_HINT: &str = "paste: load  space: toggle  q: quit";

/// Render the status line at the bottom of the panel: the last status
/// message, or key hints
pub fn render_status_row<P: TaskPersistence>(frame: &mut Frame, app: &App<P>, area: Rect) {
    let (text, color) = match &app.status {
        Some(status) if !app.store.is_durable() => (status.as_str(), app.theme.accent),
        Some(status) => (status.as_str(), app.theme.text),
        None => (KEY_HINT, app.theme.dim),
    };
    let text = truncate_to_width(text, area.width as usize);
    frame.render_widget(Paragraph::new(text).style(Style::default().fg(color)), area);
}
