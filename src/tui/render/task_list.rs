use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};

use crate::io::task_store::TaskPersistence;
use crate::model::task::Progress;
use crate::tui::app::{App, Row};
use crate::util::unicode::{display_width, fit_to_width};

pub const EMPTY_MESSAGE: &str = "No tasks. Paste to load a checklist.";

/// Render tasks and their indented steps, scrolled to keep the cursor in view
pub fn render_task_list<P: TaskPersistence>(frame: &mut Frame, app: &App<P>, area: Rect) {
    if app.store.is_empty() {
        let empty = Paragraph::new(EMPTY_MESSAGE)
            .style(Style::default().fg(app.theme.dim))
            .wrap(Wrap { trim: true });
        frame.render_widget(empty, area);
        return;
    }

    let rows = app.rows();
    let height = area.height as usize;
    let offset = scroll_offset(app.cursor, rows.len(), height);
    let lines: Vec<Line> = rows
        .iter()
        .enumerate()
        .skip(offset)
        .take(height)
        .map(|(i, row)| row_line(app, *row, i == app.cursor, area.width as usize))
        .collect();
    frame.render_widget(Paragraph::new(lines), area);
}

fn scroll_offset(cursor: usize, len: usize, height: usize) -> usize {
    if height == 0 || cursor < height {
        return 0;
    }
    (cursor + 1 - height).min(len.saturating_sub(height))
}

fn row_line<P: TaskPersistence>(app: &App<P>, row: Row, selected: bool, width: usize) -> Line<'static> {
    let tasks = app.store.tasks();
    let (indent, progress, text) = match row {
        Row::Task { task } => {
            let t = &tasks[task];
            ("", t.progress(), t.title.as_str())
        }
        Row::Step { task, step } => {
            let s = &tasks[task].steps[step];
            let progress = if s.completed {
                Progress::Checked
            } else {
                Progress::Unchecked
            };
            ("  ", progress, s.text.as_str())
        }
    };

    let checkbox = format!("{}[{}] ", indent, progress.checkbox_char());
    let text = fit_to_width(text, width.saturating_sub(display_width(&checkbox)));

    let mut box_style = Style::default().fg(app.theme.progress_color(progress));
    let mut text_style = if progress == Progress::Checked {
        Style::default()
            .fg(app.theme.dim)
            .add_modifier(Modifier::CROSSED_OUT)
    } else {
        Style::default().fg(app.theme.text)
    };
    if selected {
        box_style = box_style.bg(app.theme.selection_bg);
        text_style = text_style.bg(app.theme.selection_bg);
    }
    Line::from(vec![
        Span::styled(checkbox, box_style),
        Span::styled(text, text_style),
    ])
}
