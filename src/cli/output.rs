use serde::Serialize;

use crate::model::task::{Progress, Step, Task};
use crate::ops::task_ops::ChecklistStats;

/// Characters of an id shown in listings
pub const SHORT_ID_LEN: usize = 8;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct StatusJson {
    #[serde(flatten)]
    pub stats: ChecklistStats,
    pub durable: bool,
}

#[derive(Serialize)]
pub struct PasteJson {
    pub tasks: usize,
    pub steps: usize,
}

#[derive(Serialize)]
pub struct CheckJson<'a> {
    pub task_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_id: Option<&'a str>,
    pub completed: bool,
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(SHORT_ID_LEN) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

fn checkbox(progress: Progress) -> String {
    format!("[{}]", progress.checkbox_char())
}

/// `[x] 1a2b3c4d Title`
pub fn format_task_line(task: &Task) -> String {
    format!(
        "{} {} {}",
        checkbox(task.progress()),
        short_id(&task.id),
        task.title
    )
}

/// Indented under its task
pub fn format_step_line(step: &Step) -> String {
    let progress = if step.completed {
        Progress::Checked
    } else {
        Progress::Unchecked
    };
    format!("    {} {} {}", checkbox(progress), short_id(&step.id), step.text)
}

pub fn format_task_tree(task: &Task) -> Vec<String> {
    let mut lines = vec![format_task_line(task)];
    lines.extend(task.steps.iter().map(format_step_line));
    lines
}

pub fn format_task_list(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return "No tasks.".to_string();
    }
    tasks
        .iter()
        .flat_map(format_task_tree)
        .collect::<Vec<_>>()
        .join("\n")
}

/// `N tasks (M steps) loaded`, shared by the CLI and the overlay status line
pub fn format_summary(tasks: &[Task]) -> String {
    let steps: usize = tasks.iter().map(|t| t.steps.len()).sum();
    format!(
        "{} {} ({} {}) loaded",
        tasks.len(),
        plural(tasks.len(), "task", "tasks"),
        steps,
        plural(steps, "step", "steps")
    )
}

pub fn format_status(stats: &ChecklistStats, durable: bool) -> String {
    let mut out = format!(
        "{} tasks: {} done, {} partial, {} open\n{}/{} steps done",
        stats.total, stats.checked, stats.partial, stats.unchecked, stats.steps_completed, stats.steps
    );
    if !durable {
        out.push_str("\nwarning: last save failed");
    }
    out
}

fn plural<'a>(n: usize, one: &'a str, many: &'a str) -> &'a str {
    if n == 1 { one } else { many }
}
