use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::task::{Progress, Step, Task};

/// Error type for task operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error("task not found: {0}")]
    NotFound(String),
    #[error("step not found: {step_id} (task {task_id})")]
    StepNotFound { task_id: String, step_id: String },
    #[error("ambiguous id prefix '{prefix}' matches {count} items")]
    Ambiguous { prefix: String, count: usize },
}

// ---------------------------------------------------------------------------
// Completion transitions
// ---------------------------------------------------------------------------

/// Apply the completion transition rule to a (completed, completed_at) pair.
/// false→true stamps `now`, true→false clears the stamp, no transition
/// leaves the stamp alone. Returns whether the value changed.
fn apply_completion(
    completed: &mut bool,
    completed_at: &mut Option<DateTime<Utc>>,
    value: bool,
    now: DateTime<Utc>,
) -> bool {
    if *completed == value {
        return false;
    }
    *completed = value;
    *completed_at = if value { Some(now) } else { None };
    true
}

/// Re-derive a stepped task's completion from its steps.
/// Directly-checkable tasks are left untouched.
pub fn derive_task_completion(task: &mut Task, now: DateTime<Utc>) -> bool {
    if task.steps.is_empty() {
        return false;
    }
    let all_done = task.steps.iter().all(|s| s.completed);
    apply_completion(&mut task.completed, &mut task.completed_at, all_done, now)
}

/// Set one step's completion, then re-derive its parent task.
pub fn set_step_completion(
    tasks: &mut [Task],
    task_id: &str,
    step_id: &str,
    completed: bool,
    now: DateTime<Utc>,
) -> Result<(), TaskError> {
    let task = find_task_mut(tasks, task_id).ok_or_else(|| TaskError::NotFound(task_id.into()))?;
    let step = task
        .find_step_mut(step_id)
        .ok_or_else(|| TaskError::StepNotFound {
            task_id: task_id.into(),
            step_id: step_id.into(),
        })?;

    apply_completion(&mut step.completed, &mut step.completed_at, completed, now);
    derive_task_completion(task, now);
    Ok(())
}

/// Set a task's completion directly. For a stepped task the value and the
/// task's timestamp are pushed down to every step, overwriting their own.
pub fn set_task_completion(
    tasks: &mut [Task],
    task_id: &str,
    completed: bool,
    now: DateTime<Utc>,
) -> Result<(), TaskError> {
    let task = find_task_mut(tasks, task_id).ok_or_else(|| TaskError::NotFound(task_id.into()))?;

    apply_completion(&mut task.completed, &mut task.completed_at, completed, now);
    for step in &mut task.steps {
        step.completed = task.completed;
        step.completed_at = task.completed_at;
    }
    Ok(())
}

/// Repair invariants on freshly loaded data: step order and indices,
/// stepped-task derivation, and `completed_at` present iff `completed`.
/// Returns the number of fields changed.
pub fn reconcile(tasks: &mut [Task], now: DateTime<Utc>) -> usize {
    let mut repairs = 0;
    for task in tasks.iter_mut() {
        task.steps.sort_by_key(|s| s.order_index);
        for (i, step) in task.steps.iter_mut().enumerate() {
            if step.order_index != i {
                step.order_index = i;
                repairs += 1;
            }
            repairs += repair_stamp(&mut step.completed, &mut step.completed_at, now);
        }

        if !task.steps.is_empty() {
            let all_done = task.steps.iter().all(|s| s.completed);
            if task.completed != all_done {
                task.completed = all_done;
                repairs += 1;
            }
        }
        repairs += repair_stamp(&mut task.completed, &mut task.completed_at, now);
    }
    repairs
}

fn repair_stamp(
    completed: &mut bool,
    completed_at: &mut Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> usize {
    match (*completed, completed_at.is_some()) {
        (true, false) => {
            *completed_at = Some(now);
            1
        }
        (false, true) => {
            *completed_at = None;
            1
        }
        _ => 0,
    }
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

pub fn find_task<'a>(tasks: &'a [Task], task_id: &str) -> Option<&'a Task> {
    tasks.iter().find(|t| t.id == task_id)
}

pub fn find_task_mut<'a>(tasks: &'a mut [Task], task_id: &str) -> Option<&'a mut Task> {
    tasks.iter_mut().find(|t| t.id == task_id)
}

/// Resolve a full task id or a unique id prefix
pub fn resolve_task<'a>(tasks: &'a [Task], needle: &str) -> Result<&'a Task, TaskError> {
    resolve_by_prefix(tasks, needle, |t| &t.id)?
        .ok_or_else(|| TaskError::NotFound(needle.to_string()))
}

/// Resolve a full step id or a unique id prefix within one task
pub fn resolve_step<'a>(task: &'a Task, needle: &str) -> Result<&'a Step, TaskError> {
    resolve_by_prefix(&task.steps, needle, |s| &s.id)?.ok_or_else(|| TaskError::StepNotFound {
        task_id: task.id.clone(),
        step_id: needle.to_string(),
    })
}

fn resolve_by_prefix<'a, T>(
    items: &'a [T],
    needle: &str,
    id_of: impl Fn(&T) -> &String,
) -> Result<Option<&'a T>, TaskError> {
    if needle.is_empty() {
        return Ok(None);
    }
    if let Some(exact) = items.iter().find(|item| id_of(item) == needle) {
        return Ok(Some(exact));
    }
    let matches: Vec<&T> = items
        .iter()
        .filter(|item| id_of(item).starts_with(needle))
        .collect();
    match matches.len() {
        0 => Ok(None),
        1 => Ok(Some(matches[0])),
        count => Err(TaskError::Ambiguous {
            prefix: needle.to_string(),
            count,
        }),
    }
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Task and step completion counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChecklistStats {
    pub total: usize,
    pub checked: usize,
    pub partial: usize,
    pub unchecked: usize,
    pub steps: usize,
    pub steps_completed: usize,
}

pub fn checklist_stats(tasks: &[Task]) -> ChecklistStats {
    let mut stats = ChecklistStats {
        total: tasks.len(),
        ..Default::default()
    };
    for task in tasks {
        match task.progress() {
            Progress::Checked => stats.checked += 1,
            Progress::Partial => stats.partial += 1,
            Progress::Unchecked => stats.unchecked += 1,
        }
        stats.steps += task.steps.len();
        stats.steps_completed += task.completed_steps();
    }
    stats
}
