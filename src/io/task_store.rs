use std::cell::{Cell, RefCell};
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::io::tasks_io::{self, StoreError};
use crate::model::task::Task;
use crate::ops::task_ops::{self, TaskError};

/// Where a `TaskStore` reads its initial state from and writes every
/// mutation to.
pub trait TaskPersistence {
    /// Load the saved task list. Never fails: unreadable data is empty.
    fn load(&self) -> Vec<Task>;
    fn save(&self, tasks: &[Task]) -> Result<(), StoreError>;
}

/// The task document on disk
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFile { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TaskPersistence for JsonFile {
    fn load(&self) -> Vec<Task> {
        tasks_io::load_tasks(&self.path)
    }

    fn save(&self, tasks: &[Task]) -> Result<(), StoreError> {
        tasks_io::save_tasks(&self.path, tasks)
    }
}

/// In-memory persistence that records what was saved. Can be told to
/// refuse writes, to exercise the unsaved-state path.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    saved: RefCell<Vec<Task>>,
    saves: Cell<usize>,
    failing: Cell<bool>,
}

impl MemoryPersistence {
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        MemoryPersistence {
            saved: RefCell::new(tasks),
            ..Default::default()
        }
    }

    /// Number of successful saves
    pub fn saves(&self) -> usize {
        self.saves.get()
    }

    pub fn saved(&self) -> Vec<Task> {
        self.saved.borrow().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }
}

impl TaskPersistence for MemoryPersistence {
    fn load(&self) -> Vec<Task> {
        self.saved.borrow().clone()
    }

    fn save(&self, tasks: &[Task]) -> Result<(), StoreError> {
        if self.failing.get() {
            return Err(StoreError::WriteError {
                path: PathBuf::from("<memory>"),
                source: io::Error::other("write refused"),
            });
        }
        *self.saved.borrow_mut() = tasks.to_vec();
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}

/// The single authoritative task list.
///
/// Every successful mutation is written through to the persistence layer
/// before returning. A failed write does not undo the in-memory change; it
/// is logged and kept in `last_save_error` until a later save succeeds.
/// Not internally synchronized: callers funnel mutations through one thread.
pub struct TaskStore<P: TaskPersistence = JsonFile> {
    tasks: Vec<Task>,
    persistence: P,
    last_save_error: Option<String>,
}

impl<P: TaskPersistence> TaskStore<P> {
    /// Load the saved list, repairing any broken invariants in it
    pub fn open(persistence: P) -> Self {
        let mut tasks = persistence.load();
        let repairs = task_ops::reconcile(&mut tasks, Utc::now());
        if repairs > 0 {
            debug!(repairs, "reconciled loaded tasks");
        }
        TaskStore {
            tasks,
            persistence,
            last_save_error: None,
        }
    }

    /// Borrowed read-only view of the current list
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Independent copy of the current list
    pub fn get_all(&self) -> Vec<Task> {
        self.tasks.clone()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Discard the current list and take `tasks` as the new state
    pub fn replace_all(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
        info!(count = self.tasks.len(), "tasks replaced");
        self.persist();
    }

    /// Set a step's completion and re-derive its task. Returns false, with
    /// nothing changed or written, if the task or step is unknown.
    pub fn update_step_completion(&mut self, task_id: &str, step_id: &str, completed: bool) -> bool {
        let result =
            task_ops::set_step_completion(&mut self.tasks, task_id, step_id, completed, Utc::now());
        self.finish_update(result)
    }

    /// Set a task's completion, pushing it down to any steps. Returns false,
    /// with nothing changed or written, if the task is unknown.
    pub fn update_task_completion(&mut self, task_id: &str, completed: bool) -> bool {
        let result = task_ops::set_task_completion(&mut self.tasks, task_id, completed, Utc::now());
        self.finish_update(result)
    }

    fn finish_update(&mut self, result: Result<(), TaskError>) -> bool {
        match result {
            Ok(()) => {
                self.persist();
                true
            }
            Err(e) => {
                warn!(error = %e, "completion update ignored");
                false
            }
        }
    }

    /// Write the current list, e.g. to retry after a failed save
    pub fn save(&mut self) -> Result<(), StoreError> {
        match self.persistence.save(&self.tasks) {
            Ok(()) => {
                self.last_save_error = None;
                Ok(())
            }
            Err(e) => {
                self.last_save_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    fn persist(&mut self) {
        if let Err(e) = self.save() {
            error!(error = %e, "tasks changed in memory but were not saved");
        }
    }

    /// Replace the in-memory list with what is saved. Refused while there
    /// are unsaved changes, which the reload would discard.
    pub fn reload(&mut self) -> bool {
        if !self.is_durable() {
            warn!("reload skipped: unsaved changes in memory");
            return false;
        }
        let mut tasks = self.persistence.load();
        task_ops::reconcile(&mut tasks, Utc::now());
        self.tasks = tasks;
        true
    }

    /// Whether the last write reached the persistence layer
    pub fn is_durable(&self) -> bool {
        self.last_save_error.is_none()
    }

    pub fn last_save_error(&self) -> Option<&str> {
        self.last_save_error.as_deref()
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::TaskParser;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn memory_store(text: &str) -> TaskStore<MemoryPersistence> {
        let mut store = TaskStore::open(MemoryPersistence::default());
        store.replace_all(TaskParser::default().parse(text));
        store
    }

    #[test]
    fn replace_all_persists() {
        let store = memory_store("Buy milk. Go home.\nWalk the dog");
        assert_eq!(store.len(), 2);
        assert_eq!(store.persistence().saves(), 1);
        assert_eq!(store.persistence().saved(), store.get_all());
    }

    #[test]
    fn snapshot_is_independent() {
        let store = memory_store("Walk the dog");
        let mut snapshot = store.get_all();
        snapshot[0].title = "changed".into();
        snapshot[0].completed = true;
        assert_eq!(store.get_all()[0].title, "Walk the dog");
        assert!(!store.get_all()[0].completed);
    }

    #[test]
    fn step_update_persists_and_derives() {
        let mut store = memory_store("Buy milk. Go home.");
        let task = store.get_all().remove(0);
        assert!(store.update_step_completion(&task.id, &task.steps[0].id, true));
        assert!(store.update_step_completion(&task.id, &task.steps[1].id, true));
        assert_eq!(store.persistence().saves(), 3);
        let saved = store.persistence().saved();
        assert!(saved[0].completed);
        assert!(saved[0].completed_at.is_some());
    }

    #[test]
    fn unknown_ids_return_false_without_saving() {
        let mut store = memory_store("Buy milk. Go home.");
        let before = store.get_all();
        let task_id = before[0].id.clone();

        assert!(!store.update_step_completion("missing", "missing", true));
        assert!(!store.update_step_completion(&task_id, "missing", true));
        assert!(!store.update_task_completion("missing", true));

        assert_eq!(store.get_all(), before);
        assert_eq!(store.persistence().saves(), 1);
    }

    #[test]
    fn failed_save_keeps_change_and_is_surfaced() {
        let mut store = memory_store("Walk the dog");
        let id = store.get_all()[0].id.clone();
        store.persistence().set_failing(true);

        assert!(store.update_task_completion(&id, true));
        assert!(store.get_all()[0].completed);
        assert!(!store.is_durable());
        assert!(store.last_save_error().unwrap().contains("write refused"));
        assert!(!store.persistence().saved()[0].completed);

        assert!(!store.reload());
        assert!(store.get_all()[0].completed);

        store.persistence().set_failing(false);
        store.save().unwrap();
        assert!(store.is_durable());
        assert!(store.persistence().saved()[0].completed);
    }

    #[test]
    fn open_reconciles_saved_state() {
        let mut tasks = TaskParser::default().parse("One. Two.");
        for step in &mut tasks[0].steps {
            step.completed = true;
        }
        let store = TaskStore::open(MemoryPersistence::with_tasks(tasks));
        let task = &store.tasks()[0];
        assert!(task.completed);
        assert!(task.completed_at.is_some());
        assert!(task.steps.iter().all(|s| s.completed_at.is_some()));
    }

    #[test]
    fn json_file_store_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");

        let mut store = TaskStore::open(JsonFile::new(&path));
        assert!(store.is_empty());
        store.replace_all(TaskParser::default().parse("Buy milk. Go home.\nWalk the dog"));
        let dog = store.get_all()[1].id.clone();
        assert!(store.update_task_completion(&dog, true));
        let expected = store.get_all();

        let reopened = TaskStore::open(JsonFile::new(&path));
        assert_eq!(reopened.get_all(), expected);
    }

    #[test]
    fn reload_picks_up_external_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");
        let mut ours = TaskStore::open(JsonFile::new(&path));
        ours.replace_all(TaskParser::default().parse("First"));

        let mut theirs = TaskStore::open(JsonFile::new(&path));
        theirs.replace_all(TaskParser::default().parse("Second\nThird"));

        assert!(ours.reload());
        let titles: Vec<String> = ours.get_all().into_iter().map(|t| t.title).collect();
        assert_eq!(titles, vec!["Second", "Third"]);
    }

    #[test]
    fn unwritable_path_reports_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "file, not a dir").unwrap();
        let mut store = TaskStore::open(JsonFile::new(blocker.join("tasks.json")));
        store.replace_all(TaskParser::default().parse("Walk the dog"));
        assert_eq!(store.len(), 1);
        assert!(!store.is_durable());
    }
}
