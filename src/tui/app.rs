use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::{debug, info, warn};

use crate::cli::output::format_summary;
use crate::io::config_io::ConfigStore;
use crate::io::lock::FileLock;
use crate::io::paths::DataDir;
use crate::io::task_store::{JsonFile, TaskPersistence, TaskStore};
use crate::io::watcher::{DataDirWatcher, FileEvent};
use crate::model::config::AppConfig;
use crate::parse::{TaskParser, TextSegmenter, segmenter_for};

use super::input;
use super::render;
use super::shortcut::{Action, ShortcutMap};
use super::theme::Theme;

const NOT_SAVED: &str = "not saved: ";

/// One selectable line in the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Row {
    Task { task: usize },
    Step { task: usize, step: usize },
}

/// Overlay state. Owns the task store; every mutation goes through it.
pub struct App<P: TaskPersistence = JsonFile> {
    pub store: TaskStore<P>,
    pub parser: TaskParser<Box<dyn TextSegmenter>>,
    pub config: AppConfig,
    pub theme: Theme,
    pub shortcuts: ShortcutMap,
    /// Data directory to lock while writing; None when not backed by disk
    pub lock_dir: Option<PathBuf>,
    pub visible: bool,
    /// Set while the panel is shown by a peek
    pub peek_deadline: Option<Instant>,
    pub cursor: usize,
    pub status: Option<String>,
    pub should_quit: bool,
}

impl<P: TaskPersistence> App<P> {
    pub fn new(store: TaskStore<P>, config: AppConfig) -> Self {
        let mut app = App {
            store,
            parser: TaskParser::new(segmenter_for(config.parser.segmenter)),
            theme: Theme::from_config(&config.appearance),
            shortcuts: ShortcutMap::from_config(&config.shortcuts),
            config,
            lock_dir: None,
            visible: true,
            peek_deadline: None,
            cursor: 0,
            status: None,
            should_quit: false,
        };
        app.check_durable();
        app
    }

    pub fn with_lock_dir(mut self, dir: &Path) -> Self {
        self.lock_dir = Some(dir.to_path_buf());
        self
    }

    /// Swap in a new config (theme, hotkeys, segmenter) without touching tasks
    pub fn apply_config(&mut self, config: AppConfig) {
        self.parser = TaskParser::new(segmenter_for(config.parser.segmenter));
        self.theme = Theme::from_config(&config.appearance);
        self.shortcuts = ShortcutMap::from_config(&config.shortcuts);
        self.config = config;
        debug!("config applied");
    }

    // -----------------------------------------------------------------------
    // Rows and cursor
    // -----------------------------------------------------------------------

    /// Tasks in order, each followed by its steps
    pub fn rows(&self) -> Vec<Row> {
        let mut rows = Vec::new();
        for (ti, task) in self.store.tasks().iter().enumerate() {
            rows.push(Row::Task { task: ti });
            rows.extend((0..task.steps.len()).map(|si| Row::Step { task: ti, step: si }));
        }
        rows
    }

    pub fn selected_row(&self) -> Option<Row> {
        self.rows().get(self.cursor).copied()
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.rows().len();
        if len == 0 {
            self.cursor = 0;
            return;
        }
        self.cursor = self.cursor.saturating_add_signed(delta).min(len - 1);
    }

    pub fn cursor_to_top(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_to_bottom(&mut self) {
        self.cursor = self.rows().len().saturating_sub(1);
    }

    fn clamp_cursor(&mut self) {
        self.cursor = self.cursor.min(self.rows().len().saturating_sub(1));
    }

    // -----------------------------------------------------------------------
    // Task mutations
    // -----------------------------------------------------------------------

    /// Replace the checklist with tasks parsed from pasted text. Blank
    /// pastes are ignored.
    pub fn paste(&mut self, text: &str) {
        if text.trim().is_empty() {
            debug!("ignoring empty paste");
            return;
        }
        let tasks = self.parser.parse(text);
        if self.with_write_lock(|store| store.replace_all(tasks)).is_none() {
            return;
        }
        self.cursor = 0;
        self.status = Some(format_summary(self.store.tasks()));
        self.check_durable();
    }

    /// Flip the selected row: a task row sets the whole task (and its
    /// steps), a step row sets that step and re-derives its task.
    pub fn toggle_selected(&mut self) {
        let Some(row) = self.selected_row() else {
            return;
        };
        let tasks = self.store.tasks();
        let (task_id, step_id, target) = match row {
            Row::Task { task } => {
                let t = &tasks[task];
                (t.id.clone(), None, !t.completed)
            }
            Row::Step { task, step } => {
                let t = &tasks[task];
                let s = &t.steps[step];
                (t.id.clone(), Some(s.id.clone()), !s.completed)
            }
        };
        self.with_write_lock(|store| match &step_id {
            Some(step_id) => store.update_step_completion(&task_id, step_id, target),
            None => store.update_task_completion(&task_id, target),
        });
        self.check_durable();
    }

    /// Run a store mutation under the data-dir lock, if there is one.
    /// Tasks are re-read under the lock first so writes from other
    /// processes are not overwritten. Returns None, with a status message,
    /// when the lock is unavailable.
    fn with_write_lock<R>(&mut self, f: impl FnOnce(&mut TaskStore<P>) -> R) -> Option<R> {
        let lock = match &self.lock_dir {
            Some(dir) => match FileLock::acquire_default(dir) {
                Ok(lock) => Some(lock),
                Err(e) => {
                    warn!(error = %e, "write skipped");
                    self.status = Some(e.to_string());
                    return None;
                }
            },
            None => None,
        };
        if lock.is_some() && self.store.is_durable() {
            self.reload_tasks();
        }
        let result = f(&mut self.store);
        drop(lock);
        Some(result)
    }

    fn check_durable(&mut self) {
        match self.store.last_save_error() {
            Some(err) => self.status = Some(format!("{}{}", NOT_SAVED, err)),
            None => {
                if self.status.as_deref().is_some_and(|s| s.starts_with(NOT_SAVED)) {
                    self.status = None;
                }
            }
        }
    }

    /// Re-read tasks written by another process
    pub fn reload_tasks(&mut self) {
        if self.store.reload() {
            self.clamp_cursor();
            debug!(count = self.store.len(), "tasks reloaded");
        }
    }

    // -----------------------------------------------------------------------
    // Visibility
    // -----------------------------------------------------------------------

    pub fn toggle_visibility(&mut self) {
        self.visible = !self.visible;
        self.peek_deadline = None;
    }

    /// Show the panel for the configured peek duration. Has no effect while
    /// the panel is pinned visible.
    pub fn peek(&mut self, now: Instant) {
        if self.visible && self.peek_deadline.is_none() {
            return;
        }
        self.visible = true;
        self.peek_deadline = Some(now + self.peek_duration());
    }

    fn peek_duration(&self) -> Duration {
        let secs = self.config.shortcuts.peek_duration_seconds.max(0.0);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::from_secs(3))
    }

    /// Advance timers: ends an expired peek
    pub fn tick(&mut self, now: Instant) {
        if let Some(deadline) = self.peek_deadline
            && now >= deadline
        {
            self.visible = false;
            self.peek_deadline = None;
        }
    }

    pub fn handle_action(&mut self, action: Action, now: Instant) {
        match action {
            Action::ToggleVisibility => self.toggle_visibility(),
            Action::PeekVisibility => self.peek(now),
            Action::ExitApplication => self.should_quit = true,
        }
    }
}

// ---------------------------------------------------------------------------
// Terminal loop
// ---------------------------------------------------------------------------

/// Run the overlay against `data_dir` until the user exits
pub fn run(data_dir: &DataDir) -> Result<(), Box<dyn std::error::Error>> {
    data_dir.ensure_exists()?;
    let config = ConfigStore::load(&data_dir.config_path())?;
    let store = TaskStore::open(JsonFile::new(data_dir.tasks_path()));
    info!(tasks = store.len(), dir = %data_dir.root().display(), "overlay starting");

    let mut app = App::new(store, config.config().clone()).with_lock_dir(data_dir.root());

    let watcher = match DataDirWatcher::start(data_dir.root()) {
        Ok(w) => Some(w),
        Err(e) => {
            warn!(error = %e, "file watcher unavailable, external edits will not reload");
            None
        }
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Restore the terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), DisableBracketedPaste, LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let result = run_event_loop(&mut terminal, &mut app, watcher.as_ref(), data_dir);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    watcher: Option<&DataDirWatcher>,
    data_dir: &DataDir,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|frame| render::render(frame, app))?;

        if event::poll(Duration::from_millis(250))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    input::handle_key(app, key, Instant::now());
                }
                Event::Paste(text) => input::handle_paste(app, &text),
                _ => {}
            }
        }

        if let Some(watcher) = watcher {
            for evt in watcher.poll() {
                match evt {
                    FileEvent::TasksChanged => app.reload_tasks(),
                    FileEvent::ConfigChanged => match ConfigStore::load(&data_dir.config_path()) {
                        Ok(store) => app.apply_config(store.config().clone()),
                        Err(e) => warn!(error = %e, "config reload failed"),
                    },
                }
            }
        }

        app.tick(Instant::now());

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::task_store::MemoryPersistence;
    use crate::model::task::Progress;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn app() -> App<MemoryPersistence> {
        App::new(
            TaskStore::open(MemoryPersistence::default()),
            AppConfig::default(),
        )
    }

    fn app_with(text: &str) -> App<MemoryPersistence> {
        let mut app = app();
        app.paste(text);
        app
    }

    #[test]
    fn paste_replaces_and_reports() {
        let mut app = app_with("Walk the dog");
        app.paste("Pack the bag. Lock the door. Leave.\nRest");
        assert_eq!(app.store.len(), 2);
        assert_eq!(app.status.as_deref(), Some("2 tasks (3 steps) loaded"));
        assert_eq!(app.store.persistence().saves(), 2);
    }

    #[test]
    fn blank_paste_is_ignored() {
        let mut app = app_with("Walk the dog");
        app.paste("   \n\t\n");
        assert_eq!(app.store.len(), 1);
        assert_eq!(app.store.persistence().saves(), 1);
    }

    #[test]
    fn rows_interleave_steps() {
        let app = app_with("Open it. Close it.\nDone");
        assert_eq!(
            app.rows(),
            vec![
                Row::Task { task: 0 },
                Row::Step { task: 0, step: 0 },
                Row::Step { task: 0, step: 1 },
                Row::Task { task: 1 },
            ]
        );
    }

    #[test]
    fn cursor_stays_in_bounds() {
        let mut app = app_with("Open it. Close it.\nDone");
        app.move_cursor(-3);
        assert_eq!(app.cursor, 0);
        app.move_cursor(10);
        assert_eq!(app.cursor, 3);
        app.cursor_to_top();
        assert_eq!(app.cursor, 0);
        app.cursor_to_bottom();
        assert_eq!(app.cursor, 3);
    }

    #[test]
    fn toggling_steps_derives_task() {
        let mut app = app_with("Open it. Close it.");
        app.cursor = 1;
        app.toggle_selected();
        assert_eq!(app.store.tasks()[0].progress(), Progress::Partial);
        app.cursor = 2;
        app.toggle_selected();
        assert!(app.store.tasks()[0].completed);
        app.toggle_selected();
        assert!(!app.store.tasks()[0].completed);
        assert!(app.store.tasks()[0].steps[0].completed);
    }

    #[test]
    fn toggling_task_row_sets_all_steps() {
        let mut app = app_with("Open it. Close it.");
        app.cursor = 0;
        app.toggle_selected();
        let task = &app.store.tasks()[0];
        assert!(task.completed);
        assert!(task.steps.iter().all(|s| s.completed));
        app.toggle_selected();
        assert!(app.store.tasks()[0].steps.iter().all(|s| !s.completed));
    }

    #[test]
    fn toggle_on_empty_list_is_noop() {
        let mut app = app();
        app.toggle_selected();
        assert_eq!(app.store.persistence().saves(), 0);
    }

    #[test]
    fn peek_shows_then_hides() {
        let mut app = app();
        app.toggle_visibility();
        assert!(!app.visible);

        let start = Instant::now();
        app.peek(start);
        assert!(app.visible);
        app.tick(start + Duration::from_secs(2));
        assert!(app.visible);

        // Peeking again restarts the timer
        app.peek(start + Duration::from_secs(2));
        app.tick(start + Duration::from_secs(4));
        assert!(app.visible);
        app.tick(start + Duration::from_secs(5));
        assert!(!app.visible);
    }

    #[test]
    fn peek_leaves_pinned_panel_alone() {
        let mut app = app();
        let start = Instant::now();
        app.peek(start);
        assert!(app.peek_deadline.is_none());
        app.tick(start + Duration::from_secs(10));
        assert!(app.visible);
    }

    #[test]
    fn toggle_cancels_peek() {
        let mut app = app();
        app.toggle_visibility();
        let start = Instant::now();
        app.peek(start);
        app.toggle_visibility();
        assert!(!app.visible);
        app.toggle_visibility();
        app.tick(start + Duration::from_secs(10));
        assert!(app.visible);
    }

    #[test]
    fn failed_save_shows_status() {
        let mut app = app_with("Walk the dog");
        app.store.persistence().set_failing(true);
        app.toggle_selected();
        assert!(app.store.tasks()[0].completed);
        assert!(app.status.as_deref().unwrap().starts_with("not saved:"));
    }

    #[test]
    fn writes_release_the_lock() {
        let tmp = TempDir::new().unwrap();
        let mut app = app().with_lock_dir(tmp.path());
        app.paste("Walk the dog");
        assert_eq!(app.store.len(), 1);
        assert!(FileLock::acquire(tmp.path(), Duration::from_millis(50)).is_ok());
    }

    #[test]
    fn locked_write_keeps_changes_from_other_processes() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("tasks.json");
        let mut app = App::new(TaskStore::open(JsonFile::new(&path)), AppConfig::default())
            .with_lock_dir(tmp.path());
        app.paste("Alpha\nBeta");

        // another process checks Beta while the overlay still shows it open
        {
            let _lock = FileLock::acquire_default(tmp.path()).unwrap();
            let mut other = TaskStore::open(JsonFile::new(&path));
            let beta = other.tasks()[1].id.clone();
            assert!(other.update_task_completion(&beta, true));
        }
        assert!(!app.store.tasks()[1].completed);

        app.cursor = 0;
        app.toggle_selected();

        let on_disk = TaskStore::open(JsonFile::new(&path)).get_all();
        assert!(on_disk[0].completed);
        assert!(on_disk[1].completed);
        assert_eq!(app.store.get_all(), on_disk);
    }

    #[test]
    fn locked_write_skips_reload_with_unsaved_changes() {
        let tmp = TempDir::new().unwrap();
        let mut app = app().with_lock_dir(tmp.path());
        app.paste("Walk the dog");
        app.store.persistence().set_failing(true);
        app.toggle_selected();
        assert!(!app.store.is_durable());

        app.cursor = 0;
        app.toggle_selected();
        assert!(!app.store.tasks()[0].completed);
        assert_eq!(app.store.len(), 1);
    }

    #[test]
    fn apply_config_switches_segmenter() {
        let mut app = app();
        let mut config = AppConfig::default();
        config.parser.segmenter = crate::model::config::SegmenterKind::Line;
        app.apply_config(config);
        app.paste("Open it. Close it.");
        assert!(app.store.tasks()[0].is_directly_checkable());
    }
}
