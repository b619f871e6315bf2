use std::path::{Path, PathBuf};
use std::sync::mpsc;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

const TASKS_FILE: &str = "tasks.json";
const CONFIG_FILE: &str = "config.json";

/// Changes seen in the data directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEvent {
    TasksChanged,
    ConfigChanged,
}

/// Watches the data directory for writes by other processes.
pub struct DataDirWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<FileEvent>,
}

impl DataDirWatcher {
    /// Start watching `data_dir`. Call `poll()` each tick.
    pub fn start(data_dir: &Path) -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::channel();

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                let Ok(event) = result else {
                    return;
                };
                match event.kind {
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {}
                    _ => return,
                }
                for evt in classify(&event.paths) {
                    let _ = tx.send(evt);
                }
            },
            Config::default(),
        )?;

        // Atomic writes rename a temp file over the target, so watch the
        // directory rather than the files.
        watcher.watch(data_dir, RecursiveMode::NonRecursive)?;
        Ok(DataDirWatcher {
            _watcher: watcher,
            rx,
        })
    }

    /// Drain pending events, collapsing duplicates
    pub fn poll(&self) -> Vec<FileEvent> {
        let mut events = Vec::new();
        while let Ok(evt) = self.rx.try_recv() {
            if !events.contains(&evt) {
                events.push(evt);
            }
        }
        events
    }
}

/// Map changed paths to events. Temp files and the lock are ignored.
fn classify(paths: &[PathBuf]) -> Vec<FileEvent> {
    let mut events = Vec::new();
    for path in paths {
        let evt = match path.file_name().and_then(|n| n.to_str()) {
            Some(TASKS_FILE) => FileEvent::TasksChanged,
            Some(CONFIG_FILE) => FileEvent::ConfigChanged,
            _ => continue,
        };
        if !events.contains(&evt) {
            events.push(evt);
        }
    }
    events
}
