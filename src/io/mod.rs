pub mod config_io;
pub mod lock;
pub mod paths;
pub mod task_store;
pub mod tasks_io;
pub mod watcher;
