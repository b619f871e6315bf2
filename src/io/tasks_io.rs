use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::model::task::Task;

/// Error type for task document writes
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not serialize tasks: {0}")]
    SerializeError(#[from] serde_json::Error),
}

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Read the task document. A missing, empty or malformed file gives an
/// empty list; records that fail to decode are skipped.
pub fn load_tasks(path: &Path) -> Vec<Task> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no task document yet");
            return Vec::new();
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read task document");
            return Vec::new();
        }
    };
    parse_document(&content)
}

/// Decode a task document from JSON text
pub fn parse_document(content: &str) -> Vec<Task> {
    if content.trim().is_empty() {
        return Vec::new();
    }

    let records: Vec<Value> = match serde_json::from_str(content) {
        Ok(Value::Array(records)) => records,
        Ok(_) => {
            warn!("task document is not a JSON array, ignoring it");
            return Vec::new();
        }
        Err(e) => {
            warn!(error = %e, "task document is not valid JSON, ignoring it");
            return Vec::new();
        }
    };

    records
        .into_iter()
        .enumerate()
        .filter_map(|(i, record)| match Task::deserialize(record) {
            Ok(task) => Some(task),
            Err(e) => {
                warn!(index = i, error = %e, "skipping malformed task record");
                None
            }
        })
        .collect()
}

/// Encode tasks as the pretty-printed task document
pub fn serialize_document(tasks: &[Task]) -> Result<String, StoreError> {
    Ok(serde_json::to_string_pretty(tasks)?)
}

/// Write the task document, creating its directory if needed
pub fn save_tasks(path: &Path, tasks: &[Task]) -> Result<(), StoreError> {
    let content = serialize_document(tasks)?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| StoreError::WriteError {
            path: dir.to_path_buf(),
            source: e,
        })?;
    }
    atomic_write(path, content.as_bytes()).map_err(|e| StoreError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })
}
