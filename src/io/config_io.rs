use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::io::tasks_io::atomic_write;
use crate::model::config::AppConfig;

/// Error type for config operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(#[from] serde_json::Error),
    #[error("invalid key path: '{0}'")]
    InvalidKeyPath(String),
    #[error("{path} is not a JSON object; fix or remove it before changing settings")]
    Unparsed { path: PathBuf },
}

/// config.json layered over the built-in defaults.
///
/// `document` is the merged JSON (defaults with the file on top) and is
/// what `get`/`set` address; `config` is its typed form. When the file has
/// values of the wrong type, `document` still carries them and `config`
/// falls back to the defaults until `set` repairs them.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    document: Value,
    config: AppConfig,
    /// False when the file could not be parsed at all; `set` would lose it
    writable: bool,
}

impl ConfigStore {
    /// Load the config file. A missing file is created from the defaults.
    /// A file that is not valid JSON, or whose values have the wrong
    /// types, is ignored with a warning and left on disk untouched.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let document = default_document()?;
        let store = |document, config, writable| ConfigStore {
            path: path.to_path_buf(),
            document,
            config,
            writable,
        };

        match fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str::<Value>(&text) {
                Ok(Value::Object(overlay)) => {
                    let mut merged = document.clone();
                    deep_merge(&mut merged, Value::Object(overlay));
                    let config = match AppConfig::deserialize(&merged) {
                        Ok(config) => {
                            debug!(path = %path.display(), "config loaded");
                            config
                        }
                        Err(e) => {
                            warn!(path = %path.display(), error = %e, "config has invalid values, using defaults");
                            AppConfig::default()
                        }
                    };
                    return Ok(store(merged, config, true));
                }
                Ok(_) => warn!(path = %path.display(), "config is not a JSON object, using defaults"),
                Err(e) => warn!(path = %path.display(), error = %e, "config is not valid JSON, using defaults"),
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let created = store(document, AppConfig::default(), true);
                if let Err(e) = created.write() {
                    warn!(error = %e, "could not create default config");
                }
                return Ok(created);
            }
            Err(e) => {
                return Err(ConfigError::ReadError {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
        }

        Ok(store(document, AppConfig::default(), false))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Look up a dotted key path such as `window.anchor`
    pub fn get(&self, key_path: &str) -> Option<&Value> {
        let mut current = &self.document;
        for part in split_key_path(key_path).ok()? {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    /// Set a dotted key path, creating intermediate objects. The result
    /// must still be a valid config; on success it is written to disk.
    /// Refused while the file on disk could not be parsed.
    pub fn set(&mut self, key_path: &str, value: Value) -> Result<(), ConfigError> {
        if !self.writable {
            return Err(ConfigError::Unparsed {
                path: self.path.clone(),
            });
        }
        let parts = split_key_path(key_path)?;
        let mut document = self.document.clone();
        set_in(&mut document, &parts, value)
            .ok_or_else(|| ConfigError::InvalidKeyPath(key_path.to_string()))?;
        let config = AppConfig::deserialize(&document)?;

        self.document = document;
        self.config = config;
        self.write()
    }

    fn write(&self) -> Result<(), ConfigError> {
        let write_err = |e| ConfigError::WriteError {
            path: self.path.clone(),
            source: e,
        };
        let text = serde_json::to_string_pretty(&self.document)?;
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(write_err)?;
        }
        atomic_write(&self.path, text.as_bytes()).map_err(write_err)
    }
}

fn default_document() -> Result<Value, ConfigError> {
    Ok(serde_json::to_value(AppConfig::default())?)
}

fn split_key_path(key_path: &str) -> Result<Vec<&str>, ConfigError> {
    let parts: Vec<&str> = key_path.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(ConfigError::InvalidKeyPath(key_path.to_string()));
    }
    Ok(parts)
}

/// Returns None if a non-object sits where an intermediate object is needed
fn set_in(target: &mut Value, parts: &[&str], value: Value) -> Option<()> {
    let (last, parents) = parts.split_last()?;
    let mut current = target;
    for part in parents {
        current = current
            .as_object_mut()?
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    current.as_object_mut()?.insert(last.to_string(), value);
    Some(())
}

/// Merge `overlay` into `base`: objects merge key by key, anything else
/// replaces.
pub fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Interpret a command-line value: JSON if it parses, else a plain string
pub fn parse_cli_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
