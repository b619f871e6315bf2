use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Rejected entity construction
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntityError {
    #[error("task title must not be empty")]
    EmptyTitle,
    #[error("step text must not be empty")]
    EmptyStepText,
}

/// Generate a fresh random id (UUID v4). Step ids come from the same
/// generator, so they are unique across the whole store, not just their task.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Presentation state of a task, derived from its fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Progress {
    Unchecked,
    /// Some but not all steps done. Never stored.
    Partial,
    Checked,
}

impl Progress {
    /// The character used inside the checkbox `[ ]`
    pub fn checkbox_char(self) -> char {
        match self {
            Progress::Unchecked => ' ',
            Progress::Partial => '~',
            Progress::Checked => 'x',
        }
    }
}

/// One checklist item, derived from a single pasted line.
///
/// Field names on the wire follow the persisted task document
/// (`task_id`, `task_title`, ...), so a `Vec<Task>` serializes straight
/// into `tasks.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "task_id")]
    pub id: String,
    #[serde(rename = "task_title")]
    pub title: String,
    /// The trimmed line this task was parsed from
    #[serde(rename = "original_text_block", default)]
    pub source_text: String,
    #[serde(rename = "created_timestamp", default, with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    /// Derived from `steps` when there are any; set directly otherwise
    #[serde(default)]
    pub completed: bool,
    #[serde(rename = "completed_timestamp", default, with = "timestamp")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// An ordered sub-item of a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    #[serde(rename = "step_id")]
    pub id: String,
    /// Zero-based position within the parent task
    #[serde(rename = "step_index", default)]
    pub order_index: usize,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(rename = "completed_timestamp", default, with = "timestamp")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create an unchecked task with a fresh id and no steps
    pub fn new(
        title: impl Into<String>,
        source_text: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, EntityError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(EntityError::EmptyTitle);
        }
        Ok(Task {
            id: new_id(),
            title,
            source_text: source_text.into(),
            created_at: Some(created_at),
            completed: false,
            completed_at: None,
            steps: Vec::new(),
        })
    }

    /// A task without steps is checked and unchecked directly
    pub fn is_directly_checkable(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn completed_steps(&self) -> usize {
        self.steps.iter().filter(|s| s.completed).count()
    }

    pub fn progress(&self) -> Progress {
        if self.completed {
            Progress::Checked
        } else if self.steps.iter().any(|s| s.completed) {
            Progress::Partial
        } else {
            Progress::Unchecked
        }
    }

    pub fn find_step(&self, step_id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == step_id)
    }

    pub fn find_step_mut(&mut self, step_id: &str) -> Option<&mut Step> {
        self.steps.iter_mut().find(|s| s.id == step_id)
    }
}

impl Step {
    /// Create an unchecked step with a fresh id
    pub fn new(order_index: usize, text: impl Into<String>) -> Result<Self, EntityError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(EntityError::EmptyStepText);
        }
        Ok(Step {
            id: new_id(),
            order_index,
            text,
            completed: false,
            completed_at: None,
        })
    }
}

/// Lenient (de)serialization for optional timestamps.
///
/// Writes RFC 3339 in UTC. Reads RFC 3339, or a naive ISO-8601 datetime
/// (no offset) which is taken as local time. Anything unparseable, or a
/// non-string value, reads as `None` instead of failing the record.
pub(crate) mod timestamp {
    use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, TimeZone, Utc};
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => {
                let parsed = parse(&s);
                if parsed.is_none() {
                    tracing::warn!(value = %s, "unparseable timestamp, treating as null");
                }
                parsed
            }
            Some(other) => {
                tracing::warn!(value = %other, "non-string timestamp, treating as null");
                None
            }
        })
    }

    pub fn parse(s: &str) -> Option<DateTime<Utc>> {
        let s = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }
        NAIVE_FORMATS.iter().find_map(|fmt| {
            let naive = NaiveDateTime::parse_from_str(s, fmt).ok()?;
            Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
        })
    }
}
