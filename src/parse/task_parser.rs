use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::model::task::{EntityError, Step, Task};
use crate::parse::segment::{SentenceSegmenter, TextSegmenter};

/// Turns a pasted text block into tasks, one per non-blank line.
///
/// Each line is run through the segmenter. The first fragment becomes the
/// title; when a line yields two or more fragments, every fragment
/// (including the first) becomes a step.
pub struct TaskParser<S = SentenceSegmenter> {
    segmenter: S,
}

impl Default for TaskParser<SentenceSegmenter> {
    fn default() -> Self {
        TaskParser::new(SentenceSegmenter)
    }
}

impl<S: TextSegmenter> TaskParser<S> {
    pub fn new(segmenter: S) -> Self {
        TaskParser { segmenter }
    }

    /// Parse with the current time as every task's creation time
    pub fn parse(&self, text_block: &str) -> Vec<Task> {
        self.parse_at(text_block, Utc::now())
    }

    /// Parse a text block. All tasks share `created_at`. Never fails:
    /// segmentation trouble degrades to a single-fragment line.
    pub fn parse_at(&self, text_block: &str, created_at: DateTime<Utc>) -> Vec<Task> {
        let mut tasks = Vec::new();

        for line in text_block.trim().lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let fragments = self.fragments(line);
            if fragments.is_empty() {
                debug!(line, "line has no usable fragments, skipped");
                continue;
            }

            match build_task(line, fragments, created_at) {
                Ok(task) => tasks.push(task),
                Err(e) => warn!(line, error = %e, "could not build task from line"),
            }
        }

        debug!(count = tasks.len(), "parsed text block");
        tasks
    }

    /// Segment a trimmed line, falling back to the whole line on error or
    /// empty output. Returned fragments are trimmed and non-empty.
    fn fragments(&self, line: &str) -> Vec<String> {
        let raw = match self.segmenter.segment(line) {
            Ok(fragments) if !fragments.is_empty() => fragments,
            Ok(_) => {
                debug!(line, "segmenter returned no fragments, using whole line");
                vec![line.to_string()]
            }
            Err(e) => {
                warn!(line, error = %e, "segmentation failed, using whole line");
                vec![line.to_string()]
            }
        };

        raw.into_iter()
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .collect()
    }
}

/// Step indices are assigned after blank fragments are dropped, so they
/// always run 0..n-1.
fn build_task(
    line: &str,
    fragments: Vec<String>,
    created_at: DateTime<Utc>,
) -> Result<Task, EntityError> {
    let mut task = Task::new(fragments[0].clone(), line, created_at)?;
    if fragments.len() > 1 {
        task.steps = fragments
            .into_iter()
            .enumerate()
            .map(|(i, text)| Step::new(i, text))
            .collect::<Result<_, _>>()?;
    }
    Ok(task)
}
