use unicode_segmentation::UnicodeSegmentation;

use crate::model::SegmenterKind;

/// Error type for segmentation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SegmentError {
    #[error("segmenter unavailable: {0}")]
    Unavailable(String),
    #[error("could not segment line: {0}")]
    Failed(String),
}

/// Splits one line of text into ordered sentence-like fragments.
///
/// Implementations may return fragments with surrounding whitespace, or
/// blank fragments; the task parser trims and filters them.
pub trait TextSegmenter {
    fn segment(&self, line: &str) -> Result<Vec<String>, SegmentError>;
}

impl TextSegmenter for Box<dyn TextSegmenter> {
    fn segment(&self, line: &str) -> Result<Vec<String>, SegmentError> {
        (**self).segment(line)
    }
}

/// Unicode (UAX #29) sentence boundaries. Sentences with no alphanumeric
/// content are skipped, so a line of bare punctuation yields nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct SentenceSegmenter;

impl TextSegmenter for SentenceSegmenter {
    fn segment(&self, line: &str) -> Result<Vec<String>, SegmentError> {
        Ok(line.unicode_sentences().map(str::to_string).collect())
    }
}

/// Treats the whole line as a single fragment
#[derive(Debug, Clone, Copy, Default)]
pub struct LineSegmenter;

impl TextSegmenter for LineSegmenter {
    fn segment(&self, line: &str) -> Result<Vec<String>, SegmentError> {
        Ok(vec![line.to_string()])
    }
}

/// Build the segmenter selected in config
pub fn segmenter_for(kind: SegmenterKind) -> Box<dyn TextSegmenter> {
    match kind {
        SegmenterKind::Sentence => Box::new(SentenceSegmenter),
        SegmenterKind::Line => Box::new(LineSegmenter),
    }
}
