pub mod segment;
pub mod task_parser;

pub use segment::{
    LineSegmenter, SegmentError, SentenceSegmenter, TextSegmenter, segmenter_for,
};
pub use task_parser::TaskParser;
