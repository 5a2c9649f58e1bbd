//! Transcript emission.
//!
//! Each window's result is reported as soon as the recognition call returns:
//! one detected-language line, then every segment in chronological order.
//! Nothing is buffered or reordered across windows.

use crate::log_debug_content;
use crate::stt::{Segment, Transcription};
use anyhow::Result;

/// Destination for per-window transcription results. Implementations must
/// emit every segment of every window, in order.
pub trait TranscriptSink {
    fn emit(&mut self, transcription: &Transcription) -> Result<()>;
}

pub(crate) fn format_language_line(transcription: &Transcription) -> String {
    format!(
        "Detected language '{}' with probability {:.2}",
        transcription.language, transcription.language_probability
    )
}

pub(crate) fn format_segment(segment: &Segment) -> String {
    format!(
        "[{:.2}s -> {:.2}s] {}",
        segment.start, segment.end, segment.text
    )
}

/// Prints results to stdout, one line per language detection and per segment.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    pub fn new() -> Self {
        Self
    }
}

impl TranscriptSink for ConsoleSink {
    fn emit(&mut self, transcription: &Transcription) -> Result<()> {
        println!("{}", format_language_line(transcription));
        for segment in &transcription.segments {
            let line = format_segment(segment);
            println!("{line}");
            // Transcript text is user content; only mirrored into the debug
            // log when --log-content is set.
            log_debug_content(&line);
        }
        Ok(())
    }
}
