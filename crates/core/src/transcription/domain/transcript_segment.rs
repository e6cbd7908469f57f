use crate::shared::validation::{check_window, ValidationError};

/// A timed span of recognized speech. Times are seconds from the start of the audio.
#[derive(Clone, Debug, PartialEq)]
pub struct TranscriptSegment {
    start: f64,
    end: f64,
    text: String,
}

impl TranscriptSegment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Result<Self, ValidationError> {
        check_window(start, end)?;
        Ok(Self {
            start,
            end,
            text: text.into(),
        })
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}
