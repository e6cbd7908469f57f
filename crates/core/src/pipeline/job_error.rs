use thiserror::Error;

use crate::captions::domain::caption_renderer::RenderError;
use crate::media::domain::background_selector::BackgroundError;
use crate::media::domain::composition_plan::CompositionError;
use crate::shared::validation::ValidationError;
use crate::transcription::domain::speech_segmenter::TranscriptionError;

/// The single failure a reel job surfaces, tagged with the stage that failed.
///
/// The message already carries the underlying error's text, so variants do
/// not expose it again as a `source`.
#[derive(Error, Debug)]
pub enum JobError {
    #[error("background asset not found: {0}")]
    MissingAsset(BackgroundError),
    #[error("invalid job input: {0}")]
    InvalidInput(ValidationError),
    #[error("Error transcribing narration: {0}")]
    Transcription(TranscriptionError),
    #[error("Error creating caption image: {0}")]
    Render(RenderError),
    #[error("Error composing video: {0}")]
    Composition(CompositionError),
}

impl From<BackgroundError> for JobError {
    fn from(e: BackgroundError) -> Self {
        JobError::MissingAsset(e)
    }
}

impl From<ValidationError> for JobError {
    fn from(e: ValidationError) -> Self {
        JobError::InvalidInput(e)
    }
}

impl From<TranscriptionError> for JobError {
    fn from(e: TranscriptionError) -> Self {
        JobError::Transcription(e)
    }
}

impl From<RenderError> for JobError {
    fn from(e: RenderError) -> Self {
        JobError::Render(e)
    }
}

impl From<CompositionError> for JobError {
    fn from(e: CompositionError) -> Self {
        JobError::Composition(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::path::PathBuf;

    #[test]
    fn test_missing_asset_message() {
        let err = JobError::from(BackgroundError::NotFound(PathBuf::from("assets/bg.mp4")));
        assert_eq!(err.to_string(), "background asset not found: assets/bg.mp4");
        assert!(err.source().is_none());
    }

    #[test]
    fn test_cause_text_appears_once() {
        let err = JobError::from(CompositionError::EncoderFailed {
            status: "exit status: 1".into(),
            stderr: "Invalid data found when processing input".into(),
        });
        let mut chain = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            chain.push_str(&cause.to_string());
            source = cause.source();
        }
        assert_eq!(chain.matches("Invalid data found").count(), 1);
    }

    #[test]
    fn test_stage_context_prefixes() {
        let render = JobError::from(RenderError::EmptyText);
        assert!(render.to_string().starts_with("Error creating caption image: "));

        let compose = JobError::from(CompositionError::EncoderNotFound);
        assert!(compose.to_string().starts_with("Error composing video: "));

        let transcribe = JobError::from(TranscriptionError::Inference("boom".into()));
        assert!(transcribe
            .to_string()
            .starts_with("Error transcribing narration: "));
    }
}
