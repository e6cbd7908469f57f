use std::path::PathBuf;

use thiserror::Error;

use super::audio_clip::AudioClip;
use super::transcript_segment::TranscriptSegment;

#[derive(Error, Debug)]
pub enum TranscriptionError {
    #[error("whisper model not found at: {0}")]
    ModelNotFound(PathBuf),
    #[error("failed to load whisper model: {0}")]
    ModelLoad(String),
    #[error("failed to decode narration audio {path}: {message}")]
    AudioDecode { path: PathBuf, message: String },
    #[error("narration audio {0} has no audio stream")]
    NoAudio(PathBuf),
    #[error("whisper inference failed: {0}")]
    Inference(String),
}

/// Domain interface for speech-to-text segmentation.
///
/// Implementations return segment-level timings in playback order. The order
/// and `end > start` are part of the contract and are not re-checked by callers.
pub trait SpeechSegmenter {
    fn segment(
        &self,
        audio: &AudioClip,
        language: &str,
    ) -> Result<Vec<TranscriptSegment>, TranscriptionError>;
}
