use std::path::Path;

use super::audio_clip::AudioClip;
use super::speech_segmenter::TranscriptionError;

/// Loads narration audio as mono PCM at a requested sample rate.
pub trait AudioSource {
    fn read_mono(&self, path: &Path, sample_rate: u32) -> Result<AudioClip, TranscriptionError>;
}
