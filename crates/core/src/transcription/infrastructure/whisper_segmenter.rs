use std::path::{Path, PathBuf};

use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::shared::constants::WHISPER_SAMPLE_RATE;
use crate::transcription::domain::audio_clip::AudioClip;
use crate::transcription::domain::speech_segmenter::{SpeechSegmenter, TranscriptionError};
use crate::transcription::domain::transcript_segment::TranscriptSegment;

/// Speech segmenter using whisper.cpp via whisper-rs.
///
/// Produces one [`TranscriptSegment`] per whisper segment. The model is loaded
/// per call; a job transcribes exactly once.
#[derive(Debug)]
pub struct WhisperSegmenter {
    model_path: PathBuf,
}

impl WhisperSegmenter {
    pub fn new(model_path: &Path) -> Result<Self, TranscriptionError> {
        if !model_path.exists() {
            return Err(TranscriptionError::ModelNotFound(model_path.to_path_buf()));
        }
        Ok(Self {
            model_path: model_path.to_path_buf(),
        })
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }
}

impl SpeechSegmenter for WhisperSegmenter {
    fn segment(
        &self,
        audio: &AudioClip,
        language: &str,
    ) -> Result<Vec<TranscriptSegment>, TranscriptionError> {
        if audio.sample_rate() != WHISPER_SAMPLE_RATE {
            return Err(TranscriptionError::Inference(format!(
                "expected {WHISPER_SAMPLE_RATE} Hz audio, got {} Hz",
                audio.sample_rate()
            )));
        }

        let model_path = self
            .model_path
            .to_str()
            .ok_or_else(|| TranscriptionError::ModelLoad("model path is not UTF-8".into()))?;
        let ctx = WhisperContext::new_with_params(model_path, WhisperContextParameters::default())
            .map_err(|e| TranscriptionError::ModelLoad(e.to_string()))?;

        let mut state = ctx
            .create_state()
            .map_err(|e| TranscriptionError::ModelLoad(format!("failed to create state: {e}")))?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_language(Some(language));
        params.set_translate(false);
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        params.set_n_threads(num_cpus().min(4) as i32);

        state
            .full(params, audio.samples())
            .map_err(|e| TranscriptionError::Inference(e.to_string()))?;

        let mut segments = Vec::new();
        let num_segments = state.full_n_segments();

        for seg_idx in 0..num_segments {
            let Some(segment) = state.get_segment(seg_idx) else {
                continue;
            };

            // Segment timestamps are in centiseconds (10ms units)
            let start = segment.start_timestamp() as f64 / 100.0;
            let end = segment.end_timestamp() as f64 / 100.0;
            let text = segment
                .to_str()
                .map(|t| t.trim().to_string())
                .unwrap_or_default();

            match TranscriptSegment::new(start, end, text) {
                Ok(seg) => segments.push(seg),
                Err(e) => log::debug!("Dropping whisper segment {seg_idx}: {e}"),
            }
        }

        log::info!(
            "Transcribed {:.1}s of audio into {} segments",
            audio.duration(),
            segments.len()
        );
        Ok(segments)
    }
}

fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_nonexistent_path_returns_error() {
        let result = WhisperSegmenter::new(Path::new("/nonexistent/model.bin"));
        assert!(matches!(result, Err(TranscriptionError::ModelNotFound(_))));
    }

    #[test]
    fn test_new_nonexistent_path_error_message() {
        let err = WhisperSegmenter::new(Path::new("/nonexistent/model.bin")).unwrap_err();
        assert!(
            err.to_string().contains("not found"),
            "Expected 'not found' in error, got: {err}"
        );
    }

    #[test]
    fn test_wrong_sample_rate_rejected_before_model_load() {
        let tmp = tempfile::TempDir::new().unwrap();
        let model = tmp.path().join("model.bin");
        std::fs::write(&model, b"not a real model").unwrap();

        let segmenter = WhisperSegmenter::new(&model).unwrap();
        let audio = AudioClip::new(vec![0.0; 44100], 44100);
        let result = segmenter.segment(&audio, "el");
        assert!(matches!(result, Err(TranscriptionError::Inference(_))));
    }

    #[test]
    #[ignore] // Requires whisper model file
    fn test_segment_does_not_crash_on_sine_wave() {
        let model_path = crate::shared::model_resolver::resolve(
            crate::shared::constants::WHISPER_MODEL_NAME,
            crate::shared::constants::WHISPER_MODEL_URL,
            None,
            None,
        )
        .expect("Failed to resolve whisper model");

        let segmenter = WhisperSegmenter::new(&model_path).expect("Failed to create segmenter");

        let len = (3.0 * WHISPER_SAMPLE_RATE as f64) as usize;
        let samples: Vec<f32> = (0..len)
            .map(|i| {
                let t = i as f64 / WHISPER_SAMPLE_RATE as f64;
                (2.0 * std::f64::consts::PI * 440.0 * t).sin() as f32
            })
            .collect();
        let audio = AudioClip::new(samples, WHISPER_SAMPLE_RATE);

        let result = segmenter.segment(&audio, "en");
        assert!(result.is_ok(), "Segmentation should not error: {result:?}");
    }
}
