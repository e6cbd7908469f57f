use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::job_error::JobError;
use super::pipeline_logger::PipelineLogger;
use crate::captions::domain::caption::Caption;
use crate::captions::domain::caption_renderer::{CaptionImage, CaptionRenderer};
use crate::captions::domain::segment_aligner::align;
use crate::media::domain::background_selector::{
    choose_background_file, select_offset, BackgroundClip,
};
use crate::media::domain::composition_plan::CompositionPlan;
use crate::media::domain::media_probe::MediaProbe;
use crate::media::domain::video_encoder::VideoEncoder;
use crate::narration::domain::sentence::{normalize_narration, split_sentences};
use crate::shared::config::ReelConfig;
use crate::shared::constants::WHISPER_SAMPLE_RATE;
use crate::shared::validation::ValidationError;
use crate::transcription::domain::audio_source::AudioSource;
use crate::transcription::domain::speech_segmenter::SpeechSegmenter;

/// The inputs of one reel: a narration recording and the text it reads.
#[derive(Clone, Debug)]
pub struct NarrationJob {
    pub audio: PathBuf,
    pub text: String,
}

/// What a finished job produced.
#[derive(Clone, Debug)]
pub struct ReelOutput {
    pub video: PathBuf,
    pub duration: f64,
    pub background: PathBuf,
    pub background_offset: f64,
    pub captions: Vec<Caption>,
    /// Left on disk after the job for inspection.
    pub caption_images: Vec<CaptionImage>,
}

/// Runs one reel job end to end, strictly in sequence:
/// transcribe, split, align, render each caption, then compose and encode.
///
/// The first failing stage aborts the job; nothing is retried and no partial
/// video is produced.
pub struct ComposeReelUseCase {
    audio_source: Box<dyn AudioSource>,
    segmenter: Box<dyn SpeechSegmenter>,
    renderer: Box<dyn CaptionRenderer>,
    probe: Box<dyn MediaProbe>,
    encoder: Box<dyn VideoEncoder>,
    config: ReelConfig,
}

impl ComposeReelUseCase {
    pub fn new(
        audio_source: Box<dyn AudioSource>,
        segmenter: Box<dyn SpeechSegmenter>,
        renderer: Box<dyn CaptionRenderer>,
        probe: Box<dyn MediaProbe>,
        encoder: Box<dyn VideoEncoder>,
        config: ReelConfig,
    ) -> Self {
        Self {
            audio_source,
            segmenter,
            renderer,
            probe,
            encoder,
            config,
        }
    }

    /// Fails with `MissingAsset` when the background location has no usable
    /// clip. Callers run this before any expensive setup.
    pub fn precheck_background(location: &Path) -> Result<(), JobError> {
        if location.is_file() {
            return Ok(());
        }
        // Directory pools are validated by actually picking from them.
        choose_background_file(location, &mut StdRng::seed_from_u64(0))?;
        Ok(())
    }

    pub fn run(
        &mut self,
        job: &NarrationJob,
        logger: &mut dyn PipelineLogger,
    ) -> Result<ReelOutput, JobError> {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        // 1. Background precondition, before any processing
        let background = choose_background_file(&self.config.background, &mut rng)?;
        logger.info(&format!("Background: {}", background.display()));

        // 2. Transcribe
        let t = Instant::now();
        let audio = self
            .audio_source
            .read_mono(&job.audio, WHISPER_SAMPLE_RATE)?;
        let segments = self.segmenter.segment(&audio, &self.config.language)?;
        logger.timing("transcribe", elapsed_ms(t));
        logger.metric("segments", segments.len() as f64);

        // 3. Split
        let t = Instant::now();
        let sentences = split_sentences(&normalize_narration(&job.text));
        if sentences.is_empty() {
            return Err(ValidationError::Empty {
                field: "narration text",
            }
            .into());
        }
        logger.timing("split", elapsed_ms(t));
        logger.metric("sentences", sentences.len() as f64);

        // 4. Align
        let t = Instant::now();
        let captions = align(
            &sentences,
            &segments,
            self.config.default_caption_duration,
        )?;
        logger.timing("align", elapsed_ms(t));

        // 5. Render, one blocking call per caption
        let t = Instant::now();
        let mut images = Vec::with_capacity(captions.len());
        for (i, caption) in captions.iter().enumerate() {
            let image = self.renderer.render(caption)?;
            logger.metric("caption_font_size", f64::from(image.font_size));
            logger.progress(i + 1, captions.len());
            images.push(image);
        }
        logger.timing("render", elapsed_ms(t));

        // 6. Compose and encode
        let t = Instant::now();
        let duration = self.probe.duration(&job.audio)?;
        let clip = BackgroundClip {
            duration: self.probe.duration(&background)?,
            path: background.clone(),
        };
        let offset = select_offset(&clip, duration, &mut rng);
        let window = clip.window(offset, duration);
        if clip.duration < duration {
            logger.info(&format!(
                "Background is {:.1}s for {:.1}s of narration, looping",
                clip.duration, duration
            ));
        }

        let late = captions.iter().filter(|c| c.end() > duration).count();
        if late > 0 {
            log::warn!("{late} captions extend past the end of the narration");
        }

        let plan = self.build_plan(&clip.path, offset, window, duration, &captions, &images, &job.audio)?;
        let output = self.output_path();
        self.encoder.encode(&plan, &output)?;
        logger.timing("compose", elapsed_ms(t));
        logger.metric("output_seconds", duration);
        logger.info(&format!("Reel written to {}", output.display()));
        logger.summary();

        Ok(ReelOutput {
            video: output,
            duration,
            background,
            background_offset: offset,
            captions,
            caption_images: images,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn build_plan(
        &self,
        background: &Path,
        offset: f64,
        window: f64,
        duration: f64,
        captions: &[Caption],
        images: &[CaptionImage],
        narration: &Path,
    ) -> Result<CompositionPlan, JobError> {
        let canvas = &self.config.canvas;
        let mut plan = CompositionPlan::open(background, offset, window)?
            .scale(canvas.width)?
            .pad(canvas.width, canvas.height, &canvas.pad_color)?
            .loop_to(duration, canvas.fps)?
            .trim(duration)?;
        for (caption, image) in captions.iter().zip(images) {
            plan = plan.overlay(image, caption, self.config.fade_duration)?;
        }
        Ok(plan.mux_audio(narration)?)
    }

    fn output_path(&self) -> PathBuf {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        self.config.output_dir.join(format!("final_{secs}.mp4"))
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
