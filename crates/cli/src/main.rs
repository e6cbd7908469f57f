use std::path::PathBuf;
use std::process;

use clap::Parser;

use newsreel_core::captions::infrastructure::fontdue_caption_renderer::FontdueCaptionRenderer;
use newsreel_core::media::domain::video_encoder::EncodeSettings;
use newsreel_core::media::infrastructure::ffmpeg_audio_reader::FfmpegAudioReader;
use newsreel_core::media::infrastructure::ffmpeg_cli_encoder::{is_ffmpeg_on_path, FfmpegCliEncoder};
use newsreel_core::media::infrastructure::ffmpeg_probe::FfmpegProbe;
use newsreel_core::pipeline::compose_reel_use_case::{ComposeReelUseCase, NarrationJob};
use newsreel_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use newsreel_core::shared::config::ReelConfig;
use newsreel_core::shared::model_resolver;
use newsreel_core::transcription::infrastructure::whisper_segmenter::WhisperSegmenter;

/// Captioned vertical video from a narration recording and its text.
#[derive(Parser)]
#[command(name = "newsreel")]
struct Cli {
    /// Narration audio file.
    #[arg(long)]
    audio: PathBuf,

    /// Narration text, as read in the recording.
    #[arg(long, conflicts_with = "text_file", required_unless_present = "text_file")]
    text: Option<String>,

    /// File holding the narration text.
    #[arg(long)]
    text_file: Option<PathBuf>,

    /// Background clip, or a directory of clips to pick from.
    #[arg(long)]
    background: Option<PathBuf>,

    /// Directory the final video is written to.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Directory caption images are written to (kept after the run).
    #[arg(long)]
    caption_dir: Option<PathBuf>,

    /// JSON config file (defaults to the per-user config if present).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Narration language code passed to whisper.
    #[arg(long)]
    language: Option<String>,

    /// Whisper model file (skips cache lookup and download).
    #[arg(long)]
    model: Option<PathBuf>,

    /// Seed for background clip and offset selection.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = build_config(&cli)?;
    let text = narration_text(&cli)?;

    if !cli.audio.exists() {
        return Err(format!("Narration audio not found: {}", cli.audio.display()).into());
    }
    ComposeReelUseCase::precheck_background(&config.background)?;
    if !is_ffmpeg_on_path() {
        return Err("ffmpeg is required for encoding, but was not found on PATH".into());
    }

    log::info!("Resolving model: {}", config.whisper_model_name);
    let model_path = model_resolver::resolve(
        &config.whisper_model_name,
        &config.whisper_model_url,
        config.whisper_model_path.as_deref(),
        Some(Box::new(download_progress)),
    )?;
    eprintln!();

    let segmenter = WhisperSegmenter::new(&model_path)?;
    let renderer = FontdueCaptionRenderer::new(&config.caption, &config.canvas, &config.caption_dir)?;
    log::info!("Captions use the {}", renderer.font_source());
    let encoder = FfmpegCliEncoder::new(EncodeSettings::from_config(
        &config.encode,
        config.canvas.fps,
    ));

    let mut use_case = ComposeReelUseCase::new(
        Box::new(FfmpegAudioReader),
        Box::new(segmenter),
        Box::new(renderer),
        Box::new(FfmpegProbe),
        Box::new(encoder),
        config,
    );
    let job = NarrationJob {
        audio: cli.audio,
        text,
    };
    let mut logger = StdoutPipelineLogger::new();
    let output = use_case.run(&job, &mut logger)?;

    println!("{}", output.video.display());
    Ok(())
}

/// Config file (explicit, else per-user, else defaults) with CLI overrides.
fn build_config(cli: &Cli) -> Result<ReelConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => ReelConfig::load_from(path)?,
        None => ReelConfig::load_default()?,
    };
    if let Some(background) = &cli.background {
        config.background = background.clone();
    }
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(dir) = &cli.caption_dir {
        config.caption_dir = dir.clone();
    }
    if let Some(language) = &cli.language {
        config.language = language.clone();
    }
    if let Some(model) = &cli.model {
        config.whisper_model_path = Some(model.clone());
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    config.validate()?;
    Ok(config)
}

fn narration_text(cli: &Cli) -> Result<String, Box<dyn std::error::Error>> {
    let text = match (&cli.text, &cli.text_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read narration text {}: {e}", path.display()))?,
        (None, None) => return Err("Either --text or --text-file is required".into()),
    };
    if text.trim().is_empty() {
        return Err("Narration text is empty".into());
    }
    Ok(text)
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading whisper model... {pct}%");
    } else {
        eprint!("\rDownloading whisper model... {downloaded} bytes");
    }
}
