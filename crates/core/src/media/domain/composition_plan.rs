use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::captions::domain::caption::Caption;
use crate::captions::domain::caption_renderer::CaptionImage;

#[derive(Error, Debug)]
pub enum CompositionError {
    #[error("stage '{stage}' cannot follow '{after}'")]
    OutOfOrder {
        stage: &'static str,
        after: &'static str,
    },
    #[error("caption overlay at {start:.3}s precedes the previous one at {previous:.3}s")]
    NotChronological { start: f64, previous: f64 },
    #[error("invalid {stage} parameter: {message}")]
    InvalidParameter {
        stage: &'static str,
        message: String,
    },
    #[error("composition plan is incomplete: {0}")]
    Incomplete(&'static str),
    #[error("failed to probe {path}: {message}")]
    Probe { path: PathBuf, message: String },
    #[error("ffmpeg executable not found on PATH")]
    EncoderNotFound,
    #[error("failed to launch ffmpeg: {0}")]
    EncoderSpawn(#[source] std::io::Error),
    #[error("ffmpeg exited with {status}: {stderr}")]
    EncoderFailed { status: String, stderr: String },
    #[error("failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// One transform in the render graph, in the order it is applied.
#[derive(Clone, Debug, PartialEq)]
pub enum Stage {
    Open {
        source: PathBuf,
        offset: f64,
        window: f64,
    },
    Scale {
        width: u32,
    },
    Pad {
        width: u32,
        height: u32,
        color: String,
    },
    /// Repeats the background input `loops` extra times at the demuxer;
    /// `frames` is the window length in frames at `fps`.
    Loop {
        duration: f64,
        fps: u32,
        loops: u32,
        frames: u32,
    },
    Trim {
        duration: f64,
    },
    /// Caption shown over the closed interval `[start, end]`.
    Overlay {
        image: PathBuf,
        input: usize,
        start: f64,
        end: f64,
        fade: f64,
    },
    MuxAudio {
        source: PathBuf,
        input: usize,
    },
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Open { .. } => "open",
            Stage::Scale { .. } => "scale",
            Stage::Pad { .. } => "pad",
            Stage::Loop { .. } => "loop",
            Stage::Trim { .. } => "trim",
            Stage::Overlay { .. } => "overlay",
            Stage::MuxAudio { .. } => "mux_audio",
        }
    }
}

/// A file fed to the encoder, with how it should be opened.
#[derive(Clone, Debug, PartialEq)]
pub enum MediaInput {
    /// Background clip read from `offset` for `window` seconds.
    Background {
        path: PathBuf,
        offset: f64,
        window: f64,
    },
    /// Still image repeated at `fps` for `duration` seconds.
    Still {
        path: PathBuf,
        fps: u32,
        duration: f64,
    },
    Audio {
        path: PathBuf,
    },
}

impl MediaInput {
    pub fn path(&self) -> &Path {
        match self {
            MediaInput::Background { path, .. }
            | MediaInput::Still { path, .. }
            | MediaInput::Audio { path } => path,
        }
    }
}

/// Immutable description of the render graph.
///
/// Built stage by stage: `open -> scale -> pad -> loop_to -> trim ->
/// overlay* -> mux_audio`. Each step consumes the plan and returns a new one,
/// or an error if the step is out of order or its parameters are invalid.
#[derive(Clone, Debug, PartialEq)]
pub struct CompositionPlan {
    stages: Vec<Stage>,
    inputs: Vec<MediaInput>,
}

impl CompositionPlan {
    /// Starts a plan from a background window `[offset, offset + window)`.
    pub fn open(source: impl Into<PathBuf>, offset: f64, window: f64) -> Result<Self, CompositionError> {
        if !offset.is_finite() || offset < 0.0 {
            return Err(invalid("open", format!("offset must be >= 0, got {offset}")));
        }
        if !window.is_finite() || window <= 0.0 {
            return Err(invalid("open", format!("window must be > 0, got {window}")));
        }
        let source = source.into();
        Ok(Self {
            stages: vec![Stage::Open {
                source: source.clone(),
                offset,
                window,
            }],
            inputs: vec![MediaInput::Background {
                path: source,
                offset,
                window,
            }],
        })
    }

    pub fn scale(self, width: u32) -> Result<Self, CompositionError> {
        self.expect_after("scale", &["open"])?;
        if width == 0 || width % 2 != 0 {
            return Err(invalid("scale", format!("width must be even and non-zero, got {width}")));
        }
        Ok(self.push(Stage::Scale { width }))
    }

    pub fn pad(self, width: u32, height: u32, color: &str) -> Result<Self, CompositionError> {
        self.expect_after("pad", &["scale"])?;
        let scaled = self.scaled_width().unwrap_or(width);
        if width < scaled || height == 0 || width % 2 != 0 || height % 2 != 0 {
            return Err(invalid(
                "pad",
                format!("canvas {width}x{height} must be even and at least the scaled width {scaled}"),
            ));
        }
        if color.trim().is_empty() {
            return Err(invalid("pad", "color must not be empty".into()));
        }
        Ok(self.push(Stage::Pad {
            width,
            height,
            color: color.to_string(),
        }))
    }

    /// Repeats the opened window until it covers `duration` seconds.
    ///
    /// The loop count is zero when the window already covers the duration.
    /// Repeats restart at the beginning of the file, so a window that needs
    /// them must be opened at offset 0.
    pub fn loop_to(self, duration: f64, fps: u32) -> Result<Self, CompositionError> {
        self.expect_after("loop", &["pad"])?;
        if !duration.is_finite() || duration <= 0.0 {
            return Err(invalid("loop", format!("duration must be > 0, got {duration}")));
        }
        if fps == 0 {
            return Err(invalid("loop", "fps must be > 0".into()));
        }
        let window = self.window();
        // Tolerance keeps an exact multiple from counting one loop too many.
        let loops = ((duration / window) - 1e-9).ceil().max(1.0) as u32 - 1;
        let frames = (window * fps as f64).ceil().max(1.0) as u32;
        let offset = self.offset();
        if loops > 0 && offset > 0.0 {
            return Err(invalid(
                "loop",
                format!("a repeating background must start at 0, got offset {offset}"),
            ));
        }
        Ok(self.push(Stage::Loop {
            duration,
            fps,
            loops,
            frames,
        }))
    }

    /// Cuts the looped stream to exactly `duration` seconds.
    pub fn trim(self, duration: f64) -> Result<Self, CompositionError> {
        self.expect_after("trim", &["loop"])?;
        let covered = match self.stages.last() {
            Some(Stage::Loop { duration, .. }) => *duration,
            _ => 0.0,
        };
        if !duration.is_finite() || duration <= 0.0 || duration > covered {
            return Err(invalid(
                "trim",
                format!("duration {duration} must be in (0, {covered}]"),
            ));
        }
        Ok(self.push(Stage::Trim { duration }))
    }

    /// Composites a caption image over the stream during the caption window.
    ///
    /// Captions must be added in chronological order. `fade` is clamped to
    /// half the window so the fade-in and fade-out never overlap.
    pub fn overlay(
        self,
        image: &CaptionImage,
        caption: &Caption,
        fade: f64,
    ) -> Result<Self, CompositionError> {
        self.expect_after("overlay", &["trim", "overlay"])?;
        if let Some(previous) = self.last_overlay_start() {
            if caption.start() < previous {
                return Err(CompositionError::NotChronological {
                    start: caption.start(),
                    previous,
                });
            }
        }
        if !fade.is_finite() || fade < 0.0 {
            return Err(invalid("overlay", format!("fade must be >= 0, got {fade}")));
        }
        let (fps, duration) = (self.fps(), self.duration().unwrap_or_default());
        let input = self.inputs.len();
        let mut plan = self.push(Stage::Overlay {
            image: image.path.clone(),
            input,
            start: caption.start(),
            end: caption.end(),
            fade: fade.min(caption.duration() / 2.0),
        });
        plan.inputs.push(MediaInput::Still {
            path: image.path.clone(),
            fps,
            duration,
        });
        Ok(plan)
    }

    /// Attaches the narration as the only audio stream.
    pub fn mux_audio(self, source: impl Into<PathBuf>) -> Result<Self, CompositionError> {
        self.expect_after("mux_audio", &["trim", "overlay"])?;
        let source = source.into();
        let input = self.inputs.len();
        let mut plan = self.push(Stage::MuxAudio {
            source: source.clone(),
            input,
        });
        plan.inputs.push(MediaInput::Audio { path: source });
        Ok(plan)
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn inputs(&self) -> &[MediaInput] {
        &self.inputs
    }

    /// True once audio has been attached, which is the last stage.
    pub fn is_complete(&self) -> bool {
        matches!(self.stages.last(), Some(Stage::MuxAudio { .. }))
    }

    /// Output length, known once the trim stage exists.
    pub fn duration(&self) -> Option<f64> {
        self.stages.iter().find_map(|s| match s {
            Stage::Trim { duration } => Some(*duration),
            _ => None,
        })
    }

    pub fn fps(&self) -> u32 {
        self.stages
            .iter()
            .find_map(|s| match s {
                Stage::Loop { fps, .. } => Some(*fps),
                _ => None,
            })
            .unwrap_or(crate::shared::constants::FRAME_RATE)
    }

    /// Extra passes over the background input and the seconds they must
    /// cover, when the window alone is too short.
    pub fn background_repeat(&self) -> Option<(u32, f64)> {
        self.stages.iter().find_map(|s| match s {
            Stage::Loop {
                loops, duration, ..
            } if *loops > 0 => Some((*loops, *duration)),
            _ => None,
        })
    }

    pub fn overlay_count(&self) -> usize {
        self.stages
            .iter()
            .filter(|s| matches!(s, Stage::Overlay { .. }))
            .count()
    }

    /// Input index of the narration track, once attached.
    pub fn audio_input(&self) -> Option<usize> {
        self.stages.iter().find_map(|s| match s {
            Stage::MuxAudio { input, .. } => Some(*input),
            _ => None,
        })
    }

    /// Label of the final video stream in [`Self::filter_complex`].
    pub fn output_label(&self) -> String {
        match self.overlay_count() {
            0 => "[base]".to_string(),
            n => format!("[v{}]", n - 1),
        }
    }

    /// Renders the video stages as an ffmpeg `-filter_complex` graph.
    ///
    /// The background chain ends in `[base]`; each overlay `k` reads caption
    /// input `[N:v]` into `[capk]` and produces `[vk]`.
    pub fn filter_complex(&self) -> String {
        let mut chain: Vec<String> = Vec::new();
        let mut graph = String::new();
        let mut current = "[base]".to_string();
        let mut overlay_index = 0usize;

        for stage in &self.stages {
            match stage {
                Stage::Open { .. } | Stage::MuxAudio { .. } => {}
                Stage::Scale { width } => chain.push(format!("scale={width}:-2")),
                Stage::Pad {
                    width,
                    height,
                    color,
                } => chain.push(format!(
                    "pad={width}:{height}:(ow-iw)/2:(oh-ih)/2:color={color}"
                )),
                // Repeats happen on the input side, see `background_repeat`.
                Stage::Loop { fps, .. } => chain.push(format!("fps={fps}")),
                Stage::Trim { duration } => {
                    chain.push(format!("trim=duration={}", format_seconds(*duration)));
                    chain.push("setpts=PTS-STARTPTS".to_string());
                    let _ = write!(graph, "[0:v]{}[base]", chain.join(","));
                }
                Stage::Overlay {
                    input,
                    start,
                    end,
                    fade,
                    ..
                } => {
                    let k = overlay_index;
                    let (st, en, d) = (
                        format_seconds(*start),
                        format_seconds(*end),
                        format_seconds(*fade),
                    );
                    let mut caption_chain = vec!["format=rgba".to_string()];
                    if *fade > 0.0 {
                        caption_chain.push(format!("fade=t=in:st={st}:d={d}:alpha=1"));
                        caption_chain.push(format!(
                            "fade=t=out:st={}:d={d}:alpha=1",
                            format_seconds(end - fade)
                        ));
                    }
                    let _ = write!(
                        graph,
                        ";[{input}:v]{}[cap{k}];{current}[cap{k}]overlay=0:0:enable='between(t,{st},{en})'[v{k}]",
                        caption_chain.join(",")
                    );
                    current = format!("[v{k}]");
                    overlay_index += 1;
                }
            }
        }
        graph
    }

    fn push(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    fn expect_after(&self, stage: &'static str, allowed: &[&str]) -> Result<(), CompositionError> {
        let after = self.stages.last().map_or("nothing", Stage::name);
        if allowed.contains(&after) {
            Ok(())
        } else {
            Err(CompositionError::OutOfOrder { stage, after })
        }
    }

    fn window(&self) -> f64 {
        match self.stages.first() {
            Some(Stage::Open { window, .. }) => *window,
            _ => 0.0,
        }
    }

    fn offset(&self) -> f64 {
        match self.stages.first() {
            Some(Stage::Open { offset, .. }) => *offset,
            _ => 0.0,
        }
    }

    fn scaled_width(&self) -> Option<u32> {
        self.stages.iter().find_map(|s| match s {
            Stage::Scale { width } => Some(*width),
            _ => None,
        })
    }

    fn last_overlay_start(&self) -> Option<f64> {
        self.stages.iter().rev().find_map(|s| match s {
            Stage::Overlay { start, .. } => Some(*start),
            _ => None,
        })
    }
}

/// Renders seconds for ffmpeg, floored to whole milliseconds so no rendered
/// time exceeds the value it stands for.
pub fn format_seconds(seconds: f64) -> String {
    // Sub-nanosecond slack absorbs float error on values already on a ms boundary.
    let millis = (seconds * 1000.0 + 1e-6).floor().max(0.0);
    format!("{:.3}", millis / 1000.0)
}

fn invalid(stage: &'static str, message: String) -> CompositionError {
    CompositionError::InvalidParameter { stage, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(name: &str) -> CaptionImage {
        CaptionImage {
            path: PathBuf::from(format!("/tmp/captions/{name}.png")),
            width: 1080,
            height: 1920,
            font_size: 120.0,
        }
    }

    fn base(window: f64, duration: f64) -> CompositionPlan {
        CompositionPlan::open("bg.mp4", 0.0, window)
            .and_then(|p| p.scale(1080))
            .and_then(|p| p.pad(1080, 1920, "black"))
            .and_then(|p| p.loop_to(duration, 30))
            .and_then(|p| p.trim(duration))
            .unwrap()
    }

    #[test]
    fn test_short_asset_loops_then_trims_to_exact_duration() {
        // 8s asset, 12s narration
        let plan = base(8.0, 12.0);
        let stages = plan.stages();
        assert_eq!(
            stages[3],
            Stage::Loop {
                duration: 12.0,
                fps: 30,
                loops: 1,
                frames: 240
            }
        );
        assert_eq!(stages[4], Stage::Trim { duration: 12.0 });
        assert_eq!(plan.duration(), Some(12.0));

        assert_eq!(plan.background_repeat(), Some((1, 12.0)));
        assert!(plan.filter_complex().contains("trim=duration=12.000"));
    }

    #[test]
    fn test_long_enough_window_is_not_repeated() {
        let plan = base(12.0, 12.0);
        assert!(matches!(plan.stages()[3], Stage::Loop { loops: 0, .. }));
        assert_eq!(plan.background_repeat(), None);
    }

    #[test]
    fn test_frames_are_never_buffered_in_the_graph() {
        let graph = base(30.0, 95.0).filter_complex();
        assert!(!graph.contains("loop="));
        assert!(!graph.contains("FRAME_RATE"));
    }

    #[test]
    fn test_repeating_window_must_start_at_zero() {
        let err = CompositionPlan::open("bg.mp4", 2.0, 5.0)
            .and_then(|p| p.scale(1080))
            .and_then(|p| p.pad(1080, 1920, "black"))
            .and_then(|p| p.loop_to(12.0, 30))
            .unwrap_err();
        assert!(matches!(err, CompositionError::InvalidParameter { stage: "loop", .. }));

        let offset_without_repeat = CompositionPlan::open("bg.mp4", 2.0, 12.0)
            .and_then(|p| p.scale(1080))
            .and_then(|p| p.pad(1080, 1920, "black"))
            .and_then(|p| p.loop_to(12.0, 30));
        assert!(offset_without_repeat.is_ok());
    }

    #[test]
    fn test_times_floor_to_whole_milliseconds() {
        assert_eq!(format_seconds(12.3456), "12.345");
        assert_eq!(format_seconds(2.4 - 0.2), "2.200");
        assert_eq!(format_seconds(0.0), "0.000");

        let plan = base(20.0, 12.3456);
        assert!(plan.filter_complex().contains("trim=duration=12.345,"));
    }

    #[test]
    fn test_exact_multiple_loops_once_per_extra_window() {
        let plan = base(4.0, 12.0);
        assert!(matches!(plan.stages()[3], Stage::Loop { loops: 2, .. }));
    }

    #[test]
    fn test_background_chain_order() {
        let graph = base(8.0, 12.0).filter_complex();
        assert_eq!(
            graph,
            "[0:v]scale=1080:-2,pad=1080:1920:(ow-iw)/2:(oh-ih)/2:color=black,fps=30,\
             trim=duration=12.000,setpts=PTS-STARTPTS[base]"
        );
    }

    #[test]
    fn test_out_of_order_stages_rejected() {
        let opened = CompositionPlan::open("bg.mp4", 0.0, 5.0).unwrap();
        let err = opened.clone().pad(1080, 1920, "black").unwrap_err();
        assert!(matches!(
            err,
            CompositionError::OutOfOrder {
                stage: "pad",
                after: "open"
            }
        ));
        assert!(opened.clone().trim(5.0).is_err());
        assert!(opened.mux_audio("a.mp3").is_err());
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        assert!(CompositionPlan::open("bg.mp4", -1.0, 5.0).is_err());
        assert!(CompositionPlan::open("bg.mp4", 0.0, 0.0).is_err());
        let scaled = CompositionPlan::open("bg.mp4", 0.0, 5.0)
            .and_then(|p| p.scale(1080))
            .unwrap();
        assert!(scaled.clone().pad(720, 1920, "black").is_err());
        assert!(scaled.pad(1080, 1920, " ").is_err());
    }

    #[test]
    fn test_trim_longer_than_loop_rejected() {
        let looped = CompositionPlan::open("bg.mp4", 0.0, 5.0)
            .and_then(|p| p.scale(1080))
            .and_then(|p| p.pad(1080, 1920, "black"))
            .and_then(|p| p.loop_to(10.0, 30))
            .unwrap();
        assert!(looped.trim(10.5).is_err());
    }

    #[test]
    fn test_overlays_chain_in_caption_order() {
        let first = Caption::new("Hello world", 0.0, 1.5).unwrap();
        let second = Caption::new("This is great", 1.6, 3.0).unwrap();
        let plan = base(8.0, 12.0)
            .overlay(&image("a"), &first, 0.3)
            .and_then(|p| p.overlay(&image("b"), &second, 0.3))
            .and_then(|p| p.mux_audio("narration.mp3"))
            .unwrap();

        assert!(plan.is_complete());
        assert_eq!(plan.overlay_count(), 2);
        assert_eq!(plan.output_label(), "[v1]");
        assert_eq!(plan.audio_input(), Some(3));
        assert_eq!(plan.inputs().len(), 4);
        assert_eq!(
            plan.inputs()[1],
            MediaInput::Still {
                path: PathBuf::from("/tmp/captions/a.png"),
                fps: 30,
                duration: 12.0
            }
        );

        let graph = plan.filter_complex();
        assert!(graph.contains(
            "[1:v]format=rgba,fade=t=in:st=0.000:d=0.300:alpha=1,\
             fade=t=out:st=1.200:d=0.300:alpha=1[cap0];\
             [base][cap0]overlay=0:0:enable='between(t,0.000,1.500)'[v0]"
        ));
        assert!(graph.contains("[v0][cap1]overlay=0:0:enable='between(t,1.600,3.000)'[v1]"));
        assert!(graph.find("[v0]").unwrap() < graph.find("[v1]").unwrap());
    }

    #[test]
    fn test_fade_clamped_for_short_caption() {
        let brief = Caption::new("Hi", 2.0, 2.4).unwrap();
        let plan = base(8.0, 12.0).overlay(&image("a"), &brief, 0.3).unwrap();
        match plan.stages().last() {
            Some(Stage::Overlay { fade, .. }) => assert!((fade - 0.2).abs() < 1e-9),
            other => panic!("unexpected stage: {other:?}"),
        }
        assert!(plan.filter_complex().contains("fade=t=out:st=2.200:d=0.200"));
    }

    #[test]
    fn test_fade_out_ends_at_caption_end() {
        let caption = Caption::new("x", 3.0, 6.0).unwrap();
        let plan = base(8.0, 12.0).overlay(&image("a"), &caption, 0.3).unwrap();
        assert!(plan.filter_complex().contains("fade=t=out:st=5.700:d=0.300"));
    }

    #[test]
    fn test_non_chronological_overlay_rejected() {
        let late = Caption::new("late", 5.0, 6.0).unwrap();
        let early = Caption::new("early", 1.0, 2.0).unwrap();
        let err = base(8.0, 12.0)
            .overlay(&image("a"), &late, 0.3)
            .and_then(|p| p.overlay(&image("b"), &early, 0.3))
            .unwrap_err();
        assert!(matches!(err, CompositionError::NotChronological { .. }));
    }

    #[test]
    fn test_nothing_after_audio() {
        let caption = Caption::new("x", 0.0, 1.0).unwrap();
        let muxed = base(8.0, 12.0).mux_audio("a.mp3").unwrap();
        assert_eq!(muxed.output_label(), "[base]");
        assert!(muxed.overlay(&image("a"), &caption, 0.3).is_err());
    }
}
