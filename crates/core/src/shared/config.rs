use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::constants::*;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Output frame geometry and letterbox color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub pad_color: String,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: CANVAS_WIDTH,
            height: CANVAS_HEIGHT,
            fps: FRAME_RATE,
            pad_color: PAD_COLOR.to_string(),
        }
    }
}

/// Fixed encoder parameters handed to ffmpeg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeConfig {
    pub video_codec: String,
    pub video_bitrate: String,
    pub audio_codec: String,
    pub audio_bitrate: String,
    pub pixel_format: String,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            video_codec: VIDEO_CODEC.to_string(),
            video_bitrate: VIDEO_BITRATE.to_string(),
            audio_codec: AUDIO_CODEC.to_string(),
            audio_bitrate: AUDIO_BITRATE.to_string(),
            pixel_format: PIXEL_FORMAT.to_string(),
        }
    }
}

/// Typography and decoration of a rendered caption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionStyle {
    pub font_path: PathBuf,
    pub fallback_font_paths: Vec<PathBuf>,
    pub wrap_chars: usize,
    pub initial_size: f32,
    pub min_size: f32,
    pub margin: f32,
    pub vertical_anchor: f32,
    pub bar_padding: f32,
    pub stroke_width: i32,
    pub stroke_step: i32,
    pub text_color: [u8; 4],
    pub stroke_color: [u8; 4],
    pub bar_color: [u8; 4],
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            font_path: PathBuf::from(PREFERRED_FONT_PATH),
            fallback_font_paths: Vec::new(),
            wrap_chars: WRAP_CHARS,
            initial_size: INITIAL_FONT_SIZE,
            min_size: MIN_FONT_SIZE,
            margin: HORIZONTAL_MARGIN,
            vertical_anchor: VERTICAL_ANCHOR,
            bar_padding: BAR_PADDING,
            stroke_width: STROKE_WIDTH,
            stroke_step: STROKE_STEP,
            text_color: TEXT_COLOR,
            stroke_color: STROKE_COLOR,
            bar_color: BAR_COLOR,
        }
    }
}

/// Everything a reel job needs besides its narration inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReelConfig {
    /// A single clip, or a directory of clips to pick from at random.
    pub background: PathBuf,
    pub output_dir: PathBuf,
    pub caption_dir: PathBuf,
    pub language: String,
    pub whisper_model_name: String,
    pub whisper_model_url: String,
    /// Skips cache lookup and download when set.
    pub whisper_model_path: Option<PathBuf>,
    pub canvas: CanvasConfig,
    pub encode: EncodeConfig,
    pub caption: CaptionStyle,
    pub fade_duration: f64,
    pub default_caption_duration: f64,
    pub seed: Option<u64>,
}

impl Default for ReelConfig {
    fn default() -> Self {
        Self {
            background: PathBuf::from(DEFAULT_BACKGROUND_PATH),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            caption_dir: PathBuf::from(DEFAULT_CAPTION_DIR),
            language: DEFAULT_LANGUAGE.to_string(),
            whisper_model_name: WHISPER_MODEL_NAME.to_string(),
            whisper_model_url: WHISPER_MODEL_URL.to_string(),
            whisper_model_path: None,
            canvas: CanvasConfig::default(),
            encode: EncodeConfig::default(),
            caption: CaptionStyle::default(),
            fade_duration: FADE_DURATION,
            default_caption_duration: DEFAULT_CAPTION_DURATION,
            seed: None,
        }
    }
}

impl ReelConfig {
    /// Per-user config location, e.g. `~/.config/newsreel/config.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("newsreel").join("config.json"))
    }

    /// Reads the per-user config if one exists, otherwise returns defaults.
    pub fn load_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Reads an explicit config file. Missing fields take their defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let canvas = &self.canvas;
        if canvas.width == 0 || canvas.height == 0 {
            return Err(ConfigError::Invalid(
                "canvas width/height must be non-zero".into(),
            ));
        }
        if canvas.width % 2 != 0 || canvas.height % 2 != 0 {
            return Err(ConfigError::Invalid(format!(
                "canvas {}x{} must have even dimensions for yuv420p output",
                canvas.width, canvas.height
            )));
        }
        if canvas.fps == 0 {
            return Err(ConfigError::Invalid("fps must be non-zero".into()));
        }
        let style = &self.caption;
        if style.min_size <= 0.0 || style.min_size > style.initial_size {
            return Err(ConfigError::Invalid(format!(
                "caption sizes must satisfy 0 < min ({}) <= initial ({})",
                style.min_size, style.initial_size
            )));
        }
        if style.wrap_chars == 0 {
            return Err(ConfigError::Invalid("wrap_chars must be non-zero".into()));
        }
        if style.margin < 0.0 || style.margin >= canvas.width as f32 {
            return Err(ConfigError::Invalid(format!(
                "margin {} must be within the canvas width {}",
                style.margin, canvas.width
            )));
        }
        if style.stroke_step <= 0 || style.stroke_width < 0 {
            return Err(ConfigError::Invalid(
                "stroke step must be positive and stroke width non-negative".into(),
            ));
        }
        if !(0.0..=1.0).contains(&style.vertical_anchor) {
            return Err(ConfigError::Invalid(format!(
                "vertical_anchor must be between 0.0 and 1.0, got {}",
                style.vertical_anchor
            )));
        }
        if !(self.default_caption_duration > 0.0) {
            return Err(ConfigError::Invalid(
                "default_caption_duration must be positive".into(),
            ));
        }
        if self.fade_duration < 0.0 {
            return Err(ConfigError::Invalid(
                "fade_duration must not be negative".into(),
            ));
        }
        if self.language.trim().is_empty() {
            return Err(ConfigError::Invalid("language must not be empty".into()));
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, json)
    }
}
