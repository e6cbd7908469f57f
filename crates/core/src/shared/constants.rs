pub const WHISPER_MODEL_NAME: &str = "ggml-base.bin";
pub const WHISPER_MODEL_URL: &str =
    "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-base.bin";
pub const WHISPER_SAMPLE_RATE: u32 = 16000;

/// Narration is produced upstream in Greek.
pub const DEFAULT_LANGUAGE: &str = "el";

pub const DEFAULT_BACKGROUND_PATH: &str = "assets/background.mp4";
pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DEFAULT_CAPTION_DIR: &str = "temp/captions";
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv", "webm"];

pub const CANVAS_WIDTH: u32 = 1080;
pub const CANVAS_HEIGHT: u32 = 1920;
pub const FRAME_RATE: u32 = 30;
/// Letterbox color for the padded background, as an ffmpeg color string.
pub const PAD_COLOR: &str = "black";

pub const VIDEO_CODEC: &str = "libx264";
pub const VIDEO_BITRATE: &str = "4M";
pub const AUDIO_CODEC: &str = "aac";
pub const AUDIO_BITRATE: &str = "192k";
pub const PIXEL_FORMAT: &str = "yuv420p";

/// Length of a synthetic caption window for sentences past the last transcript segment.
pub const DEFAULT_CAPTION_DURATION: f64 = 3.0;
pub const FADE_DURATION: f64 = 0.3;

/// Soft line budget in characters, spaces included.
pub const WRAP_CHARS: usize = 30;
pub const INITIAL_FONT_SIZE: f32 = 120.0;
pub const MIN_FONT_SIZE: f32 = 60.0;
pub const HORIZONTAL_MARGIN: f32 = 100.0;
/// Vertical center of the caption block as a fraction of canvas height.
pub const VERTICAL_ANCHOR: f32 = 0.75;
pub const BAR_PADDING: f32 = 30.0;
pub const STROKE_WIDTH: i32 = 6;
pub const STROKE_STEP: i32 = 2;

pub const TEXT_COLOR: [u8; 4] = [255, 255, 255, 255];
pub const STROKE_COLOR: [u8; 4] = [0, 0, 0, 255];
pub const BAR_COLOR: [u8; 4] = [0, 0, 0, 255];

pub const PREFERRED_FONT_PATH: &str = "assets/fonts/Montserrat-Black.ttf";
/// Bold sans-serif families queried from the system font database, best first.
pub const SYSTEM_FONT_FAMILIES: &[&str] = &[
    "Montserrat",
    "DejaVu Sans",
    "Liberation Sans",
    "Arial",
    "Helvetica",
    "Noto Sans",
];
