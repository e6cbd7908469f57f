use std::path::Path;

use super::composition_plan::{CompositionError, CompositionPlan};
use crate::shared::config::EncodeConfig;

/// Fixed encoder parameters applied to every reel.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodeSettings {
    pub video_codec: String,
    pub video_bitrate: String,
    pub audio_codec: String,
    pub audio_bitrate: String,
    pub pixel_format: String,
    pub fps: u32,
}

impl EncodeSettings {
    pub fn from_config(encode: &EncodeConfig, fps: u32) -> Self {
        Self {
            video_codec: encode.video_codec.clone(),
            video_bitrate: encode.video_bitrate.clone(),
            audio_codec: encode.audio_codec.clone(),
            audio_bitrate: encode.audio_bitrate.clone(),
            pixel_format: encode.pixel_format.clone(),
            fps,
        }
    }
}

/// Materializes a complete composition plan into a single output file.
///
/// One blocking call per job. A failure leaves no usable output behind.
pub trait VideoEncoder {
    fn encode(&self, plan: &CompositionPlan, output: &Path) -> Result<(), CompositionError>;
}
