use std::path::Path;

use crate::media::domain::composition_plan::CompositionError;
use crate::media::domain::media_probe::MediaProbe;

/// libavformat reports container durations in microseconds.
const AV_TIME_BASE: f64 = 1_000_000.0;

/// Container duration lookup through libavformat.
pub struct FfmpegProbe;

impl MediaProbe for FfmpegProbe {
    fn duration(&self, path: &Path) -> Result<f64, CompositionError> {
        let probe_err = |message: String| CompositionError::Probe {
            path: path.to_path_buf(),
            message,
        };
        ffmpeg_next::init().map_err(|e| probe_err(e.to_string()))?;

        let ictx = ffmpeg_next::format::input(path).map_err(|e| probe_err(e.to_string()))?;
        let raw = ictx.duration();
        if raw <= 0 {
            return Err(probe_err("container reports no duration".into()));
        }
        Ok(raw as f64 / AV_TIME_BASE)
    }
}
