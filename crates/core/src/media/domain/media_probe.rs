use std::path::Path;

use super::composition_plan::CompositionError;

/// Reads container-level facts about a media file.
pub trait MediaProbe {
    /// Playable duration in seconds.
    fn duration(&self, path: &Path) -> Result<f64, CompositionError>;
}
