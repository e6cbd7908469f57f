use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

use crate::shared::constants::VIDEO_EXTENSIONS;

#[derive(Error, Debug)]
pub enum BackgroundError {
    #[error("{0}")]
    NotFound(PathBuf),
    #[error("no video clips in {0}")]
    EmptyPool(PathBuf),
    #[error("failed to list {path}: {source}")]
    List {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A background asset and its playable length in seconds.
#[derive(Clone, Debug, PartialEq)]
pub struct BackgroundClip {
    pub path: PathBuf,
    pub duration: f64,
}

impl BackgroundClip {
    /// Seconds of footage available from `offset`, capped at `required`.
    pub fn window(&self, offset: f64, required: f64) -> f64 {
        (self.duration - offset).min(required)
    }
}

/// Picks a start offset for a `required`-second window of `asset`.
///
/// When the asset is long enough, the offset is drawn uniformly from
/// `[0, duration - required]` so the whole window lies inside the asset.
/// A shorter asset always starts at 0 and is looped downstream.
///
/// Offsets are floored to whole milliseconds, the precision they are
/// rendered at.
pub fn select_offset<R: Rng + ?Sized>(asset: &BackgroundClip, required: f64, rng: &mut R) -> f64 {
    if asset.duration < required {
        return 0.0;
    }
    let latest = floor_ms(asset.duration - required);
    if latest <= 0.0 {
        return 0.0;
    }
    let mut offset = floor_ms(rng.gen_range(0.0..=latest));
    if offset + required > asset.duration {
        offset = floor_ms(offset - 0.001).max(0.0);
    }
    offset
}

/// Resolves the background location to one clip.
///
/// A file is used as is. A directory is a pool: one clip with a known video
/// extension is chosen at random. Listing is sorted so a seeded `rng` picks
/// the same clip every run.
pub fn choose_background_file<R: Rng + ?Sized>(
    location: &Path,
    rng: &mut R,
) -> Result<PathBuf, BackgroundError> {
    if location.is_file() {
        return Ok(location.to_path_buf());
    }
    if !location.is_dir() {
        return Err(BackgroundError::NotFound(location.to_path_buf()));
    }

    let entries = std::fs::read_dir(location).map_err(|source| BackgroundError::List {
        path: location.to_path_buf(),
        source,
    })?;
    let mut clips: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && is_video(path))
        .collect();
    clips.sort();

    let chosen = clips
        .choose(rng)
        .cloned()
        .ok_or_else(|| BackgroundError::EmptyPool(location.to_path_buf()))?;
    log::debug!(
        "Picked background {} from {} clips",
        chosen.display(),
        clips.len()
    );
    Ok(chosen)
}

fn is_video(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            VIDEO_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

fn floor_ms(seconds: f64) -> f64 {
    (seconds * 1000.0).floor() / 1000.0
}
