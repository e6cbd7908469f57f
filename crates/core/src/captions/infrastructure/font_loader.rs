use std::fmt;
use std::path::{Path, PathBuf};

use fontdb::{Database, Family, Query, Source, Stretch, Style, Weight};
use fontdue::layout::{CoordinateSystem, Layout, LayoutSettings, TextStyle};
use fontdue::{Font, FontSettings};

use crate::captions::domain::auto_fit::TextMeasurer;
use crate::captions::domain::caption_renderer::RenderError;
use crate::shared::constants::SYSTEM_FONT_FAMILIES;

/// Face shipped with the crate, used when neither configured nor system fonts load.
pub const BUNDLED_FONT_PATH: &str =
    concat!(env!("CARGO_MANIFEST_DIR"), "/assets/fonts/DejaVuSans-Bold.ttf");
static BUNDLED_FONT: &[u8] = include_bytes!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/assets/fonts/DejaVuSans-Bold.ttf"
));

// Layout advances are whole pixels, so this width keeps the padding exact.
const MEASURE_WIDTH: f32 = 65536.0;

/// Which of the configured typefaces ended up loaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FontSource {
    Preferred,
    Fallback(PathBuf),
}

impl fmt::Display for FontSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontSource::Preferred => write!(f, "preferred font"),
            FontSource::Fallback(path) => write!(f, "fallback font {}", path.display()),
        }
    }
}

/// A parsed font together with where it came from.
pub struct LoadedFont {
    font: Font,
    path: PathBuf,
    source: FontSource,
}

impl LoadedFont {
    fn fallback(font: Font, path: PathBuf) -> Self {
        Self {
            font,
            source: FontSource::Fallback(path.clone()),
            path,
        }
    }

    pub fn font(&self) -> &Font {
        &self.font
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source(&self) -> &FontSource {
        &self.source
    }
}

impl TextMeasurer for LoadedFont {
    /// Pen advance of `line` as laid out for drawing.
    fn line_width(&self, line: &str, size: f32) -> f32 {
        if line.is_empty() {
            return 0.0;
        }
        let mut layout = Layout::new(CoordinateSystem::PositiveYDown);
        layout.reset(&LayoutSettings {
            max_width: Some(MEASURE_WIDTH),
            ..LayoutSettings::default()
        });
        layout.append(&[&self.font], &TextStyle::new(line, size, 0));
        layout
            .lines()
            .and_then(|lines| lines.first())
            .map(|first| MEASURE_WIDTH - first.padding)
            .unwrap_or(0.0)
    }

    fn line_height(&self, size: f32) -> f32 {
        self.font
            .horizontal_line_metrics(size)
            .map(|m| m.new_line_size)
            .unwrap_or(size * 1.2)
    }
}

/// Loads the preferred typeface, falling back to `fallbacks` in order, then to
/// a bold sans-serif system face, then to the bundled face.
///
/// A preferred font that cannot be read or parsed is logged at `warn`. The
/// bundled face always parses, so in practice this only fails on a corrupt build.
pub fn load_font(preferred: &Path, fallbacks: &[PathBuf]) -> Result<LoadedFont, RenderError> {
    match parse_font(preferred) {
        Ok(font) => {
            log::info!("Caption font: {}", preferred.display());
            return Ok(LoadedFont {
                font,
                path: preferred.to_path_buf(),
                source: FontSource::Preferred,
            });
        }
        Err(reason) => log::warn!(
            "Preferred caption font {} unavailable ({reason}), trying fallbacks",
            preferred.display()
        ),
    }

    for path in fallbacks {
        match parse_font(path) {
            Ok(font) => {
                log::info!("Caption font: {} (fallback)", path.display());
                return Ok(LoadedFont::fallback(font, path.clone()));
            }
            Err(reason) => log::debug!("Skipping fallback font {}: {reason}", path.display()),
        }
    }

    let mut db = Database::new();
    db.load_system_fonts();
    if let Some(loaded) = query_system_font(&db, SYSTEM_FONT_FAMILIES) {
        log::info!("Caption font: {} (system)", loaded.path().display());
        return Ok(loaded);
    }

    log::warn!("No system sans-serif font found, using the bundled face");
    bundled_font().map_err(|reason| RenderError::NoFont {
        tried: std::iter::once(preferred)
            .chain(fallbacks.iter().map(PathBuf::as_path))
            .map(|p| p.display().to_string())
            .chain([format!("system families {SYSTEM_FONT_FAMILIES:?}"), reason])
            .collect::<Vec<_>>()
            .join(", "),
    })
}

/// Best bold match among `families`, then the generic sans-serif family.
fn query_system_font(db: &Database, families: &[&str]) -> Option<LoadedFont> {
    let mut wanted: Vec<Family<'_>> = families.iter().copied().map(Family::Name).collect();
    wanted.push(Family::SansSerif);
    let id = db.query(&Query {
        families: &wanted,
        weight: Weight::BOLD,
        stretch: Stretch::Normal,
        style: Style::Normal,
    })?;

    let path = match &db.face(id)?.source {
        Source::File(path) | Source::SharedFile(path, _) => path.clone(),
        Source::Binary(_) => return None,
    };
    let parsed = db.with_face_data(id, |data, index| {
        Font::from_bytes(
            data,
            FontSettings {
                collection_index: index,
                ..FontSettings::default()
            },
        )
    })?;
    match parsed {
        Ok(font) => Some(LoadedFont::fallback(font, path)),
        Err(reason) => {
            log::debug!("Skipping system font {}: {reason}", path.display());
            None
        }
    }
}

fn bundled_font() -> Result<LoadedFont, String> {
    let font = Font::from_bytes(BUNDLED_FONT, FontSettings::default()).map_err(str::to_string)?;
    Ok(LoadedFont::fallback(font, PathBuf::from(BUNDLED_FONT_PATH)))
}

fn parse_font(path: &Path) -> Result<Font, String> {
    let bytes = std::fs::read(path).map_err(|e| e.to_string())?;
    Font::from_bytes(bytes, FontSettings::default()).map_err(|e| e.to_string())
}
