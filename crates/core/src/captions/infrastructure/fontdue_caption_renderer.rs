use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use fontdue::layout::{
    CoordinateSystem, GlyphRasterConfig, Layout, LayoutSettings, TextStyle, VerticalAlign,
};
use image::{Rgba, RgbaImage};

use super::font_loader::{load_font, FontSource, LoadedFont};
use crate::captions::domain::auto_fit::{fit_font_size, FitParams, TextMeasurer};
use crate::captions::domain::caption::Caption;
use crate::captions::domain::caption_renderer::{
    CaptionImage, CaptionLayout, CaptionRenderer, LayoutParams, RenderError,
};
use crate::captions::domain::line_wrap::wrap_words;
use crate::shared::config::{CanvasConfig, CaptionStyle};

struct GlyphBitmap {
    width: usize,
    height: usize,
    coverage: Vec<u8>,
}

/// Rasterizes captions onto transparent canvas-sized PNGs with fontdue.
///
/// Each caption is wrapped, auto-fitted, laid over a full-width bar, stroked
/// by stamping the text at a grid of offsets, then filled.
pub struct FontdueCaptionRenderer {
    font: LoadedFont,
    style: CaptionStyle,
    width: u32,
    height: u32,
    output_dir: PathBuf,
    glyph_cache: HashMap<GlyphRasterConfig, GlyphBitmap>,
}

impl FontdueCaptionRenderer {
    pub fn new(
        style: &CaptionStyle,
        canvas: &CanvasConfig,
        output_dir: &Path,
    ) -> Result<Self, RenderError> {
        let font = load_font(&style.font_path, &style.fallback_font_paths)?;
        std::fs::create_dir_all(output_dir).map_err(|source| RenderError::CreateDir {
            path: output_dir.to_path_buf(),
            source,
        })?;
        Ok(Self {
            font,
            style: style.clone(),
            width: canvas.width,
            height: canvas.height,
            output_dir: output_dir.to_path_buf(),
            glyph_cache: HashMap::new(),
        })
    }

    pub fn font_source(&self) -> &FontSource {
        self.font.source()
    }

    fn draw_text(
        &mut self,
        canvas: &mut RgbaImage,
        lines: &[String],
        layout: &CaptionLayout,
        size: f32,
        offset: (i32, i32),
        color: [u8; 4],
    ) {
        let mut text_layout = Layout::new(CoordinateSystem::PositiveYDown);
        for (line, placement) in lines.iter().zip(&layout.lines) {
            text_layout.reset(&LayoutSettings {
                x: placement.x + offset.0 as f32,
                y: placement.top + offset.1 as f32,
                max_height: Some(layout.line_height),
                vertical_align: VerticalAlign::Middle,
                ..LayoutSettings::default()
            });
            text_layout.append(&[self.font.font()], &TextStyle::new(line, size, 0));

            for glyph in text_layout.glyphs() {
                if glyph.width == 0 || glyph.height == 0 {
                    continue;
                }
                let font = self.font.font();
                let bitmap = self.glyph_cache.entry(glyph.key).or_insert_with(|| {
                    let (metrics, coverage) = font.rasterize_config(glyph.key);
                    GlyphBitmap {
                        width: metrics.width,
                        height: metrics.height,
                        coverage,
                    }
                });
                blend_glyph(
                    canvas,
                    glyph.x.round() as i32,
                    glyph.y.round() as i32,
                    bitmap,
                    color,
                );
            }
        }
    }

    fn next_path(&self) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let mut path = self.output_dir.join(format!("caption_{nanos}.png"));
        let mut n = 1;
        while path.exists() {
            path = self.output_dir.join(format!("caption_{nanos}_{n}.png"));
            n += 1;
        }
        path
    }
}

impl CaptionRenderer for FontdueCaptionRenderer {
    fn render(&mut self, caption: &Caption) -> Result<CaptionImage, RenderError> {
        let lines = wrap_words(caption.text(), self.style.wrap_chars);
        if lines.is_empty() {
            return Err(RenderError::EmptyText);
        }

        let fit = fit_font_size(
            &lines,
            &self.font,
            self.width as f32,
            &FitParams {
                initial_size: self.style.initial_size,
                min_size: self.style.min_size,
                margin: self.style.margin,
            },
        );
        let widths: Vec<f32> = lines
            .iter()
            .map(|line| self.font.line_width(line, fit.size))
            .collect();
        let layout = CaptionLayout::compute(
            &widths,
            self.font.line_height(fit.size),
            &LayoutParams {
                canvas_width: self.width,
                canvas_height: self.height,
                vertical_anchor: self.style.vertical_anchor,
                bar_padding: self.style.bar_padding,
            },
        );

        let mut canvas = RgbaImage::new(self.width, self.height);
        fill_bar(&mut canvas, &layout, self.style.bar_color);

        let reach = self.style.stroke_width;
        let step = self.style.stroke_step.max(1) as usize;
        if reach > 0 {
            for dy in (-reach..=reach).step_by(step) {
                for dx in (-reach..=reach).step_by(step) {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    self.draw_text(
                        &mut canvas,
                        &lines,
                        &layout,
                        fit.size,
                        (dx, dy),
                        self.style.stroke_color,
                    );
                }
            }
        }
        self.draw_text(
            &mut canvas,
            &lines,
            &layout,
            fit.size,
            (0, 0),
            self.style.text_color,
        );

        let path = self.next_path();
        canvas.save(&path).map_err(|e| RenderError::Save {
            path: path.clone(),
            message: e.to_string(),
        })?;

        log::debug!(
            "Caption [{:.2}s, {:.2}s] {} lines at {:.0}px -> {}",
            caption.start(),
            caption.end(),
            lines.len(),
            fit.size,
            path.display()
        );

        Ok(CaptionImage {
            path,
            width: self.width,
            height: self.height,
            font_size: fit.size,
        })
    }
}

fn fill_bar(canvas: &mut RgbaImage, layout: &CaptionLayout, color: [u8; 4]) {
    let top = layout.bar_top.floor().max(0.0) as u32;
    let bottom = (layout.bar_bottom.ceil() as u32).min(canvas.height());
    for y in top..bottom {
        for x in 0..canvas.width() {
            canvas.put_pixel(x, y, Rgba(color));
        }
    }
}

fn blend_glyph(canvas: &mut RgbaImage, x: i32, y: i32, glyph: &GlyphBitmap, color: [u8; 4]) {
    let (width, height) = (canvas.width() as i32, canvas.height() as i32);
    for row in 0..glyph.height {
        let py = y + row as i32;
        if py < 0 || py >= height {
            continue;
        }
        for col in 0..glyph.width {
            let px = x + col as i32;
            if px < 0 || px >= width {
                continue;
            }
            let mask = glyph.coverage[row * glyph.width + col];
            if mask == 0 {
                continue;
            }
            let alpha = (u16::from(mask) * u16::from(color[3]) / 255) as u8;
            let dst = canvas.get_pixel_mut(px as u32, py as u32);
            *dst = over(*dst, [color[0], color[1], color[2], alpha]);
        }
    }
}

/// Porter-Duff source-over for straight (non-premultiplied) RGBA.
fn over(dst: Rgba<u8>, src: [u8; 4]) -> Rgba<u8> {
    let sa = f32::from(src[3]) / 255.0;
    let da = f32::from(dst[3]) / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let mut out = [0u8; 4];
    for c in 0..3 {
        let value = (f32::from(src[c]) * sa + f32::from(dst[c]) * da * (1.0 - sa)) / out_a;
        out[c] = value.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_a * 255.0).round() as u8;
    Rgba(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::captions::infrastructure::font_loader::BUNDLED_FONT_PATH;
    use tempfile::TempDir;

    fn renderer(dir: &Path) -> FontdueCaptionRenderer {
        let style = CaptionStyle {
            font_path: PathBuf::from(BUNDLED_FONT_PATH),
            ..CaptionStyle::default()
        };
        FontdueCaptionRenderer::new(&style, &CanvasConfig::default(), dir).unwrap()
    }

    #[test]
    fn test_over_on_transparent_takes_source() {
        let out = over(Rgba([0, 0, 0, 0]), [255, 10, 20, 128]);
        assert_eq!(out, Rgba([255, 10, 20, 128]));
    }

    #[test]
    fn test_over_opaque_source_replaces() {
        let out = over(Rgba([0, 0, 0, 255]), [255, 255, 255, 255]);
        assert_eq!(out, Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_render_produces_canvas_sized_png() {
        let tmp = TempDir::new().unwrap();
        let mut renderer = renderer(tmp.path());
        let caption = Caption::new("Hello world", 0.0, 1.5).unwrap();
        let image = renderer.render(&caption).unwrap();

        assert!(image.path.exists());
        assert!(image.path.starts_with(tmp.path()));
        assert_eq!((image.width, image.height), (1080, 1920));
        assert_eq!(image.font_size, 120.0);

        let png = image::open(&image.path).unwrap().to_rgba8();
        assert_eq!(png.dimensions(), (1080, 1920));
        // Top corner is outside the bar and stays transparent.
        assert_eq!(png.get_pixel(0, 0)[3], 0);
        // Left edge at the anchor row is inside the opaque bar.
        assert_eq!(png.get_pixel(0, 1440)[3], 255);
    }

    #[test]
    fn test_long_caption_is_shrunk_within_bounds() {
        let tmp = TempDir::new().unwrap();
        let mut renderer = renderer(tmp.path());
        let caption = Caption::new(
            "Incomprehensibilities notwithstanding everything continues",
            0.0,
            3.0,
        )
        .unwrap();
        let image = renderer.render(&caption).unwrap();
        assert!(image.font_size < 120.0);
        assert!(image.font_size >= 60.0);
    }

    #[test]
    fn test_missing_font_still_renders() {
        let tmp = TempDir::new().unwrap();
        let style = CaptionStyle {
            font_path: PathBuf::from("/nonexistent/Montserrat-Black.ttf"),
            fallback_font_paths: vec![PathBuf::from("/usr/share/fonts/dejavu/missing.ttf")],
            ..CaptionStyle::default()
        };
        let mut renderer =
            FontdueCaptionRenderer::new(&style, &CanvasConfig::default(), tmp.path()).unwrap();
        assert!(matches!(renderer.font_source(), FontSource::Fallback(_)));

        let image = renderer
            .render(&Caption::new("Still captioned", 0.0, 1.0).unwrap())
            .unwrap();
        assert!(image.path.exists());
    }

    #[test]
    fn test_consecutive_renders_get_distinct_files() {
        let tmp = TempDir::new().unwrap();
        let mut renderer = renderer(tmp.path());
        let a = renderer.render(&Caption::new("First", 0.0, 1.0).unwrap()).unwrap();
        let b = renderer.render(&Caption::new("Second", 1.0, 2.0).unwrap()).unwrap();
        assert_ne!(a.path, b.path);
        assert!(a.path.exists() && b.path.exists());
    }
}
