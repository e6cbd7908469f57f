use std::path::PathBuf;

use thiserror::Error;

use super::caption::Caption;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("no usable caption font, tried: {tried}")]
    NoFont { tried: String },
    #[error("caption text has nothing to draw")]
    EmptyText,
    #[error("failed to create caption directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to save caption image {path}: {message}")]
    Save { path: PathBuf, message: String },
}

/// A rendered caption on disk: a transparent canvas-sized PNG.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptionImage {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Font size the text was drawn at after auto-fit.
    pub font_size: f32,
}

/// Domain interface for turning a timed caption into an overlay image.
///
/// Calls are sequential; each returns a fresh file that is never rewritten.
pub trait CaptionRenderer {
    fn render(&mut self, caption: &Caption) -> Result<CaptionImage, RenderError>;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutParams {
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// Vertical center of the text block as a fraction of canvas height.
    pub vertical_anchor: f32,
    pub bar_padding: f32,
}

/// Top-left corner of one line's layout box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinePlacement {
    pub x: f32,
    pub top: f32,
}

/// Where each line and the backing bar go on the canvas.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptionLayout {
    pub lines: Vec<LinePlacement>,
    pub line_height: f32,
    pub bar_top: f32,
    pub bar_bottom: f32,
}

impl CaptionLayout {
    /// Centers each line horizontally and the whole block on the vertical
    /// anchor. The bar spans the full width and covers the block plus
    /// padding, clipped to the canvas.
    pub fn compute(line_widths: &[f32], line_height: f32, params: &LayoutParams) -> Self {
        let canvas_w = params.canvas_width as f32;
        let canvas_h = params.canvas_height as f32;
        let block_height = line_height * line_widths.len() as f32;
        let block_top = canvas_h * params.vertical_anchor - block_height / 2.0;

        let lines = line_widths
            .iter()
            .enumerate()
            .map(|(i, width)| LinePlacement {
                x: (canvas_w - width) / 2.0,
                top: block_top + i as f32 * line_height,
            })
            .collect();

        Self {
            lines,
            line_height,
            bar_top: (block_top - params.bar_padding).max(0.0),
            bar_bottom: (block_top + block_height + params.bar_padding).min(canvas_h),
        }
    }
}
