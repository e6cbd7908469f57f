/// Measures rendered text extents for a given font size.
///
/// Kept as a trait so the fitting arithmetic can be tested without a font
/// file on disk.
pub trait TextMeasurer {
    /// Horizontal advance of one line of text, in pixels.
    fn line_width(&self, line: &str, size: f32) -> f32;

    /// Distance between consecutive baselines, in pixels.
    fn line_height(&self, size: f32) -> f32;
}

/// Bounding box of a multi-line, center-aligned text block.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextBlock {
    pub width: f32,
    pub height: f32,
}

impl TextBlock {
    /// Width is the widest line; height stacks one line height per line.
    pub fn measure(lines: &[String], measurer: &dyn TextMeasurer, size: f32) -> Self {
        let width = lines
            .iter()
            .map(|line| measurer.line_width(line, size))
            .fold(0.0f32, f32::max);
        let height = measurer.line_height(size) * lines.len() as f32;
        Self { width, height }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitParams {
    pub initial_size: f32,
    pub min_size: f32,
    /// Horizontal space reserved across both sides of the canvas.
    pub margin: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitResult {
    pub size: f32,
    pub block: TextBlock,
    /// True when the block is still wider than the available width because
    /// the minimum size was reached.
    pub overflows: bool,
}

/// Picks the font size for a wrapped caption.
///
/// Starts at `initial_size`; if the block is wider than `canvas_width - margin`
/// the size is scaled by the ratio of available to measured width, then
/// clamped so it never drops below `min_size`. Lines are never altered here.
pub fn fit_font_size(
    lines: &[String],
    measurer: &dyn TextMeasurer,
    canvas_width: f32,
    params: &FitParams,
) -> FitResult {
    let available = (canvas_width - params.margin).max(0.0);
    let initial = TextBlock::measure(lines, measurer, params.initial_size);

    if initial.width <= available || initial.width <= 0.0 {
        return FitResult {
            size: params.initial_size,
            block: initial,
            overflows: false,
        };
    }

    let scale = available / initial.width;
    let size = (params.initial_size * scale).max(params.min_size);
    let block = TextBlock::measure(lines, measurer, size);
    // Half a pixel of slack absorbs rounding in the rescale.
    let overflows = block.width > available + 0.5;
    if overflows {
        log::debug!(
            "Caption clamped to minimum size {size:.0}px, {:.0}px wider than available",
            block.width - available
        );
    }

    FitResult {
        size,
        block,
        overflows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::captions::domain::line_wrap::wrap_words;
    use approx::assert_relative_eq;
    use rstest::rstest;

    /// Fixed-pitch measurer: every character advances `0.6 * size`.
    struct MonospaceMeasurer;

    impl TextMeasurer for MonospaceMeasurer {
        fn line_width(&self, line: &str, size: f32) -> f32 {
            line.chars().count() as f32 * size * 0.6
        }

        fn line_height(&self, size: f32) -> f32 {
            size * 1.2
        }
    }

    fn params() -> FitParams {
        FitParams {
            initial_size: 120.0,
            min_size: 60.0,
            margin: 100.0,
        }
    }

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_block_measures_widest_line() {
        let block = TextBlock::measure(&lines(&["ab", "abcd", "a"]), &MonospaceMeasurer, 10.0);
        assert_relative_eq!(block.width, 24.0);
        assert_relative_eq!(block.height, 36.0);
    }

    #[test]
    fn test_fitting_text_keeps_initial_size() {
        // 10 chars * 72px = 720px < 980px
        let result = fit_font_size(&lines(&["Hello you!"]), &MonospaceMeasurer, 1080.0, &params());
        assert_eq!(result.size, 120.0);
        assert!(!result.overflows);
    }

    #[test]
    fn test_wide_text_shrinks_below_initial() {
        // 21 chars * 72px = 1512px, scaled to fit 980px
        let wrapped = wrap_words("Hello wonderful world", 30);
        let result = fit_font_size(&wrapped, &MonospaceMeasurer, 1080.0, &params());

        assert!(result.size < 120.0);
        assert!(result.size >= 60.0);
        assert_relative_eq!(result.size, 120.0 * 980.0 / 1512.0, epsilon = 1e-3);
        assert!(!result.overflows);
    }

    #[test]
    fn test_shrink_is_clamped_to_minimum() {
        let long = "W".repeat(80);
        let result = fit_font_size(&lines(&[&long]), &MonospaceMeasurer, 1080.0, &params());
        assert_eq!(result.size, 60.0);
        assert!(result.overflows);
    }

    #[test]
    fn test_shrunk_block_fits_when_not_clamped() {
        // 20 chars at most per line
        let wrapped = wrap_words("Καλημέρα σε όλους τους φίλους", 20);
        let result = fit_font_size(&wrapped, &MonospaceMeasurer, 1080.0, &params());
        assert!(!result.overflows);
        assert!(result.block.width <= 980.0 + 1e-3);
    }

    #[test]
    fn test_empty_lines_keep_initial_size() {
        let result = fit_font_size(&[], &MonospaceMeasurer, 1080.0, &params());
        assert_eq!(result.size, 120.0);
        assert_eq!(result.block.width, 0.0);
    }

    #[rstest]
    #[case(1)]
    #[case(15)]
    #[case(31)]
    #[case(120)]
    #[case(1000)]
    fn test_never_below_minimum(#[case] word_len: usize) {
        let text = format!("{} tail", "m".repeat(word_len));
        let wrapped = wrap_words(&text, 30);
        let result = fit_font_size(&wrapped, &MonospaceMeasurer, 1080.0, &params());
        assert!(result.size >= 60.0);
        assert!(result.size <= 120.0);
    }
}
