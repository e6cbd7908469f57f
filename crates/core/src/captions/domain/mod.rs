pub mod auto_fit;
pub mod caption;
pub mod caption_renderer;
pub mod line_wrap;
pub mod segment_aligner;
