pub mod background_selector;
pub mod composition_plan;
pub mod media_probe;
pub mod video_encoder;
