pub mod captions;
pub mod media;
pub mod narration;
pub mod pipeline;
pub mod shared;
pub mod transcription;
