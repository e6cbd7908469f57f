pub mod audio_clip;
pub mod audio_source;
pub mod speech_segmenter;
pub mod transcript_segment;
