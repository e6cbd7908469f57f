pub mod whisper_segmenter;
