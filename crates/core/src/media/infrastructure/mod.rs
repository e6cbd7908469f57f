pub mod ffmpeg_audio_reader;
pub mod ffmpeg_cli_encoder;
pub mod ffmpeg_probe;
