use std::path::Path;

use ffmpeg_next::format::sample::Type as SampleLayout;
use ffmpeg_next::format::Sample;
use ffmpeg_next::util::frame::audio::Audio;
use ffmpeg_next::ChannelLayout;

use crate::transcription::domain::audio_clip::AudioClip;
use crate::transcription::domain::audio_source::AudioSource;
use crate::transcription::domain::speech_segmenter::TranscriptionError;

/// Decodes narration audio to mono f32 PCM with ffmpeg-next.
pub struct FfmpegAudioReader;

impl AudioSource for FfmpegAudioReader {
    /// Decodes the best audio stream of `path`, resampled to `sample_rate` Hz mono.
    fn read_mono(&self, path: &Path, sample_rate: u32) -> Result<AudioClip, TranscriptionError> {
        let decode_err = |e: ffmpeg_next::Error| TranscriptionError::AudioDecode {
            path: path.to_path_buf(),
            message: e.to_string(),
        };
        ffmpeg_next::init().map_err(decode_err)?;

        let mut ictx = ffmpeg_next::format::input(path).map_err(decode_err)?;
        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Audio)
            .ok_or_else(|| TranscriptionError::NoAudio(path.to_path_buf()))?;
        let stream_index = stream.index();

        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
            .map_err(decode_err)?;
        let mut decoder = codec_ctx.decoder().audio().map_err(decode_err)?;

        let mut resampler = ffmpeg_next::software::resampling::Context::get(
            decoder.format(),
            decoder.channel_layout(),
            decoder.rate(),
            Sample::F32(SampleLayout::Planar),
            ChannelLayout::MONO,
            sample_rate,
        )
        .map_err(decode_err)?;

        let mut samples: Vec<f32> = Vec::new();
        let mut decoded = Audio::empty();
        let mut resampled = Audio::empty();

        for (stream, packet) in ictx.packets() {
            if stream.index() != stream_index {
                continue;
            }
            decoder.send_packet(&packet).map_err(decode_err)?;
            while decoder.receive_frame(&mut decoded).is_ok() {
                resampler.run(&decoded, &mut resampled).map_err(decode_err)?;
                extract_f32_samples(&resampled, &mut samples);
            }
        }

        decoder.send_eof().map_err(decode_err)?;
        while decoder.receive_frame(&mut decoded).is_ok() {
            resampler.run(&decoded, &mut resampled).map_err(decode_err)?;
            extract_f32_samples(&resampled, &mut samples);
        }

        // The resampler may still hold buffered samples
        if let Ok(Some(delay)) = resampler.flush(&mut resampled) {
            if delay.output > 0 {
                extract_f32_samples(&resampled, &mut samples);
            }
        }

        let clip = AudioClip::new(samples, sample_rate);
        if clip.is_empty() {
            return Err(TranscriptionError::NoAudio(path.to_path_buf()));
        }
        log::debug!(
            "Decoded {:.2}s of narration from {}",
            clip.duration(),
            path.display()
        );
        Ok(clip)
    }
}

/// Extract f32 samples from a planar mono resampled frame.
fn extract_f32_samples(frame: &Audio, out: &mut Vec<f32>) {
    let num_samples = frame.samples();
    if num_samples == 0 {
        return;
    }
    let data = frame.data(0);
    // SAFETY: the resampler outputs planar f32, so plane 0 holds `num_samples` floats.
    let floats = unsafe { std::slice::from_raw_parts(data.as_ptr() as *const f32, num_samples) };
    out.extend_from_slice(floats);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_nonexistent_file() {
        let path = if cfg!(windows) {
            Path::new("Z:\\nonexistent\\narration.mp3")
        } else {
            Path::new("/nonexistent/narration.mp3")
        };
        let result = FfmpegAudioReader.read_mono(path, 16000);
        assert!(matches!(result, Err(TranscriptionError::AudioDecode { .. })));
    }

    #[test]
    fn test_read_non_media_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("narration.mp3");
        std::fs::write(&path, b"not audio at all").unwrap();
        assert!(FfmpegAudioReader.read_mono(&path, 16000).is_err());
    }
}
