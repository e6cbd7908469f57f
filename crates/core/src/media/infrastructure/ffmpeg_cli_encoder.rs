use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::media::domain::composition_plan::{
    format_seconds, CompositionError, CompositionPlan, MediaInput,
};
use crate::media::domain::video_encoder::{EncodeSettings, VideoEncoder};

/// Runs a composition plan through the `ffmpeg` executable.
///
/// The plan is rendered to a single `-filter_complex` invocation; stderr is
/// captured and returned in the error when ffmpeg exits non-zero. A background
/// that must repeat is looped by the demuxer with `-stream_loop`, so no frames
/// are held in memory.
pub struct FfmpegCliEncoder {
    settings: EncodeSettings,
}

impl FfmpegCliEncoder {
    pub fn new(settings: EncodeSettings) -> Self {
        Self { settings }
    }

    /// Full argument list, excluding the program name.
    pub fn command_args(
        &self,
        plan: &CompositionPlan,
        output: &Path,
    ) -> Result<Vec<OsString>, CompositionError> {
        if !plan.is_complete() {
            return Err(CompositionError::Incomplete("narration audio was never attached"));
        }
        let duration = plan
            .duration()
            .ok_or(CompositionError::Incomplete("output duration is unknown"))?;
        let audio = plan
            .audio_input()
            .ok_or(CompositionError::Incomplete("narration audio was never attached"))?;

        let mut args: Vec<OsString> = ["-y", "-hide_banner", "-loglevel", "error"]
            .iter()
            .map(OsString::from)
            .collect();

        for input in plan.inputs() {
            match input {
                MediaInput::Background {
                    path,
                    offset,
                    window,
                } => {
                    match plan.background_repeat() {
                        Some((loops, covered)) => {
                            args.push("-stream_loop".into());
                            args.push(loops.to_string().into());
                            args.push("-t".into());
                            args.push(format_seconds(covered).into());
                        }
                        None => {
                            args.push("-ss".into());
                            args.push(format_seconds(*offset).into());
                            args.push("-t".into());
                            args.push(format_seconds(*window).into());
                        }
                    }
                    args.push("-i".into());
                    args.push(path.into());
                }
                MediaInput::Still {
                    path,
                    fps,
                    duration,
                } => {
                    args.push("-loop".into());
                    args.push("1".into());
                    args.push("-framerate".into());
                    args.push(fps.to_string().into());
                    args.push("-t".into());
                    args.push(format_seconds(*duration).into());
                    args.push("-i".into());
                    args.push(path.into());
                }
                MediaInput::Audio { path } => {
                    args.push("-i".into());
                    args.push(path.into());
                }
            }
        }

        let s = &self.settings;
        let tail: Vec<String> = vec![
            "-filter_complex".into(),
            plan.filter_complex(),
            "-map".into(),
            plan.output_label(),
            "-map".into(),
            format!("{audio}:a:0"),
            "-c:v".into(),
            s.video_codec.clone(),
            "-b:v".into(),
            s.video_bitrate.clone(),
            "-c:a".into(),
            s.audio_codec.clone(),
            "-b:a".into(),
            s.audio_bitrate.clone(),
            "-r".into(),
            s.fps.to_string(),
            "-pix_fmt".into(),
            s.pixel_format.clone(),
            "-t".into(),
            format_seconds(duration),
            "-movflags".into(),
            "+faststart".into(),
        ];
        args.extend(tail.into_iter().map(OsString::from));
        args.push(output.into());
        Ok(args)
    }
}

impl VideoEncoder for FfmpegCliEncoder {
    fn encode(&self, plan: &CompositionPlan, output: &Path) -> Result<(), CompositionError> {
        let args = self.command_args(plan, output)?;
        ensure_parent_dir(output)?;
        if !is_ffmpeg_on_path() {
            return Err(CompositionError::EncoderNotFound);
        }

        log::info!(
            "Encoding {} with {} caption overlays",
            output.display(),
            plan.overlay_count()
        );
        log::debug!("ffmpeg {:?}", args);

        let result = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(CompositionError::EncoderSpawn)?;

        if !result.status.success() {
            return Err(CompositionError::EncoderFailed {
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

fn ensure_parent_dir(path: &Path) -> Result<(), CompositionError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|source| CompositionError::OutputDir {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
