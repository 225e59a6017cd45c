// ClipForge Production Tools - Cutting & Audio Extraction
// Copyright (c) 2026 Xing_The_Creator | ClipForge
//
// FFmpeg wrappers used between download and composition.

use crate::config::EncodingConfig;
use crate::error::{ClipError, Result};
use crate::selector::Selection;
use crate::tools::source_tools::stderr_tail;
use crate::tools::toolchain::Toolchain;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Prefix relative paths starting with `-` so tools never read them as flags.
pub fn safe_arg_path(path: &Path) -> PathBuf {
    if path.to_string_lossy().starts_with('-') {
        Path::new(".").join(path)
    } else {
        path.to_path_buf()
    }
}

/// Run ffmpeg with `args`, turning a non-zero exit into `ClipError::Render`.
pub async fn run_ffmpeg(tools: &Toolchain, args: &[OsString], what: &str) -> Result<()> {
    run_ffmpeg_in(tools, args, what, None).await
}

/// Same as [`run_ffmpeg`], optionally from inside `cwd`.
pub async fn run_ffmpeg_in(
    tools: &Toolchain,
    args: &[OsString],
    what: &str,
    cwd: Option<&Path>,
) -> Result<()> {
    debug!("[PROD] ffmpeg {:?} (cwd {:?})", args, cwd);

    let mut cmd = tools.ffmpeg_command();
    cmd.arg("-nostdin").args(args);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    let output = cmd
        .output()
        .await
        .map_err(|e| ClipError::Render(format!("{}: failed to launch ffmpeg: {}", what, e)))?;

    if !output.status.success() {
        return Err(ClipError::Render(format!(
            "{}: ffmpeg exited with {}: {}",
            what,
            output.status,
            stderr_tail(&output.stderr)
        )));
    }
    Ok(())
}

pub(crate) fn os_args<I, S>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    args.into_iter().map(Into::into).collect()
}

fn build_cut_args(
    input: &Path,
    selection: &Selection,
    encoding: &EncodingConfig,
    output: &Path,
) -> Vec<OsString> {
    let mut args = os_args(["-y", "-hide_banner", "-loglevel", "error"]);
    if !selection.full_source {
        args.extend(os_args(["-ss".to_string(), format!("{:.3}", selection.start)]));
    }
    args.push("-i".into());
    args.push(safe_arg_path(input).into_os_string());
    if !selection.full_source {
        args.extend(os_args(["-t".to_string(), format!("{:.3}", selection.length)]));
    }
    args.extend(os_args([
        "-map",
        "0:v:0",
        "-map",
        "0:a:0?",
        "-c:v",
        encoding.video_codec.as_str(),
        "-preset",
        encoding.preset.as_str(),
        "-crf",
    ]));
    args.push(encoding.crf.to_string().into());
    args.extend(os_args([
        "-c:a",
        encoding.audio_codec.as_str(),
        "-b:a",
        encoding.audio_bitrate.as_str(),
        "-avoid_negative_ts",
        "make_zero",
    ]));
    args.push(safe_arg_path(output).into_os_string());
    args
}

/// Re-encode `selection` of `input` into a standalone clip.
/// The clip is re-encoded and starts exactly at `selection.start`.
pub async fn cut_segment(
    tools: &Toolchain,
    input: &Path,
    selection: &Selection,
    encoding: &EncodingConfig,
    output: &Path,
) -> Result<PathBuf> {
    info!(
        "[PROD] Cutting {:?} ({:.2}s + {:.2}s) -> {:?}",
        input, selection.start, selection.length, output
    );
    let args = build_cut_args(input, selection, encoding, output);
    run_ffmpeg(tools, &args, "segment cut").await?;
    Ok(output.to_path_buf())
}

fn build_wav_args(input: &Path, output: &Path) -> Vec<OsString> {
    let mut args = os_args(["-y", "-hide_banner", "-loglevel", "error", "-i"]);
    args.push(safe_arg_path(input).into_os_string());
    args.extend(os_args([
        "-vn", "-ac", "1", "-ar", "16000", "-c:a", "pcm_s16le",
    ]));
    args.push(safe_arg_path(output).into_os_string());
    args
}

/// Extract 16 kHz mono PCM for speech recognition.
pub async fn extract_wav(tools: &Toolchain, input: &Path, output: &Path) -> Result<PathBuf> {
    info!("[PROD] Extracting speech audio: {:?}", input);
    let args = build_wav_args(input, output);
    run_ffmpeg(tools, &args, "audio extraction").await?;
    Ok(output.to_path_buf())
}
