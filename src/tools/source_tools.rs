// ClipForge Source Tools - Video Acquisition & Inspection
// Copyright (c) 2026 Xing_The_Creator | ClipForge
//
// This module handles:
// 1. Source downloads via yt-dlp
// 2. Media inspection via ffprobe
// 3. Asset pool directory scanning

use crate::error::{ClipError, Result};
use crate::tools::production_tools::safe_arg_path;
use crate::tools::toolchain::{Toolchain, YtDlpLauncher};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;
use walkdir::WalkDir;

const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// File name of the downloaded source inside the run's work directory.
pub const SOURCE_FILE_NAME: &str = "video.mp4";

/// Reject anything that is not an absolute http(s) URL before yt-dlp sees it.
pub fn validate_source_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ClipError::Download(format!("'{}' is not a valid URL: {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ClipError::Download(format!(
                "unsupported URL scheme '{}' in '{}'",
                other, raw
            )))
        }
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(ClipError::Download(format!("'{}' has no host", raw)));
    }
    Ok(url)
}

fn build_ytdlp_download_args(url: &Url, output_path: &Path, format: &str) -> Vec<String> {
    vec![
        "-f".to_string(),
        format.to_string(),
        "--merge-output-format".to_string(),
        "mp4".to_string(),
        "--no-playlist".to_string(),
        "--force-overwrites".to_string(),
        "-o".to_string(),
        safe_arg_path(output_path).to_string_lossy().to_string(),
        "--".to_string(),
        url.to_string(),
    ]
}

fn build_ytdlp_title_args(url: &Url) -> Vec<String> {
    vec![
        "--print".to_string(),
        "%(title)s".to_string(),
        "--no-download".to_string(),
        "--no-playlist".to_string(),
        "--".to_string(),
        url.to_string(),
    ]
}

fn launcher(tools: &Toolchain) -> Result<&YtDlpLauncher> {
    tools
        .ytdlp
        .as_ref()
        .ok_or_else(|| ClipError::Download("yt-dlp is not installed".into()))
}

/// Download `url` to `<out_dir>/video.mp4`.
pub async fn download_video(
    tools: &Toolchain,
    url: &str,
    out_dir: &Path,
    format: &str,
) -> Result<PathBuf> {
    let url = validate_source_url(url)?;
    tokio::fs::create_dir_all(out_dir).await?;
    let output_path = out_dir.join(SOURCE_FILE_NAME);
    run_download(tools, &url, &output_path, format).await?;
    Ok(output_path)
}

/// Download `url` into `out_dir`, naming the file after the video title.
pub async fn download_titled(
    tools: &Toolchain,
    url: &str,
    out_dir: &Path,
    format: &str,
) -> Result<PathBuf> {
    let url = validate_source_url(url)?;
    let title = fetch_title(tools, &url).await?;
    tokio::fs::create_dir_all(out_dir).await?;
    let output_path = out_dir.join(format!("{}.mp4", sanitize_title(&title)));
    run_download(tools, &url, &output_path, format).await?;
    Ok(output_path)
}

async fn fetch_title(tools: &Toolchain, url: &Url) -> Result<String> {
    let output = launcher(tools)?
        .command()
        .args(build_ytdlp_title_args(url))
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| ClipError::Download(format!("failed to launch yt-dlp: {}", e)))?;

    if !output.status.success() {
        return Err(ClipError::Download(format!(
            "title lookup for {} failed: {}",
            url,
            stderr_tail(&output.stderr)
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
}

async fn run_download(tools: &Toolchain, url: &Url, output_path: &Path, format: &str) -> Result<()> {
    info!("[SOURCE] Downloading {} -> {:?}", url, output_path);

    let output = launcher(tools)?
        .command()
        .args(build_ytdlp_download_args(url, output_path, format))
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| ClipError::Download(format!("failed to launch yt-dlp: {}", e)))?;

    if !output.status.success() {
        return Err(ClipError::Download(format!(
            "yt-dlp exited with {} for {}: {}",
            output.status,
            url,
            stderr_tail(&output.stderr)
        )));
    }
    if !output_path.exists() {
        return Err(ClipError::Download(format!(
            "yt-dlp reported success but {:?} was not written",
            output_path
        )));
    }
    Ok(())
}

/// File-system safe version of a video title.
pub fn sanitize_title(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == ' ' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim().trim_start_matches('-').to_string();
    if cleaned.is_empty() {
        "video".to_string()
    } else {
        cleaned
    }
}

/// What ffprobe reports about a media file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaProbe {
    pub duration: f64,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub has_video: bool,
    pub has_audio: bool,
}

#[derive(Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    format: Option<FfprobeFormat>,
}

#[derive(Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
}

#[derive(Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Parse `ffprobe -print_format json -show_format -show_streams` output.
pub fn parse_ffprobe_json(raw: &str) -> std::result::Result<MediaProbe, String> {
    let parsed: FfprobeOutput =
        serde_json::from_str(raw).map_err(|e| format!("unreadable ffprobe output: {}", e))?;

    let video = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"));
    let has_audio = parsed
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    let container_duration = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .and_then(|d| d.parse::<f64>().ok());
    let stream_duration = parsed
        .streams
        .iter()
        .filter_map(|s| s.duration.as_deref())
        .filter_map(|d| d.parse::<f64>().ok())
        .fold(None, |acc: Option<f64>, d| Some(acc.map_or(d, |a| a.max(d))));

    let duration = container_duration
        .or(stream_duration)
        .ok_or_else(|| "no duration reported".to_string())?;

    Ok(MediaProbe {
        duration,
        width: video.and_then(|v| v.width),
        height: video.and_then(|v| v.height),
        has_video: video.is_some(),
        has_audio,
    })
}

/// Inspect a media file with ffprobe, bounded by a timeout.
pub async fn probe_media(tools: &Toolchain, path: &Path) -> Result<MediaProbe> {
    let safe_path = safe_arg_path(path);

    let output = tokio::time::timeout(
        PROBE_TIMEOUT,
        tools
            .ffprobe_command()
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(&safe_path)
            .output(),
    )
    .await
    .map_err(|_| ClipError::decode(path, "ffprobe timed out"))?
    .map_err(|e| ClipError::decode(path, format!("failed to launch ffprobe: {}", e)))?;

    if !output.status.success() {
        return Err(ClipError::decode(path, stderr_tail(&output.stderr)));
    }

    let probe = parse_ffprobe_json(&String::from_utf8_lossy(&output.stdout))
        .map_err(|reason| ClipError::decode(path, reason))?;
    debug!("[SOURCE] Probed {:?}: {:?}", path, probe);
    Ok(probe)
}

/// Regular files directly inside `dir` whose extension matches
/// (case-insensitively), in path order. A missing directory is an empty pool.
pub fn scan_pool(dir: &Path, extension: &str) -> Vec<PathBuf> {
    if !dir.is_dir() {
        debug!("[SOURCE] Pool directory {:?} does not exist", dir);
        return Vec::new();
    }

    let mut found: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|ext| ext.to_str())
                .map_or(false, |ext| ext.eq_ignore_ascii_case(extension))
        })
        .collect();
    found.sort();
    found
}

/// Last few lines of a tool's stderr, for error messages.
pub(crate) fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(6);
    lines[start..].join(" | ")
}
