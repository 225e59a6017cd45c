// Shared helpers for the ffmpeg-backed integration tests.
#![allow(dead_code)]

use std::path::Path;
use std::process::Command;

fn succeeds(program: &str, args: &[&str]) -> bool {
    Command::new(program)
        .args(args)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn listing(args: &[&str]) -> String {
    Command::new("ffmpeg")
        .args(args)
        .output()
        .map(|o| String::from_utf8_lossy(&o.stdout).to_string())
        .unwrap_or_default()
}

/// ffmpeg + ffprobe with the encoders and filters the pipeline uses.
/// Tests return early (and pass) when this is false.
pub fn ffmpeg_ready() -> bool {
    if !succeeds("ffmpeg", &["-version"]) || !succeeds("ffprobe", &["-version"]) {
        eprintln!("skipping: ffmpeg/ffprobe not installed");
        return false;
    }
    let encoders = listing(&["-hide_banner", "-encoders"]);
    let filters = listing(&["-hide_banner", "-filters"]);
    let ready = encoders.contains("libx264")
        && encoders.contains("libmp3lame")
        && filters.contains(" ass ");
    if !ready {
        eprintln!("skipping: ffmpeg lacks libx264, libmp3lame or libass");
    }
    ready
}

fn ffmpeg(args: &[&str]) {
    let output = Command::new("ffmpeg")
        .args(["-y", "-hide_banner", "-loglevel", "error"])
        .args(args)
        .output()
        .expect("failed to execute ffmpeg");
    if !output.status.success() {
        panic!(
            "ffmpeg fixture failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

/// Test-pattern video with a sine-tone audio track.
pub fn make_video(path: &Path, seconds: u32, size: &str) {
    let video = format!("testsrc=duration={}:size={}:rate=25", seconds, size);
    let audio = format!("sine=frequency=440:duration={}", seconds);
    ffmpeg(&[
        "-f", "lavfi", "-i", &video,
        "-f", "lavfi", "-i", &audio,
        "-c:v", "libx264", "-pix_fmt", "yuv420p",
        "-c:a", "aac", "-shortest",
        path.to_str().unwrap(),
    ]);
}

/// Test-pattern video without audio.
pub fn make_silent_video(path: &Path, seconds: u32, size: &str) {
    let video = format!("testsrc2=duration={}:size={}:rate=25", seconds, size);
    ffmpeg(&[
        "-f", "lavfi", "-i", &video,
        "-c:v", "libx264", "-pix_fmt", "yuv420p",
        path.to_str().unwrap(),
    ]);
}

pub fn make_music(path: &Path, seconds: u32) {
    let audio = format!("sine=frequency=220:duration={}", seconds);
    ffmpeg(&[
        "-f", "lavfi", "-i", &audio,
        "-c:a", "libmp3lame",
        path.to_str().unwrap(),
    ]);
}
