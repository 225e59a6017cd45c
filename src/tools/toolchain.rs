// ClipForge Toolchain - External Program Resolution
// Copyright (c) 2026 Xing_The_Creator | ClipForge
//
// Resolves ffmpeg, ffprobe, yt-dlp and whisper once at startup so every
// later invocation uses the same binaries.

use crate::config::ToolPaths;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// How yt-dlp gets launched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum YtDlpLauncher {
    /// A standalone `yt-dlp` executable.
    Standalone(PathBuf),
    /// `python -m yt_dlp` through the given interpreter.
    PythonModule(PathBuf),
}

impl YtDlpLauncher {
    pub fn program(&self) -> &Path {
        match self {
            YtDlpLauncher::Standalone(path) => path,
            YtDlpLauncher::PythonModule(python) => python,
        }
    }

    /// Arguments that must precede every yt-dlp argument list.
    pub fn prefix_args(&self) -> Vec<String> {
        match self {
            YtDlpLauncher::Standalone(_) => Vec::new(),
            YtDlpLauncher::PythonModule(_) => vec!["-m".to_string(), "yt_dlp".to_string()],
        }
    }

    pub fn command(&self) -> Command {
        let mut cmd = Command::new(self.program());
        cmd.args(self.prefix_args());
        cmd
    }
}

#[derive(Debug, Clone)]
pub struct Toolchain {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
    pub ytdlp: Option<YtDlpLauncher>,
    pub whisper: Option<PathBuf>,
    missing: Vec<&'static str>,
}

impl Default for Toolchain {
    /// Bare program names, looked up by the OS at spawn time.
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
            ytdlp: Some(YtDlpLauncher::Standalone(PathBuf::from("yt-dlp"))),
            whisper: Some(PathBuf::from("whisper")),
            missing: Vec::new(),
        }
    }
}

impl Toolchain {
    pub async fn resolve(paths: &ToolPaths) -> Self {
        let mut missing = Vec::new();

        let ffmpeg = locate("ffmpeg", paths.ffmpeg.as_deref()).unwrap_or_else(|| {
            missing.push("ffmpeg");
            PathBuf::from("ffmpeg")
        });
        let ffprobe = locate("ffprobe", paths.ffprobe.as_deref()).unwrap_or_else(|| {
            missing.push("ffprobe");
            PathBuf::from("ffprobe")
        });

        let ytdlp = match paths.ytdlp.as_deref() {
            Some(explicit) => Some(YtDlpLauncher::Standalone(explicit.to_path_buf())),
            None => find_ytdlp().await,
        };
        if ytdlp.is_none() {
            missing.push("yt-dlp");
        }

        let whisper = locate("whisper", paths.whisper.as_deref());

        for tool in &missing {
            warn!("[TOOLS] '{}' was not found on PATH", tool);
        }
        info!(
            "[TOOLS] ffmpeg={:?} ffprobe={:?} yt-dlp={:?} whisper={:?}",
            ffmpeg, ffprobe, ytdlp, whisper
        );

        Self {
            ffmpeg,
            ffprobe,
            ytdlp,
            whisper,
            missing,
        }
    }

    /// Required tools that could not be found during resolution.
    pub fn missing_tools(&self) -> &[&'static str] {
        &self.missing
    }

    pub fn ffmpeg_command(&self) -> Command {
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.kill_on_drop(true);
        cmd
    }

    pub fn ffprobe_command(&self) -> Command {
        let mut cmd = Command::new(&self.ffprobe);
        cmd.kill_on_drop(true);
        cmd
    }
}

fn locate(name: &str, explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    which::which(name).ok()
}

/// Standalone binary first, then any python interpreter that has the module.
async fn find_ytdlp() -> Option<YtDlpLauncher> {
    if let Ok(path) = which::which("yt-dlp") {
        if responds_to_version(Command::new(&path)).await {
            debug!("[TOOLS] Found standalone yt-dlp at {:?}", path);
            return Some(YtDlpLauncher::Standalone(path));
        }
        warn!("[TOOLS] {:?} exists but --version failed", path);
    }

    for candidate in ["python3", "python", "py"] {
        let Ok(python) = which::which(candidate) else {
            continue;
        };
        let mut cmd = Command::new(&python);
        cmd.args(["-m", "yt_dlp"]);
        if responds_to_version(cmd).await {
            debug!("[TOOLS] Found yt-dlp module via {:?}", python);
            return Some(YtDlpLauncher::PythonModule(python));
        }
    }
    None
}

async fn responds_to_version(mut cmd: Command) -> bool {
    cmd.arg("--version")
        .kill_on_drop(true)
        .output()
        .await
        .map(|o| o.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launcher_prefix() {
        let standalone = YtDlpLauncher::Standalone(PathBuf::from("/usr/bin/yt-dlp"));
        assert!(standalone.prefix_args().is_empty());
        assert_eq!(standalone.program(), Path::new("/usr/bin/yt-dlp"));

        let module = YtDlpLauncher::PythonModule(PathBuf::from("python3"));
        assert_eq!(module.prefix_args(), vec!["-m", "yt_dlp"]);
    }

    #[tokio::test]
    async fn test_explicit_paths_win() {
        let paths = ToolPaths {
            ffmpeg: Some(PathBuf::from("/opt/ff/ffmpeg")),
            ffprobe: Some(PathBuf::from("/opt/ff/ffprobe")),
            ytdlp: Some(PathBuf::from("/opt/yt-dlp")),
            whisper: None,
        };
        let tools = Toolchain::resolve(&paths).await;
        assert_eq!(tools.ffmpeg, PathBuf::from("/opt/ff/ffmpeg"));
        assert_eq!(tools.ffprobe, PathBuf::from("/opt/ff/ffprobe"));
        assert_eq!(
            tools.ytdlp,
            Some(YtDlpLauncher::Standalone(PathBuf::from("/opt/yt-dlp")))
        );
        assert!(tools.missing_tools().is_empty());
    }
}
