// ClipForge Configuration
// Copyright (c) 2026 Xing_The_Creator | ClipForge
//
// Resolved once at startup (defaults -> JSON file -> CLIPFORGE_* env -> CLI)
// and shared read-only for the rest of the run.

use crate::compose::captions::{CaptionStyle, CaptionVariant};
use crate::error::{ClipError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// What a batch run does when one window fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop the whole run at the first failed window.
    #[default]
    Abort,
    /// Log the failed window and carry on with the next one.
    Skip,
}

impl std::str::FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "skip" | "continue" => Ok(Self::Skip),
            other => Err(format!("unknown failure policy '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriberKind {
    /// The external `whisper` command-line tool.
    #[default]
    WhisperCli,
    /// In-process whisper.cpp (requires the `native-whisper` feature).
    Native,
}

impl std::str::FromStr for TranscriberKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "whisper" | "whisper_cli" | "whisper-cli" | "cli" => Ok(Self::WhisperCli),
            "native" | "whisper-rs" => Ok(Self::Native),
            other => Err(format!("unknown transcription engine '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    pub engine: TranscriberKind,
    /// Whisper model size, e.g. "medium" or "base.en".
    pub model: String,
    pub language: Option<String>,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            engine: TranscriberKind::WhisperCli,
            model: "medium".to_string(),
            language: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingConfig {
    pub video_codec: String,
    pub audio_codec: String,
    pub preset: String,
    pub crf: u8,
    pub audio_bitrate: String,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            preset: "medium".to_string(),
            crf: 23,
            audio_bitrate: "192k".to_string(),
        }
    }
}

/// Explicit external tool locations. `None` means "look it up on PATH".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    pub ffmpeg: Option<PathBuf>,
    pub ffprobe: Option<PathBuf>,
    pub ytdlp: Option<PathBuf>,
    pub whisper: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    pub min_clip_length: u32,
    pub max_clip_length: u32,
    /// Batch window width in seconds.
    pub clip_interval: u32,
    pub music_gain: f64,
    pub background_folder: PathBuf,
    pub music_folder: PathBuf,
    pub output_dir: PathBuf,
    /// yt-dlp format selector for the source download.
    pub download_format: String,
    pub seed: Option<u64>,
    pub failure_policy: FailurePolicy,
    pub captions: CaptionStyle,
    pub transcription: TranscriptionConfig,
    pub encoding: EncodingConfig,
    pub tools: ToolPaths,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            min_clip_length: 15,
            max_clip_length: 35,
            clip_interval: 240,
            music_gain: 0.15,
            background_folder: PathBuf::from("backgrounds"),
            music_folder: PathBuf::from("music"),
            output_dir: PathBuf::from("."),
            download_format: "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best".to_string(),
            seed: None,
            failure_policy: FailurePolicy::Abort,
            captions: CaptionStyle::default(),
            transcription: TranscriptionConfig::default(),
            encoding: EncodingConfig::default(),
            tools: ToolPaths::default(),
        }
    }
}

const ENV_PREFIX: &str = "CLIPFORGE_";

impl StudioConfig {
    /// Defaults, then the optional JSON file, then `CLIPFORGE_*` variables.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut config = match file {
            Some(path) => Self::from_json_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| ClipError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Override fields from environment-style key lookups.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        if let Some(v) = get("MIN_CLIP_LENGTH") {
            self.min_clip_length = parse_env("MIN_CLIP_LENGTH", &v)?;
        }
        if let Some(v) = get("MAX_CLIP_LENGTH") {
            self.max_clip_length = parse_env("MAX_CLIP_LENGTH", &v)?;
        }
        if let Some(v) = get("CLIP_INTERVAL") {
            self.clip_interval = parse_env("CLIP_INTERVAL", &v)?;
        }
        if let Some(v) = get("MUSIC_GAIN") {
            self.music_gain = parse_env("MUSIC_GAIN", &v)?;
        }
        if let Some(v) = get("BACKGROUND_FOLDER") {
            self.background_folder = PathBuf::from(v);
        }
        if let Some(v) = get("MUSIC_FOLDER") {
            self.music_folder = PathBuf::from(v);
        }
        if let Some(v) = get("OUTPUT_DIR") {
            self.output_dir = PathBuf::from(v);
        }
        if let Some(v) = get("SEED") {
            self.seed = Some(parse_env("SEED", &v)?);
        }
        if let Some(v) = get("FAILURE_POLICY") {
            self.failure_policy = parse_env("FAILURE_POLICY", &v)?;
        }
        if let Some(v) = get("CAPTION_STYLE") {
            let variant: CaptionVariant = parse_env("CAPTION_STYLE", &v)?;
            self.captions = self.captions.clone().with_variant(variant);
        }
        if let Some(v) = get("WHISPER_MODEL") {
            self.transcription.model = v;
        }
        if let Some(v) = get("WHISPER_LANGUAGE") {
            self.transcription.language = Some(v);
        }
        if let Some(v) = get("TRANSCRIBER") {
            self.transcription.engine = parse_env("TRANSCRIBER", &v)?;
        }
        if let Some(v) = get("FFMPEG") {
            self.tools.ffmpeg = Some(PathBuf::from(v));
        }
        if let Some(v) = get("FFPROBE") {
            self.tools.ffprobe = Some(PathBuf::from(v));
        }
        if let Some(v) = get("YTDLP") {
            self.tools.ytdlp = Some(PathBuf::from(v));
        }
        if let Some(v) = get("WHISPER") {
            self.tools.whisper = Some(PathBuf::from(v));
        }

        debug!("[CONFIG] Environment overrides applied");
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_clip_length == 0 {
            return Err(ClipError::Config("min_clip_length must be at least 1".into()));
        }
        if self.min_clip_length > self.max_clip_length {
            return Err(ClipError::Config(format!(
                "min_clip_length ({}) exceeds max_clip_length ({})",
                self.min_clip_length, self.max_clip_length
            )));
        }
        if self.clip_interval == 0 {
            return Err(ClipError::Config("clip_interval must be positive".into()));
        }
        if !self.music_gain.is_finite() || self.music_gain < 0.0 {
            return Err(ClipError::Config(format!(
                "music_gain must be a non-negative number, got {}",
                self.music_gain
            )));
        }
        self.captions.validate()?;
        Ok(())
    }
}

fn parse_env<T>(name: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse::<T>().map_err(|e| {
        ClipError::Config(format!("{}{}='{}': {}", ENV_PREFIX, name, value, e))
    })
}
