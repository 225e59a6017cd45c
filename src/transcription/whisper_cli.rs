// ClipForge Whisper CLI Transcriber
// Copyright (c) 2026 Xing_The_Creator | ClipForge
//
// Runs the `whisper` command with word timestamps and reads back its JSON.

use super::{Transcriber, TranscriptionResult};
use crate::error::{ClipError, Result};
use crate::tools::production_tools::safe_arg_path;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

pub struct WhisperCli {
    program: PathBuf,
    model: String,
    language: Option<String>,
}

impl WhisperCli {
    pub fn new(program: PathBuf, model: &str, language: Option<String>) -> Self {
        Self {
            program,
            model: model.to_string(),
            language,
        }
    }

    fn build_args(&self, media: &Path, out_dir: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            safe_arg_path(media).into_os_string(),
            "--model".into(),
            self.model.clone().into(),
            "--word_timestamps".into(),
            "True".into(),
            "--output_format".into(),
            "json".into(),
            "--output_dir".into(),
            out_dir.as_os_str().to_os_string(),
            "--verbose".into(),
            "False".into(),
        ];
        if let Some(lang) = &self.language {
            args.push("--language".into());
            args.push(lang.clone().into());
        }
        args
    }
}

/// whisper names its output after the input file's stem.
fn output_json_path(media: &Path, out_dir: &Path) -> PathBuf {
    let stem = media
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| OsString::from("transcript"));
    let mut name = stem;
    name.push(".json");
    out_dir.join(name)
}

#[async_trait]
impl Transcriber for WhisperCli {
    fn name(&self) -> &str {
        "whisper-cli"
    }

    async fn transcribe(&self, media: &Path) -> Result<TranscriptionResult> {
        info!("[TRANSCRIBE] whisper ({}) on {:?}", self.model, media);

        let out_dir = tempfile::Builder::new()
            .prefix("clipforge-whisper-")
            .tempdir()?;
        let args = self.build_args(media, out_dir.path());
        debug!("[TRANSCRIBE] {:?} {:?}", self.program, args);

        let output = Command::new(&self.program)
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ClipError::Transcription(format!("failed to launch whisper: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: Vec<&str> = stderr.lines().rev().take(4).collect();
            return Err(ClipError::Transcription(format!(
                "whisper exited with {}: {}",
                output.status,
                tail.into_iter().rev().collect::<Vec<_>>().join(" | ")
            )));
        }

        let json_path = output_json_path(media, out_dir.path());
        let raw = tokio::fs::read_to_string(&json_path).await.map_err(|e| {
            ClipError::Transcription(format!("whisper wrote no {:?}: {}", json_path, e))
        })?;
        let result = TranscriptionResult::from_whisper_json(&raw)?;

        info!(
            "[TRANSCRIBE] {} words in {} segments",
            result.word_count(),
            result.segments.len()
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_request_word_timestamps() {
        let cli = WhisperCli::new(PathBuf::from("whisper"), "medium", Some("en".into()));
        let args: Vec<String> = cli
            .build_args(Path::new("clip_0.mp4"), Path::new("/tmp/w"))
            .iter()
            .map(|a| a.to_string_lossy().to_string())
            .collect();
        assert_eq!(args[0], "clip_0.mp4");
        assert!(args.windows(2).any(|w| w[0] == "--word_timestamps" && w[1] == "True"));
        assert!(args.windows(2).any(|w| w[0] == "--model" && w[1] == "medium"));
        assert!(args.windows(2).any(|w| w[0] == "--output_format" && w[1] == "json"));
        assert!(args.windows(2).any(|w| w[0] == "--language" && w[1] == "en"));
    }

    #[test]
    fn test_output_json_path_uses_stem() {
        assert_eq!(
            output_json_path(Path::new("/tmp/run/clip_3.mp4"), Path::new("/out")),
            PathBuf::from("/out/clip_3.json")
        );
    }

    #[tokio::test]
    async fn test_missing_program_is_transcription_error() {
        let cli = WhisperCli::new(
            PathBuf::from("/nonexistent/clipforge-whisper"),
            "tiny",
            None,
        );
        let err = cli.transcribe(Path::new("clip.mp4")).await.unwrap_err();
        assert!(matches!(err, ClipError::Transcription(_)));
    }
}
