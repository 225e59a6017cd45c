// ClipForge Transcription
// Copyright (c) 2026 Xing_The_Creator | ClipForge
//
// Word-timed speech transcription. The composition side only ever sees
// `TranscriptionResult`; which engine produced it is irrelevant there.

pub mod whisper_cli;

#[cfg(feature = "native-whisper")]
pub mod native;

mod tokens;

use crate::config::{TranscriberKind, TranscriptionConfig};
use crate::error::{ClipError, Result};
use crate::tools::Toolchain;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// One recognized word. Times are seconds from the start of the clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    #[serde(rename = "word")]
    pub text: String,
    pub start: f64,
    pub end: f64,
}

impl Word {
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    #[serde(default)]
    pub words: Vec<Word>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionResult {
    #[serde(default)]
    pub segments: Vec<Segment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl TranscriptionResult {
    pub fn from_words(words: Vec<Word>) -> Self {
        Self {
            segments: vec![Segment { words }],
            language: None,
        }
    }

    /// Every word, segments in order and words in order within each.
    pub fn words(&self) -> impl Iterator<Item = &Word> {
        self.segments.iter().flat_map(|s| s.words.iter())
    }

    pub fn word_count(&self) -> usize {
        self.segments.iter().map(|s| s.words.len()).sum()
    }

    /// Parse whisper's JSON output (`segments[].words[]` with `word`,
    /// `start`, `end`). Unknown fields are ignored.
    pub fn from_whisper_json(raw: &str) -> Result<Self> {
        let parsed: Self = serde_json::from_str(raw)
            .map_err(|e| ClipError::Transcription(format!("unreadable transcript JSON: {}", e)))?;
        parsed.validate()?;
        Ok(parsed)
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path).await?;
        Self::from_whisper_json(&raw)
    }

    /// Timestamps must be finite and no word may end before it starts.
    /// Overlapping or out-of-order words are tolerated.
    pub fn validate(&self) -> Result<()> {
        for (i, word) in self.words().enumerate() {
            if !word.start.is_finite() || !word.end.is_finite() {
                return Err(ClipError::Transcription(format!(
                    "word {} ({:?}) has a non-finite timestamp",
                    i, word.text
                )));
            }
            if word.end < word.start {
                return Err(ClipError::Transcription(format!(
                    "word {} ({:?}) ends at {:.3}s before it starts at {:.3}s",
                    i, word.text, word.end, word.start
                )));
            }
        }
        Ok(())
    }
}

/// Turns a media file into a word-timed transcription.
#[async_trait]
pub trait Transcriber: Send + Sync {
    fn name(&self) -> &str;

    async fn transcribe(&self, media: &Path) -> Result<TranscriptionResult>;
}

/// Returns the same transcription for every input.
#[derive(Debug, Clone)]
pub struct PreparedTranscript(pub TranscriptionResult);

#[async_trait]
impl Transcriber for PreparedTranscript {
    fn name(&self) -> &str {
        "prepared"
    }

    async fn transcribe(&self, _media: &Path) -> Result<TranscriptionResult> {
        Ok(self.0.clone())
    }
}

pub async fn build_transcriber(
    config: &TranscriptionConfig,
    tools: &Toolchain,
) -> Result<Arc<dyn Transcriber>> {
    info!(
        "[TRANSCRIBE] Engine: {:?}, model: {}",
        config.engine, config.model
    );
    match config.engine {
        TranscriberKind::WhisperCli => {
            let program = tools.whisper.clone().ok_or_else(|| {
                ClipError::Transcription("the `whisper` command was not found on PATH".into())
            })?;
            Ok(Arc::new(whisper_cli::WhisperCli::new(
                program,
                &config.model,
                config.language.clone(),
            )))
        }
        #[cfg(feature = "native-whisper")]
        TranscriberKind::Native => {
            let engine =
                native::NativeWhisper::new(&config.model, config.language.clone(), tools.clone())
                    .await?;
            Ok(Arc::new(engine))
        }
        #[cfg(not(feature = "native-whisper"))]
        TranscriberKind::Native => Err(ClipError::Config(
            "native transcription requires building with the `native-whisper` feature".into(),
        )),
    }
}
