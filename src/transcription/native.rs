// ClipForge Native Transcriber
// Copyright (c) 2026 Xing_The_Creator | ClipForge
//
// In-process whisper.cpp with token timestamps, no Python required.

use super::tokens::{group_tokens, RawToken};
use super::{Transcriber, TranscriptionResult};
use crate::error::{ClipError, Result};
use crate::tools::production_tools::extract_wav;
use crate::tools::Toolchain;
use async_trait::async_trait;
use hf_hub::api::sync::Api;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

const WHISPER_RATE: u32 = 16_000;

fn transcription_err(context: &str, e: impl std::fmt::Display) -> ClipError {
    ClipError::Transcription(format!("{}: {}", context, e))
}

pub struct NativeWhisper {
    model_path: PathBuf,
    language: Option<String>,
    tools: Toolchain,
}

impl NativeWhisper {
    pub async fn new(model: &str, language: Option<String>, tools: Toolchain) -> Result<Self> {
        let model_name = model.to_string();
        let model_path = tokio::task::spawn_blocking(move || Self::ensure_model(&model_name))
            .await
            .map_err(|e| transcription_err("model download task failed", e))??;

        Ok(Self {
            model_path,
            language,
            tools,
        })
    }

    /// Cached `ggml-<model>.bin`, downloaded from the whisper.cpp repo on first use.
    fn ensure_model(model_name: &str) -> Result<PathBuf> {
        let base_dir = match std::env::var("CLIPFORGE_CACHE_DIR") {
            Ok(dir) => PathBuf::from(dir).join("models"),
            Err(_) => dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("clipforge")
                .join("models"),
        };
        fs::create_dir_all(&base_dir)?;

        let filename = format!("ggml-{}.bin", model_name);
        let model_path = base_dir.join(&filename);
        if model_path.exists() {
            info!("[TRANSCRIBE] Using cached model {:?}", model_path);
            return Ok(model_path);
        }

        info!("[TRANSCRIBE] Downloading Whisper model {}...", filename);
        let api = Api::new().map_err(|e| transcription_err("hf-hub init", e))?;
        let repo = api.model("ggerganov/whisper.cpp".to_string());
        let downloaded = repo
            .get(&filename)
            .map_err(|e| transcription_err(&format!("download {}", filename), e))?;
        fs::copy(&downloaded, &model_path)?;

        info!("[TRANSCRIBE] Model cached at {:?}", model_path);
        Ok(model_path)
    }

    fn read_pcm(wav: &Path) -> Result<Vec<f32>> {
        let mut reader =
            hound::WavReader::open(wav).map_err(|e| transcription_err("open WAV", e))?;
        let spec = reader.spec();
        if spec.sample_rate != WHISPER_RATE || spec.channels != 1 {
            return Err(ClipError::Transcription(format!(
                "expected 16 kHz mono audio, got {} Hz x {}",
                spec.sample_rate, spec.channels
            )));
        }
        reader
            .samples::<i16>()
            .map(|s| s.map(|v| v as f32 / 32768.0))
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(|e| transcription_err("read WAV samples", e))
    }

    fn transcribe_blocking(
        model_path: &Path,
        wav: &Path,
        language: Option<&str>,
    ) -> Result<TranscriptionResult> {
        let pcm = Self::read_pcm(wav)?;

        let model = model_path.to_str().ok_or_else(|| {
            ClipError::Transcription(format!("model path {:?} is not UTF-8", model_path))
        })?;
        let ctx = WhisperContext::new_with_params(model, WhisperContextParameters::default())
            .map_err(|e| transcription_err("load model", format!("{:?}", e)))?;
        let mut state = ctx
            .create_state()
            .map_err(|e| transcription_err("create state", format!("{:?}", e)))?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        params.set_token_timestamps(true);
        params.set_language(language);
        let threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4) as i32;
        params.set_n_threads(threads);

        state
            .full(params, &pcm)
            .map_err(|e| transcription_err("inference", format!("{:?}", e)))?;

        let n_segments = state
            .full_n_segments()
            .map_err(|e| transcription_err("segment count", format!("{:?}", e)))?;

        let mut segments = Vec::with_capacity(n_segments.max(0) as usize);
        for seg in 0..n_segments {
            let n_tokens = state
                .full_n_tokens(seg)
                .map_err(|e| transcription_err("token count", format!("{:?}", e)))?;
            let mut tokens = Vec::with_capacity(n_tokens.max(0) as usize);
            for tok in 0..n_tokens {
                let text = state
                    .full_get_token_text(seg, tok)
                    .map_err(|e| transcription_err("token text", format!("{:?}", e)))?;
                let data = state
                    .full_get_token_data(seg, tok)
                    .map_err(|e| transcription_err("token data", format!("{:?}", e)))?;
                tokens.push(RawToken {
                    text,
                    t0: data.t0,
                    t1: data.t1,
                });
            }
            segments.push(super::Segment {
                words: group_tokens(&tokens),
            });
        }

        Ok(TranscriptionResult {
            segments,
            language: language.map(str::to_string),
        })
    }
}

#[async_trait]
impl Transcriber for NativeWhisper {
    fn name(&self) -> &str {
        "whisper-native"
    }

    async fn transcribe(&self, media: &Path) -> Result<TranscriptionResult> {
        info!("[TRANSCRIBE] Native whisper on {:?}", media);

        let scratch = tempfile::Builder::new()
            .prefix("clipforge-wav-")
            .tempdir()?;
        let wav = scratch.path().join("speech.wav");
        extract_wav(&self.tools, media, &wav).await?;

        let model_path = self.model_path.clone();
        let language = self.language.clone();
        let result = tokio::task::spawn_blocking(move || {
            Self::transcribe_blocking(&model_path, &wav, language.as_deref())
        })
        .await
        .map_err(|e| transcription_err("inference task failed", e))??;

        result.validate()?;
        info!("[TRANSCRIBE] {} words", result.word_count());
        Ok(result)
    }
}
