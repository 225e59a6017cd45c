// ClipForge Studio - Run Orchestration
// Copyright (c) 2026 Xing_The_Creator | ClipForge
//
// Download -> select -> cut -> transcribe -> compose, once (single mode)
// or once per fixed-width window of the source (batch mode). Each window
// render is a function of its index alone; windows run one after another.

use crate::compose::assets::WorkDir;
use crate::compose::{CompositionEngine, RenderReport};
use crate::config::{FailurePolicy, StudioConfig};
use crate::error::{ClipError, Result};
use crate::random::{RandomFactory, SeedPolicy};
use crate::selector::{plan_windows, BatchWindow, SegmentSelector};
use crate::tools::production_tools::cut_segment;
use crate::tools::source_tools::{download_titled, download_video, probe_media};
use crate::tools::Toolchain;
use crate::transcription::{build_transcriber, Transcriber, TranscriptionResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub type ProgressCallback = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// One clip from anywhere in the source.
    Single,
    /// One clip per `clip_interval` window of the source.
    Batch,
}

/// `output.mp4` for single mode, `output_<index>.mp4` for batch windows.
pub fn output_name(mode: RunMode, index: usize) -> String {
    match mode {
        RunMode::Single => "output.mp4".to_string(),
        RunMode::Batch => format!("output_{}.mp4", index),
    }
}

fn clip_name(mode: RunMode, index: usize) -> String {
    match mode {
        RunMode::Single => "clip.mp4".to_string(),
        RunMode::Batch => format!("clip_{}.mp4", index),
    }
}

/// Outcome of a whole run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub rendered: Vec<RenderReport>,
    /// Windows that failed under [`FailurePolicy::Skip`], tagged with their index.
    pub failures: Vec<ClipError>,
    pub windows_planned: usize,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn outputs(&self) -> Vec<&Path> {
        self.rendered.iter().map(|r| r.output.as_path()).collect()
    }
}

pub struct Studio {
    config: Arc<StudioConfig>,
    tools: Toolchain,
    selector: SegmentSelector,
    engine: CompositionEngine,
    transcriber: Arc<dyn Transcriber>,
    randomness: Arc<dyn RandomFactory>,
    progress: Option<ProgressCallback>,
}

impl Studio {
    pub fn new(
        config: Arc<StudioConfig>,
        tools: Toolchain,
        transcriber: Arc<dyn Transcriber>,
    ) -> Result<Self> {
        config.validate()?;
        let selector = SegmentSelector::new(config.min_clip_length, config.max_clip_length)?;
        let engine = CompositionEngine::new(&config, tools.clone());
        let randomness: Arc<dyn RandomFactory> = Arc::new(SeedPolicy::from_seed(config.seed));

        Ok(Self {
            config,
            tools,
            selector,
            engine,
            transcriber,
            randomness,
            progress: None,
        })
    }

    /// Resolve tools and the configured transcriber, then build a studio.
    pub async fn from_config(config: Arc<StudioConfig>) -> Result<Self> {
        config.validate()?;
        let tools = Toolchain::resolve(&config.tools).await;
        let transcriber = build_transcriber(&config.transcription, &tools).await?;
        Self::new(config, tools, transcriber)
    }

    pub fn with_randomness(mut self, randomness: Arc<dyn RandomFactory>) -> Self {
        self.randomness = randomness;
        self
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.tools
    }

    fn report(&self, msg: &str) {
        info!("[STUDIO] {}", msg);
        if let Some(cb) = &self.progress {
            cb(msg);
        }
    }

    /// Download `url` into a scratch directory and process it.
    pub async fn run(&self, url: &str, mode: RunMode) -> Result<RunReport> {
        let work = WorkDir::new("clipforge-run-")?;
        self.report(&format!("Downloading {}", url));
        let source = download_video(
            &self.tools,
            url,
            work.path(),
            &self.config.download_format,
        )
        .await?;
        self.process_source(&source, mode, work.path()).await
    }

    /// Process an already-local source video.
    pub async fn process_source(
        &self,
        source: &Path,
        mode: RunMode,
        work_dir: &Path,
    ) -> Result<RunReport> {
        let probe = probe_media(&self.tools, source).await?;
        if !probe.duration.is_finite() || probe.duration <= 0.0 {
            return Err(ClipError::InvalidSource(format!(
                "{:?} has duration {}",
                source, probe.duration
            )));
        }
        let duration = probe.duration;
        self.report(&format!("Source is {:.1}s long", duration));

        match mode {
            RunMode::Single => {
                let rendered = self.render_window(source, duration, None, work_dir).await?;
                Ok(RunReport {
                    rendered: vec![rendered],
                    failures: Vec::new(),
                    windows_planned: 1,
                })
            }
            RunMode::Batch => self.run_batch(source, duration, work_dir).await,
        }
    }

    async fn run_batch(&self, source: &Path, duration: f64, work_dir: &Path) -> Result<RunReport> {
        let windows = plan_windows(duration, self.config.clip_interval)?;
        let mut report = RunReport {
            windows_planned: windows.len(),
            ..RunReport::default()
        };

        if windows.is_empty() {
            warn!(
                "[STUDIO] Source ({:.1}s) is shorter than one {}s window; nothing to render",
                duration, self.config.clip_interval
            );
            return Ok(report);
        }

        for window in &windows {
            self.report(&format!(
                "Clip {}/{} (window {:.0}s..{:.0}s)",
                window.index + 1,
                windows.len(),
                window.start,
                window.end
            ));
            match self.render_window(source, duration, Some(window), work_dir).await {
                Ok(rendered) => report.rendered.push(rendered),
                Err(e) => {
                    let e = e.in_window(window.index);
                    match self.config.failure_policy {
                        FailurePolicy::Abort => return Err(e),
                        FailurePolicy::Skip => {
                            error!("[STUDIO] Skipping failed {}", e);
                            report.failures.push(e);
                        }
                    }
                }
            }
        }

        self.report(&format!(
            "Batch finished: {} rendered, {} failed",
            report.rendered.len(),
            report.failures.len()
        ));
        Ok(report)
    }

    /// Render one clip. `window` is `None` in single mode.
    ///
    /// Depends only on the window (or its absence) and the studio's
    /// immutable state, so windows can be rendered in any order.
    pub async fn render_window(
        &self,
        source: &Path,
        source_duration: f64,
        window: Option<&BatchWindow>,
        work_dir: &Path,
    ) -> Result<RenderReport> {
        let (mode, index) = match window {
            Some(w) => (RunMode::Batch, w.index),
            None => (RunMode::Single, 0),
        };
        let mut rng = self.randomness.for_window(index);

        let selection = match window {
            Some(w) => self
                .selector
                .select_in_window(source_duration, w, rng.as_mut())?,
            None => self.selector.select(source_duration, 0.0, rng.as_mut())?,
        };
        self.report(&format!(
            "Cutting {:.1}s..{:.1}s",
            selection.start,
            selection.end()
        ));

        let clip = work_dir.join(clip_name(mode, index));
        cut_segment(
            &self.tools,
            source,
            &selection,
            &self.config.encoding,
            &clip,
        )
        .await?;

        self.report("Transcribing speech");
        let transcription = self.transcriber.transcribe(&clip).await?;
        debug!(
            "[STUDIO] {} words from {}",
            transcription.word_count(),
            self.transcriber.name()
        );

        self.report("Compositing");
        let output = self.config.output_dir.join(output_name(mode, index));
        let rendered = self
            .engine
            .render(&clip, &transcription, &output, rng.as_mut())
            .await;

        if let Err(e) = tokio::fs::remove_file(&clip).await {
            debug!("[STUDIO] Could not remove {:?}: {}", clip, e);
        }

        let rendered = rendered?;
        self.report(&format!("Clip saved as {:?}", rendered.output));
        Ok(rendered)
    }

    /// Compose an existing clip with a prepared transcription.
    pub async fn compose_only(
        &self,
        clip: &Path,
        transcription: &TranscriptionResult,
        output: &Path,
    ) -> Result<RenderReport> {
        transcription.validate()?;
        let mut rng = self.randomness.for_window(0);
        self.report(&format!("Compositing {:?}", clip));
        self.engine
            .render(clip, transcription, output, rng.as_mut())
            .await
    }

    /// Download `url` into the background pool, named after its title.
    pub async fn fetch_background(&self, url: &str) -> Result<PathBuf> {
        self.report(&format!("Fetching background {}", url));
        let path = download_titled(
            &self.tools,
            url,
            &self.config.background_folder,
            &self.config.download_format,
        )
        .await?;
        self.report(&format!("Background saved as {:?}", path));
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcription::PreparedTranscript;
    use std::sync::Mutex;

    fn studio(config: StudioConfig) -> Studio {
        Studio::new(
            Arc::new(config),
            Toolchain::default(),
            Arc::new(PreparedTranscript(TranscriptionResult::default())),
        )
        .unwrap()
    }

    #[test]
    fn test_output_names() {
        assert_eq!(output_name(RunMode::Single, 0), "output.mp4");
        assert_eq!(output_name(RunMode::Batch, 0), "output_0.mp4");
        assert_eq!(output_name(RunMode::Batch, 3), "output_3.mp4");
        assert_eq!(clip_name(RunMode::Batch, 1), "clip_1.mp4");
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = StudioConfig {
            min_clip_length: 50,
            ..StudioConfig::default()
        };
        let result = Studio::new(
            Arc::new(config),
            Toolchain::default(),
            Arc::new(PreparedTranscript(TranscriptionResult::default())),
        );
        assert!(matches!(result.err(), Some(ClipError::Config(_))));
    }

    #[tokio::test]
    async fn test_bad_url_is_download_error() {
        let studio = studio(StudioConfig::default());
        let err = studio.run("not a url", RunMode::Single).await.unwrap_err();
        assert!(matches!(err, ClipError::Download(_)));
    }

    #[tokio::test]
    async fn test_progress_callback_receives_messages() {
        let seen = Arc::new(Mutex::new(Vec::<String>::new()));
        let sink = seen.clone();
        let studio = studio(StudioConfig::default()).with_progress(Arc::new(move |msg: &str| {
            sink.lock().unwrap().push(msg.to_string());
        }));
        let _ = studio.run("ftp://example.com/video", RunMode::Single).await;
        let seen = seen.lock().unwrap();
        assert!(seen.iter().any(|m| m.starts_with("Downloading")));
    }

    #[tokio::test]
    async fn test_unreadable_source_fails_before_rendering() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("video.mp4");
        std::fs::write(&source, b"not a video").unwrap();
        let studio = studio(StudioConfig::default());
        let err = studio
            .process_source(&source, RunMode::Batch, dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, ClipError::AssetDecode { .. }));
    }
}
