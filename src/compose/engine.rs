// ClipForge Composition Engine
// Copyright (c) 2026 Xing_The_Creator | ClipForge
//
// One foreground clip + one background + one music track + a transcription
// in, one finished file out. Either the whole file lands at the output path
// or nothing does.

use crate::compose::assets::{AssetPool, AudioAsset, VideoAsset, WorkDir};
use crate::compose::captions::{AssScript, CaptionStyle};
use crate::compose::filtergraph::render_args;
use crate::compose::plan::{BackgroundFit, CompositionPlan, MusicFit};
use crate::config::{EncodingConfig, StudioConfig};
use crate::error::{AssetKind, Result};
use crate::random::RandomSource;
use crate::tools::production_tools::run_ffmpeg_in;
use crate::tools::Toolchain;
use crate::transcription::TranscriptionResult;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const CAPTIONS_FILE: &str = "captions.ass";
const STAGED_FILE: &str = "render.mp4";

/// What a successful render produced.
#[derive(Debug, Clone)]
pub struct RenderReport {
    pub output: PathBuf,
    pub duration: f64,
    pub background: PathBuf,
    pub music: PathBuf,
    pub background_fit: BackgroundFit,
    pub music_fit: MusicFit,
    pub cue_count: usize,
    pub width: u32,
    pub height: u32,
}

pub struct CompositionEngine {
    tools: Toolchain,
    background_dir: PathBuf,
    music_dir: PathBuf,
    music_gain: f64,
    style: CaptionStyle,
    encoding: EncodingConfig,
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

impl CompositionEngine {
    pub fn new(config: &StudioConfig, tools: Toolchain) -> Self {
        Self {
            tools,
            background_dir: config.background_folder.clone(),
            music_dir: config.music_folder.clone(),
            music_gain: config.music_gain,
            style: config.captions.clone(),
            encoding: config.encoding.clone(),
        }
    }

    /// Render `clip` with captions from `transcription` into `output`.
    ///
    /// Random draws, in order: background pick, music pick, background
    /// window start.
    pub async fn render(
        &self,
        clip: &Path,
        transcription: &TranscriptionResult,
        output: &Path,
        rng: &mut dyn RandomSource,
    ) -> Result<RenderReport> {
        // Both pools are checked before anything is decoded.
        let backgrounds = AssetPool::scan(AssetKind::Background, &self.background_dir);
        let tracks = AssetPool::scan(AssetKind::Music, &self.music_dir);
        backgrounds.ensure_non_empty()?;
        tracks.ensure_non_empty()?;

        let background_path = absolute(backgrounds.choose(rng)?)?;
        let music_path = absolute(tracks.choose(rng)?)?;
        info!(
            "[COMPOSE] Background {:?}, music {:?}",
            background_path, music_path
        );

        let foreground = VideoAsset::open(&self.tools, &absolute(clip)?).await?;
        let background = VideoAsset::open(&self.tools, &background_path).await?;
        let music = AudioAsset::open(&self.tools, &music_path).await?;

        let plan = CompositionPlan::resolve(
            foreground,
            background,
            music,
            transcription,
            &self.style,
            self.music_gain,
            rng,
        );

        let output = absolute(output)?;
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let work = WorkDir::beside(&output, ".clipforge-render-")?;

        AssScript {
            play_res_x: plan.frame_width(),
            play_res_y: plan.stacked_height(),
            style: &plan.style,
            cues: &plan.cues,
        }
        .write_to(&work.join(CAPTIONS_FILE))
        .await?;

        let staged = work.join(STAGED_FILE);
        let args = render_args(&plan, CAPTIONS_FILE, &self.encoding, &staged);
        info!(
            "[COMPOSE] Rendering {:.2}s at {}x{} with {} caption cues",
            plan.duration(),
            plan.frame_width(),
            plan.stacked_height(),
            plan.cues.len()
        );
        run_ffmpeg_in(&self.tools, &args, "composite render", Some(work.path())).await?;

        publish(&staged, &output).await?;
        info!("[COMPOSE] Wrote {:?}", output);

        Ok(RenderReport {
            output,
            duration: plan.duration(),
            background: background_path,
            music: music_path,
            background_fit: plan.background_fit,
            music_fit: plan.music_fit,
            cue_count: plan.cues.len(),
            width: plan.frame_width(),
            height: plan.stacked_height(),
        })
    }
}

/// Move the finished render into place.
async fn publish(staged: &Path, output: &Path) -> Result<()> {
    if tokio::fs::rename(staged, output).await.is_ok() {
        return Ok(());
    }
    warn!("[COMPOSE] rename into {:?} failed, copying instead", output);
    let partial = output.with_extension("partial.mp4");
    let copied = match tokio::fs::copy(staged, &partial).await {
        Ok(_) => tokio::fs::rename(&partial, output).await,
        Err(e) => Err(e),
    };
    if let Err(e) = copied {
        if let Err(cleanup) = tokio::fs::remove_file(&partial).await {
            debug!("[COMPOSE] No partial file to remove at {:?}: {}", partial, cleanup);
        }
        return Err(e.into());
    }
    Ok(())
}
