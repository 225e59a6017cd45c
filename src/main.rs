// ClipForge Main Entry Point
// Copyright (c) 2026 Xing_The_Creator | ClipForge

use clipforge_core::compose::assets::AssetPool;
use clipforge_core::compose::captions::CaptionVariant;
use clipforge_core::config::{FailurePolicy, StudioConfig};
use clipforge_core::studio::{RunMode, RunReport, Studio};
use clipforge_core::tools::Toolchain;
use clipforge_core::transcription::{PreparedTranscript, TranscriptionResult};
use clipforge_core::AssetKind;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "clipforge")]
#[command(about = "Turn long videos into short captioned clips with music", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    overrides: Overrides,

    /// Log debug output from clipforge
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Settings that win over the config file and environment.
#[derive(Args, Default)]
struct Overrides {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Seed for reproducible clip and asset selection
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Shortest clip length in seconds
    #[arg(long, global = true)]
    min_len: Option<u32>,

    /// Longest clip length in seconds
    #[arg(long, global = true)]
    max_len: Option<u32>,

    /// Music volume relative to dialogue
    #[arg(long, global = true)]
    music_gain: Option<f64>,

    /// Folder of .mp4 background videos
    #[arg(long, global = true)]
    background_folder: Option<PathBuf>,

    /// Folder of .mp3 music tracks
    #[arg(long, global = true)]
    music_folder: Option<PathBuf>,

    /// Where output files are written
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Caption look: stroked or plain
    #[arg(long, global = true)]
    caption_style: Option<CaptionVariant>,

    /// Whisper model size (e.g. base, small, medium)
    #[arg(long, global = true)]
    model: Option<String>,
}

impl Overrides {
    fn apply(&self, config: &mut StudioConfig) {
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(v) = self.min_len {
            config.min_clip_length = v;
        }
        if let Some(v) = self.max_len {
            config.max_clip_length = v;
        }
        if let Some(v) = self.music_gain {
            config.music_gain = v;
        }
        if let Some(v) = &self.background_folder {
            config.background_folder = v.clone();
        }
        if let Some(v) = &self.music_folder {
            config.music_folder = v.clone();
        }
        if let Some(v) = &self.output_dir {
            config.output_dir = v.clone();
        }
        if let Some(v) = self.caption_style {
            config.captions = config.captions.clone().with_variant(v);
        }
        if let Some(v) = &self.model {
            config.transcription.model = v.clone();
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Make one clip from a video URL (writes output.mp4)
    Single {
        /// Source video URL
        url: String,
    },

    /// Make one clip per interval of a video URL (writes output_<i>.mp4)
    Batch {
        /// Source video URL
        url: String,

        /// Window width in seconds
        #[arg(long)]
        interval: Option<u32>,

        /// What to do when one window fails: abort or skip
        #[arg(long)]
        on_failure: Option<FailurePolicy>,
    },

    /// Composite an existing clip with a whisper JSON transcript
    Compose {
        /// Foreground clip
        #[arg(short, long)]
        input: PathBuf,

        /// Whisper-format JSON with word timestamps
        #[arg(short, long)]
        transcript: PathBuf,

        /// Output video path
        #[arg(short, long, default_value = "output.mp4")]
        output: PathBuf,
    },

    /// Download a video into the background pool
    FetchBackground {
        /// Video URL
        url: String,
    },

    /// Check external tools and asset pools
    Check,
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("info,clipforge_core=debug,clipforge=debug")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn install_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        let location = panic_info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown".to_string());
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        eprintln!("[CLIPFORGE PANIC] at {}: {}", location, message);
    }));
}

fn load_config(cli: &Cli) -> Result<StudioConfig> {
    let mut config = StudioConfig::load(cli.overrides.config.as_deref())
        .context("failed to load configuration")?;
    cli.overrides.apply(&mut config);
    if let Commands::Batch {
        interval,
        on_failure,
        ..
    } = &cli.command
    {
        if let Some(v) = interval {
            config.clip_interval = *v;
        }
        if let Some(p) = on_failure {
            config.failure_policy = *p;
        }
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn summarize(report: &RunReport) -> Result<()> {
    for rendered in &report.rendered {
        info!(
            "Saved {:?} ({:.1}s, {}x{}, {} captions)",
            rendered.output, rendered.duration, rendered.width, rendered.height, rendered.cue_count
        );
    }
    if report.windows_planned == 0 {
        warn!("No clips were produced");
    }
    if !report.is_success() {
        for failure in &report.failures {
            error!("{}", failure);
        }
        bail!(
            "{} of {} window(s) failed",
            report.failures.len(),
            report.windows_planned
        );
    }
    Ok(())
}

async fn check(config: &StudioConfig) -> Result<()> {
    let tools = Toolchain::resolve(&config.tools).await;
    info!("ffmpeg:  {:?}", tools.ffmpeg);
    info!("ffprobe: {:?}", tools.ffprobe);
    info!("yt-dlp:  {:?}", tools.ytdlp);
    info!("whisper: {:?}", tools.whisper);

    let backgrounds = AssetPool::scan(AssetKind::Background, &config.background_folder);
    let music = AssetPool::scan(AssetKind::Music, &config.music_folder);

    let mut problems = tools
        .missing_tools()
        .iter()
        .map(|t| format!("{} not found", t))
        .collect::<Vec<_>>();
    if backgrounds.is_empty() {
        problems.push(format!("no .mp4 files in {:?}", config.background_folder));
    }
    if music.is_empty() {
        problems.push(format!("no .mp3 files in {:?}", config.music_folder));
    }

    if problems.is_empty() {
        info!("All checks passed");
        Ok(())
    } else {
        for p in &problems {
            warn!("{}", p);
        }
        bail!("{} problem(s) found", problems.len())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);
    install_panic_hook();

    let config = Arc::new(load_config(&cli)?);

    match &cli.command {
        Commands::Single { url } => {
            let studio = Studio::from_config(config).await?;
            let report = studio.run(url, RunMode::Single).await?;
            summarize(&report)?;
        }
        Commands::Batch { url, .. } => {
            let studio = Studio::from_config(config).await?;
            let report = studio.run(url, RunMode::Batch).await?;
            summarize(&report)?;
        }
        Commands::Compose {
            input,
            transcript,
            output,
        } => {
            let transcription = TranscriptionResult::load(transcript)
                .await
                .with_context(|| format!("failed to read transcript {:?}", transcript))?;
            let tools = Toolchain::resolve(&config.tools).await;
            let studio = Studio::new(
                config,
                tools,
                Arc::new(PreparedTranscript(transcription.clone())),
            )?;
            let rendered = studio.compose_only(input, &transcription, output).await?;
            info!("Saved {:?} ({} captions)", rendered.output, rendered.cue_count);
        }
        Commands::FetchBackground { url } => {
            let tools = Toolchain::resolve(&config.tools).await;
            let studio = Studio::new(
                config,
                tools,
                Arc::new(PreparedTranscript(TranscriptionResult::default())),
            )?;
            let path = studio.fetch_background(url).await?;
            info!("Background saved as {:?}", path);
        }
        Commands::Check => check(&config).await?,
    }

    Ok(())
}
