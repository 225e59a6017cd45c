// ClipForge Tools
// Copyright (c) 2026 Xing_The_Creator | ClipForge
//
// Thin async wrappers over the external programs the pipeline drives:
// yt-dlp for acquisition, ffprobe for inspection and ffmpeg for cutting.

pub mod production_tools;
pub mod source_tools;
pub mod toolchain;

pub use toolchain::{Toolchain, YtDlpLauncher};
