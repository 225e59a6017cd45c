// ClipForge Assets
// Copyright (c) 2026 Xing_The_Creator | ClipForge
//
// Opened media and the pools they are drawn from. Assets live for exactly
// one render and are released when dropped, on every exit path.

use crate::error::{AssetKind, ClipError, Result};
use crate::random::RandomSource;
use crate::tools::source_tools::{probe_media, scan_pool};
use crate::tools::Toolchain;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// A decodable video stream with its geometry and duration.
#[derive(Debug)]
pub struct VideoAsset {
    path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub duration: f64,
    pub has_audio: bool,
}

impl VideoAsset {
    pub async fn open(tools: &Toolchain, path: &Path) -> Result<Self> {
        let probe = probe_media(tools, path).await?;
        if !probe.has_video {
            return Err(ClipError::decode(path, "no video stream"));
        }
        let (width, height) = match (probe.width, probe.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
            _ => return Err(ClipError::decode(path, "video stream has no dimensions")),
        };
        if !probe.duration.is_finite() || probe.duration <= 0.0 {
            return Err(ClipError::decode(
                path,
                format!("non-positive duration {}", probe.duration),
            ));
        }

        debug!(
            "[COMPOSE] Opened video {:?}: {}x{}, {:.2}s, audio={}",
            path, width, height, probe.duration, probe.has_audio
        );
        Ok(Self {
            path: path.to_path_buf(),
            width,
            height,
            duration: probe.duration,
            has_audio: probe.has_audio,
        })
    }

    /// Build an asset from known properties without probing.
    pub fn from_parts(path: impl Into<PathBuf>, width: u32, height: u32, duration: f64, has_audio: bool) -> Self {
        Self {
            path: path.into(),
            width,
            height,
            duration,
            has_audio,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for VideoAsset {
    fn drop(&mut self) {
        debug!("[COMPOSE] Released video {:?}", self.path);
    }
}

/// A decodable audio-only stream.
#[derive(Debug)]
pub struct AudioAsset {
    path: PathBuf,
    pub duration: f64,
}

impl AudioAsset {
    pub async fn open(tools: &Toolchain, path: &Path) -> Result<Self> {
        let probe = probe_media(tools, path).await?;
        if !probe.has_audio {
            return Err(ClipError::decode(path, "no audio stream"));
        }
        if !probe.duration.is_finite() || probe.duration <= 0.0 {
            return Err(ClipError::decode(
                path,
                format!("non-positive duration {}", probe.duration),
            ));
        }
        debug!("[COMPOSE] Opened audio {:?}: {:.2}s", path, probe.duration);
        Ok(Self {
            path: path.to_path_buf(),
            duration: probe.duration,
        })
    }

    pub fn from_parts(path: impl Into<PathBuf>, duration: f64) -> Self {
        Self {
            path: path.into(),
            duration,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for AudioAsset {
    fn drop(&mut self) {
        debug!("[COMPOSE] Released audio {:?}", self.path);
    }
}

/// Interchangeable candidate files for one asset kind.
#[derive(Debug, Clone)]
pub struct AssetPool {
    kind: AssetKind,
    candidates: Vec<PathBuf>,
}

impl AssetPool {
    pub fn scan(kind: AssetKind, dir: &Path) -> Self {
        let candidates = scan_pool(dir, kind.extension());
        info!(
            "[COMPOSE] {} pool {:?}: {} candidate(s)",
            kind,
            dir,
            candidates.len()
        );
        Self { kind, candidates }
    }

    pub fn from_candidates(kind: AssetKind, candidates: Vec<PathBuf>) -> Self {
        Self { kind, candidates }
    }

    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn ensure_non_empty(&self) -> Result<()> {
        if self.is_empty() {
            return Err(ClipError::MissingAsset(self.kind));
        }
        Ok(())
    }

    /// Uniformly pick one candidate.
    pub fn choose(&self, rng: &mut dyn RandomSource) -> Result<&Path> {
        self.ensure_non_empty()?;
        let index = rng.pick_index(self.candidates.len());
        self.candidates
            .get(index)
            .map(PathBuf::as_path)
            .ok_or_else(|| {
                ClipError::Config(format!(
                    "random source picked {} index {} from a pool of {}",
                    self.kind,
                    index,
                    self.candidates.len()
                ))
            })
    }
}

/// Scratch directory removed when dropped.
#[derive(Debug)]
pub struct WorkDir {
    dir: TempDir,
}

impl WorkDir {
    pub fn new(prefix: &str) -> Result<Self> {
        let dir = tempfile::Builder::new().prefix(prefix).tempdir()?;
        debug!("[COMPOSE] Work directory {:?}", dir.path());
        Ok(Self { dir })
    }

    /// Scratch space next to `target`, so the final move stays on one filesystem.
    pub fn beside(target: &Path, prefix: &str) -> Result<Self> {
        let parent = match target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let dir = tempfile::Builder::new().prefix(prefix).tempdir_in(parent)?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::ScriptedRandom;

    #[test]
    fn test_empty_pools_report_their_kind() {
        let dir = tempfile::tempdir().unwrap();
        let bg = AssetPool::scan(AssetKind::Background, dir.path());
        let music = AssetPool::scan(AssetKind::Music, dir.path());
        assert!(matches!(
            bg.ensure_non_empty(),
            Err(ClipError::MissingAsset(AssetKind::Background))
        ));
        let mut rng = ScriptedRandom::default();
        assert!(matches!(
            music.choose(&mut rng),
            Err(ClipError::MissingAsset(AssetKind::Music))
        ));
    }

    #[test]
    fn test_choose_uses_random_source() {
        let pool = AssetPool::from_candidates(
            AssetKind::Music,
            vec!["a.mp3".into(), "b.mp3".into(), "c.mp3".into()],
        );
        let mut rng = ScriptedRandom::new([0.0, 0.5, 1.0]);
        assert_eq!(pool.choose(&mut rng).unwrap(), Path::new("a.mp3"));
        assert_eq!(pool.choose(&mut rng).unwrap(), Path::new("b.mp3"));
        assert_eq!(pool.choose(&mut rng).unwrap(), Path::new("c.mp3"));
    }

    struct OutOfRange;

    impl RandomSource for OutOfRange {
        fn uniform_int(&mut self, low: u32, _high: u32) -> u32 {
            low
        }

        fn uniform_f64(&mut self, low: f64, _high: f64) -> f64 {
            low
        }

        fn pick_index(&mut self, len: usize) -> usize {
            len + 4
        }
    }

    #[test]
    fn test_out_of_range_pick_is_an_error() {
        let pool = AssetPool::from_candidates(
            AssetKind::Background,
            vec!["a.mp4".into(), "b.mp4".into()],
        );
        let err = pool.choose(&mut OutOfRange).unwrap_err();
        assert!(matches!(err, ClipError::Config(_)));
    }

    #[test]
    fn test_scan_only_takes_pool_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("loop.mp4"), b"").unwrap();
        std::fs::write(dir.path().join("track.mp3"), b"").unwrap();
        assert_eq!(AssetPool::scan(AssetKind::Background, dir.path()).len(), 1);
        assert_eq!(AssetPool::scan(AssetKind::Music, dir.path()).len(), 1);
    }

    #[test]
    fn test_work_dir_is_removed_on_drop() {
        let work = WorkDir::new("clipforge-test-").unwrap();
        let path = work.path().to_path_buf();
        std::fs::write(work.join("clip.mp4"), b"x").unwrap();
        assert!(path.exists());
        drop(work);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_undecodable_file_is_asset_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("broken.mp4");
        std::fs::write(&bogus, b"definitely not a video").unwrap();
        let tools = Toolchain::default();
        // Either ffprobe rejects the file or is missing; both are decode errors.
        let err = VideoAsset::open(&tools, &bogus).await.unwrap_err();
        assert!(matches!(err, ClipError::AssetDecode { .. }));
    }
}
