// ClipForge Error Taxonomy
// Copyright (c) 2026 Xing_The_Creator | ClipForge
//
// Every failure is fatal to the render it happens in. Nothing here is retried.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Which interchangeable asset pool an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Background,
    Music,
}

impl AssetKind {
    /// File extension scanned for in this pool (without the dot).
    pub fn extension(&self) -> &'static str {
        match self {
            AssetKind::Background => "mp4",
            AssetKind::Music => "mp3",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Background => write!(f, "background"),
            AssetKind::Music => write!(f, "music"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ClipError {
    /// Degenerate or zero-length source.
    #[error("invalid source: {0}")]
    InvalidSource(String),

    #[error("download failed: {0}")]
    Download(String),

    /// The configured pool holds no candidate files.
    #[error("no {0} candidates available in the configured pool")]
    MissingAsset(AssetKind),

    #[error("failed to decode {path:?}: {reason}")]
    AssetDecode { path: PathBuf, reason: String },

    #[error("transcription failed: {0}")]
    Transcription(String),

    /// ffmpeg exited unsuccessfully while cutting or compositing.
    #[error("render failed: {0}")]
    Render(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// A batch window failed; `source` is the underlying error.
    #[error("window {index}: {source}")]
    Window {
        index: usize,
        #[source]
        source: Box<ClipError>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ClipError>;

impl ClipError {
    pub fn decode(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ClipError::AssetDecode {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Tag this error with the batch window it came from.
    /// Already-tagged errors are left alone.
    pub fn in_window(self, index: usize) -> Self {
        match self {
            ClipError::Window { .. } => self,
            other => ClipError::Window {
                index,
                source: Box::new(other),
            },
        }
    }

    pub fn window_index(&self) -> Option<usize> {
        match self {
            ClipError::Window { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// The innermost error, with any window tag stripped.
    pub fn root(&self) -> &ClipError {
        match self {
            ClipError::Window { source, .. } => source.root(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_asset_names_pool() {
        let err = ClipError::MissingAsset(AssetKind::Background);
        assert_eq!(
            err.to_string(),
            "no background candidates available in the configured pool"
        );
        let err = ClipError::MissingAsset(AssetKind::Music);
        assert!(err.to_string().contains("music"));
    }

    #[test]
    fn test_window_tagging_is_idempotent() {
        let err = ClipError::Transcription("engine crashed".into())
            .in_window(3)
            .in_window(7);
        assert_eq!(err.window_index(), Some(3));
        assert!(matches!(err.root(), ClipError::Transcription(_)));
        assert_eq!(err.to_string(), "window 3: transcription failed: engine crashed");
    }

    #[test]
    fn test_pool_extensions() {
        assert_eq!(AssetKind::Background.extension(), "mp4");
        assert_eq!(AssetKind::Music.extension(), "mp3");
    }
}
