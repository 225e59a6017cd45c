// ClipForge Core Library
// Copyright (c) 2026 Xing_The_Creator | ClipForge

pub mod compose;
pub mod config;
pub mod error;
pub mod random;
pub mod selector;
pub mod studio;
pub mod tools;
pub mod transcription;

pub use error::{AssetKind, ClipError, Result};
