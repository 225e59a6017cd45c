// ClipForge Composition
// Copyright (c) 2026 Xing_The_Creator | ClipForge

pub mod assets;
pub mod captions;
pub mod engine;
pub mod filtergraph;
pub mod plan;

pub use engine::{CompositionEngine, RenderReport};
