// ClipForge Segment Selector
// Copyright (c) 2026 Xing_The_Creator | ClipForge
//
// Picks which part of the source video becomes a clip. Lengths are whole
// seconds drawn from the configured range; starts are continuous.

use crate::error::{ClipError, Result};
use crate::random::RandomSource;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The chosen `(start, length)` of a clip, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub start: f64,
    pub length: f64,
    /// The drawn length covered the whole source, so all of it was taken.
    pub full_source: bool,
}

impl Selection {
    pub fn end(&self) -> f64 {
        self.start + self.length
    }
}

/// One fixed-width slice `[start, end)` of the source used in batch mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchWindow {
    pub index: usize,
    pub start: f64,
    pub end: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct SegmentSelector {
    min_len: u32,
    max_len: u32,
}

impl SegmentSelector {
    pub fn new(min_len: u32, max_len: u32) -> Result<Self> {
        if min_len == 0 || min_len > max_len {
            return Err(ClipError::Config(format!(
                "clip length range [{}, {}] is empty",
                min_len, max_len
            )));
        }
        Ok(Self { min_len, max_len })
    }

    pub fn min_len(&self) -> u32 {
        self.min_len
    }

    pub fn max_len(&self) -> u32 {
        self.max_len
    }

    /// Draw a clip from `[lower_bound, source_duration]`.
    pub fn select(
        &self,
        source_duration: f64,
        lower_bound: f64,
        rng: &mut dyn RandomSource,
    ) -> Result<Selection> {
        self.select_bounded(source_duration, lower_bound, None, rng)
    }

    /// Draw a clip that lies entirely inside `window`. A drawn length longer
    /// than the window is shrunk to the window's width.
    pub fn select_in_window(
        &self,
        source_duration: f64,
        window: &BatchWindow,
        rng: &mut dyn RandomSource,
    ) -> Result<Selection> {
        self.select_bounded(source_duration, window.start, Some(window.end), rng)
    }

    fn select_bounded(
        &self,
        source_duration: f64,
        lower_bound: f64,
        upper_bound: Option<f64>,
        rng: &mut dyn RandomSource,
    ) -> Result<Selection> {
        if !source_duration.is_finite() || source_duration <= 0.0 {
            return Err(ClipError::InvalidSource(format!(
                "source duration {} is not positive",
                source_duration
            )));
        }

        let lower = lower_bound.max(0.0);
        let ceiling = upper_bound.map_or(source_duration, |u| u.min(source_duration));
        if upper_bound.is_some() && ceiling <= lower {
            return Err(ClipError::Config(format!(
                "window [{:.2}, {:.2}] holds no part of a {:.2}s source",
                lower, ceiling, source_duration
            )));
        }

        let drawn_length = rng.uniform_int(self.min_len, self.max_len) as f64;
        // A windowed clip never outgrows its window.
        let length = match upper_bound {
            Some(_) if drawn_length > ceiling - lower => {
                debug!(
                    "[SELECT] Drawn length {:.0}s exceeds the {:.2}s window; shrinking",
                    drawn_length,
                    ceiling - lower
                );
                ceiling - lower
            }
            _ => drawn_length,
        };

        if length >= source_duration {
            debug!(
                "[SELECT] Drawn length {:.0}s covers the {:.2}s source; taking all of it",
                length, source_duration
            );
            return Ok(Selection {
                start: 0.0,
                length: source_duration,
                full_source: true,
            });
        }

        let latest = (ceiling - length).max(lower);

        let drawn = rng.uniform_f64(lower, latest);
        let start = drawn.min(source_duration - length).max(0.0);

        debug!(
            "[SELECT] Clip {:.2}s..{:.2}s (length {:.0}s, start range [{:.2}, {:.2}])",
            start,
            start + length,
            length,
            lower,
            latest
        );

        Ok(Selection {
            start,
            length,
            full_source: false,
        })
    }
}

/// Split `[0, source_duration)` into `floor(source_duration / interval)`
/// windows. A trailing partial window is dropped.
pub fn plan_windows(source_duration: f64, interval: u32) -> Result<Vec<BatchWindow>> {
    if interval == 0 {
        return Err(ClipError::Config("clip interval must be positive".into()));
    }
    if !source_duration.is_finite() || source_duration <= 0.0 {
        return Err(ClipError::InvalidSource(format!(
            "source duration {} is not positive",
            source_duration
        )));
    }

    let width = interval as f64;
    let count = (source_duration / width).floor() as usize;

    Ok((0..count)
        .map(|index| BatchWindow {
            index,
            start: index as f64 * width,
            end: (index + 1) as f64 * width,
        })
        .collect())
}
