// ClipForge Composition Plan
// Copyright (c) 2026 Xing_The_Creator | ClipForge
//
// Resolves how background and music are fitted to the foreground before
// any ffmpeg arguments are built. Every resolved plan spans exactly the
// foreground duration.

use crate::compose::assets::{AudioAsset, VideoAsset};
use crate::compose::captions::{cues_from_transcription, CaptionCue, CaptionStyle};
use crate::random::RandomSource;
use crate::transcription::TranscriptionResult;
use tracing::debug;

/// How the background video is matched to the foreground duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackgroundFit {
    /// Background is long enough: play `[start, start + duration)` of it.
    Window { start: f64 },
    /// Background is too short: play it `repeats` times, then cut the tail.
    Loop { repeats: u32 },
}

/// How the music track is matched to the foreground duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MusicFit {
    Trim,
    Loop { repeats: u32 },
}

fn repeats_to_cover(clip: f64, target: f64) -> u32 {
    ((target / clip).ceil() as u32).max(1)
}

pub fn fit_background(background: f64, foreground: f64, rng: &mut dyn RandomSource) -> BackgroundFit {
    if background >= foreground {
        BackgroundFit::Window {
            start: rng.uniform_f64(0.0, background - foreground),
        }
    } else {
        BackgroundFit::Loop {
            repeats: repeats_to_cover(background, foreground),
        }
    }
}

pub fn fit_music(music: f64, foreground: f64) -> MusicFit {
    if music >= foreground {
        MusicFit::Trim
    } else {
        MusicFit::Loop {
            repeats: repeats_to_cover(music, foreground),
        }
    }
}

/// Height of a `width x height` frame scaled to `target_width`, aspect
/// preserved and rounded to an even number for 4:2:0 encoders.
pub fn scaled_height(width: u32, height: u32, target_width: u32) -> u32 {
    let exact = height as f64 * target_width as f64 / width.max(1) as f64;
    let even = ((exact / 2.0).round() as u32) * 2;
    even.max(2)
}

/// Everything one render needs, with durations already reconciled.
#[derive(Debug)]
pub struct CompositionPlan {
    pub foreground: VideoAsset,
    pub background: VideoAsset,
    pub music: AudioAsset,
    pub cues: Vec<CaptionCue>,
    pub style: CaptionStyle,
    pub background_fit: BackgroundFit,
    pub music_fit: MusicFit,
    pub music_gain: f64,
    /// Background height after scaling to the foreground width.
    pub background_height: u32,
}

impl CompositionPlan {
    pub fn resolve(
        foreground: VideoAsset,
        background: VideoAsset,
        music: AudioAsset,
        transcription: &TranscriptionResult,
        style: &CaptionStyle,
        music_gain: f64,
        rng: &mut dyn RandomSource,
    ) -> Self {
        let duration = foreground.duration;
        let background_fit = fit_background(background.duration, duration, rng);
        let music_fit = fit_music(music.duration, duration);
        let background_height =
            scaled_height(background.width, background.height, foreground.width);
        let cues = cues_from_transcription(
            transcription,
            style,
            foreground.width,
            foreground.height,
            duration,
        );

        debug!(
            "[COMPOSE] Plan: {:.2}s, background {:?}, music {:?}, {} cues",
            duration,
            background_fit,
            music_fit,
            cues.len()
        );

        Self {
            foreground,
            background,
            music,
            cues,
            style: style.clone(),
            background_fit,
            music_fit,
            music_gain,
            background_height,
        }
    }

    pub fn duration(&self) -> f64 {
        self.foreground.duration
    }

    pub fn frame_width(&self) -> u32 {
        self.foreground.width
    }

    pub fn stacked_height(&self) -> u32 {
        self.foreground.height + self.background_height
    }

    /// Background material available before the final trim.
    pub fn background_coverage(&self) -> f64 {
        match self.background_fit {
            BackgroundFit::Window { start } => self.background.duration - start,
            BackgroundFit::Loop { repeats } => self.background.duration * repeats as f64,
        }
    }

    /// Music material available before the final trim.
    pub fn music_coverage(&self) -> f64 {
        match self.music_fit {
            MusicFit::Trim => self.music.duration,
            MusicFit::Loop { repeats } => self.music.duration * repeats as f64,
        }
    }

    /// Background duration as rendered.
    pub fn background_duration(&self) -> f64 {
        self.background_coverage().min(self.duration())
    }

    /// Music duration as rendered.
    pub fn music_duration(&self) -> f64 {
        self.music_coverage().min(self.duration())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{RngSource, ScriptedRandom};
    use crate::transcription::Word;

    fn plan_with(bg_duration: f64, fg_duration: f64, music_duration: f64) -> CompositionPlan {
        let mut rng = ScriptedRandom::new([0.5]);
        CompositionPlan::resolve(
            VideoAsset::from_parts("clip.mp4", 1080, 1920, fg_duration, true),
            VideoAsset::from_parts("bg.mp4", 1920, 1080, bg_duration, false),
            AudioAsset::from_parts("track.mp3", music_duration),
            &TranscriptionResult::default(),
            &CaptionStyle::default(),
            0.15,
            &mut rng,
        )
    }

    #[test]
    fn test_short_background_loops_then_trims() {
        let plan = plan_with(10.0, 25.0, 60.0);
        assert_eq!(plan.background_fit, BackgroundFit::Loop { repeats: 3 });
        assert!(plan.background_coverage() >= 25.0);
        assert_eq!(plan.background_duration(), 25.0);
    }

    #[test]
    fn test_long_background_takes_window() {
        let plan = plan_with(100.0, 25.0, 60.0);
        match plan.background_fit {
            BackgroundFit::Window { start } => assert!((start - 37.5).abs() < 1e-9),
            other => panic!("expected window, got {:?}", other),
        }
        assert_eq!(plan.background_duration(), 25.0);
    }

    #[test]
    fn test_equal_background_uses_whole_file() {
        let plan = plan_with(25.0, 25.0, 60.0);
        assert_eq!(plan.background_fit, BackgroundFit::Window { start: 0.0 });
    }

    #[test]
    fn test_music_trim_or_loop() {
        assert_eq!(plan_with(60.0, 25.0, 60.0).music_fit, MusicFit::Trim);
        let plan = plan_with(60.0, 25.0, 7.0);
        assert_eq!(plan.music_fit, MusicFit::Loop { repeats: 4 });
        assert_eq!(plan.music_duration(), 25.0);
    }

    #[test]
    fn test_durations_always_match_foreground() {
        let mut rng = RngSource::seeded(3);
        for _ in 0..300 {
            let fg = rng.uniform_f64(0.5, 40.0);
            let bg = rng.uniform_f64(0.5, 90.0);
            let music = rng.uniform_f64(0.5, 200.0);
            let plan = plan_with(bg, fg, music);
            assert!((plan.background_duration() - fg).abs() < 1e-9);
            assert!((plan.music_duration() - fg).abs() < 1e-9);
        }
    }

    #[test]
    fn test_window_start_range() {
        let mut rng = RngSource::seeded(11);
        for _ in 0..500 {
            match fit_background(30.0, 12.0, &mut rng) {
                BackgroundFit::Window { start } => assert!((0.0..=18.0).contains(&start)),
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn test_scaled_background_height() {
        // 16:9 landscape scaled to a 1080-wide portrait clip
        assert_eq!(scaled_height(1920, 1080, 1080), 608);
        assert_eq!(scaled_height(1080, 1920, 1080), 1920);
        assert_eq!(scaled_height(640, 480, 1280), 960);
        assert_eq!(scaled_height(1000, 1, 10), 2);
        let plan = plan_with(60.0, 25.0, 60.0);
        assert_eq!(plan.stacked_height(), 1920 + 608);
        assert_eq!(plan.frame_width(), 1080);
    }

    #[test]
    fn test_cues_follow_foreground_geometry() {
        let transcription = TranscriptionResult::from_words(vec![
            Word::new("ok", 0.0, 0.5),
            Word::new("go", 0.5, 1.1),
        ]);
        let mut rng = ScriptedRandom::default();
        let plan = CompositionPlan::resolve(
            VideoAsset::from_parts("clip.mp4", 720, 1280, 5.0, true),
            VideoAsset::from_parts("bg.mp4", 720, 1280, 5.0, false),
            AudioAsset::from_parts("track.mp3", 5.0),
            &transcription,
            &CaptionStyle::default(),
            0.15,
            &mut rng,
        );
        assert_eq!(plan.cues.len(), 2);
        assert_eq!(plan.cues[1].position.x, 360);
        assert_eq!(plan.cues[1].position.y, 1160);
    }
}
