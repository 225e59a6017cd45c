// ClipForge Captions
// Copyright (c) 2026 Xing_The_Creator | ClipForge
//
// One cue per transcribed word, rendered as an ASS script that ffmpeg's
// `ass` filter burns over the stacked frame.

use crate::error::{ClipError, Result};
use crate::transcription::TranscriptionResult;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Deployment-wide caption look. Never chosen per cue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptionVariant {
    /// Bold text with an outline, fading in and out.
    #[default]
    Stroked,
    /// No outline and no fade.
    Plain,
}

impl FromStr for CaptionVariant {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stroked" | "stroke" | "bold" => Ok(Self::Stroked),
            "plain" => Ok(Self::Plain),
            other => Err(format!("unknown caption style '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    pub const BLACK: RgbColor = RgbColor { r: 0, g: 0, b: 0 };
    pub const WHITE: RgbColor = RgbColor { r: 255, g: 255, b: 255 };
    pub const YELLOW: RgbColor = RgbColor { r: 255, g: 255, b: 0 };

    /// ASS colour literal, `&HAABBGGRR` with zero alpha (opaque).
    pub fn to_ass(&self) -> String {
        format!("&H00{:02X}{:02X}{:02X}", self.b, self.g, self.r)
    }

    fn named(name: &str) -> Option<Self> {
        let rgb = match name {
            "black" => (0, 0, 0),
            "white" => (255, 255, 255),
            "yellow" => (255, 255, 0),
            "red" => (255, 0, 0),
            "green" => (0, 128, 0),
            "lime" => (0, 255, 0),
            "blue" => (0, 0, 255),
            "cyan" => (0, 255, 255),
            "magenta" => (255, 0, 255),
            "orange" => (255, 165, 0),
            _ => return None,
        };
        Some(RgbColor {
            r: rgb.0,
            g: rgb.1,
            b: rgb.2,
        })
    }
}

impl FromStr for RgbColor {
    type Err = String;

    /// Accepts a colour name or `#RRGGBB`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(format!("'{}' is not a #RRGGBB colour", s));
            }
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| e.to_string());
            return Ok(RgbColor {
                r: channel(0)?,
                g: channel(2)?,
                b: channel(4)?,
            });
        }
        Self::named(&s.to_lowercase()).ok_or_else(|| format!("unknown colour '{}'", s))
    }
}

impl std::fmt::Display for RgbColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Serialize for RgbColor {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RgbColor {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionStyle {
    pub variant: CaptionVariant,
    pub font: String,
    pub font_size: u32,
    pub bold: bool,
    pub fill: RgbColor,
    pub stroke: RgbColor,
    pub stroke_width: f32,
    /// Distance from the bottom of the foreground frame to the top of the text.
    pub bottom_offset: u32,
    /// Horizontal margin on each side; text wraps at `width - 2 * side_margin`.
    pub side_margin: u32,
    pub fade_secs: f64,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self::stroked()
    }
}

impl CaptionStyle {
    pub fn stroked() -> Self {
        Self {
            variant: CaptionVariant::Stroked,
            font: "Arial".to_string(),
            font_size: 50,
            bold: true,
            fill: RgbColor::YELLOW,
            stroke: RgbColor::BLACK,
            stroke_width: 2.0,
            bottom_offset: 120,
            side_margin: 50,
            fade_secs: 0.2,
        }
    }

    pub fn plain() -> Self {
        Self::stroked().with_variant(CaptionVariant::Plain)
    }

    pub fn with_variant(mut self, variant: CaptionVariant) -> Self {
        self.variant = variant;
        self
    }

    pub fn outline_width(&self) -> f32 {
        match self.variant {
            CaptionVariant::Stroked => self.stroke_width,
            CaptionVariant::Plain => 0.0,
        }
    }

    pub fn fade_ms(&self) -> Option<u32> {
        match self.variant {
            CaptionVariant::Stroked if self.fade_secs > 0.0 => {
                Some((self.fade_secs * 1000.0).round() as u32)
            }
            _ => None,
        }
    }

    /// Top-centre anchor of every cue inside a `width x height` foreground.
    pub fn anchor(&self, width: u32, height: u32) -> CaptionPosition {
        CaptionPosition {
            x: width / 2,
            y: height.saturating_sub(self.bottom_offset),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.font_size == 0 {
            return Err(ClipError::Config("caption font_size must be positive".into()));
        }
        if !self.stroke_width.is_finite() || self.stroke_width < 0.0 {
            return Err(ClipError::Config(format!(
                "caption stroke_width {} is invalid",
                self.stroke_width
            )));
        }
        if !self.fade_secs.is_finite() || self.fade_secs < 0.0 {
            return Err(ClipError::Config(format!(
                "caption fade_secs {} is invalid",
                self.fade_secs
            )));
        }
        if self.font.trim().is_empty() {
            return Err(ClipError::Config("caption font must be named".into()));
        }
        Ok(())
    }
}

/// Pixel position of a cue's top-centre point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptionPosition {
    pub x: u32,
    pub y: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaptionCue {
    pub text: String,
    pub start: f64,
    pub end: f64,
    pub position: CaptionPosition,
    pub variant: CaptionVariant,
}

impl CaptionCue {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Keep `[start, end]` inside `[0, duration]`. In-range spans pass through
/// untouched.
fn clamp_span(start: f64, end: f64, duration: f64) -> (f64, f64) {
    if start >= 0.0 && end <= duration {
        return (start, end);
    }
    let start = start.clamp(0.0, duration);
    let end = end.clamp(start, duration);
    (start, end)
}

/// One cue per word, in transcription order.
pub fn cues_from_transcription(
    transcription: &TranscriptionResult,
    style: &CaptionStyle,
    frame_width: u32,
    frame_height: u32,
    duration: f64,
) -> Vec<CaptionCue> {
    let position = style.anchor(frame_width, frame_height);
    let cues: Vec<CaptionCue> = transcription
        .words()
        .map(|word| {
            let (start, end) = clamp_span(word.start, word.end, duration);
            CaptionCue {
                text: word.text.trim().to_string(),
                start,
                end,
                position,
                variant: style.variant,
            }
        })
        .collect();
    debug!("[COMPOSE] {} caption cues at {:?}", cues.len(), position);
    cues
}

/// ASS timestamp, `H:MM:SS.cc`.
pub fn format_ass_time(secs: f64) -> String {
    let cs = (secs.max(0.0) * 100.0).round() as u64;
    let hours = cs / 360_000;
    let minutes = (cs % 360_000) / 6_000;
    let seconds = (cs % 6_000) / 100;
    let centis = cs % 100;
    format!("{hours}:{minutes:02}:{seconds:02}.{centis:02}")
}

/// Make word text inert for ASS: no override blocks, no escapes, one line.
fn escape_text(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '{' => '(',
            '}' => ')',
            '\\' => '\u{FF3C}',
            '\n' | '\r' => ' ',
            other => other,
        })
        .collect()
}

const STYLE_NAME: &str = "Caption";

/// A complete ASS document for one render.
pub struct AssScript<'a> {
    pub play_res_x: u32,
    pub play_res_y: u32,
    pub style: &'a CaptionStyle,
    pub cues: &'a [CaptionCue],
}

impl AssScript<'_> {
    fn style_line(&self) -> String {
        let s = self.style;
        format!(
            "Style: {},{},{},{},&H000000FF,{},&H00000000,{},0,0,0,100,100,0,0,1,{},0,8,{},{},0,1",
            STYLE_NAME,
            s.font,
            s.font_size,
            s.fill.to_ass(),
            s.stroke.to_ass(),
            if s.bold { -1 } else { 0 },
            s.outline_width(),
            s.side_margin,
            s.side_margin,
        )
    }

    fn event_line(&self, cue: &CaptionCue) -> String {
        let mut tags = format!("\\an8\\pos({},{})", cue.position.x, cue.position.y);
        if cue.variant == CaptionVariant::Stroked {
            if let Some(ms) = self.style.fade_ms() {
                tags.push_str(&format!("\\fad({},{})", ms, ms));
            }
        }
        format!(
            "Dialogue: 0,{},{},{},,0,0,0,,{{{}}}{}",
            format_ass_time(cue.start),
            format_ass_time(cue.end),
            STYLE_NAME,
            tags,
            escape_text(&cue.text)
        )
    }

    pub fn render(&self) -> String {
        let mut lines = vec![
            "[Script Info]".to_string(),
            "Title: ClipForge captions".to_string(),
            "ScriptType: v4.00+".to_string(),
            "WrapStyle: 0".to_string(),
            format!("PlayResX: {}", self.play_res_x),
            format!("PlayResY: {}", self.play_res_y),
            "ScaledBorderAndShadow: yes".to_string(),
            String::new(),
            "[V4+ Styles]".to_string(),
            "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, \
             BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, \
             BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding"
                .to_string(),
            self.style_line(),
            String::new(),
            "[Events]".to_string(),
            "Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text"
                .to_string(),
        ];
        lines.extend(self.cues.iter().map(|cue| self.event_line(cue)));
        lines.push(String::new());
        lines.join("\n")
    }

    pub async fn write_to(&self, path: &Path) -> Result<()> {
        tokio::fs::write(path, self.render()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcription::{Segment, Word};

    fn ok_go() -> TranscriptionResult {
        TranscriptionResult {
            segments: vec![Segment {
                words: vec![Word::new(" ok", 0.0, 0.5), Word::new(" go", 0.5, 1.1)],
            }],
            language: None,
        }
    }

    #[test]
    fn test_colour_parsing() {
        assert_eq!("yellow".parse::<RgbColor>().unwrap(), RgbColor::YELLOW);
        assert_eq!("#FF8000".parse::<RgbColor>().unwrap(), RgbColor { r: 255, g: 128, b: 0 });
        assert!("#12345".parse::<RgbColor>().is_err());
        assert!("mauve-ish".parse::<RgbColor>().is_err());
        assert_eq!(RgbColor::YELLOW.to_ass(), "&H0000FFFF");
        assert_eq!(RgbColor { r: 0x12, g: 0x34, b: 0x56 }.to_ass(), "&H00563412");
    }

    #[test]
    fn test_one_cue_per_word_with_word_timing() {
        let style = CaptionStyle::stroked();
        let cues = cues_from_transcription(&ok_go(), &style, 1080, 1920, 20.0);
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].text, "ok");
        assert_eq!((cues[0].start, cues[0].end), (0.0, 0.5));
        assert_eq!(cues[1].text, "go");
        assert_eq!((cues[1].start, cues[1].end), (0.5, 1.1));
        assert_eq!(cues[0].position, CaptionPosition { x: 540, y: 1800 });
    }

    #[test]
    fn test_touching_words_are_not_merged() {
        let result = TranscriptionResult::from_words(vec![
            Word::new("same", 1.0, 2.0),
            Word::new("same", 2.0, 3.0),
        ]);
        let cues = cues_from_transcription(&result, &CaptionStyle::plain(), 640, 360, 10.0);
        assert_eq!(cues.len(), 2);
    }

    #[test]
    fn test_cues_clamped_into_clip() {
        let result = TranscriptionResult::from_words(vec![
            Word::new("late", 9.5, 10.4),
            Word::new("after", 11.0, 11.5),
        ]);
        let cues = cues_from_transcription(&result, &CaptionStyle::plain(), 640, 360, 10.0);
        assert_eq!((cues[0].start, cues[0].end), (9.5, 10.0));
        assert_eq!((cues[1].start, cues[1].end), (10.0, 10.0));
    }

    #[test]
    fn test_ass_time_format() {
        assert_eq!(format_ass_time(0.0), "0:00:00.00");
        assert_eq!(format_ass_time(1.1), "0:00:01.10");
        assert_eq!(format_ass_time(3725.456), "1:02:05.46");
    }

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("{\\b1}hi\nthere"), "(\u{FF3C}b1)hi there");
    }

    #[test]
    fn test_stroked_script_has_fade_and_outline() {
        let style = CaptionStyle::stroked();
        let cues = cues_from_transcription(&ok_go(), &style, 1080, 1920, 20.0);
        let script = AssScript {
            play_res_x: 1080,
            play_res_y: 3840,
            style: &style,
            cues: &cues,
        }
        .render();

        assert!(script.contains("PlayResX: 1080"));
        assert!(script.contains("PlayResY: 3840"));
        assert!(script.contains("Style: Caption,Arial,50,&H0000FFFF,&H000000FF,&H00000000,&H00000000,-1,"));
        assert!(script.contains(",1,2,0,8,50,50,0,1"));

        let events: Vec<&str> = script.lines().filter(|l| l.starts_with("Dialogue:")).collect();
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0],
            "Dialogue: 0,0:00:00.00,0:00:00.50,Caption,,0,0,0,,{\\an8\\pos(540,1800)\\fad(200,200)}ok"
        );
        assert!(events[1].starts_with("Dialogue: 0,0:00:00.50,0:00:01.10,"));
        assert!(events[1].ends_with("}go"));
    }

    #[test]
    fn test_plain_script_has_no_fade_or_outline() {
        let style = CaptionStyle::plain();
        let cues = cues_from_transcription(&ok_go(), &style, 1080, 1920, 20.0);
        let script = AssScript {
            play_res_x: 1080,
            play_res_y: 3840,
            style: &style,
            cues: &cues,
        }
        .render();
        assert!(!script.contains("\\fad"));
        assert!(script.contains(",1,0,0,8,50,50,0,1"));
    }

    #[test]
    fn test_style_validation() {
        let mut style = CaptionStyle::default();
        assert!(style.validate().is_ok());
        style.font_size = 0;
        assert!(style.validate().is_err());
    }

    #[test]
    fn test_variant_parsing() {
        assert_eq!("Plain".parse::<CaptionVariant>().unwrap(), CaptionVariant::Plain);
        assert_eq!("stroked".parse::<CaptionVariant>().unwrap(), CaptionVariant::Stroked);
        assert!("fancy".parse::<CaptionVariant>().is_err());
    }
}
