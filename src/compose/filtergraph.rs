// ClipForge Filter Graph
// Copyright (c) 2026 Xing_The_Creator | ClipForge
//
// Turns a resolved CompositionPlan into one ffmpeg invocation.
//
// Inputs: 0 = foreground clip, 1 = background, 2 = music.
// Video: background fitted and scaled, stacked under the foreground, then
// the caption script burned on top. Audio: dialogue at unity gain summed
// with attenuated music, no normalization.

use crate::compose::plan::{BackgroundFit, CompositionPlan, MusicFit};
use crate::config::EncodingConfig;
use crate::tools::production_tools::{os_args, safe_arg_path};
use std::ffi::OsString;
use std::path::Path;

fn secs(value: f64) -> String {
    format!("{:.3}", value)
}

fn background_input(plan: &CompositionPlan) -> Vec<OsString> {
    let mut args = match plan.background_fit {
        BackgroundFit::Window { start } => {
            os_args(["-ss".to_string(), secs(start), "-t".to_string(), secs(plan.duration())])
        }
        BackgroundFit::Loop { repeats } => {
            os_args(["-stream_loop".to_string(), repeats.saturating_sub(1).to_string()])
        }
    };
    args.push("-i".into());
    args.push(safe_arg_path(plan.background.path()).into_os_string());
    args
}

fn music_input(plan: &CompositionPlan) -> Vec<OsString> {
    let mut args = match plan.music_fit {
        MusicFit::Trim => Vec::new(),
        MusicFit::Loop { repeats } => {
            os_args(["-stream_loop".to_string(), repeats.saturating_sub(1).to_string()])
        }
    };
    args.push("-i".into());
    args.push(safe_arg_path(plan.music.path()).into_os_string());
    args
}

/// The `-filter_complex` graph. `subtitle_file` must need no filter escaping.
pub fn filter_complex(plan: &CompositionPlan, subtitle_file: &str) -> String {
    let duration = secs(plan.duration());
    let width = plan.frame_width();

    let mut chains = vec![
        "[0:v]setsar=1,format=yuv420p[fg]".to_string(),
        format!(
            "[1:v]trim=duration={d},setpts=PTS-STARTPTS,scale={w}:{h},setsar=1,format=yuv420p[bg]",
            d = duration,
            w = width,
            h = plan.background_height
        ),
        "[fg][bg]vstack=inputs=2:shortest=1[stack]".to_string(),
        format!("[stack]ass='{}'[vout]", subtitle_file),
        format!(
            "[2:a]atrim=duration={d},asetpts=PTS-STARTPTS,volume={g}[music]",
            d = duration,
            g = plan.music_gain
        ),
    ];

    if plan.foreground.has_audio {
        chains.push(format!(
            "[0:a]atrim=duration={d},asetpts=PTS-STARTPTS,apad=whole_dur={d},volume=1.0[dialogue]",
            d = duration
        ));
        // Both inputs are exactly D long, so the mix is too.
        chains.push(
            "[dialogue][music]amix=inputs=2:duration=longest:dropout_transition=0:normalize=0[aout]"
                .to_string(),
        );
    } else {
        chains.push("[music]anull[aout]".to_string());
    }

    chains.join(";")
}

/// Full ffmpeg argument list writing the composite to `output`.
pub fn render_args(
    plan: &CompositionPlan,
    subtitle_file: &str,
    encoding: &EncodingConfig,
    output: &Path,
) -> Vec<OsString> {
    let mut args = os_args(["-y", "-hide_banner", "-loglevel", "error", "-i"]);
    args.push(safe_arg_path(plan.foreground.path()).into_os_string());
    args.extend(background_input(plan));
    args.extend(music_input(plan));

    args.push("-filter_complex".into());
    args.push(filter_complex(plan, subtitle_file).into());

    args.extend(os_args([
        "-map",
        "[vout]",
        "-map",
        "[aout]",
        "-c:v",
        encoding.video_codec.as_str(),
        "-preset",
        encoding.preset.as_str(),
        "-crf",
    ]));
    args.push(encoding.crf.to_string().into());
    args.extend(os_args([
        "-pix_fmt",
        "yuv420p",
        "-c:a",
        encoding.audio_codec.as_str(),
        "-b:a",
        encoding.audio_bitrate.as_str(),
        "-movflags",
        "+faststart",
        "-t",
    ]));
    args.push(secs(plan.duration()).into());
    args.push(safe_arg_path(output).into_os_string());
    args
}
