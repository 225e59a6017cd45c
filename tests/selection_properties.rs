use clipforge_core::compose::assets::{AudioAsset, VideoAsset};
use clipforge_core::compose::captions::{cues_from_transcription, AssScript, CaptionStyle};
use clipforge_core::compose::plan::{BackgroundFit, CompositionPlan};
use clipforge_core::random::{RandomFactory, RandomSource, RngSource, ScriptedRandom, SeedPolicy};
use clipforge_core::selector::{plan_windows, SegmentSelector};
use clipforge_core::transcription::{Segment, TranscriptionResult, Word};

#[test]
fn selection_stays_inside_source_for_many_durations() {
    let selector = SegmentSelector::new(15, 35).unwrap();
    let mut rng = RngSource::seeded(2024);
    for _ in 0..5000 {
        let duration = rng.uniform_f64(0.1, 900.0);
        let sel = selector.select(duration, 0.0, &mut rng).unwrap();
        assert!(sel.start >= 0.0);
        assert!(sel.end() <= duration + 1e-9);
        if sel.full_source {
            assert_eq!(sel.start, 0.0);
            assert_eq!(sel.length, duration);
        } else {
            assert!((15.0..=35.0).contains(&sel.length));
        }
    }
}

#[test]
fn batch_windows_do_not_overlap() {
    let selector = SegmentSelector::new(15, 35).unwrap();
    let policy = SeedPolicy::Fixed(5);
    for duration in [240.0, 500.0, 1000.0, 3601.5] {
        let windows = plan_windows(duration, 240).unwrap();
        assert_eq!(windows.len(), (duration / 240.0f64).floor() as usize);

        let clips: Vec<_> = windows
            .iter()
            .map(|w| {
                let mut rng = policy.for_window(w.index);
                selector.select_in_window(duration, w, rng.as_mut()).unwrap()
            })
            .collect();
        for pair in clips.windows(2) {
            assert!(pair[0].end() <= pair[1].start + 1e-9);
        }
        for (clip, window) in clips.iter().zip(&windows) {
            assert!(clip.start >= window.start);
        }
    }
}

#[test]
fn batch_windows_stay_disjoint_when_clips_outgrow_interval() {
    let selector = SegmentSelector::new(30, 30).unwrap();
    let policy = SeedPolicy::Fixed(11);
    for duration in [20.0, 100.0, 107.5] {
        let windows = plan_windows(duration, 20).unwrap();
        let clips: Vec<_> = windows
            .iter()
            .map(|w| {
                let mut rng = policy.for_window(w.index);
                selector.select_in_window(duration, w, rng.as_mut()).unwrap()
            })
            .collect();
        for (clip, window) in clips.iter().zip(&windows) {
            assert!(clip.start >= window.start, "{:?} starts before {:?}", clip, window);
            assert!(clip.end() <= window.end + 1e-9, "{:?} runs past {:?}", clip, window);
        }
        for pair in clips.windows(2) {
            assert!(pair[0].end() <= pair[1].start + 1e-9, "overlap {:?} {:?}", pair[0], pair[1]);
        }
    }
}

#[test]
fn window_renders_depend_only_on_index() {
    let selector = SegmentSelector::new(15, 35).unwrap();
    let policy = SeedPolicy::Fixed(77);
    let windows = plan_windows(1200.0, 240).unwrap();

    let forward: Vec<_> = windows
        .iter()
        .map(|w| selector.select_in_window(1200.0, w, policy.for_window(w.index).as_mut()).unwrap())
        .collect();
    let mut backward: Vec<_> = windows
        .iter()
        .rev()
        .map(|w| selector.select_in_window(1200.0, w, policy.for_window(w.index).as_mut()).unwrap())
        .collect();
    backward.reverse();
    assert_eq!(forward, backward);
}

#[test]
fn five_hundred_second_source_gives_two_windows() {
    let windows = plan_windows(500.0, 240).unwrap();
    assert_eq!(windows.len(), 2);
    assert_eq!((windows[0].start, windows[0].end), (0.0, 240.0));
    assert_eq!((windows[1].start, windows[1].end), (240.0, 480.0));
}

#[test]
fn ten_second_background_loops_for_twenty_five_second_clip() {
    let plan = CompositionPlan::resolve(
        VideoAsset::from_parts("clip.mp4", 1080, 1920, 25.0, true),
        VideoAsset::from_parts("bg.mp4", 1080, 1920, 10.0, false),
        AudioAsset::from_parts("music.mp3", 120.0),
        &TranscriptionResult::default(),
        &CaptionStyle::default(),
        0.15,
        &mut ScriptedRandom::default(),
    );
    assert_eq!(plan.background_fit, BackgroundFit::Loop { repeats: 3 });
    assert!(plan.background_coverage() >= 25.0);
    assert_eq!(plan.background_duration(), 25.0);
    assert_eq!(plan.music_duration(), 25.0);
}

#[test]
fn cue_count_matches_word_count_across_segments() {
    let transcription = TranscriptionResult {
        segments: vec![
            Segment {
                words: vec![Word::new("ok", 0.0, 0.5), Word::new("go", 0.5, 1.1)],
            },
            Segment {
                words: vec![Word::new("", 1.2, 1.3), Word::new("now", 1.3, 1.8)],
            },
        ],
        language: None,
    };
    let style = CaptionStyle::stroked();
    let cues = cues_from_transcription(&transcription, &style, 1080, 1920, 30.0);
    assert_eq!(cues.len(), transcription.word_count());
    for (cue, word) in cues.iter().zip(transcription.words()) {
        assert_eq!((cue.start, cue.end), (word.start, word.end));
    }

    let script = AssScript {
        play_res_x: 1080,
        play_res_y: 2528,
        style: &style,
        cues: &cues,
    }
    .render();
    let events: Vec<_> = script.lines().filter(|l| l.starts_with("Dialogue:")).collect();
    assert_eq!(events.len(), 4);
    assert!(events[0].ends_with("}ok"));
    assert!(events[1].ends_with("}go"));
    assert!(events[3].ends_with("}now"));
}
