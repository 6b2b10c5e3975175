//! Integration tests for the MIDI-to-practice path.
//!
//! Feeds raw 3-byte messages through the pipeline and grades the resulting
//! voice hits with the performance tracker — the same wiring a practice
//! session uses, minus the physical device.

use std::sync::{Arc, Mutex};

use backbeat::groove::{Division, DrumVoice, GrooveData, TimeSignature};
use backbeat::midi::{Kit, MidiPipeline, VoiceHit};
use backbeat::practice::{Feedback, PerformanceTracker};
use backbeat::synth::{OfflineOutput, VoiceOutput};

const TEMPO: u16 = 120; // beat = 500 ms

fn practice_groove() -> GrooveData {
    let mut groove = GrooveData::new(TimeSignature::COMMON, Division::Sixteenths, TEMPO);
    let mut kick = vec![false; 16];
    kick[0] = true;
    kick[8] = true;
    let mut snare = vec![false; 16];
    snare[4] = true;
    snare[12] = true;
    groove.measures[0].set_row(DrumVoice::Kick, kick);
    groove.measures[0].set_row(DrumVoice::Snare, snare);
    groove
}

/// Pipeline wired to a shared tracker, the way a practice session runs.
fn practice_setup() -> (MidiPipeline, Arc<Mutex<PerformanceTracker>>) {
    let pipeline = MidiPipeline::new(Kit::builtin("td17").unwrap());

    let mut tracker = PerformanceTracker::new();
    tracker.enable(Some(practice_groove()), TEMPO, 0.0);
    let tracker = Arc::new(Mutex::new(tracker));

    let grader = Arc::clone(&tracker);
    pipeline.subscribe(move |hit: &VoiceHit| {
        grader
            .lock()
            .unwrap()
            .analyze_hit(hit.voice, hit.timestamp_ms);
    });

    (pipeline, tracker)
}

#[test]
fn td17_note_36_grades_as_kick_on_the_beat() {
    let (mut pipeline, tracker) = practice_setup();

    // Four on-the-beat kicks.
    for k in 0..4 {
        let hit = pipeline
            .handle_message(&[0x90, 36, 110], k as f64 * 500.0)
            .unwrap();
        assert_eq!(hit.voice, DrumVoice::Kick);
    }

    let tracker = tracker.lock().unwrap();
    let stats = tracker.stats();
    assert_eq!(stats.total_hits, 4);
    assert_eq!(stats.accurate_hits, 4);
    assert!((stats.average_score - 90.0).abs() < 1e-9); // (100 + 80) / 2
}

#[test]
fn unmapped_note_never_reaches_the_tracker() {
    let (mut pipeline, tracker) = practice_setup();
    assert!(pipeline.handle_message(&[0x90, 127, 100], 0.0).is_none());
    assert_eq!(tracker.lock().unwrap().stats().total_hits, 0);
}

#[test]
fn note_offs_and_noise_do_not_count_as_hits() {
    let (mut pipeline, tracker) = practice_setup();
    pipeline.handle_message(&[0x80, 36, 0], 0.0);
    pipeline.handle_message(&[0x90, 36, 0], 10.0); // velocity 0 = off
    pipeline.handle_message(&[0xF0, 0x7E], 20.0); // sysex-ish noise
    pipeline.handle_message(&[0x90], 30.0); // truncated
    assert_eq!(tracker.lock().unwrap().stats().total_hits, 0);
}

#[test]
fn off_grid_playing_earns_lower_scores() {
    let (mut pipeline, tracker) = practice_setup();

    // Dead on the beat, then drifting further off.
    pipeline.handle_message(&[0x90, 36, 100], 0.0);
    pipeline.handle_message(&[0x90, 36, 100], 562.5); // 62.5 ms late
    pipeline.handle_message(&[0x90, 36, 100], 1_200.0); // 200 ms late

    let tracker = tracker.lock().unwrap();
    let errors = &tracker.stats().timing_errors_ms;
    assert!((errors[0] - 0.0).abs() < 1e-9);
    assert!((errors[1] - 62.5).abs() < 1e-9);
    assert!((errors[2] - 200.0).abs() < 1e-9);
    assert_eq!(tracker.stats().accurate_hits, 1);
}

#[test]
fn playing_a_voice_outside_the_groove_is_flagged() {
    let (mut pipeline, tracker) = practice_setup();

    // Cowbell (TD-17 has none mapped; use GM where 56 is cowbell).
    pipeline.set_kit(Kit::builtin("general-midi").unwrap());
    let hit = pipeline.handle_message(&[0x90, 56, 100], 0.0).unwrap();
    assert_eq!(hit.voice, DrumVoice::CowBell);

    // Perfect timing but the wrong voice: (100 + 30) / 2 = 65 → Good.
    let mut tracker = tracker.lock().unwrap();
    let analysis = tracker.analyze_hit(DrumVoice::CowBell, 1_000.0).unwrap();
    assert!((analysis.overall - 65.0).abs() < 1e-9);
    assert_eq!(analysis.feedback, Feedback::Good);
}

#[test]
fn through_mode_and_grading_run_side_by_side() {
    let output = Arc::new(OfflineOutput::new());
    let mut pipeline = MidiPipeline::with_output(
        Kit::builtin("td17").unwrap(),
        Arc::clone(&output) as Arc<dyn VoiceOutput>,
    );
    pipeline.set_through(true);

    let mut tracker = PerformanceTracker::new();
    tracker.enable(Some(practice_groove()), TEMPO, 0.0);
    let tracker = Arc::new(Mutex::new(tracker));
    let grader = Arc::clone(&tracker);
    pipeline.subscribe(move |hit: &VoiceHit| {
        grader
            .lock()
            .unwrap()
            .analyze_hit(hit.voice, hit.timestamp_ms);
    });

    pipeline.handle_message(&[0x90, 38, 96], 500.0); // snare on beat 1

    // The synthesizer got an immediate trigger...
    let scheduled = output.scheduled();
    assert_eq!(scheduled.len(), 1);
    assert_eq!(scheduled[0].voice, DrumVoice::Snare);
    assert_eq!(scheduled[0].time, 0.0);

    // ...and the tracker scored the same hit.
    let tracker = tracker.lock().unwrap();
    assert_eq!(tracker.stats().total_hits, 1);
    assert_eq!(tracker.stats().accurate_hits, 1);
}

#[test]
fn disabling_the_tracker_freezes_the_run() {
    let (mut pipeline, tracker) = practice_setup();
    pipeline.handle_message(&[0x90, 36, 100], 0.0);
    tracker.lock().unwrap().disable();
    pipeline.handle_message(&[0x90, 36, 100], 500.0);

    let tracker = tracker.lock().unwrap();
    assert_eq!(tracker.stats().total_hits, 1);
    assert!(tracker.report().contains("hits:            1"));
}
