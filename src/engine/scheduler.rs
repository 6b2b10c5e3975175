//! The playback state machine — look-ahead scheduling against the output clock.
//!
//! [`GrooveScheduler`] owns the play/stop/dispose lifecycle, the look-ahead
//! scheduling pass, mid-playback groove swaps, the metronome overlay, and
//! position notifications. It is pumped from outside via [`tick`] and talks
//! to audio only through [`VoiceOutput`], so every path here runs under
//! tests with an [`OfflineOutput`](crate::synth::OfflineOutput) and a manual
//! clock. [`DrumEngine`](super::DrumEngine) adds the real-time pump.
//!
//! [`tick`]: GrooveScheduler::tick
//!
//! Scheduling uses the lookahead-window pattern: a frequent pass converts
//! every note falling inside a short window ahead of the clock into an
//! absolute-time hit. A single long timer per note would drift; the window
//! against the shared clock does not. Looping advances the start reference
//! by exactly one pattern duration rather than resetting it to "now", which
//! keeps repetitions seamless.

use std::sync::Arc;

use crate::groove::{timing, DrumVoice, GrooveData, GrooveError};
use crate::synth::{ScheduledHit, VoiceOutput};

use super::metronome::{clicks_for_measure, Click, ClickRate, MetronomeConfig, OffsetClick};

/// How far ahead of the clock hits are scheduled, in seconds.
const SCHEDULE_AHEAD_SECS: f64 = 0.1;
/// Cadence of the scheduling pass.
const SCHEDULE_INTERVAL_SECS: f64 = 0.025;
/// Cadence of the position poll. Decoupled from the scheduling pass so UI
/// frame rate never influences audio precision.
const POSITION_POLL_SECS: f64 = 0.016;
/// Lead time between `play()` and the first scheduled note.
const START_LEAD_SECS: f64 = 0.05;

/// Lifecycle states. `Disposed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    Stopped,
    Playing,
    Disposed,
}

/// Where inside its sixteenth-note cell a note triggers. Affects the audio
/// trigger time only, never the logical grid position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    #[default]
    Start,
    Middle,
    End,
}

impl SyncMode {
    fn cell_fraction(self) -> f64 {
        match self {
            SyncMode::Start => 0.0,
            SyncMode::Middle => 0.5,
            SyncMode::End => 1.0,
        }
    }
}

/// Notifications for the host. Delivered in the order they occurred.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Playback started (`true`) or stopped (`false`).
    PlaybackChanged(bool),
    /// The current logical note index changed; `None` means no current note.
    PositionChanged(Option<usize>),
    /// A groove swap was staged and will apply at the next loop boundary.
    GroovePending,
    /// A groove swap completed.
    GrooveChanged(GrooveData),
}

/// One grid slot of the flattened pattern.
struct Slot {
    /// Nominal offset from pattern start, swing included.
    offset: f64,
    hits: Vec<(DrumVoice, f32)>,
}

/// Pre-computed per-pattern schedule: flattened slots and total duration.
struct PatternSchedule {
    slots: Vec<Slot>,
    duration: f64,
}

impl PatternSchedule {
    fn build(groove: &GrooveData) -> Result<Self, GrooveError> {
        groove.validate()?;

        let mut slots = Vec::with_capacity(groove.total_notes() as usize);
        let mut measure_start = 0.0;
        for measure in &groove.measures {
            let ts = measure.effective_time_signature(groove.time_signature);
            let count = timing::notes_per_measure(groove.division, ts).ok_or(
                GrooveError::IncompatibleDivision {
                    division: groove.division,
                    time_signature: ts,
                },
            )?;
            for i in 0..count {
                let offset = measure_start
                    + timing::note_offset_secs(i, groove.division, ts, groove.tempo, groove.swing);
                let hits = measure
                    .notes
                    .iter()
                    .filter(|(_, row)| row.get(i as usize).copied().unwrap_or(false))
                    .map(|(voice, _)| (*voice, voice.default_velocity()))
                    .collect();
                slots.push(Slot { offset, hits });
            }
            measure_start += timing::measure_duration_secs(groove.tempo, ts);
        }

        Ok(Self {
            slots,
            duration: measure_start,
        })
    }
}

/// Metronome clicks flattened across the pattern's measures.
fn build_clicks(groove: &GrooveData, config: &MetronomeConfig) -> Vec<Click> {
    let mut clicks = Vec::new();
    let mut measure_start = 0.0;
    for (measure_idx, measure) in groove.measures.iter().enumerate() {
        let ts = measure.effective_time_signature(groove.time_signature);
        for click in clicks_for_measure(config, ts, groove.tempo, measure_idx) {
            clicks.push(Click {
                offset: measure_start + click.offset,
                accent: click.accent,
            });
        }
        measure_start += timing::measure_duration_secs(groove.tempo, ts);
    }
    clicks
}

fn click_hit(time: f64, accent: bool, config: &MetronomeConfig) -> ScheduledHit {
    ScheduledHit {
        voice: if accent {
            DrumVoice::MetronomeAccent
        } else {
            DrumVoice::MetronomeClick
        },
        time,
        velocity: config.click_velocity(accent),
    }
}

/// The playback engine core. Pump with [`tick`](Self::tick).
pub struct GrooveScheduler {
    output: Arc<dyn VoiceOutput>,
    state: PlayState,
    groove: Option<GrooveData>,
    schedule: Option<Arc<PatternSchedule>>,
    pending_groove: Option<GrooveData>,
    metronome: MetronomeConfig,
    metronome_dirty: bool,
    sync: SyncMode,
    looping: bool,
    /// Start reference of the current repetition on the output clock.
    loop_start: f64,
    next_slot: usize,
    clicks: Vec<Click>,
    next_click: usize,
    /// Count-in clicks as absolute times; consumed once per fresh start.
    count_in: Vec<(f64, bool)>,
    next_count_in: usize,
    position: Option<usize>,
    next_sched_at: f64,
    next_poll_at: f64,
    /// Absolute time both note streams are scheduled up to.
    scheduled_until: f64,
}

impl GrooveScheduler {
    pub fn new(output: Arc<dyn VoiceOutput>) -> Self {
        Self {
            output,
            state: PlayState::Stopped,
            groove: None,
            schedule: None,
            pending_groove: None,
            metronome: MetronomeConfig::default(),
            metronome_dirty: false,
            sync: SyncMode::default(),
            looping: false,
            loop_start: 0.0,
            next_slot: 0,
            clicks: Vec::new(),
            next_click: 0,
            count_in: Vec::new(),
            next_count_in: 0,
            position: None,
            next_sched_at: 0.0,
            next_poll_at: 0.0,
            scheduled_until: 0.0,
        }
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn position(&self) -> Option<usize> {
        self.position
    }

    pub fn sync_mode(&self) -> SyncMode {
        self.sync
    }

    pub fn set_sync_mode(&mut self, mode: SyncMode) {
        self.sync = mode;
    }

    pub fn groove(&self) -> Option<&GrooveData> {
        self.groove.as_ref()
    }

    pub fn metronome_config(&self) -> MetronomeConfig {
        self.metronome
    }

    /// Replace the whole metronome configuration.
    pub fn set_metronome_config(&mut self, config: MetronomeConfig) {
        self.metronome = config;
        self.metronome_dirty = true;
    }

    pub fn set_click_rate(&mut self, rate: ClickRate) {
        self.metronome.rate = rate;
        self.metronome_dirty = true;
    }

    pub fn set_metronome_solo(&mut self, solo: bool) {
        self.metronome.solo = solo;
    }

    pub fn set_count_in(&mut self, count_in: bool) {
        self.metronome.count_in = count_in;
    }

    pub fn set_offset_click(&mut self, offset: OffsetClick) {
        self.metronome.offset = offset;
        self.metronome_dirty = true;
    }

    pub fn set_metronome_volume(&mut self, volume: u8) {
        self.metronome.volume = volume.min(100);
    }

    /// Start playing `groove`. Returns `false` — leaving engine state
    /// untouched by the bad input — when the groove is invalid, the output
    /// cannot be resumed, or the scheduler is disposed.
    ///
    /// Calling while already playing performs an implicit stop (cancelling
    /// the previous run's unfired hits) and restarts with the new groove.
    pub fn play(
        &mut self,
        groove: GrooveData,
        looping: bool,
        events: &mut Vec<EngineEvent>,
    ) -> bool {
        if self.state == PlayState::Disposed {
            return false;
        }
        let schedule = match PatternSchedule::build(&groove) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("cannot play groove: {e}");
                return false;
            }
        };
        if self.state == PlayState::Playing {
            self.stop(events);
        }
        if !self.output.resume() {
            return false;
        }

        let now = self.output.now();
        self.clicks = build_clicks(&groove, &self.metronome);
        self.metronome_dirty = false;

        self.count_in.clear();
        self.next_count_in = 0;
        let mut count_in_dur = 0.0;
        if self.metronome.count_in {
            let first_ts = groove.measures[0].effective_time_signature(groove.time_signature);
            let beat = timing::beat_duration_secs(groove.tempo, first_ts.note_value);
            for k in 0..first_ts.beats {
                self.count_in
                    .push((now + START_LEAD_SECS + k as f64 * beat, k == 0));
            }
            count_in_dur = timing::measure_duration_secs(groove.tempo, first_ts);
        }

        self.groove = Some(groove);
        self.schedule = Some(Arc::new(schedule));
        self.pending_groove = None;
        self.looping = looping;
        self.loop_start = now + START_LEAD_SECS + count_in_dur;
        self.next_slot = 0;
        self.next_click = 0;
        self.position = None;
        self.next_sched_at = now;
        self.next_poll_at = now;
        self.scheduled_until = now;
        self.state = PlayState::Playing;

        events.push(EngineEvent::PlaybackChanged(true));
        true
    }

    /// Stop playback: cancel unfired hits, clear the position, and complete
    /// any staged groove swap so the next start uses it. No-op unless
    /// playing.
    pub fn stop(&mut self, events: &mut Vec<EngineEvent>) {
        if self.state != PlayState::Playing {
            return;
        }
        self.output.cancel_pending();
        self.state = PlayState::Stopped;
        if let Some(groove) = self.pending_groove.take() {
            if self.install_groove(groove.clone()).is_ok() {
                events.push(EngineEvent::GrooveChanged(groove));
            }
        }
        if self.position.is_some() {
            self.position = None;
            events.push(EngineEvent::PositionChanged(None));
        }
        events.push(EngineEvent::PlaybackChanged(false));
    }

    /// Release the output and halt for good. Idempotent; every later call
    /// on this scheduler is a no-op.
    pub fn dispose(&mut self, events: &mut Vec<EngineEvent>) {
        if self.state == PlayState::Disposed {
            return;
        }
        self.stop(events);
        self.state = PlayState::Disposed;
    }

    /// Swap in a new groove. When stopped the swap is immediate; while
    /// playing it is staged and applied atomically at the next loop
    /// boundary, so nothing already scheduled in the current repetition
    /// moves.
    pub fn update_groove(
        &mut self,
        groove: GrooveData,
        events: &mut Vec<EngineEvent>,
    ) -> Result<(), GrooveError> {
        if self.state == PlayState::Disposed {
            return Ok(());
        }
        // Validate up front so a bad groove never replaces a good one.
        groove.validate()?;

        if self.state == PlayState::Playing {
            self.pending_groove = Some(groove);
            events.push(EngineEvent::GroovePending);
        } else {
            self.install_groove(groove.clone())?;
            events.push(EngineEvent::GrooveChanged(groove));
        }
        Ok(())
    }

    fn install_groove(&mut self, groove: GrooveData) -> Result<(), GrooveError> {
        let schedule = PatternSchedule::build(&groove)?;
        self.clicks = build_clicks(&groove, &self.metronome);
        self.metronome_dirty = false;
        self.groove = Some(groove);
        self.schedule = Some(Arc::new(schedule));
        Ok(())
    }

    /// One-shot preview of a voice, independent of the pattern loop and of
    /// the play state.
    pub fn play_preview(&mut self, voice: DrumVoice) {
        if self.state == PlayState::Disposed {
            return;
        }
        self.output
            .schedule(ScheduledHit::immediate(voice, voice.default_velocity()));
    }

    /// Pump the scheduler. Runs the scheduling pass and the position poll
    /// when their independent due-times have been reached.
    pub fn tick(&mut self, events: &mut Vec<EngineEvent>) {
        if self.state != PlayState::Playing {
            return;
        }
        let now = self.output.now();
        if now >= self.next_sched_at {
            self.schedule_pass(now, events);
            self.next_sched_at = now + SCHEDULE_INTERVAL_SECS;
        }
        if self.state == PlayState::Playing && now >= self.next_poll_at {
            self.position_pass(now, events);
            self.next_poll_at = now + POSITION_POLL_SECS;
        }
    }

    fn schedule_pass(&mut self, now: f64, events: &mut Vec<EngineEvent>) {
        let window_end = now + SCHEDULE_AHEAD_SECS;
        let mut batch: Vec<ScheduledHit> = Vec::new();

        while self.next_count_in < self.count_in.len() {
            let (time, accent) = self.count_in[self.next_count_in];
            if time >= window_end {
                break;
            }
            batch.push(click_hit(time, accent, &self.metronome));
            self.next_count_in += 1;
        }

        if self.metronome_dirty {
            self.rebuild_clicks();
        }

        let Some(mut schedule) = self.schedule.clone() else {
            return;
        };
        let mut sync_offset = self.sync_cell_offset();

        loop {
            while self.next_slot < schedule.slots.len() {
                let slot = &schedule.slots[self.next_slot];
                let nominal = self.loop_start + slot.offset;
                if nominal >= window_end {
                    break;
                }
                if !self.metronome.solo {
                    for &(voice, velocity) in &slot.hits {
                        batch.push(ScheduledHit {
                            voice,
                            time: nominal + sync_offset,
                            velocity,
                        });
                    }
                }
                self.next_slot += 1;
            }

            while self.next_click < self.clicks.len() {
                let click = self.clicks[self.next_click];
                let time = self.loop_start + click.offset;
                if time >= window_end {
                    break;
                }
                batch.push(click_hit(time, click.accent, &self.metronome));
                self.next_click += 1;
            }

            let exhausted =
                self.next_slot >= schedule.slots.len() && self.next_click >= self.clicks.len();
            if !exhausted {
                break;
            }

            let repetition_end = self.loop_start + schedule.duration;
            if !self.looping {
                if now >= repetition_end {
                    self.stop(events);
                }
                break;
            }
            if repetition_end >= window_end {
                break;
            }

            // Loop boundary: advance by the exact pattern duration and apply
            // any staged swap before the next repetition begins.
            self.loop_start = repetition_end;
            self.next_slot = 0;
            self.next_click = 0;
            if let Some(new_groove) = self.pending_groove.take() {
                if self.install_groove(new_groove.clone()).is_ok() {
                    events.push(EngineEvent::GrooveChanged(new_groove));
                    if let Some(installed) = self.schedule.clone() {
                        schedule = installed;
                    }
                    sync_offset = self.sync_cell_offset();
                }
            }
        }

        batch.sort_by(|a, b| a.time.total_cmp(&b.time));
        for hit in batch {
            self.output.schedule(hit);
        }
        self.scheduled_until = window_end;
    }

    fn sync_cell_offset(&self) -> f64 {
        let tempo = self.groove.as_ref().map(|g| g.tempo).unwrap_or(120);
        self.sync.cell_fraction() * (60.0 / tempo as f64) / 4.0
    }

    /// Re-derive click times after a live metronome config change, keeping
    /// the already-scheduled stretch of the timeline untouched.
    fn rebuild_clicks(&mut self) {
        if let Some(groove) = self.groove.as_ref() {
            self.clicks = build_clicks(groove, &self.metronome);
        }
        let resume_at = self.scheduled_until - self.loop_start;
        self.next_click = self.clicks.partition_point(|click| click.offset < resume_at);
        self.metronome_dirty = false;
    }

    /// Walk back from the clock to the current logical note and notify on
    /// change.
    fn position_pass(&mut self, now: f64, events: &mut Vec<EngineEvent>) {
        let Some(schedule) = self.schedule.clone() else {
            return;
        };
        if now < self.loop_start && self.position.is_none() {
            return; // count-in / lead-in: no current note yet
        }

        // The scheduling pass advances `loop_start` a window ahead of the
        // audible boundary, so `now` may still sit in the previous
        // repetition.
        let mut rel = now - self.loop_start;
        if rel < 0.0 {
            rel += schedule.duration;
        }
        if rel >= schedule.duration {
            if !self.looping {
                return;
            }
            rel %= schedule.duration;
        }

        let idx = schedule
            .slots
            .partition_point(|slot| slot.offset <= rel)
            .saturating_sub(1);
        let new_position = Some(idx);
        if new_position != self.position {
            self.position = new_position;
            events.push(EngineEvent::PositionChanged(new_position));
        }
    }
}
