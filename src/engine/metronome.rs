//! Metronome configuration and click-time math.
//!
//! The metronome is an independent note stream layered over the groove by
//! the scheduler. This module owns the configuration types and the pure
//! math that places clicks inside one measure; the scheduler strings
//! measures together and converts offsets to absolute clock times.

use serde::{Deserialize, Serialize};

use crate::groove::{timing, TimeSignature};

/// How often the metronome clicks. `Off` disables the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClickRate {
    Off,
    Quarters,
    Eighths,
    Sixteenths,
}

impl ClickRate {
    /// Seconds between clicks at `tempo` quarter-note BPM.
    pub fn interval_secs(self, tempo: u16) -> Option<f64> {
        let quarter = 60.0 / tempo as f64;
        match self {
            ClickRate::Off => None,
            ClickRate::Quarters => Some(quarter),
            ClickRate::Eighths => Some(quarter / 2.0),
            ClickRate::Sixteenths => Some(quarter / 4.0),
        }
    }
}

/// Which subdivision of the quarter note the click lands on.
///
/// `Rotate` cycles 1 → E → AND → A, advancing once per measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OffsetClick {
    One,
    E,
    And,
    A,
    Ti,
    Ta,
    Rotate,
}

impl OffsetClick {
    /// Shift as a fraction of a quarter note, for a given measure index.
    pub fn quarter_fraction(self, measure_idx: usize) -> f64 {
        match self {
            OffsetClick::One => 0.0,
            OffsetClick::E => 0.25,
            OffsetClick::And => 0.5,
            OffsetClick::A => 0.75,
            OffsetClick::Ti => 1.0 / 3.0,
            OffsetClick::Ta => 2.0 / 3.0,
            OffsetClick::Rotate => [0.0, 0.25, 0.5, 0.75][measure_idx % 4],
        }
    }
}

/// Metronome settings. Read live by the scheduler on every pass, so any
/// field may be changed while playing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetronomeConfig {
    pub rate: ClickRate,
    /// Mute the groove voices and keep only the clicks.
    pub solo: bool,
    /// Prepend one measure of clicks before a fresh start.
    pub count_in: bool,
    pub offset: OffsetClick,
    /// Click loudness, 0..=100.
    pub volume: u8,
}

impl Default for MetronomeConfig {
    fn default() -> Self {
        Self {
            rate: ClickRate::Off,
            solo: false,
            count_in: false,
            offset: OffsetClick::One,
            volume: 100,
        }
    }
}

impl MetronomeConfig {
    /// Click velocity (0.0–1.0); accented clicks come out louder.
    pub fn click_velocity(&self, accent: bool) -> f32 {
        let base = if accent { 1.0 } else { 0.75 };
        base * (self.volume.min(100) as f32 / 100.0)
    }
}

/// One metronome click, relative to its measure start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Click {
    pub offset: f64,
    pub accent: bool,
}

/// Click times for one measure. The first click of a measure is accented.
pub fn clicks_for_measure(
    config: &MetronomeConfig,
    ts: TimeSignature,
    tempo: u16,
    measure_idx: usize,
) -> Vec<Click> {
    let Some(interval) = config.rate.interval_secs(tempo) else {
        return Vec::new();
    };
    let measure_dur = timing::measure_duration_secs(tempo, ts);
    let shift = config.offset.quarter_fraction(measure_idx) * (60.0 / tempo as f64);

    let mut clicks = Vec::new();
    let mut k = 0usize;
    loop {
        let base = k as f64 * interval;
        if base >= measure_dur {
            break;
        }
        clicks.push(Click {
            offset: base + shift,
            accent: k == 0,
        });
        k += 1;
    }
    clicks
}
