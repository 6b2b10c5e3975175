//! Voice synthesis and audio output.
//!
//! The timing engine talks to sound hardware only through the
//! [`VoiceOutput`] trait: a shared clock, exact-time hit scheduling, and
//! cancellation. [`CpalOutput`] implements it against a real device;
//! [`OfflineOutput`] implements it against a manual clock so every scheduling
//! path can run under tests without audio hardware.

pub mod mixer;
pub mod offline;
pub mod output;
pub mod sample;
pub mod voices;

pub use offline::OfflineOutput;
pub use output::{AudioError, CpalOutput};
pub use sample::{SampleData, SampleError};
pub use voices::build_default_bank;

use std::collections::HashMap;

use crate::groove::DrumVoice;

/// A single hit handed from the scheduler to the output.
///
/// `time` is seconds on the output's own clock; `0.0` (or any time already
/// in the past) means "as soon as possible". Hits are transient — created
/// during a look-ahead pass and garbage once handed over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledHit {
    pub voice: DrumVoice,
    pub time: f64,
    pub velocity: f32,
}

impl ScheduledHit {
    /// A hit to be played as soon as possible.
    pub fn immediate(voice: DrumVoice, velocity: f32) -> Self {
        Self {
            voice,
            time: 0.0,
            velocity,
        }
    }
}

/// The seam between the timing engine and actual sound.
///
/// Each triggered hit is an independent, non-interfering sound event; the
/// implementation owns mixing. All methods must be callable from any thread.
pub trait VoiceOutput: Send + Sync {
    /// Current time in seconds on the clock hits are scheduled against.
    /// Must be the same clock the audio path consumes, so scheduling stays
    /// drift-free under load.
    fn now(&self) -> f64;

    /// Make the output able to produce sound, e.g. after the platform
    /// suspended it. Returns `false` when the output is unavailable; the
    /// caller is expected to treat that as "cannot play right now", not as
    /// a fatal error.
    fn resume(&self) -> bool;

    /// Schedule one hit for exact-time playback.
    fn schedule(&self, hit: ScheduledHit);

    /// Drop every scheduled hit that has not started sounding yet.
    /// Already-started hits ring out naturally.
    fn cancel_pending(&self);
}

/// Sounds for every drum voice, keyed by [`DrumVoice`].
#[derive(Clone, Default)]
pub struct VoiceBank {
    sounds: HashMap<DrumVoice, SampleData>,
}

impl VoiceBank {
    /// Create an empty bank.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the sound for a voice.
    pub fn insert(&mut self, voice: DrumVoice, data: SampleData) {
        self.sounds.insert(voice, data);
    }

    /// Look up the sound for a voice.
    pub fn get(&self, voice: DrumVoice) -> Option<&SampleData> {
        self.sounds.get(&voice)
    }

    /// Number of voices with a sound.
    pub fn len(&self) -> usize {
        self.sounds.len()
    }

    /// Whether the bank has no sounds.
    pub fn is_empty(&self) -> bool {
        self.sounds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_bank() {
        let bank = VoiceBank::new();
        assert!(bank.is_empty());
        assert!(bank.get(DrumVoice::Kick).is_none());
    }

    #[test]
    fn insert_and_get() {
        let mut bank = VoiceBank::new();
        bank.insert(DrumVoice::Kick, SampleData::from_mono(vec![0.5, 0.1], 44100));
        assert_eq!(bank.len(), 1);
        assert_eq!(bank.get(DrumVoice::Kick).unwrap().len(), 2);
    }

    #[test]
    fn insert_replaces() {
        let mut bank = VoiceBank::new();
        bank.insert(DrumVoice::Snare, SampleData::from_mono(vec![1.0], 44100));
        bank.insert(DrumVoice::Snare, SampleData::from_mono(vec![0.25], 44100));
        assert_eq!(bank.len(), 1);
        assert!((bank.get(DrumVoice::Snare).unwrap().samples()[0] - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn immediate_hit_has_time_zero() {
        let hit = ScheduledHit::immediate(DrumVoice::Crash, 0.9);
        assert_eq!(hit.time, 0.0);
        assert_eq!(hit.voice, DrumVoice::Crash);
    }
}
