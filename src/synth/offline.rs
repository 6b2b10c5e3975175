//! Offline output — a manual clock plus a log of scheduled hits.
//!
//! Implements [`VoiceOutput`] without touching audio hardware, so the whole
//! scheduling engine can run deterministically under tests or in headless
//! hosts. Tests advance the clock explicitly and inspect what was scheduled.

use std::sync::Mutex;

use super::{ScheduledHit, VoiceOutput};

struct OfflineState {
    now: f64,
    scheduled: Vec<ScheduledHit>,
    resume_ok: bool,
    cancelled: usize,
}

/// A [`VoiceOutput`] that records instead of sounding.
pub struct OfflineOutput {
    state: Mutex<OfflineState>,
}

impl OfflineOutput {
    /// A fresh output at time zero that accepts everything.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(OfflineState {
                now: 0.0,
                scheduled: Vec::new(),
                resume_ok: true,
                cancelled: 0,
            }),
        }
    }

    /// An output whose `resume()` fails, imitating an unavailable device.
    pub fn unavailable() -> Self {
        let output = Self::new();
        output.state.lock().expect("offline state poisoned").resume_ok = false;
        output
    }

    /// Advance the clock by `dt` seconds.
    pub fn advance(&self, dt: f64) {
        self.state.lock().expect("offline state poisoned").now += dt;
    }

    /// Every hit scheduled so far, in scheduling order.
    pub fn scheduled(&self) -> Vec<ScheduledHit> {
        self.state
            .lock()
            .expect("offline state poisoned")
            .scheduled
            .clone()
    }

    /// Drain the recorded hits.
    pub fn take_scheduled(&self) -> Vec<ScheduledHit> {
        std::mem::take(
            &mut self
                .state
                .lock()
                .expect("offline state poisoned")
                .scheduled,
        )
    }

    /// Number of hits dropped by cancellation so far.
    pub fn cancelled(&self) -> usize {
        self.state.lock().expect("offline state poisoned").cancelled
    }
}

impl Default for OfflineOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl VoiceOutput for OfflineOutput {
    fn now(&self) -> f64 {
        self.state.lock().expect("offline state poisoned").now
    }

    fn resume(&self) -> bool {
        self.state.lock().expect("offline state poisoned").resume_ok
    }

    fn schedule(&self, hit: ScheduledHit) {
        self.state
            .lock()
            .expect("offline state poisoned")
            .scheduled
            .push(hit);
    }

    fn cancel_pending(&self) {
        let mut state = self.state.lock().expect("offline state poisoned");
        let now = state.now;
        let before = state.scheduled.len();
        // Hits timed in the future have not "started sounding" yet.
        state.scheduled.retain(|hit| hit.time <= now);
        state.cancelled += before - state.scheduled.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::groove::DrumVoice;

    #[test]
    fn clock_starts_at_zero_and_advances() {
        let output = OfflineOutput::new();
        assert_eq!(output.now(), 0.0);
        output.advance(0.25);
        output.advance(0.25);
        assert!((output.now() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn records_hits_in_order() {
        let output = OfflineOutput::new();
        output.schedule(ScheduledHit {
            voice: DrumVoice::Kick,
            time: 0.0,
            velocity: 0.8,
        });
        output.schedule(ScheduledHit {
            voice: DrumVoice::Snare,
            time: 0.5,
            velocity: 0.8,
        });
        let hits = output.scheduled();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].voice, DrumVoice::Kick);
        assert_eq!(hits[1].voice, DrumVoice::Snare);
    }

    #[test]
    fn cancel_drops_only_future_hits() {
        let output = OfflineOutput::new();
        output.schedule(ScheduledHit {
            voice: DrumVoice::Kick,
            time: 0.1,
            velocity: 0.8,
        });
        output.schedule(ScheduledHit {
            voice: DrumVoice::Snare,
            time: 0.9,
            velocity: 0.8,
        });
        output.advance(0.5);
        output.cancel_pending();

        let hits = output.scheduled();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].voice, DrumVoice::Kick);
        assert_eq!(output.cancelled(), 1);
    }

    #[test]
    fn unavailable_output_refuses_resume() {
        assert!(!OfflineOutput::unavailable().resume());
        assert!(OfflineOutput::new().resume());
    }

    #[test]
    fn take_scheduled_drains() {
        let output = OfflineOutput::new();
        output.schedule(ScheduledHit::immediate(DrumVoice::Clap, 0.5));
        assert_eq!(output.take_scheduled().len(), 1);
        assert!(output.scheduled().is_empty());
    }
}
