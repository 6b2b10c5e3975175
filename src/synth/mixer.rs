//! Audio-thread mixer — runs inside the output stream callback.
//!
//! Hit commands cross from the control side through a lock-free ring buffer.
//! The mixer starts each hit at its exact frame, mixes every sounding voice
//! additively, and advances the shared frame counter that serves as the
//! scheduling clock.

use ringbuf::traits::Consumer;
use ringbuf::HeapCons;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::VoiceBank;
use crate::groove::DrumVoice;

/// A hit as it travels to the audio thread.
///
/// `epoch` tags the cancellation generation the hit was scheduled under;
/// hits from an older generation are dropped before they start sounding.
#[derive(Debug, Clone, Copy)]
pub struct HitCommand {
    pub voice: DrumVoice,
    pub start_frame: u64,
    pub velocity: f32,
    pub epoch: u64,
}

/// A hit currently sounding.
struct ActiveHit {
    voice: DrumVoice,
    velocity: f32,
    /// Read position into the voice's sample buffer.
    cursor: usize,
    /// Frame offset into the *next* block at which this hit begins.
    /// Non-zero only for the first block.
    delay_frames: usize,
}

/// State owned by the audio callback. Touched only from the audio thread,
/// apart from the two shared atomics.
pub struct Mixer {
    consumer: HeapCons<HitCommand>,
    bank: VoiceBank,
    pending: Vec<HitCommand>,
    active: Vec<ActiveHit>,
    frames: Arc<AtomicU64>,
    epoch: Arc<AtomicU64>,
    channels: usize,
}

impl Mixer {
    pub fn new(
        consumer: HeapCons<HitCommand>,
        bank: VoiceBank,
        frames: Arc<AtomicU64>,
        epoch: Arc<AtomicU64>,
        channels: u16,
    ) -> Self {
        Self {
            consumer,
            bank,
            pending: Vec::with_capacity(64),
            active: Vec::with_capacity(64),
            frames,
            epoch,
            channels: channels as usize,
        }
    }

    /// Fill one interleaved output block.
    pub fn process(&mut self, output: &mut [f32]) {
        let base_frame = self.frames.load(Ordering::Acquire);
        let block_frames = output.len() / self.channels;
        let current_epoch = self.epoch.load(Ordering::Acquire);

        while let Some(cmd) = self.consumer.try_pop() {
            if cmd.epoch == current_epoch {
                self.pending.push(cmd);
            }
        }
        // A cancellation may arrive after commands were queued.
        self.pending.retain(|cmd| cmd.epoch == current_epoch);

        // Promote hits that begin inside this block. Late hits (start frame
        // already passed) begin at the block head.
        let block_end = base_frame + block_frames as u64;
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].start_frame < block_end {
                let cmd = self.pending.swap_remove(i);
                self.active.push(ActiveHit {
                    voice: cmd.voice,
                    velocity: cmd.velocity,
                    cursor: 0,
                    delay_frames: cmd.start_frame.saturating_sub(base_frame) as usize,
                });
            } else {
                i += 1;
            }
        }

        output.fill(0.0);
        for hit in &mut self.active {
            let Some(sound) = self.bank.get(hit.voice) else {
                hit.cursor = usize::MAX; // unknown voice: retire silently
                continue;
            };
            let samples = sound.samples();
            let start = hit.delay_frames.min(block_frames);
            hit.delay_frames = 0;

            for frame in start..block_frames {
                if hit.cursor >= samples.len() {
                    break;
                }
                let value = samples[hit.cursor] * hit.velocity;
                hit.cursor += 1;
                let at = frame * self.channels;
                for out in &mut output[at..at + self.channels] {
                    *out += value;
                }
            }
        }
        self.active.retain(|hit| {
            hit.cursor != usize::MAX
                && self
                    .bank
                    .get(hit.voice)
                    .is_some_and(|s| hit.cursor < s.len())
        });

        for sample in output.iter_mut() {
            *sample = sample.clamp(-1.0, 1.0);
        }

        self.frames.store(block_end, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::SampleData;
    use ringbuf::{
        traits::{Producer, Split},
        HeapRb,
    };

    const CHANNELS: u16 = 2;

    fn setup(bank: VoiceBank) -> (ringbuf::HeapProd<HitCommand>, Mixer, Arc<AtomicU64>) {
        let rb = HeapRb::<HitCommand>::new(64);
        let (prod, cons) = rb.split();
        let frames = Arc::new(AtomicU64::new(0));
        let epoch = Arc::new(AtomicU64::new(0));
        let mixer = Mixer::new(cons, bank, Arc::clone(&frames), Arc::clone(&epoch), CHANNELS);
        (prod, mixer, frames)
    }

    fn flat_bank(voice: DrumVoice, value: f32, len: usize) -> VoiceBank {
        let mut bank = VoiceBank::new();
        bank.insert(voice, SampleData::from_mono(vec![value; len], 44100));
        bank
    }

    #[test]
    fn silence_when_nothing_scheduled() {
        let (_prod, mut mixer, frames) = setup(VoiceBank::new());
        let mut out = vec![999.0f32; 32];
        mixer.process(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
        assert_eq!(frames.load(Ordering::SeqCst), 16);
    }

    #[test]
    fn hit_at_frame_zero_fills_block_head() {
        let (mut prod, mut mixer, _) = setup(flat_bank(DrumVoice::Kick, 0.5, 4));
        prod.try_push(HitCommand {
            voice: DrumVoice::Kick,
            start_frame: 0,
            velocity: 1.0,
            epoch: 0,
        })
        .unwrap();

        let mut out = vec![0.0f32; 16];
        mixer.process(&mut out);
        // 4 sample frames × 2 channels
        assert!(out[..8].iter().all(|&s| (s - 0.5).abs() < f32::EPSILON));
        assert!(out[8..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn hit_starts_at_exact_frame_offset() {
        let (mut prod, mut mixer, _) = setup(flat_bank(DrumVoice::Snare, 0.4, 2));
        prod.try_push(HitCommand {
            voice: DrumVoice::Snare,
            start_frame: 3,
            velocity: 1.0,
            epoch: 0,
        })
        .unwrap();

        let mut out = vec![0.0f32; 16]; // 8 frames
        mixer.process(&mut out);
        assert_eq!(out[5], 0.0); // frame 2
        assert!((out[6] - 0.4).abs() < f32::EPSILON); // frame 3, L
        assert!((out[7] - 0.4).abs() < f32::EPSILON); // frame 3, R
        assert!((out[8] - 0.4).abs() < f32::EPSILON); // frame 4
        assert_eq!(out[10], 0.0); // frame 5
    }

    #[test]
    fn hit_spans_blocks() {
        let (mut prod, mut mixer, _) = setup(flat_bank(DrumVoice::Crash, 0.2, 12));
        prod.try_push(HitCommand {
            voice: DrumVoice::Crash,
            start_frame: 0,
            velocity: 1.0,
            epoch: 0,
        })
        .unwrap();

        let mut first = vec![0.0f32; 16]; // 8 frames
        mixer.process(&mut first);
        assert!(first.iter().all(|&s| (s - 0.2).abs() < f32::EPSILON));

        let mut second = vec![0.0f32; 16];
        mixer.process(&mut second);
        // Remaining 4 frames, then silence.
        assert!(second[..8].iter().all(|&s| (s - 0.2).abs() < f32::EPSILON));
        assert!(second[8..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn future_hit_waits_in_pending() {
        let (mut prod, mut mixer, _) = setup(flat_bank(DrumVoice::Kick, 0.5, 2));
        prod.try_push(HitCommand {
            voice: DrumVoice::Kick,
            start_frame: 100,
            velocity: 1.0,
            epoch: 0,
        })
        .unwrap();

        let mut out = vec![0.0f32; 16];
        mixer.process(&mut out); // frames 0..8
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn stale_epoch_hits_are_dropped() {
        let (mut prod, mut mixer, _) = setup(flat_bank(DrumVoice::Kick, 0.5, 2));
        prod.try_push(HitCommand {
            voice: DrumVoice::Kick,
            start_frame: 0,
            velocity: 1.0,
            epoch: 0,
        })
        .unwrap();
        // Cancel before the audio thread runs.
        mixer.epoch.store(1, Ordering::SeqCst);

        let mut out = vec![0.0f32; 16];
        mixer.process(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn cancellation_drops_waiting_but_not_sounding_hits() {
        let (mut prod, mut mixer, _) = setup(flat_bank(DrumVoice::Crash, 0.2, 32));
        prod.try_push(HitCommand {
            voice: DrumVoice::Crash,
            start_frame: 0,
            velocity: 1.0,
            epoch: 0,
        })
        .unwrap();
        prod.try_push(HitCommand {
            voice: DrumVoice::Crash,
            start_frame: 1000,
            velocity: 1.0,
            epoch: 0,
        })
        .unwrap();

        let mut out = vec![0.0f32; 16];
        mixer.process(&mut out); // first hit starts sounding
        assert!(out.iter().any(|&s| s != 0.0));

        mixer.epoch.store(1, Ordering::SeqCst);
        let mut out2 = vec![0.0f32; 16];
        mixer.process(&mut out2);
        // The started hit rings out...
        assert!(out2.iter().any(|&s| s != 0.0));
        // ...and the queued one is gone for good.
        assert!(mixer.pending.is_empty());
    }

    #[test]
    fn simultaneous_hits_mix_additively_with_clamp() {
        let mut bank = flat_bank(DrumVoice::Kick, 0.8, 4);
        bank.insert(DrumVoice::Snare, SampleData::from_mono(vec![0.8; 4], 44100));
        let (mut prod, mut mixer, _) = setup(bank);
        for voice in [DrumVoice::Kick, DrumVoice::Snare] {
            prod.try_push(HitCommand {
                voice,
                start_frame: 0,
                velocity: 1.0,
                epoch: 0,
            })
            .unwrap();
        }

        let mut out = vec![0.0f32; 16];
        mixer.process(&mut out);
        // 0.8 + 0.8 clamps to 1.0
        assert!(out[..8].iter().all(|&s| (s - 1.0).abs() < f32::EPSILON));
    }

    #[test]
    fn velocity_scales_playback() {
        let (mut prod, mut mixer, _) = setup(flat_bank(DrumVoice::Kick, 0.5, 2));
        prod.try_push(HitCommand {
            voice: DrumVoice::Kick,
            start_frame: 0,
            velocity: 0.5,
            epoch: 0,
        })
        .unwrap();

        let mut out = vec![0.0f32; 8];
        mixer.process(&mut out);
        assert!((out[0] - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn unknown_voice_is_ignored() {
        let (mut prod, mut mixer, _) = setup(VoiceBank::new());
        prod.try_push(HitCommand {
            voice: DrumVoice::CowBell,
            start_frame: 0,
            velocity: 1.0,
            epoch: 0,
        })
        .unwrap();

        let mut out = vec![0.0f32; 16];
        mixer.process(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
        assert!(mixer.active.is_empty());
    }

    #[test]
    fn frame_counter_accumulates() {
        let (_prod, mut mixer, frames) = setup(VoiceBank::new());
        let mut out = vec![0.0f32; 32]; // 16 frames per block
        for _ in 0..5 {
            mixer.process(&mut out);
        }
        assert_eq!(frames.load(Ordering::SeqCst), 80);
    }
}
