//! Synthetic drum voice generators.
//!
//! Each generator renders a mono f32 buffer at the requested sample rate.
//! Noise-based sounds draw from a seeded `ChaCha8Rng` so a bank built twice
//! with the same seed is bit-identical.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::sample::SampleData;
use super::VoiceBank;
use crate::groove::DrumVoice;

/// Sine drum with an exponential pitch sweep and amplitude decay.
/// The kick uses 150→50 Hz; toms call this with higher anchors.
pub fn generate_membrane(
    sample_rate: u32,
    freq_hi: f64,
    freq_lo: f64,
    duration_secs: f64,
) -> Vec<f32> {
    let num_samples = (sample_rate as f64 * duration_secs) as usize;
    let mut output = Vec::with_capacity(num_samples);
    let mut phase = 0.0_f64;

    for i in 0..num_samples {
        let norm = i as f64 / num_samples as f64;
        let freq = freq_lo + (freq_hi - freq_lo) * (-norm * 8.0).exp();
        let amp = (-norm * 9.0).exp();

        phase += freq / sample_rate as f64;
        output.push(((phase * std::f64::consts::TAU).sin() * amp) as f32);
    }

    output
}

/// Kick drum (~250ms).
pub fn generate_kick(sample_rate: u32) -> Vec<f32> {
    generate_membrane(sample_rate, 150.0, 50.0, 0.25)
}

/// Tom at the given fundamental (~300ms).
pub fn generate_tom(sample_rate: u32, fundamental: f64) -> Vec<f32> {
    generate_membrane(sample_rate, fundamental * 1.6, fundamental, 0.3)
}

/// Snare (~200ms): 180 Hz sine body plus faster-decaying white noise.
pub fn generate_snare(sample_rate: u32, seed: u64) -> Vec<f32> {
    let duration_secs = 0.2;
    let num_samples = (sample_rate as f64 * duration_secs) as usize;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut output = Vec::with_capacity(num_samples);
    let mut phase = 0.0_f64;

    for i in 0..num_samples {
        let norm = i as f64 / num_samples as f64;

        let body_amp = (-norm * 15.0).exp();
        phase += 180.0 / sample_rate as f64;
        let body = (phase * std::f64::consts::TAU).sin() * body_amp;

        let noise_amp = (-norm * 12.0).exp();
        let noise: f64 = rng.gen_range(-1.0..1.0) * noise_amp;

        output.push((body * 0.5 + noise * 0.5) as f32);
    }

    output
}

/// Buzz stroke (~250ms): a snare with the noise tail amplitude-modulated to
/// mimic a multiple-bounce press roll.
pub fn generate_buzz(sample_rate: u32, seed: u64) -> Vec<f32> {
    let duration_secs = 0.25;
    let num_samples = (sample_rate as f64 * duration_secs) as usize;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut output = Vec::with_capacity(num_samples);

    // ~32 bounces per second
    let bounce_hz = 32.0;
    for i in 0..num_samples {
        let t = i as f64 / sample_rate as f64;
        let norm = i as f64 / num_samples as f64;
        let envelope = (-norm * 8.0).exp();
        let bounce = 0.5 + 0.5 * (t * bounce_hz * std::f64::consts::TAU).cos();
        let noise: f64 = rng.gen_range(-1.0..1.0);
        output.push((noise * envelope * bounce * 0.8) as f32);
    }

    output
}

/// Cross stick (~60ms): damped 800 Hz click, woodblock-like.
pub fn generate_cross_stick(sample_rate: u32) -> Vec<f32> {
    let duration_secs = 0.06;
    let num_samples = (sample_rate as f64 * duration_secs) as usize;
    let mut output = Vec::with_capacity(num_samples);
    let mut phase = 0.0_f64;

    for i in 0..num_samples {
        let norm = i as f64 / num_samples as f64;
        let amp = (-norm * 18.0).exp();
        phase += 800.0 / sample_rate as f64;
        output.push(((phase * std::f64::consts::TAU).sin() * amp * 0.9) as f32);
    }

    output
}

/// Filtered-noise cymbal. `decay` shapes how fast it dies; `brightness`
/// (0..1) is the high-pass coefficient.
pub fn generate_cymbal(
    sample_rate: u32,
    seed: u64,
    duration_secs: f64,
    decay: f64,
    brightness: f64,
) -> Vec<f32> {
    let num_samples = (sample_rate as f64 * duration_secs) as usize;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut output = Vec::with_capacity(num_samples);

    let mut prev_input = 0.0_f64;
    let mut prev_output = 0.0_f64;

    for i in 0..num_samples {
        let norm = i as f64 / num_samples as f64;
        let amp = (-norm * decay).exp();
        let noise: f64 = rng.gen_range(-1.0..1.0);

        // One-pole high-pass keeps only the sizzle.
        let filtered = brightness * (prev_output + noise - prev_input);
        prev_input = noise;
        prev_output = filtered;

        output.push((filtered * amp) as f32);
    }

    output
}

/// Closed hi-hat (~80ms).
pub fn generate_hihat_closed(sample_rate: u32, seed: u64) -> Vec<f32> {
    generate_cymbal(sample_rate, seed, 0.08, 20.0, 0.85)
}

/// Open hi-hat (~400ms).
pub fn generate_hihat_open(sample_rate: u32, seed: u64) -> Vec<f32> {
    generate_cymbal(sample_rate, seed, 0.4, 7.0, 0.85)
}

/// Foot chick (~50ms): duller and quieter than a stick stroke.
pub fn generate_hihat_foot(sample_rate: u32, seed: u64) -> Vec<f32> {
    generate_cymbal(sample_rate, seed, 0.05, 24.0, 0.6)
}

/// Crash (~1.2s wash).
pub fn generate_crash(sample_rate: u32, seed: u64) -> Vec<f32> {
    generate_cymbal(sample_rate, seed, 1.2, 4.0, 0.8)
}

/// Ride (~700ms): softer sizzle plus a faint stick ping.
pub fn generate_ride(sample_rate: u32, seed: u64) -> Vec<f32> {
    let mut wash = generate_cymbal(sample_rate, seed, 0.7, 5.0, 0.75);
    let mut phase = 0.0_f64;
    for (i, sample) in wash.iter_mut().enumerate() {
        let norm = i as f64 / (sample_rate as f64 * 0.7);
        phase += 1250.0 / sample_rate as f64;
        let ping = (phase * std::f64::consts::TAU).sin() * (-norm * 14.0).exp();
        *sample = *sample * 0.6 + (ping * 0.35) as f32;
    }
    wash
}

/// Two detuned, slightly clipped tones. The cowbell classic is 560+845 Hz;
/// the ride bell calls this an octave up.
pub fn generate_bell(sample_rate: u32, f1: f64, f2: f64, duration_secs: f64) -> Vec<f32> {
    let num_samples = (sample_rate as f64 * duration_secs) as usize;
    let mut output = Vec::with_capacity(num_samples);
    let mut phase1 = 0.0_f64;
    let mut phase2 = 0.0_f64;

    for i in 0..num_samples {
        let norm = i as f64 / num_samples as f64;
        let amp = (-norm * 9.0).exp();
        phase1 += f1 / sample_rate as f64;
        phase2 += f2 / sample_rate as f64;
        let tone = (phase1 * std::f64::consts::TAU).sin() + (phase2 * std::f64::consts::TAU).sin();
        // mild clipping for the metallic edge
        output.push((tone.clamp(-0.9, 0.9) * amp * 0.7) as f32);
    }

    output
}

/// Cowbell (~250ms).
pub fn generate_cowbell(sample_rate: u32) -> Vec<f32> {
    generate_bell(sample_rate, 560.0, 845.0, 0.25)
}

/// Ride bell (~350ms).
pub fn generate_ride_bell(sample_rate: u32) -> Vec<f32> {
    generate_bell(sample_rate, 1120.0, 1690.0, 0.35)
}

/// Stacker (~100ms): trashy, fast-choked cymbal stack.
pub fn generate_stacker(sample_rate: u32, seed: u64) -> Vec<f32> {
    generate_cymbal(sample_rate, seed, 0.1, 16.0, 0.95)
}

/// Clap (~150ms): three staggered noise micro-bursts and a short tail.
pub fn generate_clap(sample_rate: u32, seed: u64) -> Vec<f32> {
    let duration_secs = 0.15;
    let num_samples = (sample_rate as f64 * duration_secs) as usize;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut output = vec![0.0f32; num_samples];

    let burst_len = (0.01 * sample_rate as f64) as usize;
    for &offset_secs in &[0.0, 0.015, 0.030] {
        let start = (offset_secs * sample_rate as f64) as usize;
        for j in 0..burst_len {
            let idx = start + j;
            if idx >= num_samples {
                break;
            }
            let env = (-(j as f64 / burst_len as f64) * 15.0).exp();
            let noise: f64 = rng.gen_range(-1.0..1.0);
            output[idx] += (noise * env * 0.7) as f32;
        }
    }

    let tail_start = (0.04 * sample_rate as f64) as usize;
    for (j, sample) in output.iter_mut().enumerate().skip(tail_start) {
        let t = (j - tail_start) as f64 / sample_rate as f64;
        let noise: f64 = rng.gen_range(-1.0..1.0);
        *sample += (noise * (-t * 18.0).exp() * 0.4) as f32;
    }

    output
}

/// Tambourine (~180ms): bright jingle noise with a shaken double-hit.
pub fn generate_tambourine(sample_rate: u32, seed: u64) -> Vec<f32> {
    let mut jingle = generate_cymbal(sample_rate, seed, 0.18, 11.0, 0.95);
    let echo_at = (0.04 * sample_rate as f64) as usize;
    for i in echo_at..jingle.len() {
        let carried = jingle[i - echo_at] * 0.5;
        jingle[i] += carried;
    }
    for sample in &mut jingle {
        *sample = sample.clamp(-1.0, 1.0);
    }
    jingle
}

/// Metronome click (~30ms): plain sine blip at `pitch_hz`.
pub fn generate_click(sample_rate: u32, pitch_hz: f64) -> Vec<f32> {
    let duration_secs = 0.03;
    let num_samples = (sample_rate as f64 * duration_secs) as usize;
    let mut output = Vec::with_capacity(num_samples);
    let mut phase = 0.0_f64;

    for i in 0..num_samples {
        let norm = i as f64 / num_samples as f64;
        let amp = (-norm * 10.0).exp();
        phase += pitch_hz / sample_rate as f64;
        output.push(((phase * std::f64::consts::TAU).sin() * amp * 0.8) as f32);
    }

    output
}

/// Mix `grace` into `main` starting `offset_secs` before the main stroke's
/// body, scaled down. Used for flams and drags.
fn with_grace_notes(
    sample_rate: u32,
    main: Vec<f32>,
    graces: &[(f64, f32)], // (lead time in seconds, level)
) -> Vec<f32> {
    let lead: f64 = graces
        .iter()
        .map(|(t, _)| *t)
        .fold(0.0, f64::max);
    let lead_samples = (lead * sample_rate as f64) as usize;
    let mut output = vec![0.0f32; lead_samples + main.len()];

    for (lead_secs, level) in graces {
        let start = lead_samples - (*lead_secs * sample_rate as f64) as usize;
        for (j, &s) in main.iter().enumerate() {
            if start + j < output.len() {
                output[start + j] += s * level;
            }
        }
    }
    for (j, &s) in main.iter().enumerate() {
        output[lead_samples + j] += s;
    }
    for sample in &mut output {
        *sample = sample.clamp(-1.0, 1.0);
    }
    output
}

/// Flam: one grace note ~25ms ahead of the main stroke.
pub fn generate_flam(sample_rate: u32, seed: u64) -> Vec<f32> {
    let main = generate_snare(sample_rate, seed);
    with_grace_notes(sample_rate, main, &[(0.025, 0.4)])
}

/// Drag: two grace notes ahead of the main stroke.
pub fn generate_drag(sample_rate: u32, seed: u64) -> Vec<f32> {
    let main = generate_snare(sample_rate, seed);
    with_grace_notes(sample_rate, main, &[(0.055, 0.3), (0.03, 0.3)])
}

/// Build a bank with a deterministic synthetic sound for every voice.
pub fn build_default_bank(sample_rate: u32, seed: u64) -> VoiceBank {
    let mut bank = VoiceBank::new();
    let snare = generate_snare(sample_rate, seed);

    bank.insert(
        DrumVoice::HiHatClosed,
        SampleData::from_mono(generate_hihat_closed(sample_rate, seed), sample_rate),
    );
    bank.insert(
        DrumVoice::HiHatOpen,
        SampleData::from_mono(
            generate_hihat_open(sample_rate, seed.wrapping_add(1)),
            sample_rate,
        ),
    );
    bank.insert(
        DrumVoice::HiHatAccent,
        SampleData::from_mono(
            generate_hihat_closed(sample_rate, seed.wrapping_add(2)),
            sample_rate,
        ),
    );
    bank.insert(
        DrumVoice::HiHatFoot,
        SampleData::from_mono(
            generate_hihat_foot(sample_rate, seed.wrapping_add(3)),
            sample_rate,
        ),
    );
    bank.insert(
        DrumVoice::Ride,
        SampleData::from_mono(generate_ride(sample_rate, seed.wrapping_add(4)), sample_rate),
    );
    bank.insert(
        DrumVoice::RideBell,
        SampleData::from_mono(generate_ride_bell(sample_rate), sample_rate),
    );
    bank.insert(
        DrumVoice::Crash,
        SampleData::from_mono(
            generate_crash(sample_rate, seed.wrapping_add(5)),
            sample_rate,
        ),
    );
    bank.insert(
        DrumVoice::Stacker,
        SampleData::from_mono(
            generate_stacker(sample_rate, seed.wrapping_add(6)),
            sample_rate,
        ),
    );
    bank.insert(
        DrumVoice::CowBell,
        SampleData::from_mono(generate_cowbell(sample_rate), sample_rate),
    );
    bank.insert(
        DrumVoice::Snare,
        SampleData::from_mono(snare.clone(), sample_rate),
    );
    bank.insert(DrumVoice::SnareAccent, SampleData::from_mono(snare, sample_rate));
    bank.insert(
        DrumVoice::SnareGhost,
        SampleData::from_mono(
            generate_snare(sample_rate, seed.wrapping_add(7)),
            sample_rate,
        ),
    );
    bank.insert(
        DrumVoice::CrossStick,
        SampleData::from_mono(generate_cross_stick(sample_rate), sample_rate),
    );
    bank.insert(
        DrumVoice::SnareFlam,
        SampleData::from_mono(generate_flam(sample_rate, seed.wrapping_add(8)), sample_rate),
    );
    bank.insert(
        DrumVoice::SnareDrag,
        SampleData::from_mono(generate_drag(sample_rate, seed.wrapping_add(9)), sample_rate),
    );
    bank.insert(
        DrumVoice::SnareBuzz,
        SampleData::from_mono(generate_buzz(sample_rate, seed.wrapping_add(10)), sample_rate),
    );
    bank.insert(
        DrumVoice::Kick,
        SampleData::from_mono(generate_kick(sample_rate), sample_rate),
    );
    bank.insert(
        DrumVoice::KickAndHiHatFoot,
        SampleData::from_mono(
            {
                // kick and chick layered, kick dominant
                let kick = generate_kick(sample_rate);
                let chick = generate_hihat_foot(sample_rate, seed.wrapping_add(11));
                let mut mixed = kick;
                for (i, &s) in chick.iter().enumerate() {
                    if i < mixed.len() {
                        mixed[i] = (mixed[i] + s * 0.6).clamp(-1.0, 1.0);
                    }
                }
                mixed
            },
            sample_rate,
        ),
    );
    bank.insert(
        DrumVoice::Tom1,
        SampleData::from_mono(generate_tom(sample_rate, 220.0), sample_rate),
    );
    bank.insert(
        DrumVoice::Tom2,
        SampleData::from_mono(generate_tom(sample_rate, 165.0), sample_rate),
    );
    bank.insert(
        DrumVoice::Tom3,
        SampleData::from_mono(generate_tom(sample_rate, 120.0), sample_rate),
    );
    bank.insert(
        DrumVoice::FloorTom,
        SampleData::from_mono(generate_tom(sample_rate, 90.0), sample_rate),
    );
    bank.insert(
        DrumVoice::Clap,
        SampleData::from_mono(generate_clap(sample_rate, seed.wrapping_add(12)), sample_rate),
    );
    bank.insert(
        DrumVoice::Tambourine,
        SampleData::from_mono(
            generate_tambourine(sample_rate, seed.wrapping_add(13)),
            sample_rate,
        ),
    );
    bank.insert(
        DrumVoice::MetronomeClick,
        SampleData::from_mono(generate_click(sample_rate, 1000.0), sample_rate),
    );
    bank.insert(
        DrumVoice::MetronomeAccent,
        SampleData::from_mono(generate_click(sample_rate, 1500.0), sample_rate),
    );

    bank
}
