//! Real-time audio output — cpal stream, ring-buffer command queue, frame clock.
//!
//! The stream lives on a dedicated keeper thread because cpal streams are
//! not `Send`; the handle only holds thread-safe parts (ring-buffer
//! producer, shared atomics, a control channel). The frame counter advanced
//! by the audio callback doubles as the scheduling clock, so hit timestamps
//! and playback share one clock and cannot drift apart.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use ringbuf::{
    traits::{Producer, Split},
    HeapRb,
};

use super::mixer::{HitCommand, Mixer};
use super::voices::build_default_bank;
use super::{ScheduledHit, VoiceBank, VoiceOutput};

/// Capacity of the hit command queue.
const QUEUE_CAPACITY: usize = 1024;

/// Seed for the default synthetic bank.
const DEFAULT_BANK_SEED: u64 = 42;

/// Audio output errors.
#[derive(Debug)]
pub enum AudioError {
    /// No audio output device found.
    NoOutputDevice,
    /// Failed to query the device configuration.
    DeviceConfig(String),
    /// Failed to build the audio stream.
    StreamBuild(String),
    /// Failed to start the audio stream.
    StreamPlay(String),
    /// The audio keeper thread is gone.
    Closed,
}

impl std::fmt::Display for AudioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioError::NoOutputDevice => write!(f, "no audio output device found"),
            AudioError::DeviceConfig(e) => write!(f, "device config error: {e}"),
            AudioError::StreamBuild(e) => write!(f, "stream build error: {e}"),
            AudioError::StreamPlay(e) => write!(f, "stream play error: {e}"),
            AudioError::Closed => write!(f, "audio output thread has shut down"),
        }
    }
}

impl std::error::Error for AudioError {}

enum StreamControl {
    Resume(mpsc::Sender<bool>),
    Shutdown,
}

/// Audio output backed by the default cpal device.
pub struct CpalOutput {
    control: mpsc::Sender<StreamControl>,
    producer: Mutex<ringbuf::HeapProd<HitCommand>>,
    frames: Arc<AtomicU64>,
    epoch: Arc<AtomicU64>,
    sample_rate: u32,
    channels: u16,
}

impl CpalOutput {
    /// Open the default output device with the default synthetic bank.
    pub fn new() -> Result<Self, AudioError> {
        Self::with_bank(|sample_rate| build_default_bank(sample_rate, DEFAULT_BANK_SEED))
    }

    /// Open the default output device with a caller-supplied bank. The
    /// builder receives the device sample rate.
    pub fn with_bank(
        build: impl FnOnce(u32) -> VoiceBank + Send + 'static,
    ) -> Result<Self, AudioError> {
        let frames = Arc::new(AtomicU64::new(0));
        let epoch = Arc::new(AtomicU64::new(0));
        let (control_tx, control_rx) = mpsc::channel::<StreamControl>();
        let (init_tx, init_rx) = mpsc::channel();

        let thread_frames = Arc::clone(&frames);
        let thread_epoch = Arc::clone(&epoch);

        thread::Builder::new()
            .name("backbeat-audio".into())
            .spawn(move || {
                let init = build_stream(build, thread_frames, thread_epoch);
                let stream = match init {
                    Ok((stream, sample_rate, channels, producer)) => {
                        let _ = init_tx.send(Ok((sample_rate, channels, producer)));
                        stream
                    }
                    Err(e) => {
                        let _ = init_tx.send(Err(e));
                        return;
                    }
                };

                // Keep the stream alive until shutdown; service resume requests.
                loop {
                    match control_rx.recv() {
                        Ok(StreamControl::Resume(reply)) => {
                            let _ = reply.send(stream.play().is_ok());
                        }
                        Ok(StreamControl::Shutdown) | Err(_) => break,
                    }
                }
            })
            .map_err(|e| AudioError::StreamBuild(e.to_string()))?;

        let (sample_rate, channels, producer) = init_rx
            .recv()
            .map_err(|_| AudioError::Closed)??;

        Ok(Self {
            control: control_tx,
            producer: Mutex::new(producer),
            frames,
            epoch,
            sample_rate,
            channels,
        })
    }

    /// Sample rate of the open stream.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Channel count of the open stream.
    pub fn channels(&self) -> u16 {
        self.channels
    }
}

type StreamInit = (
    cpal::Stream,
    u32,
    u16,
    ringbuf::HeapProd<HitCommand>,
);

fn build_stream(
    build_bank: impl FnOnce(u32) -> VoiceBank,
    frames: Arc<AtomicU64>,
    epoch: Arc<AtomicU64>,
) -> Result<StreamInit, AudioError> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or(AudioError::NoOutputDevice)?;
    let config = device
        .default_output_config()
        .map_err(|e| AudioError::DeviceConfig(e.to_string()))?;

    let sample_rate = config.sample_rate().0;
    let channels = config.channels();

    let rb = HeapRb::<HitCommand>::new(QUEUE_CAPACITY);
    let (producer, consumer) = rb.split();
    let mut mixer = Mixer::new(consumer, build_bank(sample_rate), frames, epoch, channels);

    let stream_config = cpal::StreamConfig {
        channels,
        sample_rate: cpal::SampleRate(sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let err_fn = |err: cpal::StreamError| {
        eprintln!("audio stream error: {err}");
    };

    let stream = device
        .build_output_stream(
            &stream_config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                mixer.process(data);
            },
            err_fn,
            None,
        )
        .map_err(|e| AudioError::StreamBuild(e.to_string()))?;

    stream
        .play()
        .map_err(|e| AudioError::StreamPlay(e.to_string()))?;

    Ok((stream, sample_rate, channels, producer))
}

impl VoiceOutput for CpalOutput {
    fn now(&self) -> f64 {
        self.frames.load(Ordering::Acquire) as f64 / self.sample_rate as f64
    }

    fn resume(&self) -> bool {
        let (reply_tx, reply_rx) = mpsc::channel();
        if self.control.send(StreamControl::Resume(reply_tx)).is_err() {
            return false;
        }
        reply_rx.recv().unwrap_or(false)
    }

    fn schedule(&self, hit: ScheduledHit) {
        let start_frame = if hit.time <= 0.0 {
            0 // as soon as possible
        } else {
            (hit.time * self.sample_rate as f64) as u64
        };
        let command = HitCommand {
            voice: hit.voice,
            start_frame,
            velocity: hit.velocity.clamp(0.0, 1.0),
            epoch: self.epoch.load(Ordering::Acquire),
        };
        let mut producer = self.producer.lock().expect("hit queue poisoned");
        if producer.try_push(command).is_err() {
            // Queue full: the audio thread is not draining. Dropping one hit
            // is better than blocking the scheduler.
            eprintln!("audio hit queue full, dropping {:?}", hit.voice);
        }
    }

    fn cancel_pending(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
    }
}

impl Drop for CpalOutput {
    fn drop(&mut self) {
        let _ = self.control.send(StreamControl::Shutdown);
    }
}
