//! Playback engine — the host-facing handle around the scheduler core.
//!
//! [`DrumEngine`] owns a [`GrooveScheduler`] behind a mutex, a driver thread
//! that pumps it every few milliseconds, and the listener set for engine
//! notifications. Listener callbacks always run after the core lock is
//! released, so a listener may call back into the engine.
//!
//! Engines are plain values constructed by the host — build as many as you
//! need (one per grid, one per test); nothing here is process-global.

pub mod metronome;
pub mod scheduler;

pub use metronome::{ClickRate, MetronomeConfig, OffsetClick};
pub use scheduler::{EngineEvent, GrooveScheduler, PlayState, SyncMode};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::groove::{DrumVoice, GrooveData, GrooveError};
use crate::notify::{ListenerId, Listeners};
use crate::synth::{AudioError, CpalOutput, VoiceOutput};

/// Pump cadence of the driver thread. The scheduler gates its own pass and
/// poll cadences internally; the pump only needs to be finer than both.
const DRIVER_TICK: Duration = Duration::from_millis(5);

/// A drum-groove playback engine bound to one audio output.
pub struct DrumEngine {
    core: Arc<Mutex<GrooveScheduler>>,
    listeners: Arc<Listeners<EngineEvent>>,
    shutdown: Arc<AtomicBool>,
    driver: Option<JoinHandle<()>>,
}

impl DrumEngine {
    /// Create an engine on the default audio device with the default
    /// synthetic voice bank.
    pub fn new() -> Result<Self, AudioError> {
        Ok(Self::with_output(Arc::new(CpalOutput::new()?)))
    }

    /// Create an engine over any output backend (a different device, an
    /// [`OfflineOutput`](crate::synth::OfflineOutput), ...).
    pub fn with_output(output: Arc<dyn VoiceOutput>) -> Self {
        let core = Arc::new(Mutex::new(GrooveScheduler::new(output)));
        let listeners: Arc<Listeners<EngineEvent>> = Arc::new(Listeners::new());
        let shutdown = Arc::new(AtomicBool::new(false));

        let driver_core = Arc::clone(&core);
        let driver_listeners = Arc::clone(&listeners);
        let driver_shutdown = Arc::clone(&shutdown);
        let driver = thread::Builder::new()
            .name("backbeat-driver".into())
            .spawn(move || {
                let mut events = Vec::new();
                while !driver_shutdown.load(Ordering::Acquire) {
                    {
                        let mut core = driver_core.lock().expect("engine core poisoned");
                        core.tick(&mut events);
                    }
                    for event in events.drain(..) {
                        driver_listeners.emit(&event);
                    }
                    thread::sleep(DRIVER_TICK);
                }
            })
            .expect("failed to spawn engine driver thread");

        Self {
            core,
            listeners,
            shutdown,
            driver: Some(driver),
        }
    }

    /// Run `f` on the core, then deliver whatever events it produced with
    /// the lock released.
    fn with_core<R>(&self, f: impl FnOnce(&mut GrooveScheduler, &mut Vec<EngineEvent>) -> R) -> R {
        let mut events = Vec::new();
        let result = {
            let mut core = self.core.lock().expect("engine core poisoned");
            f(&mut core, &mut events)
        };
        for event in &events {
            self.listeners.emit(event);
        }
        result
    }

    /// Start playing. Returns `false` when the audio output is unavailable
    /// or the groove invalid; the engine stays stopped.
    pub fn play(&self, groove: GrooveData, looping: bool) -> bool {
        self.with_core(|core, events| core.play(groove, looping, events))
    }

    /// Stop playback and cancel all unfired hits.
    pub fn stop(&self) {
        self.with_core(|core, events| core.stop(events));
    }

    /// Hot-swap the groove; staged until the loop boundary while playing.
    pub fn update_groove(&self, groove: GrooveData) -> Result<(), GrooveError> {
        self.with_core(|core, events| core.update_groove(groove, events))
    }

    /// One-shot preview of a single voice, right now.
    pub fn play_preview(&self, voice: DrumVoice) {
        self.with_core(|core, _| core.play_preview(voice));
    }

    /// Shut down for good: halts the driver, cancels pending audio, and
    /// leaves the engine permanently unusable. Idempotent.
    pub fn dispose(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(driver) = self.driver.take() {
            let _ = driver.join();
        }
        self.with_core(|core, events| core.dispose(events));
    }

    pub fn state(&self) -> PlayState {
        self.core.lock().expect("engine core poisoned").state()
    }

    pub fn position(&self) -> Option<usize> {
        self.core.lock().expect("engine core poisoned").position()
    }

    pub fn set_sync_mode(&self, mode: SyncMode) {
        self.with_core(|core, _| core.set_sync_mode(mode));
    }

    pub fn sync_mode(&self) -> SyncMode {
        self.core.lock().expect("engine core poisoned").sync_mode()
    }

    pub fn metronome_config(&self) -> MetronomeConfig {
        self.core
            .lock()
            .expect("engine core poisoned")
            .metronome_config()
    }

    pub fn set_metronome_config(&self, config: MetronomeConfig) {
        self.with_core(|core, _| core.set_metronome_config(config));
    }

    pub fn set_click_rate(&self, rate: ClickRate) {
        self.with_core(|core, _| core.set_click_rate(rate));
    }

    pub fn set_metronome_solo(&self, solo: bool) {
        self.with_core(|core, _| core.set_metronome_solo(solo));
    }

    pub fn set_count_in(&self, count_in: bool) {
        self.with_core(|core, _| core.set_count_in(count_in));
    }

    pub fn set_offset_click(&self, offset: OffsetClick) {
        self.with_core(|core, _| core.set_offset_click(offset));
    }

    pub fn set_metronome_volume(&self, volume: u8) {
        self.with_core(|core, _| core.set_metronome_volume(volume));
    }

    /// Register a listener for engine notifications.
    pub fn subscribe(&self, listener: impl Fn(&EngineEvent) + Send + 'static) -> ListenerId {
        self.listeners.subscribe(listener)
    }

    /// Remove a previously registered listener.
    pub fn unsubscribe(&self, id: ListenerId) {
        self.listeners.unsubscribe(id);
    }
}

impl Drop for DrumEngine {
    fn drop(&mut self) {
        self.dispose();
    }
}
