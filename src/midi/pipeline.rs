//! The MIDI input pipeline — raw messages in, voice-hit broadcasts out.
//!
//! On a mapped note-on the pipeline emits a [`VoiceHit`] to every subscriber
//! (visual feedback, performance tracking, ...) and, when "through" playback
//! is on, triggers the synthesizer immediately — external input is
//! real-time and bypasses the pattern scheduler's look-ahead window.

use std::sync::Arc;

use crate::groove::DrumVoice;
use crate::notify::{ListenerId, Listeners};
use crate::synth::{ScheduledHit, VoiceOutput};

use super::kit::Kit;
use super::message::{parse_message, MidiMessage};

/// CC number of the hi-hat foot controller on common e-kits.
const CC_HIHAT_PEDAL: u8 = 4;

/// A performed hit in logical voice space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceHit {
    pub voice: DrumVoice,
    /// Normalized velocity, 0.0–1.0.
    pub velocity: f32,
    /// Wall-clock timestamp of the input event, in milliseconds.
    pub timestamp_ms: f64,
}

/// Parses raw input and routes mapped hits to subscribers and optionally to
/// an output.
pub struct MidiPipeline {
    kit: Kit,
    through: bool,
    output: Option<Arc<dyn VoiceOutput>>,
    listeners: Arc<Listeners<VoiceHit>>,
    /// Tracked from CC4: with the pedal down, open-hi-hat pads play closed.
    pedal_closed: bool,
}

impl MidiPipeline {
    /// A pipeline with no synthesizer attached ("through" has no effect).
    pub fn new(kit: Kit) -> Self {
        Self {
            kit,
            through: false,
            output: None,
            listeners: Arc::new(Listeners::new()),
            pedal_closed: false,
        }
    }

    /// A pipeline that can forward hits to `output` when "through" is on.
    pub fn with_output(kit: Kit, output: Arc<dyn VoiceOutput>) -> Self {
        let mut pipeline = Self::new(kit);
        pipeline.output = Some(output);
        pipeline
    }

    /// Swap the kit. Atomic: messages handled after this call use the new
    /// table, messages already handled used the old one.
    pub fn set_kit(&mut self, kit: Kit) {
        self.kit = kit;
    }

    pub fn kit(&self) -> &Kit {
        &self.kit
    }

    /// Enable or disable direct forwarding to the synthesizer.
    pub fn set_through(&mut self, through: bool) {
        self.through = through;
    }

    pub fn through(&self) -> bool {
        self.through
    }

    /// Register a voice-hit listener.
    pub fn subscribe(&self, listener: impl Fn(&VoiceHit) + Send + 'static) -> ListenerId {
        self.listeners.subscribe(listener)
    }

    /// Remove a voice-hit listener.
    pub fn unsubscribe(&self, id: ListenerId) {
        self.listeners.unsubscribe(id);
    }

    /// Process one raw message. Returns the emitted hit, if the message was
    /// a mapped note-on. Everything else (note-offs, unmapped notes,
    /// unknown messages) produces no downstream event and never fails.
    pub fn handle_message(&mut self, raw: &[u8], timestamp_ms: f64) -> Option<VoiceHit> {
        match parse_message(raw)? {
            MidiMessage::NoteOn { note, velocity } => {
                let mut voice = self.kit.voice_for(note)?;
                if voice == DrumVoice::HiHatOpen && self.pedal_closed {
                    voice = DrumVoice::HiHatClosed;
                }
                let hit = VoiceHit {
                    voice,
                    velocity: velocity as f32 / 127.0,
                    timestamp_ms,
                };
                self.listeners.emit(&hit);
                if self.through {
                    if let Some(output) = &self.output {
                        output.schedule(ScheduledHit::immediate(hit.voice, hit.velocity));
                    }
                }
                Some(hit)
            }
            MidiMessage::NoteOff { .. } => None, // drum hits don't sustain
            MidiMessage::ControlChange { controller, value } => {
                if controller == CC_HIHAT_PEDAL {
                    self.pedal_closed = value >= 64;
                }
                None
            }
        }
    }
}
