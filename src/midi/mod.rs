//! External MIDI input — message parsing, kit mapping, and hit routing.

pub mod input;
pub mod kit;
pub mod message;
pub mod pipeline;

pub use input::MidiInput;
pub use kit::Kit;
pub use message::{parse_message, MidiMessage};
pub use pipeline::{MidiPipeline, VoiceHit};
