//! Raw MIDI message parsing.
//!
//! Consumes 3-byte `[status, data1, data2]` messages and classifies them by
//! the status high nibble. Anything else — unknown status classes, short or
//! empty messages — is not an error, just an unhandled message: real-time
//! input is noisy and the pipeline silently skips what it does not speak.

/// A logical MIDI event the pipeline understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiMessage {
    NoteOn { note: u8, velocity: u8 },
    NoteOff { note: u8 },
    ControlChange { controller: u8, value: u8 },
}

/// Parse one raw message. Returns `None` for anything unhandled.
///
/// A note-on with velocity 0 is the wire idiom for note-off and is
/// reinterpreted as such.
pub fn parse_message(msg: &[u8]) -> Option<MidiMessage> {
    if msg.len() < 3 {
        return None;
    }
    match msg[0] & 0xF0 {
        0x90 => {
            let (note, velocity) = (msg[1], msg[2]);
            if velocity == 0 {
                Some(MidiMessage::NoteOff { note })
            } else {
                Some(MidiMessage::NoteOn { note, velocity })
            }
        }
        0x80 => Some(MidiMessage::NoteOff { note: msg[1] }),
        0xB0 => Some(MidiMessage::ControlChange {
            controller: msg[1],
            value: msg[2],
        }),
        _ => None,
    }
}
