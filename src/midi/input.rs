//! MIDI device glue — connects a midir port to a [`MidiPipeline`].
//!
//! Device discovery policy is the host's business; this is the minimal
//! bridge that feeds raw bytes and millisecond timestamps into the
//! pipeline.

use std::io;
use std::sync::{Arc, Mutex};

use midir::{MidiInput as MidirInput, MidiInputConnection};

use super::pipeline::MidiPipeline;

/// An open MIDI input connection feeding a pipeline.
pub struct MidiInput {
    _connection: MidiInputConnection<()>,
    port_name: String,
}

impl MidiInput {
    /// Listen on a MIDI port, matching `device_name` as a substring (first
    /// available port when `None`). Each incoming message is handed to the
    /// pipeline with its timestamp converted to milliseconds.
    pub fn start(
        device_name: Option<&str>,
        pipeline: Arc<Mutex<MidiPipeline>>,
    ) -> io::Result<Self> {
        let midi_in =
            MidirInput::new("backbeat").map_err(|e| io::Error::other(format!("MIDI init: {e}")))?;

        let ports = midi_in.ports();
        if ports.is_empty() {
            return Err(io::Error::other("no MIDI input ports available"));
        }

        let (port, port_name) = if let Some(filter) = device_name {
            ports
                .iter()
                .find_map(|p| {
                    let name = midi_in.port_name(p).unwrap_or_default();
                    name.contains(filter).then(|| (p.clone(), name))
                })
                .ok_or_else(|| {
                    io::Error::other(format!("MIDI device matching '{filter}' not found"))
                })?
        } else {
            let p = ports[0].clone();
            let name = midi_in
                .port_name(&p)
                .unwrap_or_else(|_| "unknown".to_string());
            (p, name)
        };

        let connection = midi_in
            .connect(
                &port,
                "backbeat-input",
                move |timestamp_us, msg, _| {
                    if let Ok(mut pipeline) = pipeline.lock() {
                        pipeline.handle_message(msg, timestamp_us as f64 / 1000.0);
                    }
                },
                (),
            )
            .map_err(|e| io::Error::other(format!("MIDI connect: {e}")))?;

        Ok(Self {
            _connection: connection,
            port_name,
        })
    }

    /// The connected port's name.
    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Names of all available MIDI input ports.
    pub fn list_devices() -> Vec<String> {
        let Ok(midi_in) = MidirInput::new("backbeat-list") else {
            return Vec::new();
        };
        midi_in
            .ports()
            .iter()
            .filter_map(|p| midi_in.port_name(p).ok())
            .collect()
    }
}
