//! Pure timing math — note counts, swing offsets, count labels, resizing.
//!
//! Everything here is stateless and deterministic. The scheduler only ever
//! works with integer note counts: division/time-signature pairings that
//! would produce a fractional count are flagged incompatible and must be
//! filtered out before a measure is built.

use super::{Division, NoteValue, TimeSignature};

/// Notes in one measure: `(division / note_value) * beats`.
///
/// Returns `None` for incompatible pairings (see [`is_compatible`]).
pub fn notes_per_measure(division: Division, ts: TimeSignature) -> Option<u32> {
    if !is_compatible(division, ts) {
        return None;
    }
    Some(notes_per_beat(division, ts.note_value) * ts.beats as u32)
}

/// Whether a division can be paired with a time signature.
///
/// Triplet divisions only work against a quarter-note pulse; straight
/// divisions must subdivide the denominator note evenly.
pub fn is_compatible(division: Division, ts: TimeSignature) -> bool {
    if division.is_triplet() {
        ts.note_value == NoteValue::Quarter
    } else {
        division.value() % ts.note_value.value() == 0
    }
}

/// Subdivisions of one denominator beat. Callers must have checked
/// compatibility; an incompatible pairing truncates.
pub fn notes_per_beat(division: Division, note_value: NoteValue) -> u32 {
    division.value() as u32 / note_value.value() as u32
}

/// Whether swing applies to a division. Triplet feels and bare quarter
/// notes have nothing to swing.
pub fn swing_supported(division: Division) -> bool {
    !division.is_triplet() && division != Division::Quarters
}

/// Duration of one denominator beat in seconds. Tempo counts quarter notes.
pub fn beat_duration_secs(tempo: u16, note_value: NoteValue) -> f64 {
    (60.0 / tempo as f64) * (4.0 / note_value.value() as f64)
}

/// Duration of one grid step in seconds.
pub fn step_duration_secs(tempo: u16, division: Division, note_value: NoteValue) -> f64 {
    beat_duration_secs(tempo, note_value) / notes_per_beat(division, note_value) as f64
}

/// Duration of one measure in seconds.
pub fn measure_duration_secs(tempo: u16, ts: TimeSignature) -> f64 {
    beat_duration_secs(tempo, ts.note_value) * ts.beats as f64
}

/// Swing delay for a position within a beat.
///
/// Upbeats (odd positions) are pushed later by `swing% * step/2`; downbeats
/// never move. At swing 100 a pair of eighths lands as a triplet feel.
pub fn swing_delay_secs(pos_in_beat: u32, step: f64, swing: u8) -> f64 {
    if pos_in_beat % 2 == 1 {
        (swing as f64 / 100.0) * (step / 2.0)
    } else {
        0.0
    }
}

/// Scheduled offset of note `index` from the start of its measure.
pub fn note_offset_secs(
    index: u32,
    division: Division,
    ts: TimeSignature,
    tempo: u16,
    swing: u8,
) -> f64 {
    let npb = notes_per_beat(division, ts.note_value);
    if npb == 0 {
        return 0.0; // incompatible pairing, filtered out upstream
    }
    let beat_dur = beat_duration_secs(tempo, ts.note_value);
    let step = beat_dur / npb as f64;

    let beat_idx = index / npb;
    let pos = index % npb;
    let swing = if swing_supported(division) { swing } else { 0 };

    beat_idx as f64 * beat_dur + pos as f64 * step + swing_delay_secs(pos, step, swing)
}

/// Rescale a hit row to a new length by linear position scaling.
///
/// `round(i * new/old)`, collisions dropped silently (last write wins),
/// positions nothing maps onto stay false. Lossy when scaling down.
pub fn resize_notes(old: &[bool], new_len: usize) -> Vec<bool> {
    let mut out = vec![false; new_len];
    if old.is_empty() || new_len == 0 {
        return out;
    }
    for (i, &hit) in old.iter().enumerate() {
        if !hit {
            continue;
        }
        let scaled = (i as f64 * new_len as f64 / old.len() as f64).round() as usize;
        out[scaled.min(new_len - 1)] = true;
    }
    out
}

const BEAT_NAMES: [&str; 16] = [
    "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12", "13", "14", "15", "16",
];

/// Count label for note `index` within a measure ("1", "E", "AND", "A",
/// "TI", "TA"). Unnamed in-between positions (32nd-note grids) are "".
pub fn count_label(index: u32, division: Division, note_value: NoteValue) -> &'static str {
    let npb = notes_per_beat(division, note_value);
    if npb == 0 {
        return "";
    }
    let beat_idx = (index / npb) as usize;
    let pos = index % npb;

    if pos == 0 {
        return BEAT_NAMES.get(beat_idx).copied().unwrap_or("");
    }
    match npb {
        2 => "AND",
        3 => ["TI", "TA"][(pos - 1) as usize],
        4 => ["E", "AND", "A"][(pos - 1) as usize],
        6 => ["TI", "TA", "AND", "TI", "TA"][(pos - 1) as usize],
        8 => ["", "E", "", "AND", "", "A", ""][(pos - 1) as usize],
        12 => ["", "TI", "", "TA", "", "AND", "", "TI", "", "TA", ""][(pos - 1) as usize],
        _ => "",
    }
}
