//! Groove data model — the declarative description of a drum pattern.
//!
//! A [`GrooveData`] is a plain value: the engine never mutates one in place,
//! it only reads the current value and swaps in replacements handed over by
//! the editing layer. Validation lives here so an invalid groove is rejected
//! before it can reach the scheduler.

pub mod timing;
pub mod voice;

pub use voice::{DrumVoice, Limb};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Lowest accepted tempo in BPM.
pub const TEMPO_MIN: u16 = 30;
/// Highest accepted tempo in BPM.
pub const TEMPO_MAX: u16 = 300;
/// Maximum number of measures in a groove.
pub const MAX_MEASURES: usize = 16;

/// The note that gets the beat. Fixed enum — nothing else is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteValue {
    Quarter,
    Eighth,
    Sixteenth,
}

impl NoteValue {
    /// Numeric denominator (4, 8, or 16).
    pub fn value(self) -> u8 {
        match self {
            NoteValue::Quarter => 4,
            NoteValue::Eighth => 8,
            NoteValue::Sixteenth => 16,
        }
    }

    /// Parse a numeric denominator.
    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            4 => Some(NoteValue::Quarter),
            8 => Some(NoteValue::Eighth),
            16 => Some(NoteValue::Sixteenth),
            _ => None,
        }
    }
}

/// Subdivisions per 4/4-measure reference. The triplet divisions (12, 24,
/// 48) are mutually exclusive with swing and with non-quarter note values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Division {
    Quarters,
    Eighths,
    EighthTriplets,
    Sixteenths,
    SixteenthTriplets,
    ThirtySeconds,
    ThirtySecondTriplets,
}

impl Division {
    /// Every division, coarsest first.
    pub const ALL: [Division; 7] = [
        Division::Quarters,
        Division::Eighths,
        Division::EighthTriplets,
        Division::Sixteenths,
        Division::SixteenthTriplets,
        Division::ThirtySeconds,
        Division::ThirtySecondTriplets,
    ];

    /// Numeric subdivision count (4, 8, 12, 16, 24, 32, or 48).
    pub fn value(self) -> u8 {
        match self {
            Division::Quarters => 4,
            Division::Eighths => 8,
            Division::EighthTriplets => 12,
            Division::Sixteenths => 16,
            Division::SixteenthTriplets => 24,
            Division::ThirtySeconds => 32,
            Division::ThirtySecondTriplets => 48,
        }
    }

    /// Parse a numeric subdivision count.
    pub fn from_value(value: u8) -> Option<Self> {
        Division::ALL.into_iter().find(|d| d.value() == value)
    }

    /// Whether this is a triplet-based division.
    pub fn is_triplet(self) -> bool {
        matches!(
            self,
            Division::EighthTriplets
                | Division::SixteenthTriplets
                | Division::ThirtySecondTriplets
        )
    }
}

/// A time signature: beats per measure over a fixed-enum note value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    pub beats: u8,
    pub note_value: NoteValue,
}

impl TimeSignature {
    /// Common time, 4/4.
    pub const COMMON: TimeSignature = TimeSignature {
        beats: 4,
        note_value: NoteValue::Quarter,
    };

    pub fn new(beats: u8, note_value: NoteValue) -> Self {
        Self { beats, note_value }
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::COMMON
    }
}

/// One measure: an optional time-signature override plus per-voice hit rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasureConfig {
    #[serde(default)]
    pub time_signature: Option<TimeSignature>,
    #[serde(default)]
    pub notes: BTreeMap<DrumVoice, Vec<bool>>,
}

impl MeasureConfig {
    /// A measure with no hit rows and no override.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The time signature this measure actually plays in.
    pub fn effective_time_signature(&self, default: TimeSignature) -> TimeSignature {
        self.time_signature.unwrap_or(default)
    }

    /// Set the hit row for a voice, replacing any previous row.
    pub fn set_row(&mut self, voice: DrumVoice, row: Vec<bool>) {
        self.notes.insert(voice, row);
    }

    /// The hit row for a voice, if present.
    pub fn row(&self, voice: DrumVoice) -> Option<&[bool]> {
        self.notes.get(&voice).map(Vec::as_slice)
    }
}

/// Validation failures for groove data. All are rejected synchronously and
/// leave the previous state untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrooveError {
    TempoOutOfRange(u16),
    SwingOutOfRange(u8),
    BeatsOutOfRange(u8),
    IncompatibleDivision {
        division: Division,
        time_signature: TimeSignature,
    },
    SwingNotSupported(Division),
    RowLength {
        measure: usize,
        voice: DrumVoice,
        expected: usize,
        got: usize,
    },
    NoMeasures,
    TooManyMeasures(usize),
    CannotRemoveLastMeasure,
    MeasureIndexOutOfBounds(usize),
}

impl std::fmt::Display for GrooveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GrooveError::TempoOutOfRange(t) => {
                write!(f, "tempo {t} outside {TEMPO_MIN}..={TEMPO_MAX} BPM")
            }
            GrooveError::SwingOutOfRange(s) => write!(f, "swing {s} outside 0..=100"),
            GrooveError::BeatsOutOfRange(b) => write!(f, "beats {b} outside 1..=16"),
            GrooveError::IncompatibleDivision {
                division,
                time_signature,
            } => write!(
                f,
                "division {} incompatible with {}/{}",
                division.value(),
                time_signature.beats,
                time_signature.note_value.value()
            ),
            GrooveError::SwingNotSupported(d) => {
                write!(f, "swing not supported for division {}", d.value())
            }
            GrooveError::RowLength {
                measure,
                voice,
                expected,
                got,
            } => write!(
                f,
                "measure {measure}: {} row has {got} notes, expected {expected}",
                voice.label()
            ),
            GrooveError::NoMeasures => write!(f, "groove has no measures"),
            GrooveError::TooManyMeasures(n) => {
                write!(f, "groove has {n} measures, maximum is {MAX_MEASURES}")
            }
            GrooveError::CannotRemoveLastMeasure => {
                write!(f, "cannot remove the last remaining measure")
            }
            GrooveError::MeasureIndexOutOfBounds(i) => {
                write!(f, "measure index {i} out of bounds")
            }
        }
    }
}

impl std::error::Error for GrooveError {}

/// A complete groove: meter, grid resolution, tempo, swing, and measures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrooveData {
    pub time_signature: TimeSignature,
    pub division: Division,
    pub tempo: u16,
    pub swing: u8,
    pub measures: Vec<MeasureConfig>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub comments: Option<String>,
}

impl GrooveData {
    /// A groove with one empty measure.
    pub fn new(time_signature: TimeSignature, division: Division, tempo: u16) -> Self {
        Self {
            time_signature,
            division,
            tempo,
            swing: 0,
            measures: vec![MeasureConfig::empty()],
            title: None,
            author: None,
            comments: None,
        }
    }

    /// Notes in measure `index`, honoring its override.
    pub fn notes_in_measure(&self, index: usize) -> Option<u32> {
        let measure = self.measures.get(index)?;
        timing::notes_per_measure(
            self.division,
            measure.effective_time_signature(self.time_signature),
        )
    }

    /// Total notes across all measures.
    pub fn total_notes(&self) -> u32 {
        (0..self.measures.len())
            .filter_map(|i| self.notes_in_measure(i))
            .sum()
    }

    /// Check every invariant. An `Ok` groove is safe to schedule.
    pub fn validate(&self) -> Result<(), GrooveError> {
        if !(TEMPO_MIN..=TEMPO_MAX).contains(&self.tempo) {
            return Err(GrooveError::TempoOutOfRange(self.tempo));
        }
        if self.swing > 100 {
            return Err(GrooveError::SwingOutOfRange(self.swing));
        }
        if self.swing > 0 && !timing::swing_supported(self.division) {
            return Err(GrooveError::SwingNotSupported(self.division));
        }
        if self.measures.is_empty() {
            return Err(GrooveError::NoMeasures);
        }
        if self.measures.len() > MAX_MEASURES {
            return Err(GrooveError::TooManyMeasures(self.measures.len()));
        }

        for (idx, measure) in self.measures.iter().enumerate() {
            let ts = measure.effective_time_signature(self.time_signature);
            if !(1..=16).contains(&ts.beats) {
                return Err(GrooveError::BeatsOutOfRange(ts.beats));
            }
            let expected = timing::notes_per_measure(self.division, ts).ok_or(
                GrooveError::IncompatibleDivision {
                    division: self.division,
                    time_signature: ts,
                },
            )? as usize;
            for (voice, row) in &measure.notes {
                if row.len() != expected {
                    return Err(GrooveError::RowLength {
                        measure: idx,
                        voice: *voice,
                        expected,
                        got: row.len(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Append an empty measure. No-op error at the measure cap.
    pub fn add_measure(&mut self) -> Result<(), GrooveError> {
        if self.measures.len() >= MAX_MEASURES {
            return Err(GrooveError::TooManyMeasures(self.measures.len()));
        }
        self.measures.push(MeasureConfig::empty());
        Ok(())
    }

    /// Remove measure `index`. Removing the last remaining measure is a
    /// no-op error; the groove is left unchanged.
    pub fn remove_measure(&mut self, index: usize) -> Result<(), GrooveError> {
        if self.measures.len() <= 1 {
            return Err(GrooveError::CannotRemoveLastMeasure);
        }
        if index >= self.measures.len() {
            return Err(GrooveError::MeasureIndexOutOfBounds(index));
        }
        self.measures.remove(index);
        Ok(())
    }

    /// Re-grid every measure onto a new division, rescaling hit rows by
    /// linear position scaling. Lossy when the grid gets coarser.
    pub fn with_division(&self, division: Division) -> Result<GrooveData, GrooveError> {
        let mut out = self.clone();
        out.division = division;
        if out.swing > 0 && !timing::swing_supported(division) {
            out.swing = 0;
        }
        for measure in &mut out.measures {
            let ts = measure.effective_time_signature(out.time_signature);
            let new_len = timing::notes_per_measure(division, ts).ok_or(
                GrooveError::IncompatibleDivision {
                    division,
                    time_signature: ts,
                },
            )? as usize;
            for row in measure.notes.values_mut() {
                *row = timing::resize_notes(row, new_len);
            }
        }
        Ok(out)
    }

    /// Change the default time signature, rescaling rows of measures that
    /// do not carry their own override.
    pub fn with_time_signature(
        &self,
        time_signature: TimeSignature,
    ) -> Result<GrooveData, GrooveError> {
        let new_len = timing::notes_per_measure(self.division, time_signature).ok_or(
            GrooveError::IncompatibleDivision {
                division: self.division,
                time_signature,
            },
        )? as usize;

        let mut out = self.clone();
        out.time_signature = time_signature;
        for measure in &mut out.measures {
            if measure.time_signature.is_some() {
                continue;
            }
            for row in measure.notes.values_mut() {
                *row = timing::resize_notes(row, new_len);
            }
        }
        Ok(out)
    }
}
