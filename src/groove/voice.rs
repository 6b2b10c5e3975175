//! Drum voices — the closed set of sounds a groove can trigger.
//!
//! Each voice carries fixed metadata: a display label, a default velocity
//! used when a pattern hit has no explicit dynamics, and a limb grouping
//! (hands play downward-stemmed voices, feet upward, in standard drum
//! notation).

use serde::{Deserialize, Serialize};

/// Which limb plays a voice. Determines stem direction in notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Limb {
    Hands,
    Feet,
}

/// A drum voice. Defined at process start and never extended at runtime.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum DrumVoice {
    HiHatClosed,
    HiHatOpen,
    HiHatAccent,
    HiHatFoot,
    Ride,
    RideBell,
    Crash,
    Stacker,
    CowBell,
    Snare,
    SnareAccent,
    SnareGhost,
    CrossStick,
    SnareFlam,
    SnareDrag,
    SnareBuzz,
    Kick,
    KickAndHiHatFoot,
    Tom1,
    Tom2,
    Tom3,
    FloorTom,
    Clap,
    Tambourine,
    MetronomeClick,
    MetronomeAccent,
}

impl DrumVoice {
    /// Every voice, in notation order (cymbals, snares, kick/toms, extras).
    pub const ALL: [DrumVoice; 26] = [
        DrumVoice::HiHatClosed,
        DrumVoice::HiHatOpen,
        DrumVoice::HiHatAccent,
        DrumVoice::HiHatFoot,
        DrumVoice::Ride,
        DrumVoice::RideBell,
        DrumVoice::Crash,
        DrumVoice::Stacker,
        DrumVoice::CowBell,
        DrumVoice::Snare,
        DrumVoice::SnareAccent,
        DrumVoice::SnareGhost,
        DrumVoice::CrossStick,
        DrumVoice::SnareFlam,
        DrumVoice::SnareDrag,
        DrumVoice::SnareBuzz,
        DrumVoice::Kick,
        DrumVoice::KickAndHiHatFoot,
        DrumVoice::Tom1,
        DrumVoice::Tom2,
        DrumVoice::Tom3,
        DrumVoice::FloorTom,
        DrumVoice::Clap,
        DrumVoice::Tambourine,
        DrumVoice::MetronomeClick,
        DrumVoice::MetronomeAccent,
    ];

    /// Human-readable name.
    pub fn label(self) -> &'static str {
        match self {
            DrumVoice::HiHatClosed => "hi-hat (closed)",
            DrumVoice::HiHatOpen => "hi-hat (open)",
            DrumVoice::HiHatAccent => "hi-hat accent",
            DrumVoice::HiHatFoot => "hi-hat foot",
            DrumVoice::Ride => "ride",
            DrumVoice::RideBell => "ride bell",
            DrumVoice::Crash => "crash",
            DrumVoice::Stacker => "stacker",
            DrumVoice::CowBell => "cowbell",
            DrumVoice::Snare => "snare",
            DrumVoice::SnareAccent => "snare accent",
            DrumVoice::SnareGhost => "ghost note",
            DrumVoice::CrossStick => "cross stick",
            DrumVoice::SnareFlam => "flam",
            DrumVoice::SnareDrag => "drag",
            DrumVoice::SnareBuzz => "buzz stroke",
            DrumVoice::Kick => "kick",
            DrumVoice::KickAndHiHatFoot => "kick + hi-hat foot",
            DrumVoice::Tom1 => "tom 1",
            DrumVoice::Tom2 => "tom 2",
            DrumVoice::Tom3 => "tom 3",
            DrumVoice::FloorTom => "floor tom",
            DrumVoice::Clap => "clap",
            DrumVoice::Tambourine => "tambourine",
            DrumVoice::MetronomeClick => "metronome",
            DrumVoice::MetronomeAccent => "metronome accent",
        }
    }

    /// Default velocity (0.0–1.0) for a pattern hit on this voice.
    pub fn default_velocity(self) -> f32 {
        match self {
            DrumVoice::SnareAccent | DrumVoice::HiHatAccent | DrumVoice::Crash => 1.0,
            DrumVoice::SnareGhost => 0.35,
            DrumVoice::CrossStick | DrumVoice::HiHatFoot => 0.6,
            DrumVoice::HiHatClosed | DrumVoice::Ride | DrumVoice::Tambourine => 0.7,
            DrumVoice::MetronomeClick => 0.75,
            DrumVoice::MetronomeAccent => 0.9,
            _ => 0.8,
        }
    }

    /// Which limb plays this voice.
    pub fn limb(self) -> Limb {
        match self {
            DrumVoice::Kick | DrumVoice::HiHatFoot | DrumVoice::KickAndHiHatFoot => Limb::Feet,
            _ => Limb::Hands,
        }
    }

    /// Whether this voice belongs to the metronome overlay rather than the
    /// groove itself.
    pub fn is_metronome(self) -> bool {
        matches!(self, DrumVoice::MetronomeClick | DrumVoice::MetronomeAccent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_contains_every_variant_once() {
        for (i, a) in DrumVoice::ALL.iter().enumerate() {
            for b in &DrumVoice::ALL[i + 1..] {
                assert_ne!(a, b, "duplicate voice in ALL");
            }
        }
        assert_eq!(DrumVoice::ALL.len(), 26);
    }

    #[test]
    fn default_velocities_in_range() {
        for voice in DrumVoice::ALL {
            let v = voice.default_velocity();
            assert!((0.0..=1.0).contains(&v), "{:?} velocity {v}", voice);
        }
    }

    #[test]
    fn accents_louder_than_ghosts() {
        assert!(
            DrumVoice::SnareAccent.default_velocity() > DrumVoice::Snare.default_velocity()
        );
        assert!(DrumVoice::SnareGhost.default_velocity() < DrumVoice::Snare.default_velocity());
    }

    #[test]
    fn feet_voices() {
        assert_eq!(DrumVoice::Kick.limb(), Limb::Feet);
        assert_eq!(DrumVoice::HiHatFoot.limb(), Limb::Feet);
        assert_eq!(DrumVoice::KickAndHiHatFoot.limb(), Limb::Feet);
        assert_eq!(DrumVoice::Snare.limb(), Limb::Hands);
        assert_eq!(DrumVoice::Ride.limb(), Limb::Hands);
    }

    #[test]
    fn labels_are_nonempty_and_distinct() {
        for (i, a) in DrumVoice::ALL.iter().enumerate() {
            assert!(!a.label().is_empty());
            for b in &DrumVoice::ALL[i + 1..] {
                assert_ne!(a.label(), b.label());
            }
        }
    }

    #[test]
    fn metronome_voices_flagged() {
        assert!(DrumVoice::MetronomeClick.is_metronome());
        assert!(DrumVoice::MetronomeAccent.is_metronome());
        assert!(!DrumVoice::Kick.is_metronome());
    }

    #[test]
    fn serde_round_trip() {
        let yaml = serde_yaml::to_string(&DrumVoice::CrossStick).unwrap();
        let parsed: DrumVoice = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, DrumVoice::CrossStick);
    }
}
