//! Kit mappings — raw note numbers to logical drum voices.
//!
//! Electronic kits disagree about which note each pad sends, so the mapping
//! is a swappable table selected by kit name. Several raw notes may alias to
//! the same voice (head and rim zones of one pad, for instance). Unmapped
//! notes simply map to nothing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::groove::DrumVoice;

/// A note-number → voice table. Custom kits round-trip through YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kit {
    name: String,
    map: BTreeMap<u8, DrumVoice>,
}

impl Kit {
    pub fn new(name: impl Into<String>, map: BTreeMap<u8, DrumVoice>) -> Self {
        Self {
            name: name.into(),
            map,
        }
    }

    /// Look up a built-in kit by name (case-insensitive): `td17`,
    /// `alesis-nitro`, or `general-midi`.
    pub fn builtin(name: &str) -> Option<Kit> {
        match name.to_ascii_lowercase().as_str() {
            "td17" | "td-17" => Some(td17()),
            "alesis-nitro" | "nitro" => Some(alesis_nitro()),
            "general-midi" | "gm" => Some(general_midi()),
            _ => None,
        }
    }

    /// Names accepted by [`Kit::builtin`].
    pub fn builtin_names() -> [&'static str; 3] {
        ["td17", "alesis-nitro", "general-midi"]
    }

    /// The voice a raw note maps to, if any.
    pub fn voice_for(&self, note: u8) -> Option<DrumVoice> {
        self.map.get(&note).copied()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parse a kit from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Kit, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Serialize this kit to YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

fn kit_from(name: &str, entries: &[(u8, DrumVoice)]) -> Kit {
    Kit::new(name, entries.iter().copied().collect())
}

/// Roland TD-17 module, factory note assignments.
fn td17() -> Kit {
    use DrumVoice::*;
    kit_from(
        "td17",
        &[
            (36, Kick),
            (38, Snare),
            (40, Snare), // rim shot zone
            (37, CrossStick),
            (42, HiHatClosed),
            (22, HiHatClosed), // edge zone
            (46, HiHatOpen),
            (26, HiHatOpen), // edge zone
            (44, HiHatFoot),
            (48, Tom1),
            (50, Tom1), // rim
            (45, Tom2),
            (47, Tom2), // rim
            (43, Tom3),
            (58, FloorTom),
            (49, Crash),
            (55, Crash), // edge
            (52, Stacker),
            (51, Ride),
            (59, Ride), // edge
            (53, RideBell),
        ],
    )
}

/// Alesis Nitro module defaults.
fn alesis_nitro() -> Kit {
    use DrumVoice::*;
    kit_from(
        "alesis-nitro",
        &[
            (36, Kick),
            (38, Snare),
            (37, CrossStick),
            (42, HiHatClosed),
            (46, HiHatOpen),
            (44, HiHatFoot),
            (48, Tom1),
            (45, Tom2),
            (43, Tom3),
            (49, Crash),
            (51, Ride),
            (53, RideBell),
        ],
    )
}

/// General MIDI percussion map (channel 10 note numbers).
fn general_midi() -> Kit {
    use DrumVoice::*;
    kit_from(
        "general-midi",
        &[
            (35, Kick),
            (36, Kick),
            (38, Snare),
            (40, Snare),
            (37, CrossStick),
            (39, Clap),
            (42, HiHatClosed),
            (44, HiHatFoot),
            (46, HiHatOpen),
            (41, FloorTom),
            (43, FloorTom),
            (45, Tom3),
            (47, Tom2),
            (48, Tom1),
            (50, Tom1),
            (49, Crash),
            (57, Crash),
            (51, Ride),
            (59, Ride),
            (53, RideBell),
            (54, Tambourine),
            (56, CowBell),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn td17_maps_kick() {
        let kit = Kit::builtin("td17").unwrap();
        assert_eq!(kit.voice_for(36), Some(DrumVoice::Kick));
    }

    #[test]
    fn high_notes_are_unmapped() {
        for name in Kit::builtin_names() {
            let kit = Kit::builtin(name).unwrap();
            assert_eq!(kit.voice_for(127), None, "{name}");
            assert_eq!(kit.voice_for(0), None, "{name}");
        }
    }

    #[test]
    fn builtin_lookup_is_case_insensitive_with_aliases() {
        assert!(Kit::builtin("TD-17").is_some());
        assert!(Kit::builtin("GM").is_some());
        assert!(Kit::builtin("Nitro").is_some());
        assert!(Kit::builtin("unknown-kit").is_none());
    }

    #[test]
    fn aliasing_multiple_notes_to_one_voice() {
        let kit = Kit::builtin("td17").unwrap();
        // Head and rim zones of the snare pad land on the same voice.
        assert_eq!(kit.voice_for(38), kit.voice_for(40));
        // Bow and edge of the hi-hat too.
        assert_eq!(kit.voice_for(42), kit.voice_for(22));
    }

    #[test]
    fn every_builtin_covers_the_core_voices() {
        for name in Kit::builtin_names() {
            let kit = Kit::builtin(name).unwrap();
            let mapped: Vec<DrumVoice> = (0..128).filter_map(|n| kit.voice_for(n)).collect();
            for voice in [
                DrumVoice::Kick,
                DrumVoice::Snare,
                DrumVoice::HiHatClosed,
                DrumVoice::HiHatOpen,
                DrumVoice::Ride,
                DrumVoice::Crash,
            ] {
                assert!(mapped.contains(&voice), "{name} misses {voice:?}");
            }
        }
    }

    #[test]
    fn yaml_round_trip() {
        let kit = Kit::builtin("alesis-nitro").unwrap();
        let yaml = kit.to_yaml().unwrap();
        let parsed = Kit::from_yaml(&yaml).unwrap();
        assert_eq!(parsed, kit);
    }

    #[test]
    fn custom_kit_from_yaml() {
        let yaml = r#"
name: my-pads
map:
  60: Kick
  61: Snare
  62: HiHatClosed
"#;
        let kit = Kit::from_yaml(yaml).unwrap();
        assert_eq!(kit.name(), "my-pads");
        assert_eq!(kit.voice_for(60), Some(DrumVoice::Kick));
        assert_eq!(kit.voice_for(61), Some(DrumVoice::Snare));
        assert_eq!(kit.voice_for(63), None);
    }
}
