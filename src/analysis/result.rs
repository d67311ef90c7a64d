//! Analysis result types

use std::fmt;

use serde::{Deserialize, Serialize};

use super::metadata::AnalysisMetadata;
use crate::features::chroma::PitchClassProfile;

/// Pitch-class names, index 0 = C
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Major or minor mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// Major (ionian)
    Major,
    /// Minor (aeolian)
    Minor,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Major => write!(f, "major"),
            Mode::Minor => write!(f, "minor"),
        }
    }
}

/// Musical key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// Major key (0 = C, 1 = C#, ..., 11 = B)
    Major(u32),
    /// Minor key (0 = C, 1 = C#, ..., 11 = B)
    Minor(u32),
}

impl Key {
    /// Key with the given mode and tonic (taken modulo 12)
    pub fn new(mode: Mode, tonic: u32) -> Self {
        match mode {
            Mode::Major => Key::Major(tonic % 12),
            Mode::Minor => Key::Minor(tonic % 12),
        }
    }

    /// Tonic pitch class (0 = C, ..., 11 = B)
    pub fn tonic(&self) -> u32 {
        match self {
            Key::Major(i) | Key::Minor(i) => *i % 12,
        }
    }

    /// Mode of the key
    pub fn mode(&self) -> Mode {
        match self {
            Key::Major(_) => Mode::Major,
            Key::Minor(_) => Mode::Minor,
        }
    }

    /// Tonic name (e.g., "C", "F#")
    pub fn tonic_name(&self) -> &'static str {
        NOTE_NAMES[self.tonic() as usize]
    }

    /// Full key name, tonic then mode (e.g., "C major", "A minor")
    ///
    /// # Example
    ///
    /// ```
    /// use stratum_key::analysis::result::Key;
    ///
    /// assert_eq!(Key::Major(0).name(), "C major");
    /// assert_eq!(Key::Minor(9).name(), "A minor");
    /// assert_eq!(Key::Major(6).name(), "F# major");
    /// ```
    pub fn name(&self) -> String {
        format!("{} {}", self.tonic_name(), self.mode())
    }

    /// All 24 keys in matching order: tonic 0..11, major before minor
    pub fn all() -> impl Iterator<Item = Key> {
        (0..12u32).flat_map(|tonic| [Key::Major(tonic), Key::Minor(tonic)])
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Complete key analysis result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyAnalysis {
    /// Best matching key
    pub key: Key,

    /// Mean correlation of the best key over the three feature channels ([-1, 1])
    pub score: f32,

    /// Mean correlation of every candidate, in matching order
    pub all_scores: Vec<(Key, f32)>,

    /// Time-averaged, smoothed STFT chroma profile
    pub chroma: PitchClassProfile,

    /// Time-averaged, smoothed HPCP profile
    pub hpcp: PitchClassProfile,

    /// Time-averaged tonnetz profile
    pub tonnetz: PitchClassProfile,

    /// Analysis metadata
    pub metadata: AnalysisMetadata,
}

impl KeyAnalysis {
    /// Candidates sorted by score, highest first (ties keep matching order)
    pub fn ranked(&self) -> Vec<(Key, f32)> {
        let mut ranked = self.all_scores.clone();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_names() {
        assert_eq!(Key::Major(0).to_string(), "C major");
        assert_eq!(Key::Minor(9).to_string(), "A minor");
        assert_eq!(Key::Minor(1).name(), "C# minor");
        assert_eq!(Key::Major(11).tonic_name(), "B");
    }

    #[test]
    fn test_key_new_wraps_tonic() {
        assert_eq!(Key::new(Mode::Major, 14), Key::Major(2));
        assert_eq!(Key::new(Mode::Minor, 9), Key::Minor(9));
        assert_eq!(Key::Minor(9).mode(), Mode::Minor);
        assert_eq!(Key::Minor(21).tonic(), 9);
    }

    #[test]
    fn test_all_keys_order() {
        let keys: Vec<Key> = Key::all().collect();
        assert_eq!(keys.len(), 24);
        assert_eq!(keys[0], Key::Major(0));
        assert_eq!(keys[1], Key::Minor(0));
        assert_eq!(keys[23], Key::Minor(11));
    }

    #[test]
    fn test_key_serializes() {
        let json = serde_json::to_string(&Key::Minor(9)).unwrap();
        let back: Key = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Key::Minor(9));
    }
}
