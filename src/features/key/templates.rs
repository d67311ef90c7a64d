//! Major and minor key templates
//!
//! One canonical major and one canonical minor profile (tonic = C); the 24
//! candidate keys are circular rotations of those two.
//!
//! # Reference
//!
//! Krumhansl, C. L., & Kessler, E. J. (1982). Tracing the Dynamic Changes in Perceived
//! Tonal Organization in a Spatial Representation of Musical Keys. *Psychological Review*,
//! 89(4), 334-368.
//!
//! Temperley, D. (1999). What's Key for Key? The Krumhansl-Schmuckler Key-Finding
//! Algorithm Reconsidered. *Music Perception*, 17(1), 65-100.

use serde::{Deserialize, Serialize};

use crate::analysis::result::{Key, Mode};
use crate::config::AnalysisConfig;
use crate::features::chroma::smoothing::smooth_circular;
use crate::features::chroma::tonnetz::project;

/// Scale membership: major (ionian) scale degrees
const DIATONIC_MAJOR: [f32; 12] = [1.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0];
/// Scale membership: natural minor (aeolian) scale degrees
const DIATONIC_MINOR: [f32; 12] = [1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0];

const KRUMHANSL_MAJOR: [f32; 12] = [
    6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88,
];
const KRUMHANSL_MINOR: [f32; 12] = [
    6.33, 2.68, 3.52, 5.38, 2.60, 3.53, 2.54, 4.75, 3.98, 2.69, 3.34, 3.17,
];

const TEMPERLEY_MAJOR: [f32; 12] = [5.0, 2.0, 3.5, 2.0, 4.5, 4.0, 2.0, 4.5, 2.0, 3.5, 1.5, 4.0];
const TEMPERLEY_MINOR: [f32; 12] = [5.0, 2.0, 3.5, 4.5, 2.0, 4.0, 2.0, 4.5, 3.5, 2.0, 1.5, 4.0];

/// Family of major/minor profiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TemplateSet {
    /// Binary scale-membership patterns (major and natural minor)
    ///
    /// The natural minor pattern is a rotation of the major one, so relative
    /// keys score identically and the major key always wins the tie.
    Diatonic,
    /// Krumhansl-Kessler probe-tone ratings
    KrumhanslKessler,
    /// Temperley's revised profiles
    #[default]
    Temperley,
}

impl TemplateSet {
    /// Canonical (major, minor) profiles with tonic C
    pub fn profiles(self) -> ([f32; 12], [f32; 12]) {
        match self {
            TemplateSet::Diatonic => (DIATONIC_MAJOR, DIATONIC_MINOR),
            TemplateSet::KrumhanslKessler => (KRUMHANSL_MAJOR, KRUMHANSL_MINOR),
            TemplateSet::Temperley => (TEMPERLEY_MAJOR, TEMPERLEY_MINOR),
        }
    }
}

/// How the 6-D tonnetz template of a candidate key is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TonnetzTemplate {
    /// First six entries of the rotated 12-bin template
    Truncated,
    /// Tonal centroid of the rotated tonic triad
    #[default]
    TonalCentroid,
}

/// Rotate a template circularly by `steps` pitch classes
///
/// `out[k] = template[(k - steps) mod 12]`: the tonic weight moves from
/// index 0 to index `steps`.
pub fn rotate(template: &[f32; 12], steps: usize) -> [f32; 12] {
    let mut rotated = *template;
    rotated.rotate_right(steps % 12);
    rotated
}

/// Key templates for all 24 keys
#[derive(Debug, Clone, PartialEq)]
pub struct KeyTemplates {
    major: [f32; 12],
    minor: [f32; 12],
    tonnetz: TonnetzTemplate,
}

impl KeyTemplates {
    /// Templates of one family with tonal-centroid tonnetz templates
    pub fn new(template_set: TemplateSet) -> Self {
        let (major, minor) = template_set.profiles();
        Self {
            major,
            minor,
            tonnetz: TonnetzTemplate::default(),
        }
    }

    /// Templates from arbitrary canonical profiles (tonic at index 0)
    pub fn from_profiles(major: [f32; 12], minor: [f32; 12], tonnetz: TonnetzTemplate) -> Self {
        Self {
            major,
            minor,
            tonnetz,
        }
    }

    /// Templates described by an `AnalysisConfig`
    ///
    /// With `smooth_templates` set, the 12-bin templates receive the same
    /// circular smoothing as the chroma and HPCP profiles.
    pub fn from_config(config: &AnalysisConfig) -> Self {
        let templates = Self::new(config.template_set).with_tonnetz_template(config.tonnetz_template);
        if config.smooth_templates {
            templates.smoothed(config.smoothing_window)
        } else {
            templates
        }
    }

    /// Replace the tonnetz template policy
    pub fn with_tonnetz_template(mut self, tonnetz: TonnetzTemplate) -> Self {
        self.tonnetz = tonnetz;
        self
    }

    /// Copy with both 12-bin templates circularly smoothed over `window` bins
    ///
    /// Smoothing commutes with rotation, so every rotated template is the
    /// smoothed rotation of the unsmoothed template.
    pub fn smoothed(&self, window: usize) -> Self {
        let smooth = |t: &[f32; 12]| {
            let mut out = [0.0f32; 12];
            out.copy_from_slice(&smooth_circular(t, window));
            out
        };
        Self {
            major: smooth(&self.major),
            minor: smooth(&self.minor),
            tonnetz: self.tonnetz,
        }
    }

    /// Canonical template (tonic C) of a mode
    pub fn template(&self, mode: Mode) -> &[f32; 12] {
        match mode {
            Mode::Major => &self.major,
            Mode::Minor => &self.minor,
        }
    }

    /// Tonnetz template policy
    pub fn tonnetz_policy(&self) -> TonnetzTemplate {
        self.tonnetz
    }

    /// 12-bin template of a candidate key
    pub fn rotated(&self, key: Key) -> [f32; 12] {
        rotate(self.template(key.mode()), key.tonic() as usize)
    }

    /// 6-D tonnetz template of a candidate key
    pub fn tonnetz_template(&self, key: Key) -> [f32; 6] {
        match self.tonnetz {
            TonnetzTemplate::Truncated => {
                let rotated = self.rotated(key);
                let mut out = [0.0f32; 6];
                out.copy_from_slice(&rotated[..6]);
                out
            }
            TonnetzTemplate::TonalCentroid => {
                let third = match key.mode() {
                    Mode::Major => 4,
                    Mode::Minor => 3,
                };
                let mut triad = [0.0f32; 12];
                for interval in [0, third, 7] {
                    triad[(key.tonic() as usize + interval) % 12] = 1.0;
                }
                project(&triad)
            }
        }
    }
}

impl Default for KeyTemplates {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}
