//! Key template matching
//!
//! Every candidate key is scored by correlating the chroma and HPCP profiles
//! with its rotated 12-bin template and the tonnetz profile with its 6-D
//! tonnetz template. The three correlations are averaged. Candidates are
//! visited tonic C..B, major before minor, and a candidate replaces the
//! current best only when its score is strictly greater, so ties go to the
//! candidate visited first.

use serde::{Deserialize, Serialize};

use super::correlation::correlation_score;
use super::templates::KeyTemplates;
use crate::analysis::result::Key;
use crate::error::AnalysisError;
use crate::features::chroma::{FeatureKind, PitchClassProfile};

/// Outcome of matching profiles against the 24 key templates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyMatch {
    /// Best matching key
    pub key: Key,

    /// Score of the best key
    pub score: f32,

    /// Score of every candidate in matching order
    pub all_scores: Vec<(Key, f32)>,
}

impl KeyMatch {
    /// Score of a specific candidate
    pub fn score_of(&self, key: Key) -> Option<f32> {
        self.all_scores
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, s)| *s)
    }
}

/// Strict running maximum over candidates
#[derive(Debug)]
struct RunningBest {
    key: Key,
    score: f32,
}

impl RunningBest {
    fn new() -> Self {
        Self {
            key: Key::Major(0),
            score: f32::NEG_INFINITY,
        }
    }

    fn offer(&mut self, key: Key, score: f32) {
        if score > self.score {
            self.key = key;
            self.score = score;
        }
    }
}

fn expect_kind(profile: &PitchClassProfile, kind: FeatureKind) -> Result<(), AnalysisError> {
    if profile.kind() != kind {
        return Err(AnalysisError::InvalidInput(format!(
            "Expected a {} profile, got {}",
            kind.name(),
            profile.kind().name()
        )));
    }
    Ok(())
}

/// Match the three feature profiles against all 24 candidate keys
///
/// # Arguments
///
/// * `chroma` - STFT chroma profile (12 values)
/// * `hpcp` - HPCP profile (12 values)
/// * `tonnetz` - Tonnetz profile (6 values)
/// * `templates` - Key templates
///
/// # Returns
///
/// The best key, its score in [-1, 1] and the scores of all candidates.
/// Channels whose correlation is undefined (for example a silent, all-zero
/// profile) contribute -1; all-degenerate input therefore yields C major
/// with score -1.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` if a profile is passed in the wrong slot.
///
/// # Example
///
/// ```
/// use stratum_key::features::chroma::{FeatureKind, PitchClassProfile};
/// use stratum_key::features::key::{match_key, KeyTemplates, TemplateSet};
/// use stratum_key::analysis::result::Key;
///
/// let templates = KeyTemplates::new(TemplateSet::Temperley);
/// let g_major = templates.rotated(Key::Major(7)).to_vec();
/// let chroma = PitchClassProfile::new(FeatureKind::Chroma, g_major.clone())?;
/// let hpcp = PitchClassProfile::new(FeatureKind::Hpcp, g_major)?;
/// let tonnetz = PitchClassProfile::new(
///     FeatureKind::Tonnetz,
///     templates.tonnetz_template(Key::Major(7)).to_vec(),
/// )?;
///
/// let result = match_key(&chroma, &hpcp, &tonnetz, &templates)?;
/// assert_eq!(result.key, Key::Major(7));
/// # Ok::<(), stratum_key::AnalysisError>(())
/// ```
pub fn match_key(
    chroma: &PitchClassProfile,
    hpcp: &PitchClassProfile,
    tonnetz: &PitchClassProfile,
    templates: &KeyTemplates,
) -> Result<KeyMatch, AnalysisError> {
    expect_kind(chroma, FeatureKind::Chroma)?;
    expect_kind(hpcp, FeatureKind::Hpcp)?;
    expect_kind(tonnetz, FeatureKind::Tonnetz)?;

    let mut best = RunningBest::new();
    let mut all_scores = Vec::with_capacity(24);

    for key in Key::all() {
        let template = templates.rotated(key);
        let tonnetz_template = templates.tonnetz_template(key);

        let chroma_score = correlation_score(chroma.values(), &template);
        let hpcp_score = correlation_score(hpcp.values(), &template);
        let tonnetz_score = correlation_score(tonnetz.values(), &tonnetz_template);
        let score = (chroma_score + hpcp_score + tonnetz_score) / 3.0;

        log::trace!(
            "{}: chroma={:.4} hpcp={:.4} tonnetz={:.4} mean={:.4}",
            key,
            chroma_score,
            hpcp_score,
            tonnetz_score,
            score
        );

        best.offer(key, score);
        all_scores.push((key, score));
    }

    log::debug!("Best matching key: {} (score={:.4})", best.key, best.score);

    Ok(KeyMatch {
        key: best.key,
        score: best.score,
        all_scores,
    })
}

/// Match a single profile against all 24 candidate keys
///
/// Chroma and HPCP profiles are compared with the rotated 12-bin templates,
/// tonnetz profiles with the tonnetz templates. Same ordering and tie rule as
/// [`match_key`].
pub fn match_channel(profile: &PitchClassProfile, templates: &KeyTemplates) -> KeyMatch {
    let mut best = RunningBest::new();
    let mut all_scores = Vec::with_capacity(24);

    for key in Key::all() {
        let score = match profile.kind() {
            FeatureKind::Chroma | FeatureKind::Hpcp => {
                correlation_score(profile.values(), &templates.rotated(key))
            }
            FeatureKind::Tonnetz => {
                correlation_score(profile.values(), &templates.tonnetz_template(key))
            }
        };
        best.offer(key, score);
        all_scores.push((key, score));
    }

    KeyMatch {
        key: best.key,
        score: best.score,
        all_scores,
    }
}
