//! Analysis metadata structures

use serde::{Deserialize, Serialize};

use crate::features::key::templates::{TemplateSet, TonnetzTemplate};

/// Analysis metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    /// Duration of the analysed signal in seconds (at the analysis rate)
    pub duration_seconds: f32,

    /// Sample rate the features were computed at in Hz
    pub sample_rate: u32,

    /// Sample rate of the input before resampling in Hz
    pub source_sample_rate: u32,

    /// Wall-clock processing time in milliseconds
    pub processing_time_ms: f32,

    /// Algorithm version
    pub algorithm_version: String,

    /// Template family used for matching
    pub template_set: TemplateSet,

    /// Tonnetz template policy used for matching
    pub tonnetz_template: TonnetzTemplate,

    /// Whether feature extraction ran concurrently
    pub parallel_extraction: bool,
}

impl Default for AnalysisMetadata {
    fn default() -> Self {
        Self {
            duration_seconds: 0.0,
            sample_rate: 0,
            source_sample_rate: 0,
            processing_time_ms: 0.0,
            algorithm_version: env!("CARGO_PKG_VERSION").to_string(),
            template_set: TemplateSet::default(),
            tonnetz_template: TonnetzTemplate::default(),
            parallel_extraction: true,
        }
    }
}
