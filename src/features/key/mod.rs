//! Key detection modules
//!
//! Detect musical key using:
//! - Major/minor templates rotated to all 24 keys
//! - Pearson correlation per feature channel
//! - Averaged template matching with a first-wins running maximum

pub mod correlation;
pub mod matcher;
pub mod templates;

pub use correlation::{correlation_score, pearson, DEGENERATE_SCORE};
pub use matcher::{match_channel, match_key, KeyMatch};
pub use templates::{rotate, KeyTemplates, TemplateSet, TonnetzTemplate};
