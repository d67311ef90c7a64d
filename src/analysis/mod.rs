//! Analysis result types
//!
//! Keys, modes, the final key analysis and its metadata.

pub mod metadata;
pub mod result;
