//! Error types for key analysis

use std::fmt;

/// Errors that can occur during key analysis
#[derive(Debug, Clone)]
pub enum AnalysisError {
    /// Invalid input parameters or unusable signal (empty, silent, bad config)
    InvalidInput(String),

    /// Audio file could not be opened, probed or decoded
    DecodingError(String),

    /// Processing error during analysis (FFT, resampling, intermediate file)
    ProcessingError(String),
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AnalysisError::DecodingError(msg) => write!(f, "Decoding error: {}", msg),
            AnalysisError::ProcessingError(msg) => write!(f, "Processing error: {}", msg),
        }
    }
}

impl std::error::Error for AnalysisError {}

impl From<std::io::Error> for AnalysisError {
    fn from(err: std::io::Error) -> Self {
        AnalysisError::ProcessingError(format!("I/O error: {}", err))
    }
}

impl From<hound::Error> for AnalysisError {
    fn from(err: hound::Error) -> Self {
        AnalysisError::ProcessingError(format!("WAV error: {}", err))
    }
}

impl From<symphonia::core::errors::Error> for AnalysisError {
    fn from(err: symphonia::core::errors::Error) -> Self {
        AnalysisError::DecodingError(err.to_string())
    }
}
