//! Feature extraction modules
//!
//! This module contains the key estimation pipeline stages:
//! - STFT / inverse STFT
//! - Harmonic-percussive separation
//! - Chroma, HPCP and tonnetz extraction
//! - Key template matching

pub mod chroma;
pub mod hpss;
pub mod key;
pub mod spectrum;
