//! Audio preprocessing modules
//!
//! This module contains utilities for preparing audio for analysis:
//! - Channel mixing (multi-channel to mono)
//! - Resampling to the analysis sample rate

pub mod channel_mixer;
pub mod resample;
