//! # Stratum Key
//!
//! Musical key estimation from audio. The harmonic part of the signal is
//! described three ways (STFT chroma, constant-Q HPCP and tonnetz), each
//! reduced to one profile and matched against major and minor templates
//! rotated to all 24 keys.
//!
//! ## Features
//!
//! - **Harmonic-percussive separation**: median-filter HPSS keeps drums out of the pitch profiles
//! - **Three feature channels**: chroma, HPCP and tonal centroid, averaged at matching time
//! - **Template matching**: Pearson correlation against Temperley, Krumhansl-Kessler or diatonic templates
//! - **Any input format**: Symphonia decoding through a scoped intermediate WAV file
//!
//! ## Quick Start
//!
//! ```no_run
//! use stratum_key::{analyze_audio, AnalysisConfig};
//!
//! // Load audio samples (mono, f32, normalized)
//! let samples: Vec<f32> = vec![]; // Your audio data
//! let sample_rate = 44100;
//!
//! // Analyze
//! let result = analyze_audio(&samples, sample_rate, AnalysisConfig::default())?;
//!
//! println!("Key: {} (score: {:.2})", result.key, result.score);
//! # Ok::<(), stratum_key::AnalysisError>(())
//! ```
//!
//! ## Architecture
//!
//! The analysis pipeline follows this flow:
//!
//! ```text
//! File → Intermediate WAV → Mono @ 22050 Hz → HPSS → {Chroma, HPCP, Tonnetz} → Template Matching → Key
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod config;
pub mod error;
pub mod features;
pub mod io;
pub mod preprocessing;

use std::fmt;
use std::path::Path;
use std::time::Instant;

// Re-export main types
pub use analysis::metadata::AnalysisMetadata;
pub use analysis::result::{Key, KeyAnalysis, Mode};
pub use config::AnalysisConfig;
pub use error::AnalysisError;
pub use features::key::{KeyTemplates, TemplateSet, TonnetzTemplate};

use features::chroma::cqt::chroma_cqt;
use features::chroma::extractor::extract_chroma;
use features::chroma::hpcp::hpcp_profile;
use features::chroma::tonnetz::tonnetz_profile;
use features::chroma::Chromagram;
use features::hpss::separate;
use features::key::match_key;
use io::{IntermediateWav, SampleBuffer};
use preprocessing::resample::resample_mono;

/// Pipeline stage, reported as it starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Decoding the input and writing the intermediate WAV
    Converting,
    /// Reading the intermediate WAV back
    Loading,
    /// Harmonic-percussive separation
    Separating,
    /// STFT chroma extraction
    Chroma,
    /// Constant-Q HPCP extraction
    Hpcp,
    /// Tonnetz extraction
    Tonnetz,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Stage::Converting => "Converting audio to WAV...",
            Stage::Loading => "Loading audio file...",
            Stage::Separating => "Separating harmonic content...",
            Stage::Chroma => "Extracting chroma features...",
            Stage::Hpcp => "Extracting HPCP features...",
            Stage::Tonnetz => "Extracting Tonnetz features...",
        };
        f.write_str(message)
    }
}

/// Main analysis function
///
/// Estimates the key of a mono signal.
///
/// # Arguments
///
/// * `samples` - Mono audio samples, normalized to [-1.0, 1.0]
/// * `sample_rate` - Sample rate in Hz (resampled to `config.target_sample_rate`)
/// * `config` - Analysis configuration parameters
///
/// # Returns
///
/// `KeyAnalysis` with the best key, its score, all 24 scores and the three profiles
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for an invalid configuration, a zero
/// sample rate, or an empty or silent signal.
///
/// # Example
///
/// ```no_run
/// use stratum_key::{analyze_audio, AnalysisConfig};
///
/// let samples = vec![0.1f32; 44100 * 30];
/// let result = analyze_audio(&samples, 44100, AnalysisConfig::default())?;
/// println!("The best matching key is: {}", result.key);
/// # Ok::<(), stratum_key::AnalysisError>(())
/// ```
pub fn analyze_audio(
    samples: &[f32],
    sample_rate: u32,
    config: AnalysisConfig,
) -> Result<KeyAnalysis, AnalysisError> {
    analyze_audio_with_progress(samples, sample_rate, config, &mut |_| {})
}

/// [`analyze_audio`] reporting each stage to `progress` as it starts
pub fn analyze_audio_with_progress(
    samples: &[f32],
    sample_rate: u32,
    config: AnalysisConfig,
    progress: &mut dyn FnMut(Stage),
) -> Result<KeyAnalysis, AnalysisError> {
    let start_time = Instant::now();
    config.validate()?;

    log::debug!(
        "Starting key analysis: {} samples at {} Hz",
        samples.len(),
        sample_rate
    );

    let buffer = SampleBuffer::new(samples.to_vec(), sample_rate)?;
    analyze_buffer(buffer, &config, progress, start_time)
}

/// Estimate the key of an audio file
///
/// The file is decoded (any format Symphonia supports), mixed to mono and
/// written to a uniquely named intermediate WAV in `config.intermediate_dir`
/// (or the system temp dir). The intermediate file is removed before this
/// function returns, whether analysis succeeded or not.
///
/// # Errors
///
/// `AnalysisError::DecodingError` for missing, unreadable or unsupported
/// files; otherwise as [`analyze_audio`].
///
/// # Example
///
/// ```no_run
/// use stratum_key::{analyze_file, AnalysisConfig};
///
/// let result = analyze_file("song.mp3", AnalysisConfig::default())?;
/// println!("{}", result.key);
/// # Ok::<(), stratum_key::AnalysisError>(())
/// ```
pub fn analyze_file(
    path: impl AsRef<Path>,
    config: AnalysisConfig,
) -> Result<KeyAnalysis, AnalysisError> {
    analyze_file_with_progress(path, config, &mut |_| {})
}

/// [`analyze_file`] reporting each stage to `progress` as it starts
pub fn analyze_file_with_progress(
    path: impl AsRef<Path>,
    config: AnalysisConfig,
    progress: &mut dyn FnMut(Stage),
) -> Result<KeyAnalysis, AnalysisError> {
    let start_time = Instant::now();
    let path = path.as_ref();
    config.validate()?;

    log::debug!("Starting key analysis of {}", path.display());

    progress(Stage::Converting);
    let wav = IntermediateWav::transcode(path, config.intermediate_dir.as_deref())?;

    progress(Stage::Loading);
    let result = wav
        .load()
        .and_then(|buffer| analyze_buffer(buffer, &config, progress, start_time));

    wav.close();
    result
}

fn analyze_buffer(
    buffer: SampleBuffer,
    config: &AnalysisConfig,
    progress: &mut dyn FnMut(Stage),
    start_time: Instant,
) -> Result<KeyAnalysis, AnalysisError> {
    if buffer.is_empty() {
        return Err(AnalysisError::InvalidInput("Empty audio samples".to_string()));
    }
    if buffer.is_silent() {
        return Err(AnalysisError::InvalidInput("Audio is entirely silent".to_string()));
    }

    let source_sample_rate = buffer.sample_rate();
    let sample_rate = config.target_sample_rate;
    let buffer = if source_sample_rate == sample_rate {
        buffer
    } else {
        SampleBuffer::new(
            resample_mono(buffer.samples(), source_sample_rate, sample_rate)?,
            sample_rate,
        )?
    };

    progress(Stage::Separating);
    let harmonic = separate(&buffer, config)?.harmonic;
    let samples = harmonic.samples();

    let (chroma, cq_chromagram) = if config.parallel_extraction {
        progress(Stage::Chroma);
        progress(Stage::Hpcp);
        let (chroma, chromagram) = rayon::join(
            || extract_chroma(samples, sample_rate, config),
            || chroma_cqt(samples, sample_rate, config),
        );
        (chroma?, chromagram?)
    } else {
        progress(Stage::Chroma);
        let chroma = extract_chroma(samples, sample_rate, config)?;
        progress(Stage::Hpcp);
        (chroma, chroma_cqt(samples, sample_rate, config)?)
    };
    let hpcp = hpcp_profile(&cq_chromagram, config.smoothing_window)?;

    progress(Stage::Tonnetz);
    let tonnetz = tonnetz_profile(&cq_chromagram)?;
    log_profiles(&cq_chromagram, &chroma, &hpcp, &tonnetz);

    let templates = KeyTemplates::from_config(config);
    let matched = match_key(&chroma, &hpcp, &tonnetz, &templates)?;

    let processing_time_ms = start_time.elapsed().as_secs_f32() * 1000.0;
    log::debug!(
        "Key analysis complete: {} (score={:.4}) in {:.1} ms",
        matched.key,
        matched.score,
        processing_time_ms
    );

    Ok(KeyAnalysis {
        key: matched.key,
        score: matched.score,
        all_scores: matched.all_scores,
        chroma,
        hpcp,
        tonnetz,
        metadata: AnalysisMetadata {
            duration_seconds: buffer.duration_seconds(),
            sample_rate,
            source_sample_rate,
            processing_time_ms,
            algorithm_version: env!("CARGO_PKG_VERSION").to_string(),
            template_set: config.template_set,
            tonnetz_template: config.tonnetz_template,
            parallel_extraction: config.parallel_extraction,
        },
    })
}

fn log_profiles(
    chromagram: &Chromagram,
    chroma: &features::chroma::PitchClassProfile,
    hpcp: &features::chroma::PitchClassProfile,
    tonnetz: &features::chroma::PitchClassProfile,
) {
    log::debug!("Constant-Q chromagram: {} frames", chromagram.len());
    log::debug!("Chroma profile: {:?}", chroma.values());
    log::debug!("HPCP profile: {:?}", hpcp.values());
    log::debug!("Tonnetz profile: {:?}", tonnetz.values());
}
