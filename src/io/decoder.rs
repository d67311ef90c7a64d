//! Audio decoding using Symphonia

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer as InterleavedBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::sample_buffer::SampleBuffer;
use crate::error::AnalysisError;
use crate::preprocessing::channel_mixer::downmix;

/// Decoded audio before downmixing
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// Interleaved samples in [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of interleaved channels
    pub channels: usize,
}

impl DecodedAudio {
    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels
        }
    }

    /// Average channels into a mono `SampleBuffer`
    pub fn to_mono(&self) -> Result<SampleBuffer, AnalysisError> {
        SampleBuffer::new(downmix(&self.samples, self.channels)?, self.sample_rate)
    }
}

/// Decode an audio file to interleaved f32 samples
///
/// The container is probed with the file extension as a hint and the first
/// track with a known codec is decoded. Packets that fail to decode are
/// skipped with a warning.
///
/// # Arguments
///
/// * `path` - Path to audio file (any format Symphonia supports: WAV, MP3, FLAC, OGG, AAC, ...)
///
/// # Returns
///
/// Interleaved samples with their sample rate and channel count
///
/// # Errors
///
/// Returns `AnalysisError::DecodingError` if the file cannot be opened, the
/// format is not recognized, no audio track exists, or nothing decodes.
pub fn decode_file(path: &Path) -> Result<DecodedAudio, AnalysisError> {
    log::debug!("Decoding audio file: {}", path.display());

    let src = File::open(path).map_err(|e| {
        AnalysisError::DecodingError(format!("Cannot open {}: {}", path.display(), e))
    })?;
    let mss = MediaSourceStream::new(Box::new(src), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AnalysisError::DecodingError("No supported audio tracks found".to_string()))?;

    let track_id = track.id;
    let sample_rate = track.codec_params.sample_rate.ok_or_else(|| {
        AnalysisError::DecodingError("Audio track has no sample rate".to_string())
    })?;
    let mut channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(0);

    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut samples: Vec<f32> = Vec::new();
    let mut skipped = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                channels = spec.channels.count();
                let mut buf = InterleavedBuffer::<f32>::new(decoded.capacity() as u64, spec);
                buf.copy_interleaved_ref(decoded);
                samples.extend_from_slice(buf.samples());
            }
            Err(SymphoniaError::DecodeError(msg)) => {
                skipped += 1;
                log::warn!("Skipping undecodable packet in {}: {}", path.display(), msg);
            }
            Err(SymphoniaError::IoError(e)) => {
                skipped += 1;
                log::warn!("I/O error in packet of {}: {}", path.display(), e);
            }
            Err(e) => return Err(e.into()),
        }
    }

    if samples.is_empty() || channels == 0 {
        return Err(AnalysisError::DecodingError(format!(
            "No audio decoded from {}",
            path.display()
        )));
    }

    log::debug!(
        "Decoded {} frames at {} Hz, {} channel(s), {} packet(s) skipped",
        samples.len() / channels,
        sample_rate,
        channels,
        skipped
    );

    Ok(DecodedAudio {
        samples,
        sample_rate,
        channels,
    })
}

/// Decode an audio file straight to a mono `SampleBuffer`
pub fn decode_mono(path: &Path) -> Result<SampleBuffer, AnalysisError> {
    decode_file(path)?.to_mono()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_stereo_wav(path: &Path, frames: usize) {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for _ in 0..frames {
            writer.write_sample(16384i16).unwrap();
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_decode_stereo_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        write_stereo_wav(&path, 800);

        let decoded = decode_file(&path).unwrap();
        assert_eq!(decoded.sample_rate, 8000);
        assert_eq!(decoded.channels, 2);
        assert_eq!(decoded.frames(), 800);

        let mono = decoded.to_mono().unwrap();
        assert_eq!(mono.len(), 800);
        assert!((mono.samples()[10] - 0.25).abs() < 1e-3);
    }

    #[test]
    fn test_missing_file() {
        let result = decode_file(Path::new("/definitely/not/here.wav"));
        assert!(matches!(result, Err(AnalysisError::DecodingError(_))));
    }

    #[test]
    fn test_garbage_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noise.mp3");
        std::fs::write(&path, b"this is not audio at all").unwrap();
        assert!(decode_file(&path).is_err());
    }
}
