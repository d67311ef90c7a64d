//! Scoped intermediate WAV file
//!
//! Compressed input is transcoded once to a mono float WAV, analysis loads
//! from that file, and the file is removed when the guard is closed or
//! dropped, on success and error paths alike.

use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::decoder::decode_file;
use super::sample_buffer::SampleBuffer;
use crate::error::AnalysisError;
use crate::preprocessing::channel_mixer::downmix;

/// Intermediate WAV file removed on close or drop
#[derive(Debug)]
pub struct IntermediateWav {
    path: PathBuf,
    file: Option<NamedTempFile>,
}

impl IntermediateWav {
    /// Create an empty, uniquely named `stratum-key-*.wav` file
    ///
    /// # Arguments
    ///
    /// * `dir` - Directory to create the file in (`None` = system temp dir)
    pub fn create(dir: Option<&Path>) -> Result<Self, AnalysisError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("stratum-key-").suffix(".wav");
        let file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        let path = file.path().to_path_buf();
        log::debug!("Created intermediate file: {}", path.display());
        Ok(Self {
            path,
            file: Some(file),
        })
    }

    /// Decode `input`, downmix to mono and write it as a 32-bit float WAV
    ///
    /// # Errors
    ///
    /// Decoding errors from the input file, or `ProcessingError` if the WAV
    /// cannot be written. A partially written file is still removed.
    pub fn transcode(input: &Path, dir: Option<&Path>) -> Result<Self, AnalysisError> {
        let decoded = decode_file(input)?;
        let mono = downmix(&decoded.samples, decoded.channels)?;

        let wav = Self::create(dir)?;
        wav.write(&mono, decoded.sample_rate)?;
        Ok(wav)
    }

    /// Path of the intermediate file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, samples: &[f32], sample_rate: u32) -> Result<(), AnalysisError> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(&self.path, spec)?;
        for &s in samples {
            writer.write_sample(s)?;
        }
        writer.finalize()?;
        Ok(())
    }

    /// Read the intermediate file back as a mono buffer
    pub fn load(&self) -> Result<SampleBuffer, AnalysisError> {
        let mut reader = hound::WavReader::open(&self.path)?;
        let spec = reader.spec();

        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
            hound::SampleFormat::Int => {
                let max_value = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|s| s as f32 / max_value))
                    .collect::<Result<Vec<_>, _>>()?
            }
        };
        let mono = downmix(&samples, spec.channels as usize)?;
        SampleBuffer::new(mono, spec.sample_rate)
    }

    /// Remove the file now
    pub fn close(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        if let Some(file) = self.file.take() {
            match file.close() {
                Ok(()) => log::info!("Deleted temporary file: {}", self.path.display()),
                Err(e) => log::warn!(
                    "Failed to delete temporary file {}: {}",
                    self.path.display(),
                    e
                ),
            }
        }
    }
}

impl Drop for IntermediateWav {
    fn drop(&mut self) {
        self.remove();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_int_wav(path: &Path, samples: &[i16], sample_rate: u32) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_transcode_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.wav");
        write_int_wav(&input, &[0, 8192, -8192, 16384], 11025);

        let work = tempfile::tempdir().unwrap();
        let wav = IntermediateWav::transcode(&input, Some(work.path())).unwrap();
        assert!(wav.path().exists());
        assert!(wav
            .path()
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with("stratum-key-") && n.ends_with(".wav"))
            .unwrap_or(false));

        let buffer = wav.load().unwrap();
        assert_eq!(buffer.sample_rate(), 11025);
        assert_eq!(buffer.len(), 4);
        assert!((buffer.samples()[1] - 0.25).abs() < 1e-3);
        assert!((buffer.samples()[3] - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_removed_on_close_and_drop() {
        let work = tempfile::tempdir().unwrap();

        let wav = IntermediateWav::create(Some(work.path())).unwrap();
        let path = wav.path().to_path_buf();
        assert!(path.exists());
        wav.close();
        assert!(!path.exists());

        let path = {
            let wav = IntermediateWav::create(Some(work.path())).unwrap();
            wav.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_unique_names() {
        let work = tempfile::tempdir().unwrap();
        let a = IntermediateWav::create(Some(work.path())).unwrap();
        let b = IntermediateWav::create(Some(work.path())).unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn test_failed_transcode_leaves_nothing() {
        let work = tempfile::tempdir().unwrap();
        let result = IntermediateWav::transcode(Path::new("/no/such/input.mp3"), Some(work.path()));
        assert!(result.is_err());
        assert_eq!(std::fs::read_dir(work.path()).unwrap().count(), 0);
    }
}
