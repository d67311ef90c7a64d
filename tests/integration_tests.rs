//! Integration tests for key analysis

use std::f32::consts::PI;
use std::path::Path;

use stratum_key::{
    analyze_audio, analyze_file, analyze_file_with_progress, AnalysisConfig, AnalysisError, Key,
    Stage, TemplateSet,
};

/// MIDI note number to frequency in Hz
fn midi_hz(note: u32) -> f32 {
    440.0 * 2f32.powf((note as f32 - 69.0) / 12.0)
}

/// Equal-amplitude sum of sines, one per MIDI note
fn chord(notes: &[u32], sample_rate: u32, seconds: f32) -> Vec<f32> {
    let freqs: Vec<f32> = notes.iter().map(|&n| midi_hz(n)).collect();
    (0..(sample_rate as f32 * seconds) as usize)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            freqs.iter().map(|f| 0.2 * (2.0 * PI * f * t).sin()).sum::<f32>()
        })
        .collect()
}

/// C4 E4 G4 with the octave above
const C_MAJOR_TRIAD: [u32; 6] = [60, 64, 67, 72, 76, 79];
/// A4 C5 E5 with the octave above
const A_MINOR_TRIAD: [u32; 6] = [69, 72, 76, 81, 84, 88];

fn write_wav(path: &Path, samples: &[f32], sample_rate: u32, channels: u16) {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).expect("create wav");
    for &s in samples {
        // Half gain keeps a six-voice chord clear of clipping
        let value = (0.5 * s).clamp(-1.0, 1.0) * i16::MAX as f32;
        let value = value as i16;
        for _ in 0..channels {
            writer.write_sample(value).expect("write sample");
        }
    }
    writer.finalize().expect("finalize wav");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_c_major_triad() {
        let samples = chord(&C_MAJOR_TRIAD, 22050, 3.0);
        let result = analyze_audio(&samples, 22050, AnalysisConfig::default())
            .expect("Analysis should succeed");

        assert_eq!(result.key, Key::Major(0), "got {}", result.key);
        assert_eq!(result.key.to_string(), "C major");
        assert!(result.score > 0.5 && result.score <= 1.0);
        assert_eq!(result.all_scores.len(), 24);
        assert!((result.metadata.duration_seconds - 3.0).abs() < 0.01);
        assert_eq!(result.metadata.sample_rate, 22050);
    }

    #[test]
    fn test_a_minor_triad() {
        let samples = chord(&A_MINOR_TRIAD, 22050, 3.0);
        let result = analyze_audio(&samples, 22050, AnalysisConfig::default())
            .expect("Analysis should succeed");

        assert_eq!(result.key, Key::Minor(9), "got {}", result.key);
        assert_eq!(result.key.to_string(), "A minor");

        // No near-tie with the runner-up
        let ranked = result.ranked();
        assert_eq!(ranked[0].0, Key::Minor(9));
        assert!(ranked[0].1 - ranked[1].1 > 0.1);
    }

    #[test]
    fn test_template_sets_agree_on_triads() {
        for set in [TemplateSet::KrumhanslKessler, TemplateSet::Diatonic] {
            let config = AnalysisConfig {
                template_set: set,
                ..AnalysisConfig::default()
            };
            let samples = chord(&A_MINOR_TRIAD, 22050, 2.0);
            let result = analyze_audio(&samples, 22050, config).unwrap();
            assert_eq!(result.key, Key::Minor(9), "{:?} gave {}", set, result.key);
        }
    }

    #[test]
    fn test_profiles_reflect_chord_tones() {
        let samples = chord(&C_MAJOR_TRIAD, 22050, 2.0);
        let result = analyze_audio(&samples, 22050, AnalysisConfig::default()).unwrap();

        assert_eq!(result.chroma.values().len(), 12);
        assert_eq!(result.hpcp.values().len(), 12);
        assert_eq!(result.tonnetz.values().len(), 6);

        // Chord tones outweigh A#, which is a semitone or more from each of them
        for profile in [&result.chroma, &result.hpcp] {
            let v = profile.values();
            assert!(v[0] > v[10] && v[4] > v[10] && v[7] > v[10]);
        }
    }

    #[test]
    fn test_sequential_extraction_matches_parallel() {
        let samples = chord(&C_MAJOR_TRIAD, 22050, 2.0);
        let parallel = analyze_audio(&samples, 22050, AnalysisConfig::default()).unwrap();
        let sequential = analyze_audio(
            &samples,
            22050,
            AnalysisConfig {
                parallel_extraction: false,
                ..AnalysisConfig::default()
            },
        )
        .unwrap();

        assert_eq!(parallel.key, sequential.key);
        assert_eq!(parallel.chroma, sequential.chroma);
        assert_eq!(parallel.hpcp, sequential.hpcp);
        assert_eq!(parallel.tonnetz, sequential.tonnetz);
    }

    #[test]
    fn test_analyze_file_stereo_44k() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("a_minor.wav");
        write_wav(&input, &chord(&A_MINOR_TRIAD, 44100, 2.5), 44100, 2);

        let work = tempfile::tempdir().unwrap();
        let config = AnalysisConfig {
            intermediate_dir: Some(work.path().to_path_buf()),
            ..AnalysisConfig::default()
        };

        let mut stages = Vec::new();
        let result = analyze_file_with_progress(&input, config, &mut |s| stages.push(s))
            .expect("Analysis should succeed");

        assert_eq!(result.key, Key::Minor(9), "got {}", result.key);
        assert_eq!(result.metadata.source_sample_rate, 44100);
        assert_eq!(result.metadata.sample_rate, 22050);
        assert_eq!(
            stages,
            vec![
                Stage::Converting,
                Stage::Loading,
                Stage::Separating,
                Stage::Chroma,
                Stage::Hpcp,
                Stage::Tonnetz
            ]
        );

        // Intermediate file is gone
        assert_eq!(std::fs::read_dir(work.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_silent_file_is_rejected_and_cleaned_up() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("silence.wav");
        write_wav(&input, &vec![0.0; 22050], 22050, 1);

        let work = tempfile::tempdir().unwrap();
        let config = AnalysisConfig {
            intermediate_dir: Some(work.path().to_path_buf()),
            ..AnalysisConfig::default()
        };

        let result = analyze_file(&input, config);
        assert!(matches!(result, Err(AnalysisError::InvalidInput(_))));
        assert_eq!(std::fs::read_dir(work.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_file() {
        let result = analyze_file("/no/such/dir/track.mp3", AnalysisConfig::default());
        assert!(matches!(result, Err(AnalysisError::DecodingError(_))));
    }

    #[test]
    fn test_result_serializes_to_json() {
        let samples = chord(&C_MAJOR_TRIAD, 22050, 1.0);
        let result = analyze_audio(&samples, 22050, AnalysisConfig::default()).unwrap();
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"all_scores\""));
        assert!(json.contains("\"Temperley\""));
    }
}
