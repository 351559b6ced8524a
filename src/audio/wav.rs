//! In-memory WAV encoding using hound
//!
//! Recordings are uploaded as 16-bit PCM mono; synthesized speech may arrive in
//! any PCM layout and is mixed down to mono f32 for playback.

use super::AudioError;
use crate::models::RecordedAudio;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::io::Cursor;

/// Encode mono f32 samples into a WAV blob
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<RecordedAudio, AudioError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for &sample in samples {
            let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer.write_sample(value)?;
        }
        writer.finalize()?;
    }

    Ok(RecordedAudio {
        bytes: cursor.into_inner(),
        sample_rate,
        duration_seconds: duration_seconds(samples.len(), sample_rate),
    })
}

/// Decode a WAV blob into mono f32 samples
///
/// Returns the samples and sample rate
pub fn decode_wav(bytes: &[u8]) -> Result<(Vec<f32>, u32), AudioError> {
    let reader = WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.into_samples::<f32>().collect::<Result<_, _>>()?,
        SampleFormat::Int => {
            // Convert integer samples to float
            let max_value = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_value))
                .collect::<Result<_, _>>()?
        }
    };

    let mono = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    };

    Ok((mono, spec.sample_rate))
}

/// Get duration of samples in seconds
pub fn duration_seconds(sample_count: usize, sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }
    sample_count as f64 / sample_rate as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_calculation() {
        assert_eq!(duration_seconds(16000, 16000), 1.0);
        assert_eq!(duration_seconds(32000, 16000), 2.0);
        assert_eq!(duration_seconds(8000, 16000), 0.5);
        assert_eq!(duration_seconds(8000, 0), 0.0);
    }

    #[test]
    fn test_encoded_recording_is_playable() {
        let samples: Vec<f32> = (0..4800).map(|i| ((i as f32) * 0.01).sin() * 0.5).collect();
        let audio = encode_wav(&samples, 48000).unwrap();

        assert_eq!(&audio.bytes[0..4], b"RIFF");
        assert_eq!(audio.sample_rate, 48000);
        assert!((audio.duration_seconds - 0.1).abs() < 1e-9);

        let (decoded, rate) = decode_wav(&audio.bytes).unwrap();
        assert_eq!(rate, 48000);
        assert_eq!(decoded.len(), samples.len());
        assert!((decoded[100] - samples[100]).abs() < 1e-3);
    }

    #[test]
    fn test_decode_mixes_stereo_to_mono() {
        let spec = WavSpec {
            channels: 2,
            sample_rate: 22050,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
            for _ in 0..10 {
                writer.write_sample(0.2f32).unwrap();
                writer.write_sample(0.6f32).unwrap();
            }
            writer.finalize().unwrap();
        }

        let (mono, rate) = decode_wav(&cursor.into_inner()).unwrap();
        assert_eq!(rate, 22050);
        assert_eq!(mono.len(), 10);
        assert!((mono[0] - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_wav(b"definitely not audio").is_err());
    }
}
