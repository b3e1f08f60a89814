//! Decoding raw buffers into audio assets

use crate::error::DecodeError;
use crate::types::AudioAsset;
use hound::{SampleFormat, WavReader};
use std::io::Cursor;
use tracing::debug;

/// Turns encoded bytes into a decoded [`AudioAsset`]
pub trait Decoder {
    fn decode(&self, bytes: &[u8]) -> Result<AudioAsset, DecodeError>;
}

/// RIFF/WAVE decoder
///
/// Integer PCM is normalised to `[-1.0, 1.0]`; 32-bit float PCM is passed
/// through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct WavDecoder;

impl Decoder for WavDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<AudioAsset, DecodeError> {
        let reader = WavReader::new(Cursor::new(bytes))?;
        let spec = reader.spec();

        let samples = match spec.sample_format {
            SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<Result<Vec<_>, _>>()?,
            SampleFormat::Int => {
                if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                    return Err(DecodeError::Unsupported(format!(
                        "{}-bit integer PCM",
                        spec.bits_per_sample
                    )));
                }
                let scale = 1.0 / (1_i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|sample| sample.map(|value| value as f32 * scale))
                    .collect::<Result<Vec<_>, _>>()?
            }
        };

        debug!(
            sample_rate = spec.sample_rate,
            channels = spec.channels,
            samples = samples.len(),
            "Decoded WAV buffer"
        );
        Ok(AudioAsset::from_interleaved(
            samples,
            spec.sample_rate,
            spec.channels,
        )?)
    }
}
