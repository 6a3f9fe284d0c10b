use std::{future::Future, io::Cursor};

use hound::{SampleFormat, WavReader};

use crate::{
    decoder::{DecodedBuffer, Decoder},
    error::DecodeError,
};

/// Decodes RIFF/WAVE bytes into a stereo [`DecodedBuffer`].
///
/// Supports:
/// - Mono and Stereo files (mono is duplicated into both channels)
/// - 8/16/24/32-bit integer or 32-bit float samples (converted to `f32`)
///
/// Does NOT support:
/// - More than 2 channels
/// - Resampling; the buffer keeps the file's sample rate
#[derive(Debug, Clone, Copy, Default)]
pub struct WavDecoder;

impl WavDecoder {
    pub fn new() -> Self {
        Self
    }

    pub fn decode_bytes(&self, bytes: &[u8]) -> Result<DecodedBuffer, DecodeError> {
        let reader =
            WavReader::new(Cursor::new(bytes)).map_err(|e| DecodeError::Malformed(e.to_string()))?;

        let spec = reader.spec();
        if spec.channels == 0 || spec.channels > 2 {
            return Err(DecodeError::UnsupportedChannels(spec.channels));
        }

        let raw_samples = Self::decode_pcm_samples(reader)?;
        let frames = Self::interleave_channels(raw_samples, usize::from(spec.channels));
        if frames.is_empty() {
            return Err(DecodeError::Empty);
        }

        Ok(DecodedBuffer::new(frames, spec.sample_rate))
    }

    fn decode_pcm_samples<R: std::io::Read>(reader: WavReader<R>) -> Result<Vec<f32>, DecodeError> {
        let spec = reader.spec();
        match (spec.sample_format, spec.bits_per_sample) {
            (SampleFormat::Int, bits @ 1..=32) => {
                let scale = (1_i64 << (bits - 1)) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| {
                        s.map(|v| v as f32 / scale)
                            .map_err(|e| DecodeError::Malformed(e.to_string()))
                    })
                    .collect()
            }
            (SampleFormat::Float, 32) => reader
                .into_samples::<f32>()
                .map(|s| s.map_err(|e| DecodeError::Malformed(e.to_string())))
                .collect(),
            (format, bits) => Err(DecodeError::UnsupportedFormat(format!(
                "{format:?} at {bits} bits"
            ))),
        }
    }

    /// Converts raw f32 samples into stereo `(L, R)` frames.
    /// Mono is duplicated into both channels.
    fn interleave_channels(samples: Vec<f32>, channels: usize) -> Vec<(f32, f32)> {
        if channels == 1 {
            samples.into_iter().map(|s| (s, s)).collect()
        } else {
            samples
                .chunks_exact(2)
                .map(|chunk| (chunk[0], chunk[1]))
                .collect()
        }
    }
}

impl Decoder for WavDecoder {
    fn decode(
        &self,
        bytes: Vec<u8>,
    ) -> impl Future<Output = Result<DecodedBuffer, DecodeError>> + Send {
        let decoder = *self;
        async move { decoder.decode_bytes(&bytes) }
    }
}
