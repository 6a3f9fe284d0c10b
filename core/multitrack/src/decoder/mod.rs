use std::{future::Future, sync::Arc};

use crate::error::DecodeError;

pub mod wav;

pub use wav::WavDecoder;

/// External decode service: turns raw encoded bytes into a [`DecodedBuffer`].
///
/// Decoding is the only suspension point in a track's lifecycle. One decode is
/// expected in flight per track; callers serialize `init` calls.
pub trait Decoder {
    fn decode(
        &self,
        bytes: Vec<u8>,
    ) -> impl Future<Output = Result<DecodedBuffer, DecodeError>> + Send;
}

/// Immutable stereo PCM. Cloning shares the same frames.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedBuffer {
    frames: Arc<[(f32, f32)]>,
    sample_rate: u32,
}

impl DecodedBuffer {
    pub fn new(frames: Vec<(f32, f32)>, sample_rate: u32) -> Self {
        Self {
            frames: frames.into(),
            sample_rate,
        }
    }

    pub fn frames(&self) -> &[(f32, f32)] {
        &self.frames
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Length in seconds.
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames.len() as f64 / f64::from(self.sample_rate)
    }

    /// Frame index for a position in seconds, negative positions clamp to 0.
    pub fn frame_at(&self, seconds: f64) -> u64 {
        (seconds.max(0.0) * f64::from(self.sample_rate)).round() as u64
    }
}
