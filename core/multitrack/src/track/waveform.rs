use std::{collections::BTreeMap, fmt};

use crate::decoder::DecodedBuffer;

/// Visual waveform collaborator. Receives the decoded buffer once and then a
/// normalized cursor position on every engine tick.
pub trait Waveform: Send + fmt::Debug {
    fn configure(&mut self, options: &WaveformOptions);
    fn load_decoded_buffer(&mut self, buffer: &DecodedBuffer);
    /// `fraction` is `playhead / duration`, nominally in [0, 1].
    fn seek_to(&mut self, fraction: f64);
}

/// Display configuration handed to a waveform as-is.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WaveformOptions {
    /// user interaction with the waveform (click to seek etc.), off by default
    pub interact: bool,
    /// renderer specific keys, passed through untouched
    pub extra: BTreeMap<String, String>,
}

impl WaveformOptions {
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Converts a playhead time to the cursor fraction a waveform expects.
pub fn playhead_fraction(playhead_time: f64, duration: f64) -> f64 {
    if duration <= 0.0 {
        return 0.0;
    }
    playhead_time / duration
}

/// Minimal waveform that reduces the buffer to per-bin peaks and remembers the
/// cursor.
#[derive(Debug, Clone, Default)]
pub struct PeakWaveform {
    bins: usize,
    peaks: Vec<f32>,
    cursor: f64,
    options: WaveformOptions,
}

impl PeakWaveform {
    pub fn new(bins: usize) -> Self {
        Self {
            bins: bins.max(1),
            ..Self::default()
        }
    }

    pub fn peaks(&self) -> &[f32] {
        &self.peaks
    }

    pub fn cursor(&self) -> f64 {
        self.cursor
    }

    /// Bin under the cursor, clamped to the last bin at the buffer end.
    pub fn cursor_bin(&self) -> Option<usize> {
        if self.peaks.is_empty() {
            return None;
        }
        let bin = (self.cursor.max(0.0) * self.peaks.len() as f64) as usize;
        Some(bin.min(self.peaks.len() - 1))
    }

    pub fn options(&self) -> &WaveformOptions {
        &self.options
    }
}

impl Waveform for PeakWaveform {
    fn configure(&mut self, options: &WaveformOptions) {
        self.options = options.clone();
    }

    fn load_decoded_buffer(&mut self, buffer: &DecodedBuffer) {
        let frames = buffer.frames();
        let chunk = frames.len().div_ceil(self.bins).max(1);
        self.peaks = frames
            .chunks(chunk)
            .map(|c| c.iter().fold(0.0f32, |acc, (l, r)| acc.max(l.abs()).max(r.abs())))
            .collect();
        self.cursor = 0.0;
    }

    fn seek_to(&mut self, fraction: f64) {
        self.cursor = fraction;
    }
}
