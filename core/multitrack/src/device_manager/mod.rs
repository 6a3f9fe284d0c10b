use thiserror::Error;

pub mod cpal_dm;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AudioDeviceError {
    #[error("no default output device")]
    DeviceNotFound,
    #[error("failed to query output config: {0}")]
    ConfigUnavailable(String),
    #[error("failed to build output stream: {0}")]
    StreamBuildFailed(String),
    #[error("failed to start output stream: {0}")]
    StreamStartFailed(String),
}

/// Interleaved output buffer in the device's native sample format.
#[derive(Debug)]
pub enum AudioSourceBufferKind<'a> {
    F32(&'a mut [f32]),
    I16(&'a mut [i16]),
    U16(&'a mut [u16]),
}

impl AudioSourceBufferKind<'_> {
    /// Number of samples across all channels.
    pub fn len(&self) -> usize {
        match self {
            Self::F32(data) => data.len(),
            Self::I16(data) => data.len(),
            Self::U16(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Something the output device can pull interleaved frames from.
pub trait AudioSource: Send {
    fn fill_buffer(&mut self, buffer: AudioSourceBufferKind<'_>, channels: usize);
}

pub trait AudioDeviceManager {
    /// Rate the default output device will run at.
    fn output_sample_rate(&self) -> Result<f64, AudioDeviceError>;

    fn start_output_stream(
        &mut self,
        audio_source: Box<dyn AudioSource>,
    ) -> Result<(), AudioDeviceError>;
}
