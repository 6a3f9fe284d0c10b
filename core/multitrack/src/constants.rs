/// Tolerance used when comparing rendered samples.
pub const AUDIO_SAMPLE_EPSILON: f32 = 1e-6;

pub const DEFAULT_SAMPLE_RATE: f64 = 44100.0;

/// Frames over which a gain change is ramped to avoid zipper noise.
pub const GAIN_RAMP_FRAMES: usize = 64;

/// Capacity of the control-to-render command ring.
pub const COMMAND_QUEUE_CAPACITY: usize = 256;

/// Unity baseline around which track and per-track gains combine.
pub const UNITY_GAIN: f32 = 1.0;
