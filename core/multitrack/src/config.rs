use crate::constants::{COMMAND_QUEUE_CAPACITY, DEFAULT_SAMPLE_RATE};

/// Engine settings fixed when the render side is built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// rate of the shared clock, should match the output device
    pub sample_rate: f64,
    /// slots in the control-to-render command ring
    pub command_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            command_capacity: COMMAND_QUEUE_CAPACITY,
        }
    }
}

impl EngineConfig {
    pub fn with_sample_rate(mut self, sample_rate: f64) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_command_capacity(mut self, capacity: usize) -> Self {
        self.command_capacity = capacity.max(1);
        self
    }
}
