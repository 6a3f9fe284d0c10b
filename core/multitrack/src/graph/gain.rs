use crate::constants::GAIN_RAMP_FRAMES;

/// Continuously controllable amplitude stage.
///
/// Setting the value only moves the target; rendering glides toward it over
/// [`GAIN_RAMP_FRAMES`] so automation at tick rate does not click.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainStage {
    target: f32,
    current: f32,
    /// per-frame increment toward `target`
    step: f32,
}

impl Default for GainStage {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl GainStage {
    pub const fn new(value: f32) -> Self {
        Self {
            target: value,
            current: value,
            step: 0.0,
        }
    }

    /// The control value, as last written.
    pub fn value(&self) -> f32 {
        self.target
    }

    pub fn set_value(&mut self, value: f32) {
        if value == self.target {
            return;
        }
        self.target = value;
        self.step = (self.target - self.current).abs() / GAIN_RAMP_FRAMES as f32;
    }

    /// Jumps straight to `value` with no ramp. Only for when nothing is
    /// sounding through the stage.
    pub fn set_value_immediate(&mut self, value: f32) {
        self.target = value;
        self.current = value;
        self.step = 0.0;
    }

    /// The gain applied to the most recently rendered frame.
    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn process(&mut self, block: &mut [(f32, f32)]) {
        for (l, r) in block.iter_mut() {
            if self.current != self.target {
                let delta = self.target - self.current;
                self.current = if delta.abs() <= self.step {
                    self.target
                } else {
                    self.current + self.step.copysign(delta)
                };
            }
            *l *= self.current;
            *r *= self.current;
        }
    }
}
