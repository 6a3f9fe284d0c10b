use atomic_float::AtomicF32;
use std::sync::atomic::Ordering;

/// Stereo positioning stage, owned by the mixer and shared with its track.
///
/// -1.0 = Left, 0.0 = Center, 1.0 = Right. At centre both channels pass
/// through at unity.
#[derive(Debug, Default)]
pub struct PanStage {
    pan: AtomicF32,
}

impl PanStage {
    pub fn new(pan: f32) -> Self {
        Self {
            pan: AtomicF32::new(pan.clamp(-1.0, 1.0)),
        }
    }

    pub fn pan(&self) -> f32 {
        self.pan.load(Ordering::Relaxed)
    }

    pub fn set_pan(&self, pan: f32) {
        self.pan.store(pan.clamp(-1.0, 1.0), Ordering::Relaxed);
    }

    /// Left and right channel multipliers for the current pan.
    pub fn channel_gains(&self) -> (f32, f32) {
        let pan = self.pan();
        let pan_l = if pan < 0.0 { 1.0 } else { 1.0 - pan };
        let pan_r = if pan > 0.0 { 1.0 } else { 1.0 + pan };
        (pan_l, pan_r)
    }

    pub fn process(&self, block: &mut [(f32, f32)]) {
        let (pan_l, pan_r) = self.channel_gains();
        for (l, r) in block.iter_mut() {
            *l *= pan_l;
            *r *= pan_r;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pan_center_should_preserve_sample() {
        let pan = PanStage::default();
        let mut block = [(1.0, 1.0)];
        pan.process(&mut block);
        assert_eq!(block[0], (1.0, 1.0));
    }

    #[test]
    fn test_pan_left_should_output_left_only() {
        let pan = PanStage::new(-1.0);
        let mut block = [(1.0, 1.0)];
        pan.process(&mut block);
        assert_eq!(block[0], (1.0, 0.0));
    }

    #[test]
    fn test_pan_right_should_output_right_only() {
        let pan = PanStage::new(1.0);
        let mut block = [(1.0, 1.0)];
        pan.process(&mut block);
        assert_eq!(block[0], (0.0, 1.0));
    }

    #[test]
    fn test_pan_is_clamped() {
        let pan = PanStage::default();
        pan.set_pan(3.0);
        assert_eq!(pan.pan(), 1.0);
    }
}
