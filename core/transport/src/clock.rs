use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Shared time base every track schedules against.
///
/// Times are seconds on the clock's own timeline, monotonically increasing
/// while the clock runs.
pub trait AudioClock: Send + Sync {
    /// Current position of the clock in seconds.
    fn current_time(&self) -> f64;

    fn sample_rate(&self) -> f64;

    /// Frame index at which `seconds` falls, rounded to the nearest frame.
    /// Negative times map to frame 0.
    fn frame_at(&self, seconds: f64) -> u64 {
        (seconds * self.sample_rate()).round().max(0.0) as u64
    }

    /// Frame index the clock is currently sitting on.
    fn current_frame(&self) -> u64 {
        self.frame_at(self.current_time())
    }
}

/// Frame-counting clock advanced by the render callback.
///
/// Counters are atomics so a single clock can be held by the engine and by
/// every track through an `Arc` without locking.
#[derive(Debug)]
pub struct SampleClock {
    sample_rate: f64,
    frame_position: AtomicU64,
    running: AtomicBool,
}

impl SampleClock {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            frame_position: AtomicU64::new(0),
            running: AtomicBool::new(true),
        }
    }

    /// Moves the clock forward by `frames`. Returns `false` when stopped.
    pub fn advance_by(&self, frames: u64) -> bool {
        if !self.running.load(Ordering::Acquire) {
            return false;
        }

        self.frame_position.fetch_add(frames, Ordering::AcqRel);
        true
    }

    pub fn position_frames(&self) -> u64 {
        self.frame_position.load(Ordering::Acquire)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn start(&self) {
        self.running.store(true, Ordering::Release);
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn reset(&self) {
        self.frame_position.store(0, Ordering::Release);
    }
}

impl AudioClock for SampleClock {
    fn current_time(&self) -> f64 {
        self.position_frames() as f64 / self.sample_rate
    }

    fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    fn current_frame(&self) -> u64 {
        self.position_frames()
    }
}
