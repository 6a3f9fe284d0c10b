pub mod clock;
pub mod playhead;

pub use clock::{AudioClock, SampleClock};
pub use playhead::Playhead;
