use rtrb::{Consumer, Producer};

use crate::track::TrackId;

/// Scheduling primitive addressed to a single track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackCommand {
    Play { when: f64, offset: f64 },
    Pause { when: Option<f64> },
    Stop { when: Option<f64> },
}

/// Control messages sent to the render side. Applied in order, one track
/// mutation at a time, at the start of the next block.
#[derive(Debug, Clone, PartialEq)]
pub enum SchedulerCommand {
    /// Start every track at `when` from `offset` seconds.
    PlayAll { when: f64, offset: f64 },
    /// Start every track at `when` from where the last pause left off.
    Resume { when: f64 },
    PauseAll { when: Option<f64> },
    StopAll { when: Option<f64> },
    Track {
        target_id: TrackId,
        command: TrackCommand,
    },
    SetSolo(Option<TrackId>),
    /// Gain pushed into every track on each tick.
    SetMasterGain(f32),
    SetTrackGain {
        target_id: TrackId,
        gain: f32,
    },
    SetActive {
        target_id: TrackId,
        active: bool,
    },
    SetPan {
        target_id: TrackId,
        pan: f32,
    },
}

pub type SchedulerCommandConsumer = Consumer<SchedulerCommand>;
pub type SchedulerCommandProducer = Producer<SchedulerCommand>;
