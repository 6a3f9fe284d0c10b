use crate::{decoder::DecodedBuffer, error::SourceError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceState {
    /// Created and bound to a buffer, never started.
    Idle,
    Scheduled {
        start_frame: u64,
        offset_frame: u64,
        stop_frame: Option<u64>,
    },
    /// Stopped before it was ever started. Can never sound.
    Inert,
}

/// One-shot playback handle over a decoded buffer.
///
/// A source is started at most once. After a stop it stays allocated but
/// silent; playing again means building a new source.
#[derive(Debug)]
pub struct BufferSource {
    buffer: DecodedBuffer,
    state: SourceState,
}

impl BufferSource {
    pub fn new(buffer: DecodedBuffer) -> Self {
        Self {
            buffer,
            state: SourceState::Idle,
        }
    }

    /// Schedules playback of the buffer from `offset_frame` beginning at clock
    /// frame `when_frame`.
    pub fn start(&mut self, when_frame: u64, offset_frame: u64) -> Result<(), SourceError> {
        match self.state {
            SourceState::Idle => {
                self.state = SourceState::Scheduled {
                    start_frame: when_frame,
                    offset_frame,
                    stop_frame: None,
                };
                Ok(())
            }
            SourceState::Scheduled { .. } => Err(SourceError::AlreadyStarted),
            SourceState::Inert => Err(SourceError::Inert),
        }
    }

    /// Schedules the end of playback at `when_frame`.
    ///
    /// Stopping an unstarted source leaves it inert. Stopping twice keeps the
    /// earlier stop frame.
    pub fn stop(&mut self, when_frame: u64) {
        if let SourceState::Scheduled { stop_frame, .. } = &mut self.state {
            *stop_frame = Some(stop_frame.map_or(when_frame, |f| f.min(when_frame)));
        } else {
            self.state = SourceState::Inert;
        }
    }

    pub fn is_stopped(&self) -> bool {
        match self.state {
            SourceState::Idle => false,
            SourceState::Scheduled { stop_frame, .. } => stop_frame.is_some(),
            SourceState::Inert => true,
        }
    }

    /// Frame at which this source falls silent for good, if known.
    fn end_frame(&self) -> Option<u64> {
        match self.state {
            SourceState::Idle => None,
            SourceState::Scheduled {
                start_frame,
                offset_frame,
                stop_frame,
            } => {
                let remaining = (self.buffer.frame_count() as u64).saturating_sub(offset_frame);
                let natural_end = start_frame.saturating_add(remaining);
                Some(stop_frame.map_or(natural_end, |stop| stop.min(natural_end)))
            }
            SourceState::Inert => Some(0),
        }
    }

    /// Whether nothing more will be heard from this source at or after `frame`.
    pub fn is_finished(&self, frame: u64) -> bool {
        self.end_frame().is_some_and(|end| frame >= end)
    }

    pub fn is_audible_at(&self, frame: u64) -> bool {
        match self.state {
            SourceState::Scheduled { start_frame, .. } => {
                frame >= start_frame && !self.is_finished(frame)
            }
            _ => false,
        }
    }

    /// Adds the frames of this source that fall inside the block starting at
    /// `block_start` into `out`.
    pub fn render_into(&self, block_start: u64, out: &mut [(f32, f32)]) {
        let SourceState::Scheduled {
            start_frame,
            offset_frame,
            ..
        } = self.state
        else {
            return;
        };
        let Some(end_frame) = self.end_frame() else {
            return;
        };

        let block_end = block_start.saturating_add(out.len() as u64);
        let begin = block_start.max(start_frame);
        let end = block_end.min(end_frame);
        if begin >= end {
            return;
        }

        let frames = self.buffer.frames();
        for frame in begin..end {
            let (l, r) = frames[(offset_frame + frame - start_frame) as usize];
            let slot = &mut out[(frame - block_start) as usize];
            slot.0 += l;
            slot.1 += r;
        }
    }
}
