use std::{fmt, sync::Arc};

use cpal::Sample as _;
use log::error;
use rtrb::RingBuffer;
use transport::{AudioClock, Playhead, SampleClock};

use crate::{
    device_manager::{AudioSource, AudioSourceBufferKind},
    error::TrackError,
    mixer::Mixer,
    scheduler::command::{
        SchedulerCommand, SchedulerCommandConsumer, SchedulerCommandProducer, TrackCommand,
    },
};

pub mod command;

/// Render-side owner of the mix.
///
/// Drains control commands, pushes gain and playhead into the tracks, renders
/// one block and advances the shared clock. Everything happens on the thread
/// that calls [`Scheduler::next_samples`], so track state is never touched
/// concurrently.
pub struct Scheduler {
    mixer: Mixer,
    clock: Arc<SampleClock>,
    /// caller-held resume position for the whole transport
    playhead: Playhead,
    commands: SchedulerCommandConsumer,
    block: Vec<(f32, f32)>,
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("mixer", &self.mixer)
            .field("clock", &self.clock)
            .field("playhead", &self.playhead)
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    pub fn new(mixer: Mixer, clock: Arc<SampleClock>, consumer: SchedulerCommandConsumer) -> Self {
        Self {
            mixer,
            clock,
            playhead: Playhead::new(),
            commands: consumer,
            block: Vec::new(),
        }
    }

    /// Builds a scheduler together with the producer end of its command ring.
    pub fn with_channel(
        mixer: Mixer,
        clock: Arc<SampleClock>,
        capacity: usize,
    ) -> (Self, SchedulerCommandProducer) {
        let (producer, consumer) = RingBuffer::new(capacity);
        (Self::new(mixer, clock, consumer), producer)
    }

    pub fn process_command(&mut self, cmd: SchedulerCommand) -> Result<(), TrackError> {
        match cmd {
            SchedulerCommand::PlayAll { when, offset } => {
                self.mixer.play_all(when, offset)?;
                self.playhead.play(when, offset);
            }
            SchedulerCommand::Resume { when } => {
                let offset = self.playhead.offset();
                self.mixer.play_all(when, offset)?;
                self.playhead.play(when, offset);
            }
            SchedulerCommand::PauseAll { when } => {
                self.mixer.pause_all(when)?;
                let at = when.unwrap_or_else(|| self.clock.current_time());
                self.playhead.pause(at);
            }
            SchedulerCommand::StopAll { when } => {
                self.mixer.stop_all(when)?;
                self.playhead.stop();
            }
            SchedulerCommand::Track { target_id, command } => {
                let track = self.mixer.track_mut(&target_id)?;
                match command {
                    TrackCommand::Play { when, offset } => track.play(when, offset)?,
                    TrackCommand::Pause { when } => track.pause(when)?,
                    TrackCommand::Stop { when } => track.stop(when)?,
                }
            }
            SchedulerCommand::SetSolo(solo) => self.mixer.set_solo(solo),
            SchedulerCommand::SetMasterGain(gain) => self.mixer.set_track_gain(gain),
            SchedulerCommand::SetTrackGain { target_id, gain } => {
                self.mixer.track_mut(&target_id)?.set_gain_value(gain);
            }
            SchedulerCommand::SetActive { target_id, active } => {
                self.mixer.track_mut(&target_id)?.set_active(active);
            }
            SchedulerCommand::SetPan { target_id, pan } => {
                self.mixer.track(&target_id)?.pan_stage().set_pan(pan);
            }
        }
        Ok(())
    }

    pub fn next_samples(&mut self, frame_size: usize) -> Vec<(f32, f32)> {
        let mut buffer = vec![(0.0f32, 0.0f32); frame_size];
        self.fill_next_samples(&mut buffer);
        buffer
    }

    pub fn fill_next_samples(&mut self, buffer: &mut [(f32, f32)]) {
        while let Ok(cmd) = self.commands.pop() {
            if let Err(e) = self.process_command(cmd) {
                error!("scheduler command failed: {e}");
            }
        }

        if !self.clock.is_running() {
            buffer.fill((0.0, 0.0));
            return;
        }

        let position = self.playhead.position(self.clock.current_time());
        if let Err(e) = self.mixer.tick(position) {
            error!("mixer tick failed: {e}");
        }

        let block_start = self.clock.current_frame();
        self.mixer.mix_into(block_start, buffer);

        // Advance the shared clock by the number of frames rendered
        self.clock.advance_by(buffer.len() as u64);
    }

    pub fn mixer(&self) -> &Mixer {
        &self.mixer
    }

    pub fn playhead(&self) -> &Playhead {
        &self.playhead
    }

    pub fn clock(&self) -> &Arc<SampleClock> {
        &self.clock
    }

    fn fill_sample<T>(data: &mut [T], channels: usize, samples: &[(f32, f32)])
    where
        T: cpal::FromSample<f32>,
    {
        for (frame, &(l, r)) in data.chunks_mut(channels).zip(samples.iter()) {
            match frame {
                [mono] => *mono = ((l + r) * 0.5).to_sample::<T>(),
                [left, right, rest @ ..] => {
                    *left = l.to_sample::<T>();
                    *right = r.to_sample::<T>();
                    for extra in rest {
                        *extra = 0.0f32.to_sample::<T>();
                    }
                }
                [] => {}
            }
        }
    }
}

impl AudioSource for Scheduler {
    fn fill_buffer(&mut self, buffer: AudioSourceBufferKind<'_>, channels: usize) {
        let channels = channels.max(1);
        let frame_size = buffer.len() / channels;

        let mut block = std::mem::take(&mut self.block);
        block.resize(frame_size, (0.0, 0.0));
        self.fill_next_samples(&mut block[..frame_size]);

        match buffer {
            AudioSourceBufferKind::F32(data) => Self::fill_sample(data, channels, &block),
            AudioSourceBufferKind::I16(data) => Self::fill_sample(data, channels, &block),
            AudioSourceBufferKind::U16(data) => Self::fill_sample(data, channels, &block),
        }

        self.block = block;
    }
}
