use log::debug;

use crate::{
    error::TrackError,
    track::{Track, TrackId},
};

/// Holds the tracks of a session together with the engine-wide solo
/// selection and track gain.
/// Produces interleaved stereo output ([f32])
#[derive(Debug)]
pub struct Mixer {
    tracks: Vec<Track>,
    /// at most one soloed track
    solo: Option<TrackId>,
    /// gain pushed into every track on each tick
    track_gain: f32,
    mix_buffer: Vec<(f32, f32)>,
    track_buffer: Vec<(f32, f32)>,
}

impl Default for Mixer {
    fn default() -> Self {
        Self::new()
    }
}

impl Mixer {
    pub fn new() -> Self {
        Self {
            tracks: Vec::new(),
            solo: None,
            track_gain: 1.0,
            mix_buffer: Vec::new(),
            track_buffer: Vec::new(),
        }
    }

    pub fn add_track(&mut self, track: Track) -> TrackId {
        let id = track.id().clone();
        self.tracks.push(track);
        id
    }

    pub fn remove_track(&mut self, id: &TrackId) -> Option<Track> {
        let index = self.tracks.iter().position(|t| t.id() == id)?;
        if self.solo.as_ref() == Some(id) {
            self.solo = None;
        }
        Some(self.tracks.remove(index))
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track(&self, id: &TrackId) -> Result<&Track, TrackError> {
        self.tracks
            .iter()
            .find(|t| t.id() == id)
            .ok_or_else(|| TrackError::UnknownTrack(id.to_string()))
    }

    pub fn track_mut(&mut self, id: &TrackId) -> Result<&mut Track, TrackError> {
        self.tracks
            .iter_mut()
            .find(|t| t.id() == id)
            .ok_or_else(|| TrackError::UnknownTrack(id.to_string()))
    }

    pub fn solo(&self) -> Option<&TrackId> {
        self.solo.as_ref()
    }

    pub fn set_solo(&mut self, solo: Option<TrackId>) {
        debug!("solo -> {solo:?}");
        self.solo = solo;
    }

    pub fn track_gain(&self) -> f32 {
        self.track_gain
    }

    pub fn set_track_gain(&mut self, gain: f32) {
        self.track_gain = gain;
    }

    /// Pushes the solo selection and track gain into every loaded track and
    /// moves their waveform cursors to `playhead`.
    pub fn tick(&mut self, playhead: f64) -> Result<(), TrackError> {
        let solo = self.solo.as_ref();
        for track in self.tracks.iter_mut().filter(|t| t.is_ready()) {
            track.set_gain(self.track_gain, solo)?;
            track.event_loop(playhead)?;
        }
        Ok(())
    }

    fn ensure_all_ready(&self) -> Result<(), TrackError> {
        if self.tracks.iter().all(Track::is_ready) {
            Ok(())
        } else {
            Err(TrackError::NotReady)
        }
    }

    /// Starts every track at the same clock time. Nothing is started unless
    /// all tracks are loaded.
    pub fn play_all(&mut self, when: f64, offset: f64) -> Result<(), TrackError> {
        self.ensure_all_ready()?;
        for track in &mut self.tracks {
            track.play(when, offset)?;
        }
        Ok(())
    }

    pub fn pause_all(&mut self, when: Option<f64>) -> Result<(), TrackError> {
        self.ensure_all_ready()?;
        for track in &mut self.tracks {
            track.pause(when)?;
        }
        Ok(())
    }

    pub fn stop_all(&mut self, when: Option<f64>) -> Result<(), TrackError> {
        self.ensure_all_ready()?;
        for track in &mut self.tracks {
            track.stop(when)?;
        }
        Ok(())
    }

    /// Sums every track's block starting at clock frame `block_start` into `out`.
    pub fn mix_into(&mut self, block_start: u64, out: &mut [(f32, f32)]) {
        out.fill((0.0, 0.0));
        self.track_buffer.resize(out.len(), (0.0, 0.0));

        for track in &mut self.tracks {
            track.fill_next_samples(block_start, &mut self.track_buffer[..out.len()]);
            for (slot, (l, r)) in out.iter_mut().zip(self.track_buffer.iter()) {
                slot.0 += l;
                slot.1 += r;
            }
        }
    }

    pub fn mix(&mut self, block_start: u64, frame_size: usize) -> Vec<f32> {
        let mut mix_buffer = std::mem::take(&mut self.mix_buffer);
        mix_buffer.resize(frame_size, (0.0, 0.0));
        self.mix_into(block_start, &mut mix_buffer[..frame_size]);

        let mut interleave_buffer = Vec::with_capacity(frame_size * 2);
        for &(l, r) in &mix_buffer[..frame_size] {
            interleave_buffer.push(l);
            interleave_buffer.push(r);
        }

        self.mix_buffer = mix_buffer;
        interleave_buffer
    }
}
