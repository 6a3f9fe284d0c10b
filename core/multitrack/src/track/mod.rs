use std::{fmt, sync::Arc};

use log::{debug, trace, warn};
use transport::AudioClock;

use crate::{
    decoder::{DecodedBuffer, Decoder},
    error::TrackError,
    graph::{BufferSource, PanStage, SignalChain},
    track::waveform::{Waveform, WaveformOptions, playhead_fraction},
};

pub mod id;
pub mod solo;
pub mod waveform;

pub use id::TrackId;

/// Buffer and sources of a track that finished loading.
#[derive(Debug)]
struct LoadedTrack {
    buffer: DecodedBuffer,
    /// current one-shot source, replaced on every `play`
    source: BufferSource,
    /// replaced sources still sounding until their scheduled stop
    retired: Vec<BufferSource>,
}

impl LoadedTrack {
    fn new(buffer: DecodedBuffer) -> Self {
        let source = BufferSource::new(buffer.clone());
        Self {
            buffer,
            source,
            retired: Vec::new(),
        }
    }

    fn retire(&mut self, source: BufferSource, now_frame: u64) {
        self.retired.retain(|s| !s.is_finished(now_frame));
        if !source.is_finished(now_frame) {
            self.retired.push(source);
        }
    }

    fn sources(&self) -> impl Iterator<Item = &BufferSource> {
        std::iter::once(&self.source).chain(self.retired.iter())
    }
}

#[derive(Debug)]
enum TrackState {
    Unloaded,
    Ready(LoadedTrack),
}

/// A single track of the mix: decoded buffer, gain stage and a reference to
/// the mixer's pan stage, scheduled against the shared audio clock.
///
/// `pause` and `stop` do the same thing here. A track keeps no resume
/// position; the caller remembers the offset and passes it to the next `play`.
pub struct Track {
    id: TrackId,
    name: String,
    clock: Arc<dyn AudioClock>,
    chain: SignalChain,
    state: TrackState,
    /// base gain multiplier set from the controls
    gain_value: f32,
    /// not muted
    active: bool,
    playing: bool,
    /// whether the last rendered frame had a source sounding through the chain
    sounding: bool,
    waveform: Option<Box<dyn Waveform>>,
}

impl fmt::Debug for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Track")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("state", &self.state)
            .field("gain_value", &self.gain_value)
            .field("active", &self.active)
            .field("playing", &self.playing)
            .finish_non_exhaustive()
    }
}

impl Track {
    pub fn new(name: impl Into<String>, clock: Arc<dyn AudioClock>, pan: Arc<PanStage>) -> Self {
        Self {
            id: TrackId::new(),
            name: name.into(),
            clock,
            chain: SignalChain::new(pan),
            state: TrackState::Unloaded,
            gain_value: 1.0,
            active: true,
            playing: false,
            sounding: false,
            waveform: None,
        }
    }

    /// Decodes `bytes` and makes the track ready to play.
    ///
    /// On failure the track is left as it was. Loading over a ready track
    /// silences it immediately and swaps in the new buffer.
    pub async fn init<D: Decoder>(
        &mut self,
        decoder: &D,
        bytes: Vec<u8>,
    ) -> Result<(), TrackError> {
        let buffer = decoder.decode(bytes).await.inspect_err(|e| {
            warn!("track '{}' failed to decode: {e}", self.name);
        })?;

        let clock_rate = self.clock.sample_rate();
        if (f64::from(buffer.sample_rate()) - clock_rate).abs() > f64::EPSILON {
            warn!(
                "track '{}' decoded at {} Hz but the clock runs at {clock_rate} Hz, \
                 playing without resampling",
                self.name,
                buffer.sample_rate()
            );
        }

        if let TrackState::Ready(loaded) = &mut self.state {
            let now = self.clock.current_frame();
            loaded.source.stop(now);
            debug!("track '{}' reloading, current source stopped", self.name);
        }

        if let Some(waveform) = self.waveform.as_mut() {
            waveform.load_decoded_buffer(&buffer);
        }

        debug!(
            "track '{}' ready, {:.3}s of audio",
            self.name,
            buffer.duration()
        );
        self.state = TrackState::Ready(LoadedTrack::new(buffer));
        self.playing = false;
        self.sounding = false;
        Ok(())
    }

    /// Starts the buffer at clock time `when` from `offset` seconds into it.
    ///
    /// Any current source is stopped at the same `when` and replaced by a new
    /// one, so there is never a gap or an overlap between the two.
    pub fn play(&mut self, when: f64, offset: f64) -> Result<(), TrackError> {
        let now_frame = self.clock.current_frame();
        let when_frame = self.clock.frame_at(when).max(now_frame);

        let TrackState::Ready(loaded) = &mut self.state else {
            return Err(TrackError::NotReady);
        };

        loaded.source.stop(when_frame);

        let mut source = BufferSource::new(loaded.buffer.clone());
        source.start(when_frame, loaded.buffer.frame_at(offset))?;

        let previous = std::mem::replace(&mut loaded.source, source);
        loaded.retire(previous, now_frame);

        debug!(
            "track '{}' playing at frame {when_frame} from {offset:.3}s",
            self.name
        );
        self.playing = true;
        Ok(())
    }

    /// Stops the current source at `when` (now when `None`), along with any
    /// replaced source still scheduled to sound past that point.
    pub fn pause(&mut self, when: Option<f64>) -> Result<(), TrackError> {
        self.halt(when)
    }

    /// Same mechanics as [`Track::pause`]; the caller decides whether the
    /// offset is kept.
    pub fn stop(&mut self, when: Option<f64>) -> Result<(), TrackError> {
        self.halt(when)
    }

    fn halt(&mut self, when: Option<f64>) -> Result<(), TrackError> {
        let now_frame = self.clock.current_frame();
        let when_frame = when.map_or(now_frame, |w| self.clock.frame_at(w).max(now_frame));

        let TrackState::Ready(loaded) = &mut self.state else {
            return Err(TrackError::NotReady);
        };

        loaded.source.stop(when_frame);
        for source in &mut loaded.retired {
            source.stop(when_frame);
        }
        if self.playing {
            debug!("track '{}' halted at frame {when_frame}", self.name);
        }
        self.playing = false;
        Ok(())
    }

    pub fn is_solo_or_active(&self, solo: Option<&TrackId>) -> bool {
        solo::is_solo_or_active(&self.id, self.active, solo)
    }

    /// Gain the stage would take for `track_gain_value` and solo selection.
    pub fn resolve_gain(&self, track_gain_value: f32, solo: Option<&TrackId>) -> f32 {
        solo::effective_gain(
            self.is_solo_or_active(solo),
            track_gain_value,
            self.gain_value,
        )
    }

    /// Writes the resolved gain onto the gain stage. Only the control value
    /// changes, so this is safe to call on every tick.
    pub fn set_gain(
        &mut self,
        track_gain_value: f32,
        solo: Option<&TrackId>,
    ) -> Result<f32, TrackError> {
        if !self.is_ready() {
            return Err(TrackError::NotReady);
        }

        let value = self.resolve_gain(track_gain_value, solo);
        trace!("track '{}' gain -> {value}", self.name);
        if self.sounding {
            self.chain.gain_mut().set_value(value);
        } else {
            self.chain.gain_mut().set_value_immediate(value);
        }
        Ok(value)
    }

    /// Attaches a waveform view and hands it the decoded buffer.
    pub fn init_waveform(
        &mut self,
        mut waveform: Box<dyn Waveform>,
        options: &WaveformOptions,
    ) -> Result<(), TrackError> {
        let TrackState::Ready(loaded) = &self.state else {
            return Err(TrackError::NotReady);
        };

        waveform.configure(options);
        waveform.load_decoded_buffer(&loaded.buffer);
        self.waveform = Some(waveform);
        Ok(())
    }

    /// Moves the waveform cursor to `playhead_time` seconds. No-op without a
    /// waveform.
    pub fn set_waveform_playhead_time(&mut self, playhead_time: f64) -> Result<(), TrackError> {
        let TrackState::Ready(loaded) = &self.state else {
            return Err(TrackError::NotReady);
        };

        if let Some(waveform) = self.waveform.as_mut() {
            waveform.seek_to(playhead_fraction(playhead_time, loaded.buffer.duration()));
        }
        Ok(())
    }

    /// Per-tick hook from the transport.
    pub fn event_loop(&mut self, play_position: f64) -> Result<(), TrackError> {
        if self.waveform.is_none() {
            return Ok(());
        }
        self.set_waveform_playhead_time(play_position)
    }

    /// Renders the block of clock frames starting at `block_start` into `out`.
    pub fn fill_next_samples(&mut self, block_start: u64, out: &mut [(f32, f32)]) {
        out.fill((0.0, 0.0));

        let TrackState::Ready(loaded) = &mut self.state else {
            self.sounding = false;
            return;
        };

        self.chain.render(loaded.sources(), block_start, out);

        let block_end = block_start.saturating_add(out.len() as u64);
        let last_frame = block_end.saturating_sub(1);
        self.sounding = !out.is_empty() && loaded.sources().any(|s| s.is_audible_at(last_frame));
        loaded.retired.retain(|s| !s.is_finished(block_end));
    }

    pub fn next_samples(&mut self, block_start: u64, frame_size: usize) -> Vec<(f32, f32)> {
        let mut samples = vec![(0.0, 0.0); frame_size];
        self.fill_next_samples(block_start, &mut samples);
        samples
    }

    pub fn id(&self) -> &TrackId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, TrackState::Ready(_))
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn gain_value(&self) -> f32 {
        self.gain_value
    }

    pub fn set_gain_value(&mut self, gain_value: f32) {
        self.gain_value = gain_value;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Current value of the gain stage control.
    pub fn gain(&self) -> f32 {
        self.chain.gain().value()
    }

    pub fn pan_stage(&self) -> &Arc<PanStage> {
        self.chain.pan()
    }

    pub fn buffer(&self) -> Option<&DecodedBuffer> {
        match &self.state {
            TrackState::Ready(loaded) => Some(&loaded.buffer),
            TrackState::Unloaded => None,
        }
    }

    pub fn duration(&self) -> Option<f64> {
        self.buffer().map(DecodedBuffer::duration)
    }

    /// Number of sources that will sound at clock `frame`.
    pub fn audible_sources_at(&self, frame: u64) -> usize {
        match &self.state {
            TrackState::Ready(loaded) => loaded
                .sources()
                .filter(|s| s.is_audible_at(frame))
                .count(),
            TrackState::Unloaded => 0,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{
        future::Future,
        sync::{Arc, Mutex},
    };

    use transport::SampleClock;

    use super::*;
    use crate::{
        constants::{AUDIO_SAMPLE_EPSILON, GAIN_RAMP_FRAMES},
        decoder::WavDecoder,
        decoder::wav::tests::{create_wav_bytes, mono_spec},
        error::DecodeError,
        track::waveform::PeakWaveform,
    };

    pub(crate) const SAMPLE_RATE: u32 = 100;

    /// Hands back a fixed buffer, or fails when empty.
    #[derive(Debug, Clone)]
    pub(crate) struct StaticDecoder(pub(crate) Option<DecodedBuffer>);

    impl Decoder for StaticDecoder {
        fn decode(
            &self,
            _bytes: Vec<u8>,
        ) -> impl Future<Output = Result<DecodedBuffer, DecodeError>> + Send {
            let result = self
                .0
                .clone()
                .ok_or_else(|| DecodeError::Malformed("rejected".to_owned()));
            async move { result }
        }
    }

    /// Records every buffer it is given and every cursor it is moved to.
    #[derive(Debug, Clone, Default)]
    struct RecordingWaveform {
        loaded: Arc<Mutex<Vec<f64>>>,
        seeks: Arc<Mutex<Vec<f64>>>,
    }

    impl Waveform for RecordingWaveform {
        fn configure(&mut self, _options: &WaveformOptions) {}
        fn load_decoded_buffer(&mut self, buffer: &DecodedBuffer) {
            self.loaded.lock().unwrap().push(buffer.duration());
        }
        fn seek_to(&mut self, fraction: f64) {
            self.seeks.lock().unwrap().push(fraction);
        }
    }

    pub(crate) fn constant_buffer(seconds: u32) -> DecodedBuffer {
        DecodedBuffer::new(vec![(1.0, 1.0); (seconds * SAMPLE_RATE) as usize], SAMPLE_RATE)
    }

    pub(crate) fn new_track(clock: &Arc<SampleClock>) -> Track {
        Track::new(
            "test-track",
            Arc::clone(clock) as Arc<dyn AudioClock>,
            Arc::new(PanStage::default()),
        )
    }

    pub(crate) async fn ready_track(clock: &Arc<SampleClock>) -> Track {
        let mut track = new_track(clock);
        track
            .init(&StaticDecoder(Some(constant_buffer(4))), Vec::new())
            .await
            .unwrap();
        track
    }

    fn clock() -> Arc<SampleClock> {
        Arc::new(SampleClock::new(f64::from(SAMPLE_RATE)))
    }

    #[test]
    fn test_operations_before_init_fail_not_ready() {
        let clock = clock();
        let mut track = new_track(&clock);

        assert!(!track.is_ready());
        assert_eq!(track.play(0.0, 0.0), Err(TrackError::NotReady));
        assert_eq!(track.pause(None), Err(TrackError::NotReady));
        assert_eq!(track.stop(Some(1.0)), Err(TrackError::NotReady));
        assert_eq!(track.set_gain(1.0, None), Err(TrackError::NotReady));
        assert_eq!(track.set_waveform_playhead_time(0.0), Err(TrackError::NotReady));
        assert!(!track.is_playing());
    }

    #[tokio::test]
    async fn test_init_makes_track_ready_without_playing() {
        let clock = clock();
        let mut track = new_track(&clock);
        let bytes = create_wav_bytes(mono_spec(SAMPLE_RATE), &[1000; 50]);

        track.init(&WavDecoder::new(), bytes).await.unwrap();

        assert!(track.is_ready());
        assert!(!track.is_playing());
        assert_eq!(track.duration(), Some(0.5));
        assert!(track.next_samples(0, 8).iter().all(|&s| s == (0.0, 0.0)));
        assert!(track.play(0.0, 0.0).is_ok());
    }

    #[tokio::test]
    async fn test_failed_decode_leaves_track_unloaded() {
        let clock = clock();
        let mut track = new_track(&clock);

        let result = track.init(&WavDecoder::new(), b"garbage".to_vec()).await;

        assert!(matches!(result, Err(TrackError::Decode(_))));
        assert!(!track.is_ready());
        assert_eq!(track.play(0.0, 0.0), Err(TrackError::NotReady));
    }

    #[tokio::test]
    async fn test_failed_reinit_keeps_previous_buffer() {
        let clock = clock();
        let mut track = ready_track(&clock).await;

        let result = track.init(&StaticDecoder(None), Vec::new()).await;

        assert!(matches!(result, Err(TrackError::Decode(_))));
        assert!(track.is_ready());
        assert_eq!(track.duration(), Some(4.0));
    }

    #[tokio::test]
    async fn test_reinit_silences_current_playback() {
        let clock = clock();
        let mut track = ready_track(&clock).await;
        track.play(0.0, 0.0).unwrap();

        track
            .init(&StaticDecoder(Some(constant_buffer(1))), Vec::new())
            .await
            .unwrap();

        assert!(!track.is_playing());
        assert_eq!(track.duration(), Some(1.0));
        assert!(track.next_samples(0, 10).iter().all(|&s| s == (0.0, 0.0)));
    }

    #[tokio::test]
    async fn test_play_schedules_start_at_when() {
        let clock = clock();
        let mut track = ready_track(&clock).await;

        track.play(0.05, 0.0).unwrap();
        assert!(track.is_playing());

        let out = track.next_samples(0, 10);
        assert!(out[..5].iter().all(|&s| s == (0.0, 0.0)));
        assert!(out[5..].iter().all(|&s| s == (1.0, 1.0)));
    }

    #[tokio::test]
    async fn test_play_in_the_past_starts_now() {
        let clock = clock();
        let mut track = ready_track(&clock).await;
        clock.advance_by(50);

        track.play(0.1, 0.0).unwrap();

        assert_eq!(track.audible_sources_at(50), 1);
        assert_eq!(track.next_samples(50, 1)[0], (1.0, 1.0));
    }

    #[tokio::test]
    async fn test_replay_never_overlaps_sources() {
        let clock = clock();
        let mut track = ready_track(&clock).await;

        track.play(0.0, 0.0).unwrap();
        track.play(0.2, 1.0).unwrap();

        for frame in 0..60 {
            assert!(track.audible_sources_at(frame) <= 1, "overlap at frame {frame}");
        }

        let out = track.next_samples(0, 60);
        // the first source keeps sounding up to the second start, never both
        assert!(out.iter().all(|&(l, r)| l == 1.0 && r == 1.0));
    }

    #[tokio::test]
    async fn test_replay_drops_finished_sources() {
        let clock = clock();
        let mut track = ready_track(&clock).await;

        for i in 0..10 {
            track.play(f64::from(i) * 0.01, 0.0).unwrap();
        }
        track.next_samples(0, 20);

        assert_eq!(track.audible_sources_at(20), 1);
    }

    #[tokio::test]
    async fn test_pause_then_play_with_caller_offset() {
        let clock = clock();
        let mut track = ready_track(&clock).await;
        track.play(0.0, 0.0).unwrap();

        clock.advance_by(30);
        track.pause(None).unwrap();
        assert!(!track.is_playing());
        assert!(track.next_samples(30, 10).iter().all(|&s| s == (0.0, 0.0)));

        track.play(0.3, 0.3).unwrap();
        assert!(track.is_playing());
        assert_eq!(track.audible_sources_at(30), 1);
    }

    #[tokio::test]
    async fn test_pause_twice_is_harmless() {
        let clock = clock();
        let mut track = ready_track(&clock).await;
        track.play(0.0, 0.0).unwrap();

        assert!(track.pause(Some(0.1)).is_ok());
        assert!(!track.is_playing());
        assert!(track.pause(None).is_ok());
        assert!(!track.is_playing());
    }

    #[tokio::test]
    async fn test_stop_before_play_is_safe_after_init() {
        let clock = clock();
        let mut track = ready_track(&clock).await;

        assert!(track.stop(None).is_ok());
        assert!(track.play(0.0, 0.0).is_ok());
        assert_eq!(track.next_samples(0, 1)[0], (1.0, 1.0));
    }

    #[tokio::test]
    async fn test_pause_also_stops_replaced_source() {
        let clock = clock();
        let mut track = ready_track(&clock).await;

        track.play(0.0, 0.0).unwrap();
        track.play(0.5, 0.0).unwrap();
        track.pause(None).unwrap();

        assert_eq!(track.audible_sources_at(10), 0);
        assert!(track.next_samples(0, 60).iter().all(|&s| s == (0.0, 0.0)));
    }

    #[tokio::test]
    async fn test_play_far_in_the_future_stays_silent() {
        let clock = clock();
        let mut track = ready_track(&clock).await;

        track.play(1e300, 0.0).unwrap();
        assert!(track.is_playing());
        assert_eq!(track.audible_sources_at(0), 0);
        assert!(track.next_samples(0, 4).iter().all(|&s| s == (0.0, 0.0)));
        assert!(track.pause(None).is_ok());
    }

    #[tokio::test]
    async fn test_scheduled_stop_in_future() {
        let clock = clock();
        let mut track = ready_track(&clock).await;
        track.play(0.0, 0.0).unwrap();
        track.stop(Some(0.05)).unwrap();

        let out = track.next_samples(0, 10);
        assert!(out[..5].iter().all(|&s| s == (1.0, 1.0)));
        assert!(out[5..].iter().all(|&s| s == (0.0, 0.0)));
    }

    #[tokio::test]
    async fn test_effective_gain_scenarios() {
        let clock = clock();
        let mut track = ready_track(&clock).await;
        let other = TrackId::new();

        assert!((track.set_gain(0.8, None).unwrap() - 0.8).abs() < AUDIO_SAMPLE_EPSILON);
        assert_eq!(track.set_gain(0.8, Some(&other)).unwrap(), 0.0);
        assert_eq!(track.gain(), 0.0);

        track.set_active(false);
        let own = track.id().clone();
        assert!((track.set_gain(0.8, Some(&own)).unwrap() - 0.8).abs() < AUDIO_SAMPLE_EPSILON);
        assert_eq!(track.set_gain(0.8, None).unwrap(), 0.0);
    }

    #[tokio::test]
    async fn test_gain_value_combines_with_track_gain() {
        let clock = clock();
        let mut track = ready_track(&clock).await;
        track.set_gain_value(1.25);

        assert!((track.set_gain(0.5, None).unwrap() - 0.75).abs() < AUDIO_SAMPLE_EPSILON);
        assert_eq!(track.resolve_gain(1.0, None), 1.25);
    }

    #[tokio::test]
    async fn test_gain_change_reaches_output_after_ramp() {
        let clock = clock();
        let mut track = ready_track(&clock).await;
        track.play(0.0, 0.0).unwrap();
        assert_eq!(track.next_samples(0, 4)[3], (1.0, 1.0));

        track.set_gain(0.5, None).unwrap();
        let out = track.next_samples(4, GAIN_RAMP_FRAMES + 1);
        assert!(out[0].0 < 1.0 && out[0].0 > 0.5);
        assert!((out[GAIN_RAMP_FRAMES].0 - 0.5).abs() < AUDIO_SAMPLE_EPSILON);
    }

    #[tokio::test]
    async fn test_gain_change_before_first_block_applies_at_once() {
        let clock = clock();
        let mut track = ready_track(&clock).await;
        track.set_active(false);
        track.play(0.0, 0.0).unwrap();
        track.set_gain(1.0, None).unwrap();

        assert!(track.next_samples(0, 8).iter().all(|&s| s == (0.0, 0.0)));
    }

    #[tokio::test]
    async fn test_gain_ramps_again_after_silence() {
        let clock = clock();
        let mut track = ready_track(&clock).await;
        track.play(0.0, 0.0).unwrap();
        track.next_samples(0, 4);

        track.stop(None).unwrap();
        track.next_samples(4, 4);
        track.set_gain(0.5, None).unwrap();

        track.play(0.0, 0.0).unwrap();
        assert_eq!(track.next_samples(8, 1)[0], (0.5, 0.5));
    }

    #[tokio::test]
    async fn test_waveform_receives_normalized_cursor() {
        let clock = clock();
        let mut track = ready_track(&clock).await;
        let waveform = RecordingWaveform::default();
        let seeks = Arc::clone(&waveform.seeks);

        // no waveform attached, nothing happens
        track.event_loop(1.0).unwrap();

        track
            .init_waveform(Box::new(waveform), &WaveformOptions::default())
            .unwrap();
        track.event_loop(0.0).unwrap();
        track.event_loop(1.0).unwrap();
        track.event_loop(4.0).unwrap();

        assert_eq!(*seeks.lock().unwrap(), vec![0.0, 0.25, 1.0]);
    }

    #[tokio::test]
    async fn test_waveform_reloads_on_reinit() {
        let clock = clock();
        let mut track = ready_track(&clock).await;
        let waveform = RecordingWaveform::default();
        let loaded = Arc::clone(&waveform.loaded);
        let seeks = Arc::clone(&waveform.seeks);
        track
            .init_waveform(Box::new(waveform), &WaveformOptions::default())
            .unwrap();

        track
            .init(&StaticDecoder(Some(constant_buffer(2))), Vec::new())
            .await
            .unwrap();
        track.set_waveform_playhead_time(1.0).unwrap();

        assert_eq!(*loaded.lock().unwrap(), vec![4.0, 2.0]);
        assert_eq!(*seeks.lock().unwrap(), vec![0.5]);
    }

    #[test]
    fn test_init_waveform_requires_ready() {
        let clock = clock();
        let mut track = new_track(&clock);
        let result =
            track.init_waveform(Box::new(PeakWaveform::new(8)), &WaveformOptions::default());
        assert_eq!(result, Err(TrackError::NotReady));
    }
}
