/// Transport-side memory of where playback is.
///
/// Tracks do not remember a resume position across a stop, so the caller keeps
/// the clock anchor and buffer offset here and feeds the offset back into the
/// next `play`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Playhead {
    /// clock time at which the current run started (or will start)
    anchor: f64,
    /// buffer position, in seconds, at `anchor`
    offset: f64,
    playing: bool,
}

impl Default for Playhead {
    fn default() -> Self {
        Self::new()
    }
}

impl Playhead {
    pub const fn new() -> Self {
        Self {
            anchor: 0.0,
            offset: 0.0,
            playing: false,
        }
    }

    pub fn play(&mut self, when: f64, offset: f64) {
        self.anchor = when;
        self.offset = offset.max(0.0);
        self.playing = true;
    }

    /// Freezes the playhead at `now` and returns the offset to resume from.
    pub fn pause(&mut self, now: f64) -> f64 {
        self.offset = self.position(now);
        self.playing = false;
        self.offset
    }

    /// Halts and rewinds to the start of the buffer.
    pub fn stop(&mut self) {
        self.offset = 0.0;
        self.playing = false;
    }

    pub fn seek(&mut self, now: f64, offset: f64) {
        self.anchor = now;
        self.offset = offset.max(0.0);
    }

    /// Position in seconds within the buffer at clock time `now`.
    /// Before a scheduled start the playhead holds at the start offset.
    pub fn position(&self, now: f64) -> f64 {
        if !self.playing {
            return self.offset;
        }

        self.offset + (now - self.anchor).max(0.0)
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }
}
