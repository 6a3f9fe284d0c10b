use std::sync::Arc;

pub mod gain;
pub mod pan;
pub mod source;

pub use gain::GainStage;
pub use pan::PanStage;
pub use source::BufferSource;

/// Fixed routing of a track: buffer source → gain stage → pan stage → output.
///
/// The gain stage lives as long as the chain; the pan stage belongs to the
/// mixer and is only referenced. Sources come and go on every `play` while
/// the rest of the chain stays in place.
#[derive(Debug)]
pub struct SignalChain {
    gain: GainStage,
    pan: Arc<PanStage>,
    scratch: Vec<(f32, f32)>,
}

impl SignalChain {
    pub fn new(pan: Arc<PanStage>) -> Self {
        Self {
            gain: GainStage::default(),
            pan,
            scratch: Vec::new(),
        }
    }

    pub fn gain(&self) -> &GainStage {
        &self.gain
    }

    pub fn gain_mut(&mut self) -> &mut GainStage {
        &mut self.gain
    }

    pub fn pan(&self) -> &Arc<PanStage> {
        &self.pan
    }

    /// Renders the connected sources through gain and pan, adding into `out`.
    pub fn render<'a>(
        &mut self,
        sources: impl IntoIterator<Item = &'a BufferSource>,
        block_start: u64,
        out: &mut [(f32, f32)],
    ) {
        self.scratch.clear();
        self.scratch.resize(out.len(), (0.0, 0.0));

        for source in sources {
            source.render_into(block_start, &mut self.scratch);
        }

        self.gain.process(&mut self.scratch);
        self.pan.process(&mut self.scratch);

        for (slot, (l, r)) in out.iter_mut().zip(self.scratch.iter()) {
            slot.0 += l;
            slot.1 += r;
        }
    }
}
