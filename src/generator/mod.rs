//! Frame-based generators used to synthesize note fragments

pub mod adsr;
pub mod fm_synth;

pub use adsr::{AdsrGenerator, AdsrPhase, EnvelopeShape};
pub use fm_synth::{FmSynthGenerator, FmSynthParams};

/// Samples produced per `process` call when rendering a whole fragment
pub const FRAME_SIZE: usize = 64;

/// Represents the current state of a signal generator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorState {
    /// Generator is still producing samples
    Running,
    /// Generator has completed and will produce no more samples
    Complete,
}

/// Core trait for all signal generators
///
/// Generators fill caller-provided frames; the frame length may vary from
/// call to call, and the last frame of a fragment is usually shorter.
pub trait SignalGenerator {
    /// Process the next frame of samples
    ///
    /// Even after `Complete` is returned the whole buffer is filled
    /// (with silence or the final held value).
    fn process(&mut self, buffer: &mut [f32]) -> GeneratorState;

    /// Check if this generator has completed
    fn is_complete(&self) -> bool;

    /// Reset the generator to its initial state
    fn reset(&mut self);
}

/// Run `generator` for exactly `len` samples
pub fn render<G: SignalGenerator + ?Sized>(generator: &mut G, len: usize) -> Vec<f32> {
    let mut samples = vec![0.0f32; len];
    for frame in samples.chunks_mut(FRAME_SIZE) {
        generator.process(frame);
    }
    samples
}
