//! WAV export
//!
//! Writes a composed signal as mono 16-bit PCM.

use std::path::Path;

use crate::signal::AudioSignal;

/// Convert one sample to 16-bit PCM, clamping to [-1.0, 1.0]
///
/// -1.0 maps to `i16::MIN` and 1.0 to `i16::MAX`.
fn to_pcm16(sample: f32) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);
    if clamped >= 0.0 {
        (clamped * i16::MAX as f32) as i16
    } else {
        (clamped * -(i16::MIN as f32)) as i16
    }
}

/// Write `signal` to `path` as a mono 16-bit PCM WAV file
///
/// # Example
/// ```no_run
/// use tracksmith::{wav::write_wav, AudioSignal};
///
/// let silence = AudioSignal::silence(44100);
/// write_wav("silence.wav", &silence, 44100).unwrap();
/// ```
pub fn write_wav(
    path: impl AsRef<Path>,
    signal: &AudioSignal,
    sample_rate: u32,
) -> Result<(), hound::Error> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in signal.samples() {
        writer.write_sample(to_pcm16(sample))?;
    }
    writer.finalize()
}
