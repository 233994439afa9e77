//! Token interpretation and note synthesis
//!
//! Each note is rendered by its own FM voice whose envelopes are fitted to
//! the note's exact length, so a fragment of `d` units is always
//! `d * unit_samples` long and ends in silence.

use crate::composer::token::{classify, ControlCommand, NoteSpec, Token};
use crate::config::{ComposerConfig, VoiceConfig};
use crate::error::ComposeError;
use crate::generator::{render, AdsrGenerator, EnvelopeShape, FmSynthGenerator, FmSynthParams};
use crate::signal::AudioSignal;

/// Result of interpreting one token
#[derive(Debug, Clone, PartialEq)]
pub enum Interpretation {
    /// Audible (or silent, for rests) signal to append to the active track
    NoteFragment(AudioSignal),
    ControlCommand(ControlCommand),
}

/// Turns tokens into signal fragments or control commands
#[derive(Debug, Clone)]
pub struct NoteMaker {
    sample_rate: u32,
    unit_samples: usize,
    max_fragment_samples: usize,
    base_frequency: f32,
    octave: u8,
    note_amplitude: f32,
    voice: VoiceConfig,
}

impl NoteMaker {
    pub fn new(config: &ComposerConfig) -> Self {
        Self {
            sample_rate: config.sample_rate,
            unit_samples: config.unit_samples,
            max_fragment_samples: config.max_fragment_samples,
            base_frequency: config.base_frequency,
            octave: config.octave,
            note_amplitude: config.note_amplitude,
            voice: config.voice.clone(),
        }
    }

    /// Classify `token` and synthesize it if it is a note or rest
    pub fn interpret(&self, token: &str) -> Result<Interpretation, ComposeError> {
        match classify(token)? {
            Token::Note(note) => self.render_note(&note).map(Interpretation::NoteFragment),
            Token::Rest(duration) => Ok(Interpretation::NoteFragment(AudioSignal::silence(
                self.fragment_len(duration)?,
            ))),
            Token::Control(command) => Ok(Interpretation::ControlCommand(command)),
        }
    }

    /// Frequency of a note in the configured octave
    ///
    /// Formula: f = base_freq * 2^((octave-1) + semitone/12)
    pub fn note_frequency(&self, note: &NoteSpec) -> f32 {
        let octave_offset = (self.octave as f32 - 1.0) * 12.0;
        let total_semitones = octave_offset + note.semitone() as f32;
        self.base_frequency * 2f32.powf(total_semitones / 12.0)
    }

    fn fragment_len(&self, duration: u32) -> Result<usize, ComposeError> {
        (duration as usize)
            .checked_mul(self.unit_samples)
            .filter(|&len| len <= self.max_fragment_samples)
            .ok_or_else(|| {
                ComposeError::InvalidParameter(format!(
                    "duration of {} units exceeds {} samples",
                    duration, self.max_fragment_samples
                ))
            })
    }

    fn render_note(&self, note: &NoteSpec) -> Result<AudioSignal, ComposeError> {
        let len = self.fragment_len(note.duration)?;
        let params = FmSynthParams::for_frequency(
            self.voice.harmonics.clone(),
            self.voice.amps.clone(),
            self.note_frequency(note),
            self.sample_rate,
            self.voice.mod_depth,
        )?;

        let shape = EnvelopeShape::new(
            self.voice.attack_samples,
            self.voice.decay_samples,
            self.voice.sustain_level,
            self.voice.release_samples,
        );
        let mod_env = AdsrGenerator::for_note(&shape, len);
        let wav_env = AdsrGenerator::for_note(&shape, len);
        let mut synth = FmSynthGenerator::new(params, mod_env, wav_env);

        let mut fragment = AudioSignal::from_samples(render(&mut synth, len));
        fragment.scale_amplitude(self.note_amplitude);
        Ok(fragment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::token::{Accidental, PitchClass};

    fn small_config() -> ComposerConfig {
        ComposerConfig {
            unit_samples: 100,
            ..Default::default()
        }
    }

    fn fragment(maker: &NoteMaker, token: &str) -> AudioSignal {
        match maker.interpret(token).unwrap() {
            Interpretation::NoteFragment(signal) => signal,
            other => panic!("{} interpreted as {:?}", token, other),
        }
    }

    #[test]
    fn test_note_frequency() {
        let maker = NoteMaker::new(&ComposerConfig {
            octave: 1,
            ..Default::default()
        });
        let c = NoteSpec {
            pitch_class: PitchClass::C,
            accidental: Accidental::Natural,
            duration: 1,
        };
        assert!((maker.note_frequency(&c) - 110.0).abs() < 0.01);

        let a = NoteSpec {
            pitch_class: PitchClass::A,
            ..c
        };
        let expected = 110.0 * 2f32.powf(9.0 / 12.0);
        assert!((maker.note_frequency(&a) - expected).abs() < 0.01);

        // Default octave 4 is three octaves above
        let maker = NoteMaker::new(&ComposerConfig::default());
        assert!((maker.note_frequency(&c) - 880.0).abs() < 0.1);
    }

    #[test]
    fn test_note_length_and_bounds() {
        let maker = NoteMaker::new(&small_config());
        let signal = fragment(&maker, "C4");
        assert_eq!(signal.len(), 400);
        assert!(signal.peak() > 0.0);
        assert!(signal.peak() <= 0.5 + 1e-6);
        assert!(signal.samples()[399].abs() < 1e-6);

        assert_eq!(fragment(&maker, "E").len(), 100);
    }

    #[test]
    fn test_rest_is_silent() {
        let maker = NoteMaker::new(&small_config());
        let signal = fragment(&maker, "R3");
        assert_eq!(signal.len(), 300);
        assert_eq!(signal.peak(), 0.0);
    }

    #[test]
    fn test_interpret_is_deterministic() {
        let maker = NoteMaker::new(&small_config());
        assert_eq!(maker.interpret("G#2"), maker.interpret("G#2"));
        assert_ne!(fragment(&maker, "C2"), fragment(&maker, "D2"));
    }

    #[test]
    fn test_control_passthrough() {
        let maker = NoteMaker::new(&small_config());
        assert_eq!(
            maker.interpret("TRACK:3").unwrap(),
            Interpretation::ControlCommand(ControlCommand::SwitchTrack(3))
        );
    }

    #[test]
    fn test_errors() {
        let maker = NoteMaker::new(&small_config());
        assert!(matches!(
            maker.interpret("ZZZ"),
            Err(ComposeError::UnrecognizedToken(_))
        ));
        // 100 samples per unit, limit is one minute at 44.1kHz
        assert!(matches!(
            maker.interpret("C99999"),
            Err(ComposeError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_note_above_nyquist() {
        let maker = NoteMaker::new(&ComposerConfig {
            unit_samples: 100,
            octave: 9,
            sample_rate: 8000,
            ..Default::default()
        });
        assert!(matches!(
            maker.interpret("B"),
            Err(ComposeError::InvalidParameter(_))
        ));
    }
}
