//! Composer configuration
//!
//! Every field has a default, so a YAML file only needs the keys it changes:
//!
//! ```yaml
//! unit_samples: 2205
//! echo_decay: 0.4
//! voice:
//!   harmonics: [2, 3]
//!   amps: [1.0, 0.5]
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// FM voice settings shared by every rendered note
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Frequency multipliers of the modulation harmonics
    pub harmonics: Vec<usize>,
    /// Modulation amplitude per harmonic
    pub amps: Vec<f32>,
    /// Modulation depth (0 = plain sine)
    pub mod_depth: f32,
    pub attack_samples: usize,
    pub decay_samples: usize,
    /// Sustain level (0.0 to 1.0)
    pub sustain_level: f32,
    pub release_samples: usize,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            harmonics: vec![2, 5, 9],
            amps: vec![1.0, 2.0, 1.0],
            mod_depth: 0.3,
            attack_samples: 441,  // 10ms at 44.1kHz
            decay_samples: 882,   // 20ms at 44.1kHz
            sustain_level: 0.7,
            release_samples: 1323, // 30ms at 44.1kHz
        }
    }
}

/// Settings for a `MusicComposer`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    /// Sample rate of every signal in Hz
    pub sample_rate: u32,
    /// Samples per note duration unit
    pub unit_samples: usize,
    /// Frequency of C in octave 1 (Hz)
    pub base_frequency: f32,
    /// Octave that note tokens are rendered in
    pub octave: u8,
    /// Peak gain of a rendered note
    pub note_amplitude: f32,
    /// Attenuation of the delayed copy added by `ECHO`
    pub echo_decay: f32,
    /// Ceiling applied by `EQ:<n>:MAX`
    pub eq_ceiling: f32,
    /// Longest accepted `ECHO` delay
    pub max_echo_delay_samples: usize,
    /// Longest note or rest fragment
    pub max_fragment_samples: usize,
    pub voice: VoiceConfig,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            unit_samples: 4410, // 100ms at 44.1kHz
            base_frequency: 110.0,
            octave: 4,
            note_amplitude: 0.5,
            echo_decay: 0.5,
            eq_ceiling: 1.0,
            max_echo_delay_samples: 10 * DEFAULT_SAMPLE_RATE as usize,
            max_fragment_samples: 60 * DEFAULT_SAMPLE_RATE as usize,
            voice: VoiceConfig::default(),
        }
    }
}

impl ComposerConfig {
    /// Parse and validate a YAML document
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: ComposerConfig = serde_yml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Check that every setting is within its domain
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return invalid("sample_rate must be positive");
        }
        if self.unit_samples == 0 {
            return invalid("unit_samples must be positive");
        }
        if !(self.base_frequency.is_finite() && self.base_frequency > 0.0) {
            return invalid("base_frequency must be positive");
        }
        if !(self.note_amplitude.is_finite() && self.note_amplitude >= 0.0) {
            return invalid("note_amplitude must be non-negative");
        }
        if !(0.0..=1.0).contains(&self.echo_decay) {
            return invalid("echo_decay must be between 0.0 and 1.0");
        }
        if !(self.eq_ceiling.is_finite() && self.eq_ceiling > 0.0) {
            return invalid("eq_ceiling must be positive");
        }

        let voice = &self.voice;
        if voice.harmonics.len() != voice.amps.len() {
            return invalid("voice.harmonics and voice.amps must have the same length");
        }
        if voice.amps.iter().any(|amp| !amp.is_finite()) {
            return invalid("voice.amps must be finite");
        }
        if !(voice.mod_depth.is_finite() && voice.mod_depth >= 0.0) {
            return invalid("voice.mod_depth must be non-negative");
        }
        if !(0.0..=1.0).contains(&voice.sustain_level) {
            return invalid("voice.sustain_level must be between 0.0 and 1.0");
        }

        Ok(())
    }
}

fn invalid(message: &str) -> Result<(), ConfigError> {
    Err(ConfigError::Invalid(message.to_string()))
}
