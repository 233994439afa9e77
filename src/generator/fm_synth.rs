use super::adsr::AdsrGenerator;
use super::{GeneratorState, SignalGenerator};
use crate::error::ComposeError;
use std::f32::consts::PI;
use tracing::warn;

const TWO_PI: f32 = 2.0 * PI;

/// Parameters for FM synthesis
///
/// Frequencies are in cycles per sample (Hz / sample rate), so a valid
/// carrier lies strictly between 0 and the Nyquist limit of 0.5.
#[derive(Debug, Clone)]
pub struct FmSynthParams {
    /// Frequency multipliers for modulation harmonics (e.g., [2, 5, 9])
    pub harmonics: Vec<usize>,
    /// Amplitudes for each modulation harmonic (e.g., [1.0, 2.0, 1.0])
    pub amps: Vec<f32>,
    /// Carrier frequency in cycles per sample
    pub cycles_per_sample: f32,
    /// Modulation depth scaling factor (0 = no FM)
    pub mod_depth: f32,
}

impl FmSynthParams {
    /// Create new FM synthesis parameters
    ///
    /// # Errors
    /// `InvalidParameter` if harmonics and amps differ in length, the
    /// carrier is not below Nyquist, or the depth is negative.
    pub fn new(
        harmonics: Vec<usize>,
        amps: Vec<f32>,
        cycles_per_sample: f32,
        mod_depth: f32,
    ) -> Result<Self, ComposeError> {
        if harmonics.len() != amps.len() {
            return Err(ComposeError::InvalidParameter(format!(
                "{} harmonics but {} amps",
                harmonics.len(),
                amps.len()
            )));
        }
        if !(cycles_per_sample > 0.0 && cycles_per_sample < 0.5) {
            return Err(ComposeError::InvalidParameter(format!(
                "carrier of {} cycles/sample is outside (0, 0.5)",
                cycles_per_sample
            )));
        }
        if !(mod_depth >= 0.0) {
            return Err(ComposeError::InvalidParameter(format!(
                "modulation depth {} is negative",
                mod_depth
            )));
        }
        Ok(Self {
            harmonics,
            amps,
            cycles_per_sample,
            mod_depth,
        })
    }

    /// Parameters for a carrier of `frequency` Hz at `sample_rate`
    pub fn for_frequency(
        harmonics: Vec<usize>,
        amps: Vec<f32>,
        frequency: f32,
        sample_rate: u32,
        mod_depth: f32,
    ) -> Result<Self, ComposeError> {
        Self::new(harmonics, amps, frequency / sample_rate as f32, mod_depth)
    }
}

/// FM Synthesis generator
///
/// The modulation envelope controls the depth of frequency modulation over
/// time, while the waveform envelope controls the output amplitude.
///
/// Algorithm per sample, with carrier w in cycles per sample:
/// 1. Modulation: m[n] = Σ amps[i] * sin(2π * harmonics[i] * w * n)
/// 2. Instantaneous frequency: f[n] = w * (1 + m[n] * mod_depth * e[n])
/// 3. Phase accumulation: θ[n] = θ[n-1] + 2π * f[n] (wrapped to [0, 2π))
/// 4. Output: y[n] = sin(θ[n]) * E[n]
pub struct FmSynthGenerator {
    params: FmSynthParams,

    mod_env: AdsrGenerator,
    wav_env: AdsrGenerator,

    phase: f32,
    /// Running phase of each modulation harmonic, wrapped to [0, 2π)
    mod_phases: Vec<f32>,
    sample_count: usize,

    // Scratch frames for the two envelopes
    mod_env_buffer: Vec<f32>,
    wav_env_buffer: Vec<f32>,
}

impl FmSynthGenerator {
    pub fn new(params: FmSynthParams, mod_env: AdsrGenerator, wav_env: AdsrGenerator) -> Self {
        let mod_total = mod_env.total_samples();
        let wav_total = wav_env.total_samples();
        if mod_total != wav_total {
            warn!(
                mod_total,
                wav_total, "Modulation and waveform envelopes have different lengths"
            );
        }

        let mod_phases = vec![0.0; params.harmonics.len()];
        Self {
            params,
            mod_env,
            wav_env,
            phase: 0.0,
            mod_phases,
            sample_count: 0,
            mod_env_buffer: Vec::new(),
            wav_env_buffer: Vec::new(),
        }
    }

    /// Compute the modulation signal m[n] and advance the harmonic phases
    fn next_modulation(&mut self) -> f32 {
        let mut modulation = 0.0f32;
        for ((&harmonic, &amp), mod_phase) in self
            .params
            .harmonics
            .iter()
            .zip(self.params.amps.iter())
            .zip(self.mod_phases.iter_mut())
        {
            modulation += amp * mod_phase.sin();
            *mod_phase =
                (*mod_phase + TWO_PI * harmonic as f32 * self.params.cycles_per_sample) % TWO_PI;
        }
        modulation
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }
}

impl SignalGenerator for FmSynthGenerator {
    fn process(&mut self, buffer: &mut [f32]) -> GeneratorState {
        self.mod_env_buffer.resize(buffer.len(), 0.0);
        self.wav_env_buffer.resize(buffer.len(), 0.0);
        let mod_state = self.mod_env.process(&mut self.mod_env_buffer);
        let wav_state = self.wav_env.process(&mut self.wav_env_buffer);

        for i in 0..buffer.len() {
            let modulation = self.next_modulation();
            let inst_freq = self.params.cycles_per_sample
                * (1.0 + modulation * self.params.mod_depth * self.mod_env_buffer[i]);

            self.phase = (self.phase + TWO_PI * inst_freq).rem_euclid(TWO_PI);
            buffer[i] = self.phase.sin() * self.wav_env_buffer[i];
            self.sample_count += 1;
        }

        if mod_state == GeneratorState::Complete && wav_state == GeneratorState::Complete {
            GeneratorState::Complete
        } else {
            GeneratorState::Running
        }
    }

    fn is_complete(&self) -> bool {
        self.mod_env.is_complete() && self.wav_env.is_complete()
    }

    fn reset(&mut self) {
        self.mod_env.reset();
        self.wav_env.reset();
        self.phase = 0.0;
        self.mod_phases.iter_mut().for_each(|p| *p = 0.0);
        self.sample_count = 0;
    }
}
