use super::{GeneratorState, SignalGenerator};

/// Stage lengths of an ADSR envelope, in samples
///
/// The sustain stage has no fixed length here: it fills whatever a note
/// leaves over once attack, decay and release are placed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeShape {
    pub attack: usize,
    pub decay: usize,
    /// Sustain level (0.0 to 1.0)
    pub sustain_level: f32,
    pub release: usize,
}

impl EnvelopeShape {
    pub fn new(attack: usize, decay: usize, sustain_level: f32, release: usize) -> Self {
        Self {
            attack,
            decay,
            sustain_level: sustain_level.clamp(0.0, 1.0),
            release,
        }
    }

    /// Split `total` samples into (attack, decay, sustain, release)
    ///
    /// When the note is shorter than attack + decay + release, those stages
    /// shrink proportionally and there is no sustain. The four lengths
    /// always add up to `total`.
    pub fn fit(&self, total: usize) -> (usize, usize, usize, usize) {
        let stages = self.attack as u128 + self.decay as u128 + self.release as u128;
        if stages <= total as u128 {
            let sustain = total - self.attack - self.decay - self.release;
            return (self.attack, self.decay, sustain, self.release);
        }

        let attack = (self.attack as u128 * total as u128 / stages) as usize;
        let decay = (self.decay as u128 * total as u128 / stages) as usize;
        // Release absorbs the rounding so the note still ends at zero
        let release = total - attack - decay;
        (attack, decay, 0, release)
    }
}

/// ADSR (Attack-Decay-Sustain-Release) envelope generator
///
/// Produces an amplitude envelope with four phases:
/// 1. Attack: ramps from initial amplitude to peak (1.0)
/// 2. Decay: ramps from peak to sustain level
/// 3. Sustain: holds at sustain level for its maximum duration
/// 4. Release: ramps from current amplitude to 0.0
///
/// Every ramp lands exactly on its target at its last sample, and a
/// zero-length phase is skipped. Transitions are sample accurate.
pub struct AdsrGenerator {
    // Configuration
    initial_amplitude: f32,
    attack_duration: usize,
    decay_duration: usize,
    sustain_level: f32,
    sustain_max_duration: usize,
    release_duration: usize,

    // State
    phase: AdsrPhase,
    position: usize,
    current_amplitude: f32,
    release_start_amplitude: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdsrPhase {
    Attack,
    Decay,
    Sustain,
    Release,
    Complete,
}

impl AdsrGenerator {
    /// Create a new ADSR envelope generator
    ///
    /// # Arguments
    /// * `initial_amplitude` - Starting amplitude (typically 0.0)
    /// * `attack_samples` - Attack phase duration in samples
    /// * `decay_samples` - Decay phase duration in samples
    /// * `sustain_level` - Sustain phase amplitude level (0.0 to 1.0)
    /// * `sustain_max_samples` - Maximum sustain duration in samples
    /// * `release_samples` - Release phase duration in samples
    pub fn new(
        initial_amplitude: f32,
        attack_samples: usize,
        decay_samples: usize,
        sustain_level: f32,
        sustain_max_samples: usize,
        release_samples: usize,
    ) -> Self {
        let initial_amplitude = initial_amplitude.clamp(0.0, 1.0);
        Self {
            initial_amplitude,
            attack_duration: attack_samples,
            decay_duration: decay_samples,
            sustain_level: sustain_level.clamp(0.0, 1.0),
            sustain_max_duration: sustain_max_samples,
            release_duration: release_samples,
            phase: AdsrPhase::Attack,
            position: 0,
            current_amplitude: initial_amplitude,
            release_start_amplitude: 0.0,
        }
    }

    /// Envelope for a note lasting exactly `total_samples`, starting from silence
    pub fn for_note(shape: &EnvelopeShape, total_samples: usize) -> Self {
        let (attack, decay, sustain, release) = shape.fit(total_samples);
        Self::new(0.0, attack, decay, shape.sustain_level, sustain, release)
    }

    pub fn current_amplitude(&self) -> f32 {
        self.current_amplitude
    }

    pub fn phase(&self) -> AdsrPhase {
        self.phase
    }

    /// Check if the envelope has completed (Release phase finished)
    pub fn is_complete(&self) -> bool {
        self.phase == AdsrPhase::Complete
    }

    /// Total envelope length in samples
    pub fn total_samples(&self) -> usize {
        self.attack_duration
            + self.decay_duration
            + self.sustain_max_duration
            + self.release_duration
    }

    fn enter_release(&mut self) {
        self.phase = AdsrPhase::Release;
        self.position = 0;
        self.release_start_amplitude = self.current_amplitude;
    }

    /// Move past every phase whose duration is used up
    fn skip_finished_phases(&mut self) {
        loop {
            match self.phase {
                AdsrPhase::Attack if self.position >= self.attack_duration => {
                    self.phase = AdsrPhase::Decay;
                    self.position = 0;
                }
                AdsrPhase::Decay if self.position >= self.decay_duration => {
                    self.phase = AdsrPhase::Sustain;
                    self.position = 0;
                }
                AdsrPhase::Sustain if self.position >= self.sustain_max_duration => {
                    self.enter_release();
                }
                AdsrPhase::Release if self.position >= self.release_duration => {
                    self.phase = AdsrPhase::Complete;
                    self.current_amplitude = 0.0;
                }
                _ => return,
            }
        }
    }

    fn next_amplitude(&mut self) -> f32 {
        self.skip_finished_phases();

        let ramp = |from: f32, to: f32, position: usize, duration: usize| {
            from + (to - from) * (position + 1) as f32 / duration as f32
        };

        self.current_amplitude = match self.phase {
            AdsrPhase::Attack => ramp(
                self.initial_amplitude,
                1.0,
                self.position,
                self.attack_duration,
            ),
            AdsrPhase::Decay => ramp(1.0, self.sustain_level, self.position, self.decay_duration),
            AdsrPhase::Sustain => self.sustain_level,
            AdsrPhase::Release => ramp(
                self.release_start_amplitude,
                0.0,
                self.position,
                self.release_duration,
            ),
            AdsrPhase::Complete => return 0.0,
        };
        self.position += 1;
        self.current_amplitude
    }
}

impl SignalGenerator for AdsrGenerator {
    fn process(&mut self, buffer: &mut [f32]) -> GeneratorState {
        for sample in buffer.iter_mut() {
            *sample = self.next_amplitude();
        }
        self.skip_finished_phases();

        if self.phase == AdsrPhase::Complete {
            GeneratorState::Complete
        } else {
            GeneratorState::Running
        }
    }

    fn is_complete(&self) -> bool {
        self.is_complete()
    }

    fn reset(&mut self) {
        self.phase = AdsrPhase::Attack;
        self.position = 0;
        self.current_amplitude = self.initial_amplitude;
        self.release_start_amplitude = 0.0;
    }
}
