//! Buffered audio signal
//!
//! An `AudioSignal` is a finite, in-memory run of mono f32 samples at the
//! composer's fixed sample rate. Index order is time order.

use crate::error::ComposeError;

/// Ordered, appendable buffer of audio samples
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioSignal {
    samples: Vec<f32>,
}

impl AudioSignal {
    /// Create an empty signal
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `len` samples of silence
    pub fn silence(len: usize) -> Self {
        Self {
            samples: vec![0.0; len],
        }
    }

    pub fn from_samples(samples: Vec<f32>) -> Self {
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Largest absolute sample value (0.0 for an empty signal)
    pub fn peak(&self) -> f32 {
        self.samples
            .iter()
            .fold(0.0f32, |peak, &sample| peak.max(sample.abs()))
    }

    /// Concatenate `fragment` onto the end of this signal
    pub fn append(&mut self, fragment: &AudioSignal) {
        self.samples.extend_from_slice(&fragment.samples);
    }

    /// Sum `other` into this signal, both aligned at sample 0
    ///
    /// The shorter signal is treated as padded with silence, so the result
    /// has the length of the longer one.
    pub fn mix(&mut self, other: &AudioSignal) {
        if other.len() > self.len() {
            self.samples.resize(other.len(), 0.0);
        }
        for (sample, &added) in self.samples.iter_mut().zip(other.samples.iter()) {
            *sample += added;
        }
    }

    /// Multiply every sample by `factor`
    pub fn scale_amplitude(&mut self, factor: f32) {
        for sample in self.samples.iter_mut() {
            *sample *= factor;
        }
    }

    /// Divide every sample by the peak so the loudest sample is at 1.0
    ///
    /// A silent signal is left unchanged. The result stays finite even
    /// when the peak is subnormal.
    pub fn normalize(&mut self) {
        let peak = self.peak();
        if peak > 0.0 {
            for sample in self.samples.iter_mut() {
                *sample /= peak;
            }
        }
    }

    /// Clip every sample's magnitude to `max_abs`, keeping its sign
    pub fn clamp_amplitude(&mut self, max_abs: f32) {
        let ceiling = max_abs.abs();
        for sample in self.samples.iter_mut() {
            *sample = sample.clamp(-ceiling, ceiling);
        }
    }

    /// Return this signal plus a copy delayed by `delay_samples` and scaled by `decay`
    ///
    /// The result is `len() + delay_samples` long: past the end of the
    /// original only the echo remains.
    ///
    /// # Errors
    /// `InvalidParameter` when `delay_samples` is zero or negative.
    pub fn apply_echo(&self, delay_samples: i64, decay: f32) -> Result<AudioSignal, ComposeError> {
        if delay_samples <= 0 {
            return Err(ComposeError::InvalidParameter(format!(
                "echo delay must be positive, got {}",
                delay_samples
            )));
        }
        let delay = usize::try_from(delay_samples).map_err(|_| {
            ComposeError::InvalidParameter(format!("echo delay {} too large", delay_samples))
        })?;
        let len = self.len().checked_add(delay).ok_or_else(|| {
            ComposeError::InvalidParameter(format!("echo delay {} too large", delay_samples))
        })?;

        let mut echoed = self.samples.clone();
        echoed.resize(len, 0.0);
        for (i, &sample) in self.samples.iter().enumerate() {
            echoed[i + delay] += sample * decay;
        }

        Ok(AudioSignal { samples: echoed })
    }
}
