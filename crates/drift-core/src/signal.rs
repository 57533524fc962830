use serde::{Deserialize, Serialize};

use crate::error::{TextureError, ensure_sample_rate};

pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;
pub const DEFAULT_TARGET_PEAK: f32 = 0.95;
/// Floor added to peaks and overlap weights before dividing.
pub const EPSILON: f32 = 1e-9;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Signal {
    pub sample_rate: u32,
    pub samples: Vec<f32>,
}

impl Signal {
    #[must_use]
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            sample_rate,
            samples,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[must_use]
    pub fn duration_seconds(&self) -> f64 {
        crate::time::samples_to_seconds(self.samples.len(), self.sample_rate)
    }

    #[must_use]
    pub fn peak(&self) -> f32 {
        peak(&self.samples)
    }

    pub fn validate(&self) -> Result<(), TextureError> {
        ensure_sample_rate(self.sample_rate)?;
        if let Some(index) = self.samples.iter().position(|sample| !sample.is_finite()) {
            return Err(TextureError::invalid(
                "samples",
                format!("non-finite sample at index {index}"),
            ));
        }
        Ok(())
    }
}

#[must_use]
pub fn peak(samples: &[f32]) -> f32 {
    samples
        .iter()
        .map(|sample| sample.abs())
        .fold(0.0_f32, f32::max)
}

#[must_use]
pub fn fix_length(mut samples: Vec<f32>, size: usize) -> Vec<f32> {
    samples.resize(size, 0.0);
    samples
}
