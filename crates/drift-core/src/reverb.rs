use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::{
    error::{TextureError, ensure_sample_rate, ensure_unit_range},
    mastering::scale_to_peak,
    signal::DEFAULT_TARGET_PEAK,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReverbConfig {
    pub enabled: bool,
    pub room: f32,
    /// Kept subtle by callers (roughly `[0, 0.3]`); only `[0, 1]` is enforced.
    pub wet: f32,
    pub damping: f32,
}

impl Default for ReverbConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            room: 0.25,
            wet: 0.07,
            damping: 0.2,
        }
    }
}

impl ReverbConfig {
    #[must_use]
    pub fn params(&self) -> ReverbParams {
        ReverbParams {
            room: self.room,
            wet: self.wet,
            damping: self.damping,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReverbParams {
    pub room: f32,
    pub wet: f32,
    pub damping: f32,
}

impl ReverbParams {
    fn validate(&self) -> Result<(), TextureError> {
        ensure_unit_range("room", self.room)?;
        ensure_unit_range("wet", self.wet)?;
        ensure_unit_range("damping", self.damping)?;
        Ok(())
    }
}

pub trait ReverbUnit: Send + Sync {
    fn process(
        &self,
        samples: &[f32],
        sample_rate: u32,
        params: &ReverbParams,
    ) -> Result<Vec<f32>, TextureError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoReverb;

impl ReverbUnit for NoReverb {
    fn process(&self, _: &[f32], _: u32, _: &ReverbParams) -> Result<Vec<f32>, TextureError> {
        Err(TextureError::DependencyUnavailable("reverb"))
    }
}

const COMB_TUNINGS: [usize; 8] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];
const ALLPASS_TUNINGS: [usize; 4] = [556, 441, 341, 225];
const TUNING_SAMPLE_RATE: f64 = 44_100.0;
const INPUT_GAIN: f32 = 0.015;
const ROOM_SCALE: f32 = 0.28;
const ROOM_OFFSET: f32 = 0.7;
const DAMPING_SCALE: f32 = 0.4;
const WET_SCALE: f32 = 3.0;
const DRY_SCALE: f32 = 2.0;
const ALLPASS_FEEDBACK: f32 = 0.5;

/// Mono Schroeder/Moorer network: eight parallel damped feedback combs into
/// four series allpasses.
#[derive(Debug, Clone, Copy)]
pub struct Freeverb {
    pub dry_level: f32,
}

impl Default for Freeverb {
    fn default() -> Self {
        Self { dry_level: 0.4 }
    }
}

struct Comb {
    buffer: Vec<f32>,
    index: usize,
    filter_store: f32,
}

impl Comb {
    fn new(len: usize) -> Self {
        Self {
            buffer: vec![0.0; len.max(1)],
            index: 0,
            filter_store: 0.0,
        }
    }

    fn process(&mut self, input: f32, feedback: f32, damp: f32) -> f32 {
        let output = self.buffer[self.index];
        self.filter_store = output * (1.0 - damp) + self.filter_store * damp;
        self.buffer[self.index] = input + self.filter_store * feedback;
        self.index = (self.index + 1) % self.buffer.len();
        output
    }
}

struct Allpass {
    buffer: Vec<f32>,
    index: usize,
}

impl Allpass {
    fn new(len: usize) -> Self {
        Self {
            buffer: vec![0.0; len.max(1)],
            index: 0,
        }
    }

    fn process(&mut self, input: f32) -> f32 {
        let buffered = self.buffer[self.index];
        self.buffer[self.index] = input + buffered * ALLPASS_FEEDBACK;
        self.index = (self.index + 1) % self.buffer.len();
        buffered - input
    }
}

fn scaled_len(tuning: usize, sample_rate: u32) -> usize {
    (tuning as f64 * f64::from(sample_rate) / TUNING_SAMPLE_RATE).round() as usize
}

impl ReverbUnit for Freeverb {
    fn process(
        &self,
        samples: &[f32],
        sample_rate: u32,
        params: &ReverbParams,
    ) -> Result<Vec<f32>, TextureError> {
        let sample_rate = ensure_sample_rate(sample_rate)?;
        params.validate()?;
        let dry = ensure_unit_range("dry_level", self.dry_level)? * DRY_SCALE;

        let feedback = params.room * ROOM_SCALE + ROOM_OFFSET;
        let damp = params.damping * DAMPING_SCALE;
        let wet = params.wet * WET_SCALE;

        let mut combs: Vec<Comb> = COMB_TUNINGS
            .iter()
            .map(|&tuning| Comb::new(scaled_len(tuning, sample_rate)))
            .collect();
        let mut allpasses: Vec<Allpass> = ALLPASS_TUNINGS
            .iter()
            .map(|&tuning| Allpass::new(scaled_len(tuning, sample_rate)))
            .collect();

        let output = samples
            .iter()
            .map(|&sample| {
                let input = sample * INPUT_GAIN;
                let mut tail: f32 = combs
                    .iter_mut()
                    .map(|comb| comb.process(input, feedback, damp))
                    .sum();
                for allpass in &mut allpasses {
                    tail = allpass.process(tail);
                }
                tail * wet + sample * dry
            })
            .collect();
        Ok(output)
    }
}

/// Runs `unit` and peak-normalises its output. An unavailable unit leaves the
/// signal untouched.
#[instrument(skip(unit, samples), fields(len = samples.len()))]
pub fn apply_ambience(
    unit: &dyn ReverbUnit,
    samples: &[f32],
    sample_rate: u32,
    params: &ReverbParams,
) -> Result<Vec<f32>, TextureError> {
    params.validate()?;
    match unit.process(samples, sample_rate, params) {
        Ok(wet) => {
            debug!("reverb applied");
            Ok(scale_to_peak(&wet, DEFAULT_TARGET_PEAK))
        }
        Err(TextureError::DependencyUnavailable(capability)) => {
            warn!(capability, "reverb unavailable, passing signal through");
            Ok(samples.to_vec())
        }
        Err(error) => Err(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn impulse(len: usize) -> Vec<f32> {
        let mut samples = vec![0.0; len];
        samples[0] = 1.0;
        samples
    }

    #[test]
    fn impulse_produces_a_tail() {
        let params = ReverbConfig::default().params();
        let output = Freeverb::default()
            .process(&impulse(48_000), 48_000, &params)
            .expect("reverb should succeed");
        assert_eq!(output.len(), 48_000);
        let tail_energy: f32 = output[2_000..].iter().map(|s| s * s).sum();
        assert!(tail_energy > 0.0, "reverb tail should carry energy");
    }

    #[test]
    fn unavailable_unit_passes_through_untouched() {
        let input = vec![0.1, -0.3, 0.2];
        let output = apply_ambience(&NoReverb, &input, 48_000, &ReverbConfig::default().params())
            .expect("passthrough should not fail");
        assert_eq!(output, input);
    }

    #[test]
    fn out_of_range_parameters_are_rejected() {
        let params = ReverbParams {
            room: 1.5,
            wet: 0.1,
            damping: 0.2,
        };
        assert!(apply_ambience(&Freeverb::default(), &[0.0; 8], 48_000, &params).is_err());
    }

    #[test]
    fn output_is_normalised() {
        let input: Vec<f32> = (0..9_600).map(|i| (i as f32 * 0.05).sin() * 0.3).collect();
        let output = apply_ambience(
            &Freeverb::default(),
            &input,
            48_000,
            &ReverbConfig::default().params(),
        )
        .expect("reverb should succeed");
        let peak = crate::signal::peak(&output);
        assert!((peak - DEFAULT_TARGET_PEAK).abs() < 1e-4);
    }
}
